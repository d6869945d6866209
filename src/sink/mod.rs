//! Output renderings for scraped lists: field dictionaries, keyed tables
//! with CSV export, and MBOX files.

pub mod dict;
pub mod mbox;
pub mod table;

pub use dict::FieldTable;
pub use mbox::{read_archival_ids, write_mbox};
pub use table::{parse_date, DataTable};
