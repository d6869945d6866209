//! Ingestion drivers: period discovery, unit listing, message assembly,
//! and the list/domain aggregators that tie them together.

pub mod assemble;
pub mod domain;
pub mod list;
pub mod periods;

pub use assemble::{assemble, derive_archival_id};
pub use domain::{DomainScraper, SaveMode};
pub use list::ListScraper;
pub use periods::{digest_lines, discover_periods, list_digest_files, list_units};
