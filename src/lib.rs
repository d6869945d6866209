//! `listscrape` — a scraping engine for legacy mailing-list archives.
//!
//! This crate fetches archive pages in three layouts (tabular index,
//! styled hypertext, and plain-text digest files), lexes them into
//! message records, and renders the results as dictionaries, keyed
//! tables, CSV, or MBOX files.

pub mod config;
pub mod error;
pub mod fetch;
pub mod lexer;
pub mod model;
pub mod scrape;
pub mod select;
pub mod sink;

pub use error::{Result, ScrapeError};
pub use lexer::ArchiveFormat;
pub use model::{ListSource, MailingList, MessageRecord};
pub use select::Selection;
