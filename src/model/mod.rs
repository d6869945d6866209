//! Canonical data model: message records, lists, domains.

pub mod list;
pub mod message;

pub use list::{ListDomain, ListSource, MailingList};
pub use message::{synthesize_id, Headers, MessageRecord, SourceRef, FETCH_FAILURE};
