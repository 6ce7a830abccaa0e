//! Source feed ingestion — domain types and the HTTP fetcher.

pub mod fetcher;
pub mod model;

pub use fetcher::{HttpPostSource, PostSource};
pub use model::{Attachment, AttachmentKind, Post};
