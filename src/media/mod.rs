//! Media library module
//!
//! The catalog maps opaque ids to files in the media directory; the store reads
//! lengths and byte ranges of those files; stats sum them up.

pub mod catalog;
pub mod query;
pub mod stats;
pub mod store;

pub use catalog::{Catalog, MediaEntry};
pub use query::{MediaPage, MediaQuery, Pagination};
pub use stats::StorageStats;
pub use store::MediaObject;
