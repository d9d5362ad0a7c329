//! Request handler module
//!
//! Routing dispatch plus the business logic behind each route: service info,
//! catalog listing and metadata, and ranged media delivery.

mod info;
pub mod media;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
