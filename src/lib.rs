//! Media streaming server
//!
//! Serves a filesystem media library over HTTP with byte-range support.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod media;
pub mod server;
