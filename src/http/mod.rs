//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the media
//! catalog: range resolution, MIME detection, body types and response builders.

pub mod body;
pub mod encoding;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use range::{resolve_range, ByteRange, RangePolicy, RangeResolution};
pub use response::{
    build_404_response, build_405_response, build_416_response, build_error_response,
    build_json_response, build_options_response,
};
