//! HTTP response building module
//!
//! Builders for the status codes the media server answers with. Builders never
//! fail outward: a builder error is logged and degrades to a bare response.

use hyper::header::HeaderValue;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::body::{self, ResponseBody};
use super::range::ByteRange;

/// Headers shared by 200 and 206 media responses
#[derive(Debug, Clone, Copy)]
pub struct MediaHeaders<'a> {
    pub content_type: &'a str,
    pub total_length: u64,
    /// Full `Content-Disposition` value, if any
    pub disposition: Option<&'a str>,
}

/// Build JSON response
pub fn build_json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    match serde_json::to_vec_pretty(value) {
        Ok(json) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .header("Content-Length", json.len())
            .body(body::full(json))
            .unwrap_or_else(|e| {
                log_build_error(status.as_str(), &e);
                Response::new(body::empty())
            }),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
    }
}

/// Build JSON error response: `{"error": ..., "code": ...}`
pub fn build_error_response(status: StatusCode, message: &str, code: &str) -> Response<ResponseBody> {
    let payload = serde_json::json!({ "error": message, "code": code }).to_string();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Content-Length", payload.len())
        .body(body::full(payload))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(body::empty())
        })
}

/// Build 404 Not Found response for unknown paths
pub fn build_404_response() -> Response<ResponseBody> {
    build_error_response(StatusCode::NOT_FOUND, "Not Found", "NOT_FOUND")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut response = build_error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method Not Allowed",
        "METHOD_NOT_ALLOWED",
    );
    response
        .headers_mut()
        .insert("Allow", HeaderValue::from_static("GET, HEAD, OPTIONS"));
    response
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(cors_origin: Option<&str>) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", "GET, HEAD, OPTIONS");

    if let Some(origin) = cors_origin {
        builder = builder
            .header("Access-Control-Allow-Origin", origin)
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type, Range, Authorization")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(body::empty()).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(body::empty())
    })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total_length: u64) -> Response<ResponseBody> {
    let payload = serde_json::json!({
        "error": "Range Not Satisfiable",
        "code": "RANGE_NOT_SATISFIABLE",
    })
    .to_string();
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Type", "application/json")
        .header("Content-Length", payload.len())
        .header("Content-Range", format!("bytes */{total_length}"))
        .body(body::full(payload))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(body::empty())
        })
}

/// Build 200 response carrying the whole object
pub fn build_full_response(headers: &MediaHeaders<'_>, content: ResponseBody) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", headers.total_length);

    if let Some(disposition) = headers.disposition {
        builder = builder.header("Content-Disposition", disposition);
    }

    builder.body(content).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(body::empty())
    })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    headers: &MediaHeaders<'_>,
    range: ByteRange,
    content: ResponseBody,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", range.len())
        .header("Content-Range", range.content_range(headers.total_length))
        .header("Accept-Ranges", "bytes");

    if let Some(disposition) = headers.disposition {
        builder = builder.header("Content-Disposition", disposition);
    }

    builder.body(content).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(body::empty())
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
