//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! route matching, dispatching, common response headers and access logging.

use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::handler::media::{self, Delivery};
use crate::handler::info;
use crate::http::encoding::decode_path_segment;
use crate::http::{self, body, ResponseBody};
use crate::logger::{self, AccessLogEntry};

const EXPOSED_HEADERS: &str = "Content-Range, Accept-Ranges, Content-Length, Content-Disposition";

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    pub is_head: bool,
    pub range_header: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let method = req.method().clone();
        Self {
            is_head: method == Method::HEAD,
            method,
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            range_header: header_str(req, header::RANGE),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body: no route reads one.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let ctx = RequestContext::from_request(&req);

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let response = match check_http_method(&ctx.method, &state) {
        Some(resp) => resp,
        None => route_request(&ctx, &state).await,
    };
    let response = finalize_response(response, &state, ctx.is_head);

    if state.cached_access_log.load(Ordering::Relaxed) {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            ctx.method.to_string(),
            ctx.path.clone(),
        );
        entry.query = ctx.query.clone();
        entry.http_version = version_label(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = if ctx.is_head {
            0
        } else {
            content_length(&response)
        };
        entry.range = ctx.range_header.clone();
        entry.referer = header_str(&req, header::REFERER);
        entry.user_agent = header_str(&req, header::USER_AGENT);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, state: &AppState) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(
            state.config.http.allowed_origin(),
        )),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request based on path
async fn route_request(ctx: &RequestContext, state: &AppState) -> Response<ResponseBody> {
    match ctx.path.as_str() {
        "/" => info::service_info(),
        "/health" => info::health(state).await,
        "/media" | "/media/" => media::list_media(ctx, state).await,
        "/stats/storage" => media::storage_stats(state).await,
        path => match path.strip_prefix("/media/") {
            Some(rest) => route_media(ctx, state, rest).await,
            None => http::build_404_response(),
        },
    }
}

/// `/media/{id}` and `/media/{id}/{action}`
async fn route_media(ctx: &RequestContext, state: &AppState, rest: &str) -> Response<ResponseBody> {
    match rest.split_once('/') {
        None => media::media_metadata(state, &decode_path_segment(rest)).await,
        Some((id, action)) => match Delivery::from_action(action) {
            Some(delivery) => {
                media::serve_media(ctx, state, &decode_path_segment(id), delivery).await
            }
            None => http::build_404_response(),
        },
    }
}

/// Headers every response carries; HEAD responses lose their body here
fn finalize_response(
    mut response: Response<ResponseBody>,
    state: &AppState,
    is_head: bool,
) -> Response<ResponseBody> {
    let headers = response.headers_mut();

    match HeaderValue::from_str(&state.config.http.server_name) {
        Ok(value) => {
            headers.insert(header::SERVER, value);
        }
        Err(e) => logger::log_warning(&format!("Invalid server_name header value: {e}")),
    }
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    if let Some(origin) = state.config.http.allowed_origin() {
        match HeaderValue::from_str(origin) {
            Ok(value) => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.insert(
                    header::ACCESS_CONTROL_EXPOSE_HEADERS,
                    HeaderValue::from_static(EXPOSED_HEADERS),
                );
                // A named origin may receive credentials; `*` never does
                if origin != "*" {
                    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
                    headers.insert(
                        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                        HeaderValue::from_static("true"),
                    );
                }
            }
            Err(e) => logger::log_warning(&format!("Invalid cors_origin header value: {e}")),
        }
    }

    if is_head {
        response.map(|_| body::empty())
    } else {
        response
    }
}

fn header_str<B>(req: &Request<B>, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn content_length(response: &Response<ResponseBody>) -> u64 {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
