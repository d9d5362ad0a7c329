//! Media route handlers
//!
//! Catalog listing, single-entry metadata and ranged delivery of the stored
//! bytes. Delivery is stat -> resolve -> open -> stream; nothing is buffered.

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::AppState;
use crate::error::{MediaError, Result};
use crate::handler::router::RequestContext;
use crate::http::encoding::content_disposition;
use crate::http::response::{build_full_response, build_partial_response, MediaHeaders};
use crate::http::{
    body, build_416_response, build_error_response, build_json_response, resolve_range,
    RangeResolution, ResponseBody,
};
use crate::logger;
use crate::media::{stats, store, Catalog, MediaEntry, MediaQuery};

/// How the bytes of an entry are handed to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Player streaming, no disposition
    Stream,
    /// `Content-Disposition: inline`
    Preview,
    /// `Content-Disposition: attachment`
    Download,
    /// The entry's preview image
    Thumbnail,
}

impl Delivery {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "stream" => Some(Self::Stream),
            "preview" => Some(Self::Preview),
            "download" => Some(Self::Download),
            "thumbnail" => Some(Self::Thumbnail),
            _ => None,
        }
    }

    fn disposition(self, file_name: &str) -> Option<String> {
        match self {
            Self::Stream | Self::Thumbnail => None,
            Self::Preview => Some(content_disposition("inline", file_name)),
            Self::Download => Some(content_disposition("attachment", file_name)),
        }
    }

    /// With streaming disabled only downloads and thumbnails keep ranges
    const fn honors_range(self, streaming_enabled: bool) -> bool {
        streaming_enabled || matches!(self, Self::Download | Self::Thumbnail)
    }
}

#[derive(Serialize)]
struct MediaMetadata<'a> {
    #[serde(flatten)]
    entry: &'a MediaEntry,
    file_size: u64,
}

/// `GET /media`
pub async fn list_media(ctx: &RequestContext, state: &AppState) -> Response<ResponseBody> {
    let query = MediaQuery::from_query_string(ctx.query.as_deref());
    let catalog = state.catalog().await;
    build_json_response(StatusCode::OK, &query.run(&catalog))
}

/// `GET /media/{id}`
pub async fn media_metadata(state: &AppState, id: &str) -> Response<ResponseBody> {
    let catalog = state.catalog().await;
    let result = async {
        let entry = catalog.get(id)?;
        let object = store::stat(catalog.root(), entry).await?;
        Ok::<_, MediaError>(build_json_response(
            StatusCode::OK,
            &MediaMetadata {
                entry,
                file_size: object.total_length,
            },
        ))
    }
    .await;

    result.unwrap_or_else(|e| media_error_response(&e))
}

/// `GET /stats/storage`
pub async fn storage_stats(state: &AppState) -> Response<ResponseBody> {
    let catalog = state.catalog().await;
    match stats::collect(&catalog).await {
        Ok(report) => build_json_response(StatusCode::OK, &report),
        Err(e) => media_error_response(&e),
    }
}

/// `GET|HEAD /media/{id}/{stream|preview|download|thumbnail}`
pub async fn serve_media(
    ctx: &RequestContext,
    state: &AppState,
    id: &str,
    delivery: Delivery,
) -> Response<ResponseBody> {
    let catalog = state.catalog().await;
    deliver(ctx, state, &catalog, id, delivery)
        .await
        .unwrap_or_else(|e| media_error_response(&e))
}

async fn deliver(
    ctx: &RequestContext,
    state: &AppState,
    catalog: &Catalog,
    id: &str,
    delivery: Delivery,
) -> Result<Response<ResponseBody>> {
    let entry = catalog.get(id)?;
    let thumbnail = match delivery {
        Delivery::Thumbnail => Some(entry.thumbnail_entry()?),
        _ => None,
    };
    let entry = thumbnail.as_ref().unwrap_or(entry);

    let object = match store::stat(catalog.root(), entry).await {
        Err(MediaError::FileMissing { .. }) if thumbnail.is_some() => {
            return Err(MediaError::ThumbnailNotFound(id.to_string()));
        }
        result => result?,
    };
    let streaming = &state.config.streaming;

    let range_header = if delivery.honors_range(streaming.enabled) {
        ctx.range_header.as_deref()
    } else {
        None
    };

    let disposition = delivery.disposition(&entry.original_name);
    let headers = MediaHeaders {
        content_type: &object.content_type,
        total_length: object.total_length,
        disposition: disposition.as_deref(),
    };

    match resolve_range(range_header, object.total_length, streaming.range_policy) {
        RangeResolution::NotSatisfiable => {
            logger::log_debug(&format!(
                "Unsatisfiable range {range_header:?} for '{id}' ({} bytes)",
                object.total_length
            ));
            Ok(build_416_response(object.total_length))
        }
        RangeResolution::Partial(range) => {
            let content = if ctx.is_head {
                body::empty()
            } else {
                body::stream(store::open_range(catalog.root(), entry, range).await?, streaming.chunk_size)
            };
            Ok(build_partial_response(&headers, range, content))
        }
        RangeResolution::Full => {
            let content = if ctx.is_head {
                body::empty()
            } else {
                body::stream(
                    store::open_full(catalog.root(), entry, object.total_length).await?,
                    streaming.chunk_size,
                )
            };
            Ok(build_full_response(&headers, content))
        }
    }
}

/// Map a media error to its JSON response, logging by severity
pub fn media_error_response(err: &MediaError) -> Response<ResponseBody> {
    match err {
        MediaError::NotFound(_) | MediaError::InvalidId(_) | MediaError::ThumbnailNotFound(_) => {
            logger::log_debug(&err.to_string());
        }
        MediaError::FileMissing { .. } => logger::log_warning(&err.to_string()),
        MediaError::Catalog(_) | MediaError::Io(_) => logger::log_error(&err.to_string()),
    }
    build_error_response(err.status(), err.public_message(), err.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::RangePolicy;
    use http_body_util::BodyExt;
    use hyper::Method;
    use std::path::Path;

    fn state_in(dir: &Path, policy: RangePolicy) -> AppState {
        let mut config = Config::load_from(dir.join("absent").to_str().unwrap()).unwrap();
        config.storage.media_dir = dir.to_string_lossy().into_owned();
        config.streaming.range_policy = policy;
        config.streaming.chunk_size = 64;
        let catalog = Catalog::load(&config.storage).unwrap();
        AppState::new(config, catalog)
    }

    fn ctx(method: Method, range: Option<&str>) -> RequestContext {
        RequestContext {
            is_head: method == Method::HEAD,
            method,
            path: String::new(),
            query: None,
            range_header: range.map(String::from),
        }
    }

    fn sample() -> Vec<u8> {
        (0..1000u32).map(|i| (i % 251) as u8).collect()
    }

    fn header<'a>(response: &'a Response<ResponseBody>, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    async fn body_of(response: Response<ResponseBody>) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_full_content_without_range() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let response = serve_media(&ctx(Method::GET, None), &state, "clip.mp4", Delivery::Stream).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-length"), Some("1000"));
        assert_eq!(header(&response, "content-type"), Some("video/mp4"));
        assert!(response.headers().get("content-range").is_none());
        assert_eq!(body_of(response).await, sample());
    }

    #[tokio::test]
    async fn test_partial_ranges() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let cases = [
            ("bytes=0-499", "bytes 0-499/1000", 0..500),
            ("bytes=500-", "bytes 500-999/1000", 500..1000),
            ("bytes=900-999", "bytes 900-999/1000", 900..1000),
            ("bytes=0-0", "bytes 0-0/1000", 0..1),
        ];
        for (range, content_range, slice) in cases {
            let response =
                serve_media(&ctx(Method::GET, Some(range)), &state, "clip.mp4", Delivery::Stream).await;
            assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT, "{range}");
            assert_eq!(header(&response, "content-range"), Some(content_range));
            assert_eq!(header(&response, "accept-ranges"), Some("bytes"));
            let expected_len = slice.len().to_string();
            assert_eq!(header(&response, "content-length"), Some(expected_len.as_str()));
            assert_eq!(body_of(response).await, sample()[slice].to_vec());
        }
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);
        let request = ctx(Method::GET, Some("bytes=100-199"));

        let first = serve_media(&request, &state, "clip.mp4", Delivery::Stream).await;
        let second = serve_media(&request, &state, "clip.mp4", Delivery::Stream).await;
        assert_eq!(first.headers(), second.headers());
        assert_eq!(body_of(first).await, body_of(second).await);
    }

    #[tokio::test]
    async fn test_unsatisfiable_range_by_policy() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let request = ctx(Method::GET, Some("bytes=1000-"));

        let strict = state_in(dir.path(), RangePolicy::Strict);
        let response = serve_media(&request, &strict, "clip.mp4", Delivery::Stream).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header(&response, "content-range"), Some("bytes */1000"));

        let lenient = state_in(dir.path(), RangePolicy::Lenient);
        let response = serve_media(&request, &lenient, "clip.mp4", Delivery::Stream).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await.len(), 1000);
    }

    #[tokio::test]
    async fn test_missing_media_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let response = serve_media(&ctx(Method::GET, None), &state, "nope.mp4", Delivery::Stream).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["code"], "MEDIA_NOT_FOUND");

        std::fs::remove_file(dir.path().join("clip.mp4")).unwrap();
        let response = serve_media(&ctx(Method::GET, None), &state, "clip.mp4", Delivery::Stream).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["code"], "FILE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);
        let response =
            serve_media(&ctx(Method::GET, None), &state, "../secret.mp4", Delivery::Stream).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let get = serve_media(&ctx(Method::GET, Some("bytes=0-499")), &state, "clip.mp4", Delivery::Stream).await;
        let head = serve_media(&ctx(Method::HEAD, Some("bytes=0-499")), &state, "clip.mp4", Delivery::Stream).await;
        assert_eq!(get.status(), head.status());
        assert_eq!(get.headers(), head.headers());
        assert!(body_of(head).await.is_empty());
    }

    #[tokio::test]
    async fn test_download_and_preview_disposition() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("song.mp3"), b"ID3").unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let response = serve_media(&ctx(Method::GET, None), &state, "song.mp3", Delivery::Download).await;
        assert_eq!(
            header(&response, "content-disposition"),
            Some("attachment; filename=\"song.mp3\"; filename*=UTF-8''song.mp3")
        );
        let response = serve_media(&ctx(Method::GET, None), &state, "song.mp3", Delivery::Preview).await;
        assert!(header(&response, "content-disposition").unwrap().starts_with("inline;"));
        let response = serve_media(&ctx(Method::GET, None), &state, "song.mp3", Delivery::Stream).await;
        assert!(response.headers().get("content-disposition").is_none());
    }

    #[tokio::test]
    async fn test_streaming_disabled_ignores_range_except_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let mut state = state_in(dir.path(), RangePolicy::Lenient);
        state.config.streaming.enabled = false;
        let request = ctx(Method::GET, Some("bytes=0-9"));

        let response = serve_media(&request, &state, "clip.mp4", Delivery::Stream).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = serve_media(&request, &state, "clip.mp4", Delivery::Download).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    }

    #[tokio::test]
    async fn test_metadata_includes_file_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.jpg"), [0u8; 42]).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let response = media_metadata(&state, "photo.jpg").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["id"], "photo.jpg");
        assert_eq!(json["media_kind"], "image");
        assert_eq!(json["file_size"], 42);
        assert!(json.get("path").is_none());
    }

    #[tokio::test]
    async fn test_list_media_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"v").unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"a").unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);
        let mut request = ctx(Method::GET, None);
        request.query = Some("type=audio".to_string());

        let response = list_media(&request, &state).await;
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["pagination"]["total"], 1);
        assert_eq!(json["media"][0]["id"], "b.mp3");
    }

    #[tokio::test]
    async fn test_thumbnail_delivery() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.jpg"), sample()).unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        std::fs::create_dir(dir.path().join("thumbnails")).unwrap();
        std::fs::write(dir.path().join("thumbnails/thumb_photo.jpg"), b"small").unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let response = serve_media(&ctx(Method::GET, None), &state, "photo.jpg", Delivery::Thumbnail).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-type"), Some("image/jpeg"));
        assert!(response.headers().get("content-disposition").is_none());
        assert_eq!(body_of(response).await, b"small");

        let response = serve_media(&ctx(Method::GET, None), &state, "clip.mp4", Delivery::Thumbnail).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["code"], "THUMBNAIL_NOT_FOUND");

        std::fs::remove_file(dir.path().join("thumbnails/thumb_photo.jpg")).unwrap();
        let response = serve_media(&ctx(Method::GET, None), &state, "photo.jpg", Delivery::Thumbnail).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["code"], "THUMBNAIL_NOT_FOUND");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_media_dir_is_not_served() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.mp4"), b"secret").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), sample()).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        std::fs::remove_file(dir.path().join("clip.mp4")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.mp4"), dir.path().join("clip.mp4"))
            .unwrap();

        let response = serve_media(&ctx(Method::GET, None), &state, "clip.mp4", Delivery::Download).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_of(response).await;
        assert!(!body.windows(6).any(|w| w == b"secret"));
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "FILE_NOT_FOUND");

        let response = media_metadata(&state, "clip.mp4").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_storage_stats() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), [0u8; 100]).unwrap();
        std::fs::write(dir.path().join("b.mp3"), [0u8; 30]).unwrap();
        let state = state_in(dir.path(), RangePolicy::Lenient);

        let response = storage_stats(&state).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json["storage"]["used"], 130);
        assert_eq!(json["files"]["total"], 2);
        assert_eq!(json["breakdown"]["byType"][0]["file_type"], "video");
        assert_eq!(json["breakdown"]["byType"][1]["size_bytes"], 30);
        assert_eq!(json["breakdown"]["byCategory"][0]["count"], 2);
    }
}
