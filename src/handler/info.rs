//! Service information endpoints

use chrono::Utc;
use hyper::{Response, StatusCode};
use serde_json::json;

use crate::config::AppState;
use crate::http::{build_json_response, ResponseBody};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `GET /`: service name, version and the endpoint map
pub fn service_info() -> Response<ResponseBody> {
    let payload = json!({
        "message": "Media streaming server",
        "version": VERSION,
        "endpoints": {
            "health": "/health",
            "media": "/media",
            "metadata": "/media/{id}",
            "stream": "/media/{id}/stream",
            "preview": "/media/{id}/preview",
            "download": "/media/{id}/download",
            "thumbnail": "/media/{id}/thumbnail",
            "stats": "/stats/storage",
        }
    });
    build_json_response(StatusCode::OK, &payload)
}

/// `GET /health`; 503 once shutdown has begun
pub async fn health(state: &AppState) -> Response<ResponseBody> {
    let shutting_down = state.is_shutting_down();
    let payload = json!({
        "status": if shutting_down { "SHUTTING_DOWN" } else { "OK" },
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION,
        "media_count": state.catalog().await.len(),
    });
    let status = if shutting_down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    build_json_response(status, &payload)
}
