use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ReadexError;
use crate::health::HealthChecker;
use crate::id_generator::is_valid_id;
use crate::middleware::client_ip_from_parts;
use crate::response::{DocumentResponse, ShareResponse};
use crate::store::SharedStore;
use crate::validation::RequestValidator;

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Application state containing the document store and health checker
pub struct AppState {
    pub store: SharedStore,
    pub health: HealthChecker,
    /// Host used for share links when the request carries none
    pub fallback_host: String,
}

/// Save a document and return its shareable link
pub async fn share(
    State(state): State<SharedState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<impl IntoResponse, ReadexError> {
    let content = RequestValidator::share_content(&body)?;

    let ip = client_ip_from_parts(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    if !state.store.check_rate_limit(&ip).await {
        return Err(ReadexError::RateLimitExceeded);
    }

    let id = state
        .store
        .save(&content, Some(&ip))
        .await
        .map_err(|e| {
            error!(error = %e, "Share failed");
            ReadexError::ShareFailed
        })?;

    let origin = request_origin(&headers, &state.fallback_host);
    info!(id = %id, bytes = content.len(), "Document shared");

    Ok(Json(ShareResponse::new(id, &origin)))
}

/// Raw markdown of a shared document
pub async fn shared_page(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ReadexError> {
    let content = load(&state, &id).await?;
    Ok(([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], content))
}

/// A shared document as JSON
pub async fn get_document(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ReadexError> {
    let content = load(&state, &id).await?;
    Ok(Json(DocumentResponse { id, content }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.health.check_health())
}

async fn load(state: &AppState, id: &str) -> Result<String, ReadexError> {
    if !is_valid_id(id) {
        return Err(ReadexError::NotFound);
    }
    state.store.get(id).await?.ok_or(ReadexError::NotFound)
}

/// `scheme://host` the client used to reach us
pub fn request_origin(headers: &HeaderMap, fallback_host: &str) -> String {
    let scheme = first_value(headers, "x-forwarded-proto").unwrap_or("http");
    let host = first_value(headers, "x-forwarded-host")
        .or_else(|| first_value(headers, header::HOST.as_str()))
        .unwrap_or(fallback_host);

    format!("{}://{}", scheme, host)
}

fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_origin_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("readex.dev"));
        assert_eq!(request_origin(&headers, "127.0.0.1:3000"), "http://readex.dev");
    }

    #[test]
    fn test_origin_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("10.0.0.5:3000"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("share.readex.dev"));
        assert_eq!(
            request_origin(&headers, "127.0.0.1:3000"),
            "https://share.readex.dev"
        );
    }

    #[test]
    fn test_origin_fallback() {
        assert_eq!(
            request_origin(&HeaderMap::new(), "127.0.0.1:3000"),
            "http://127.0.0.1:3000"
        );
    }
}
