//! HTTP surface: axum router, request shaping and error responses.
//!
//! ## Routes
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `GET`  | `/` | service name, version, endpoint list |
//! | `POST` | `/api/card/generate` | `image/png` |
//! | `GET`  | `/api/card/health` | `{status, timestamp, version}` |
//! | `POST` | `/api/generate-carousel` | [`CarouselOutput`] JSON |
//! | `GET`  | `/api/health` | `{status, timestamp, version, engine}` |
//!
//! ## Errors
//!
//! [`CardError::Validation`] becomes `400 {"error": "<message>"}`; every
//! other failure becomes `500 {"error": "<what failed>", "details": "<cause>"}`.
//! Bodies are taken as raw JSON values and deserialised by hand so malformed
//! requests get the same error shape.

use crate::card;
use crate::carousel;
use crate::config::{CardConfig, CarouselSettings, FontSource};
use crate::error::CardError;
use crate::output::{CarouselOutput, ENGINE};
use crate::progress::NoopProgressCallback;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Origins allowed by default, matching a local front-end and one production
/// domain.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "https://yourdomain.com"];

// ── Configuration & state ────────────────────────────────────────────────────

/// Process-wide server settings. Immutable once the server starts.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub fonts: FontSource,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            fonts: FontSource::default(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Shared application state accessible to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// A failed request: what was attempted, and why it failed.
#[derive(Debug)]
pub struct ApiError {
    context: &'static str,
    source: CardError,
}

impl ApiError {
    fn new(context: &'static str, source: CardError) -> Self {
        Self { context, source }
    }

    fn invalid(context: &'static str, message: impl Into<String>) -> Self {
        Self::new(context, CardError::Validation(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.source.is_client_error() {
            debug!("Rejected request: {}", self.source);
            let body = Json(json!({ "error": self.source.to_string() }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        error!("{}: {}", self.context, self.source);
        let body = Json(json!({
            "error": self.context,
            "details": self.source.to_string(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the application router with tracing and CORS middleware.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/", get(index))
        .route("/api/card/generate", post(generate_card))
        .route("/api/card/health", get(card_health))
        .route("/api/generate-carousel", post(generate_carousel))
        .route("/api/health", get(carousel_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    if !config.fonts.is_available() {
        warn!(
            "Font files not found ({}, {}); render requests will fail",
            config.fonts.regular.display(),
            config.fonts.bold.display()
        );
    }

    let app = router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("md2card listening on {}", addr);
    info!("Endpoints:");
    info!("  - POST /api/card/generate");
    info!("  - POST /api/generate-carousel");
    info!("  - GET  /api/card/health, /api/health");

    axum::serve(listener, app).await
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn index() -> Json<Value> {
    Json(json!({
        "name": "md2card",
        "version": VERSION,
        "endpoints": {
            "POST /api/card/generate": "Generate a card from Markdown",
            "GET /api/card/health": "Card service health check",
            "POST /api/generate-carousel": "Generate a carousel from Markdown",
            "GET /api/health": "Carousel service health check",
        }
    }))
}

/// Body of `POST /api/card/generate`: the Markdown plus any [`CardConfig`]
/// field, all optional.
#[derive(Debug, Deserialize)]
struct CardRequest {
    #[serde(default)]
    content: String,
    #[serde(flatten)]
    config: CardConfig,
}

async fn generate_card(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    const CONTEXT: &str = "Failed to generate card";

    let Json(value) = payload.map_err(|e| ApiError::invalid(CONTEXT, e.body_text()))?;
    let req: CardRequest = serde_json::from_value(value)
        .map_err(|e| ApiError::invalid(CONTEXT, format!("Invalid request: {e}")))?;
    info!("Card request: {} style, {} chars", req.config.style, req.content.len());

    let png = card::generate_card(&req.content, &req.config, &state.config.fonts)
        .await
        .map_err(|e| ApiError::new(CONTEXT, e))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_LENGTH, png.len().to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        png,
    )
        .into_response())
}

async fn generate_carousel(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CarouselOutput>, ApiError> {
    const CONTEXT: &str = "Failed to generate carousel";

    let Json(value) = payload.map_err(|e| ApiError::invalid(CONTEXT, e.body_text()))?;
    let text = value
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::invalid(CONTEXT, "Valid text is required"))?;
    let settings = match value.get("settings") {
        None | Some(Value::Null) => CarouselSettings::default(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ApiError::invalid(CONTEXT, format!("Invalid settings: {e}")))?,
    };

    let output = carousel::generate_carousel(text, &settings, &state.config.fonts, &NoopProgressCallback)
        .await
        .map_err(|e| ApiError::new(CONTEXT, e))?;
    Ok(Json(output))
}

async fn card_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": VERSION,
    }))
}

async fn carousel_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": VERSION,
        "engine": ENGINE,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    /// Router whose font directory holds two empty files: rendering succeeds
    /// without drawing glyphs.
    fn app_with_empty_fonts(dir: &tempfile::TempDir) -> Router {
        let fonts = FontSource::from_dir(dir.path());
        std::fs::write(&fonts.regular, b"").unwrap();
        std::fs::write(&fonts.bold, b"").unwrap();
        router(AppState::new(ServerConfig {
            fonts,
            ..ServerConfig::default()
        }))
    }

    fn app_without_fonts(dir: &tempfile::TempDir) -> Router {
        router(AppState::new(ServerConfig {
            fonts: FontSource::from_dir(dir.path()),
            ..ServerConfig::default()
        }))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app_without_fonts(&dir)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert!(body["endpoints"]["POST /api/card/generate"].is_string());
    }

    #[tokio::test]
    async fn health_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_without_fonts(&dir);

        let resp = app
            .clone()
            .oneshot(Request::get("/api/card/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "healthy");

        let resp = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["engine"], "resvg-carousel");
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn blank_card_content_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app_without_fonts(&dir)
            .oneshot(post_json("/api/card/generate", r#"{"content": "   "}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({ "error": "Content is required" }));
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app_without_fonts(&dir)
            .oneshot(post_json("/api/card/generate", "{not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn missing_fonts_are_500_with_details() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app_without_fonts(&dir)
            .oneshot(post_json("/api/card/generate", r##"{"content": "# Hi"}"##))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "Failed to generate card");
        assert!(body["details"].as_str().unwrap().contains("Inter-"));
    }

    #[tokio::test]
    async fn card_returns_png_with_cache_headers() {
        let dir = tempfile::tempdir().unwrap();
        let body = r##"{"content": "# Hi\nthere", "style": "modern", "dimensions": {"width": 200, "height": 250}}"##;
        let resp = app_with_empty_fonts(&dir)
            .oneshot(post_json("/api/card/generate", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "public, max-age=3600");
        let len: usize = resp.headers()[header::CONTENT_LENGTH].to_str().unwrap().parse().unwrap();

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.len(), len);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (200, 250));
    }

    #[tokio::test]
    async fn bad_theme_colour_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let body = r##"{"content": "x", "colorTheme": {"accent": "nope"}}"##;
        let resp = app_with_empty_fonts(&dir)
            .oneshot(post_json("/api/card/generate", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let msg = json_body(resp).await["error"].as_str().unwrap().to_string();
        assert!(msg.contains("colorTheme.accent"), "got: {msg}");
    }

    #[tokio::test]
    async fn carousel_requires_string_text() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_without_fonts(&dir);
        for body in [r#"{}"#, r#"{"text": 42}"#, r#"{"text": ""}"#] {
            let resp = app.clone().oneshot(post_json("/api/generate-carousel", body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
        }
    }

    #[tokio::test]
    async fn unknown_final_slide_type_falls_back_to_cta() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"text": "hi", "settings": {"finalSlide": {"enabled": true, "type": "party"}}}"#;
        let resp = app_with_empty_fonts(&dir)
            .oneshot(post_json("/api/generate-carousel", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let out = json_body(resp).await;
        assert_eq!(out["slides"][1]["title"], "Подписывайтесь!");
        assert_eq!(out["metadata"]["settings"]["finalSlide"]["type"], "cta");
    }

    #[tokio::test]
    async fn carousel_returns_slides_images_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"text": "plain words", "settings": {"username": "acme", "finalSlide": {"enabled": true, "type": "brand"}}}"#;
        let resp = app_with_empty_fonts(&dir)
            .oneshot(post_json("/api/generate-carousel", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let out = json_body(resp).await;
        assert_eq!(out["slides"].as_array().unwrap().len(), 2);
        assert_eq!(out["images"].as_array().unwrap().len(), 2);
        assert_eq!(out["slides"][1]["title"], "Спасибо за внимание!");
        assert_eq!(out["metadata"]["totalSlides"], 2);
        assert_eq!(out["metadata"]["settings"]["username"], "acme");
    }
}
