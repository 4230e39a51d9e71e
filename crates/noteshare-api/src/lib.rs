//! noteshare-api - HTTP API for uploading, searching and downloading notes.
//!
//! The router is built here so tests can drive it in-process; the binary
//! in `main.rs` only wires configuration, logging, and storage.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use noteshare_core::defaults::API_PREFIX;
use noteshare_core::{BlobStore, NoteRepository};

pub use config::{ApiConfig, StorageBackend};
pub use error::ApiError;
pub use services::{NoteDownload, NoteService};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
}

impl AppState {
    pub fn new(notes: Arc<dyn NoteRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            notes: NoteService::new(notes, blobs),
        }
    }
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let allow_origin = match allowed_origins {
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|o| {
            match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", o, e);
                    None
                }
            }
        })),
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Build the application router.
///
/// Bodies larger than `config.max_upload_size` are rejected with 413 by
/// the limit layer before any handler runs.
pub fn router(state: AppState, config: &ApiConfig) -> Router {
    let api = Router::new()
        .route(
            "/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route("/notes/:id", get(handlers::notes::get_note))
        .route("/notes/download/:id", get(handlers::notes::download_note))
        .route("/subjects", get(handlers::subjects::list_subjects));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(API_PREFIX, api)
        .layer(DefaultBodyLimit::max(config.max_upload_size))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(config.allowed_origins.as_deref()))
        .with_state(state)
}
