//! Route configuration and setup

use crate::constants::{API_PREFIX, FILES_ROUTE};
use crate::handlers::{files, gallery, health, records};
use crate::state::{AppState, Collection};
use crate::utils::upload::UploadLimits;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use campus_core::models::{
    Book, Concours, Contestant, Course, MediaRecord, Notification, Question, Scholarship, Skill,
    Solution,
};
use campus_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and the JSON `data` field on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit = UploadLimits::from_config(config).largest() + MULTIPART_OVERHEAD_BYTES;

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route(&format!("{}/{{*key}}", FILES_ROUTE), get(files::serve_file))
        .merge(collection_routes::<Course>())
        .merge(collection_routes::<Skill>())
        .merge(collection_routes::<Contestant>())
        .merge(collection_routes::<Notification>())
        .merge(collection_routes::<Question>())
        .merge(collection_routes::<Concours>())
        .merge(collection_routes::<Solution>())
        .merge(collection_routes::<Book>())
        .merge(collection_routes::<Scholarship>())
        .route(
            &format!("{}/{}/{{id}}/images", API_PREFIX, Scholarship::COLLECTION),
            post(gallery::add_images).delete(gallery::remove_image),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ConcurrencyLimitLayer::new(config.base.http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        body_limit_bytes = body_limit,
        http_concurrency_limit = config.base.http_concurrency_limit,
        "Routes configured"
    );

    Ok(app)
}

/// Record routes of one collection under `/api/v1/<collection>`
fn collection_routes<T: Collection>() -> Router<Arc<AppState>> {
    let base = format!("{}/{}", API_PREFIX, T::COLLECTION);
    Router::new()
        .route(
            &base,
            post(records::create_record::<T>).get(records::list_records::<T>),
        )
        .route(
            &format!("{}/{{id}}", base),
            get(records::get_record::<T>).delete(records::delete_record::<T>),
        )
        .route(
            &format!("{}/{{id}}/media/{{slot}}", base),
            put(records::replace_media::<T>).delete(records::remove_media::<T>),
        )
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.base.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .base
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
