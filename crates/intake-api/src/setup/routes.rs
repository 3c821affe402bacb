//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::upload_token_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use intake_core::Config;
use intake_infra::{
    request_id_middleware, security_headers_middleware, RequestIdSpan, SecurityHeaders,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let config = &state.config;
    let cors = setup_cors(config)?;

    // Only the PUT presign is gated; everything else is reachable without a token.
    let gated_routes = Router::new()
        .route(
            "/presigned",
            get(handlers::presigned::presigned_upload_url),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.upload_tokens.clone(),
            upload_token_middleware,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .route("/config", get(handlers::config::get_config))
        .route(
            "/upload-token",
            post(handlers::upload_token::issue_upload_token),
        )
        .route(
            "/presigned/download",
            get(handlers::presigned::presigned_download_url),
        )
        .route(
            "/registers/resident",
            post(handlers::registers::register_resident),
        )
        .route(
            "/registers/resident/finalize",
            post(handlers::registers::finalize_resident),
        )
        .route(
            "/registers/company",
            post(handlers::registers::register_company),
        )
        .route(
            "/registers/company/finalize",
            post(handlers::registers::finalize_company),
        )
        .route(
            "/registers/company/{id}/plates/{plateNumber}",
            post(handlers::uploads::upload_plate_file),
        )
        .route(
            "/registers/company/{id}/general",
            post(handlers::uploads::upload_general_file),
        );

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit,
        max_request_body_bytes = config.max_request_body_bytes(),
        "HTTP limits configured"
    );

    let security_headers = SecurityHeaders {
        hsts: config.is_production(),
    };

    let app = public_routes
        .merge(gated_routes)
        .merge(RapiDoc::with_openapi("/api/openapi.json", ApiDoc::openapi()).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes()))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdSpan))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            security_headers,
            security_headers_middleware,
        ))
        .with_state(state.clone());

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins()
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin {:?}: {}", o, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any))
}
