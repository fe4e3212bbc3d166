use std::time::Duration;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, Request, StatusCode, Uri},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    error::AppError, response::ErrorBody, services::document_service::UPLOAD_BODY_LIMIT,
    state::AppState,
};

pub mod doc;
pub mod doctors;
pub mod documents;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod settings;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/doctors", doctors::router())
        .nest("/payments", payments::router())
        .nest(
            "/documents",
            documents::router().layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .nest("/invoices", invoices::router())
        .route("/config", get(settings::public_config))
}

/// Routes only. Unknown paths are served from the static frontend directory
/// when one is configured.
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs());

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found),
    };

    router.with_state(state)
}

/// The served application: routes plus tracing, request ids, body limit,
/// CORS and the concurrency limit.
pub fn create_app(state: AppState) -> Router {
    let concurrency_limit_layer = ConcurrencyLimitLayer::new(100);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                "request started"
            );
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    create_router(state)
        .layer(RequestBodyLimitLayer::new(UPLOAD_BODY_LIMIT))
        .layer(map_response(payload_too_large_as_json))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .layer(concurrency_limit_layer)
}

/// The body limit answers 413 in plain text; clients expect the JSON error.
async fn payload_too_large_as_json(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::FileTooLarge.into_response();
    }
    response
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(format!("No route for {}", uri.path()))),
    )
}
