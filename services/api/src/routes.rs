use crate::infra::AppState;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use product_review::catalog::CatalogRepository;
use product_review::evaluations::{
    evaluation_router, CallerIdentity, EvaluationStore, EvaluationSubmissionService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_evaluation_routes<C, S>(
    service: Arc<EvaluationSubmissionService<C, S>>,
) -> axum::Router
where
    C: CatalogRepository + 'static,
    S: EvaluationStore + 'static,
{
    evaluation_router(service)
        .layer(middleware::from_fn(gateway_identity))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

/// Attach the caller identity forwarded by the authenticating gateway, if any.
pub(crate) async fn gateway_identity(mut request: Request, next: Next) -> Response {
    if let Some(caller) = CallerIdentity::from_headers(request.headers()) {
        request.extensions_mut().insert(caller);
    }
    next.run(request).await
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
