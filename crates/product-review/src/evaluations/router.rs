use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use super::domain::{FieldError, RawEvaluationSubmission};
use super::identity::CallerIdentity;
use super::repository::EvaluationStore;
use super::service::{EvaluationError, EvaluationSubmissionService};
use crate::catalog::{CatalogRepository, ProductId};

/// Envelope shared by every evaluation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            errors: None,
            data: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        if !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Body of an evaluation submission; `productId` comes from the path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationRequestBody {
    pub criterias: Option<Value>,
    pub comment: Option<String>,
}

impl EvaluationRequestBody {
    /// Split a decoded JSON body into its fields. `criterias` stays untyped for the validator;
    /// a `comment` that is neither a string nor null is reported here.
    pub fn from_json(body: Value) -> Result<Self, Vec<FieldError>> {
        let Value::Object(mut fields) = body else {
            return Err(vec![FieldError::new(
                "body",
                "the request body must be a JSON object",
            )]);
        };

        let comment = match fields.remove("comment") {
            None | Some(Value::Null) => None,
            Some(Value::String(comment)) => Some(comment),
            Some(_) => {
                return Err(vec![FieldError::new(
                    "comment",
                    "the comment must be a string",
                )])
            }
        };

        Ok(Self {
            criterias: fields.remove("criterias"),
            comment,
        })
    }
}

/// Router builder exposing the evaluation endpoints of a product.
pub fn evaluation_router<C, S>(service: Arc<EvaluationSubmissionService<C, S>>) -> Router
where
    C: CatalogRepository + 'static,
    S: EvaluationStore + 'static,
{
    Router::new()
        .route(
            "/api/products/:product_id/evaluations",
            get(list_handler::<C, S>).post(submit_handler::<C, S>),
        )
        .route(
            "/api/products/:product_id/criterias",
            get(criteria_handler::<C, S>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<C, S>(
    State(service): State<Arc<EvaluationSubmissionService<C, S>>>,
    Path(product_id): Path<String>,
    caller: Option<Extension<CallerIdentity>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    C: CatalogRepository + 'static,
    S: EvaluationStore + 'static,
{
    let caller = match authorize(caller) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let product_id = match parse_product_id(&product_id) {
        Ok(product_id) => product_id,
        Err(response) => return response,
    };
    let body = match decode_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let submission = RawEvaluationSubmission {
        product_id: Some(product_id),
        criterias: body.criterias,
        comment: body.comment,
    };

    match service.submit(&caller, submission) {
        Ok(_) => ApiResponse::new(StatusCode::CREATED, "evaluation created").into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<C, S>(
    State(service): State<Arc<EvaluationSubmissionService<C, S>>>,
    Path(product_id): Path<String>,
) -> Response
where
    C: CatalogRepository + 'static,
    S: EvaluationStore + 'static,
{
    let product_id = match parse_product_id(&product_id) {
        Ok(product_id) => product_id,
        Err(response) => return response,
    };

    match service.evaluations_for(product_id) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            data_response("evaluations retrieved", &views)
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn criteria_handler<C, S>(
    State(service): State<Arc<EvaluationSubmissionService<C, S>>>,
    Path(product_id): Path<String>,
) -> Response
where
    C: CatalogRepository + 'static,
    S: EvaluationStore + 'static,
{
    let product_id = match parse_product_id(&product_id) {
        Ok(product_id) => product_id,
        Err(response) => return response,
    };

    match service.applicable_criteria(product_id) {
        Ok(criteria) => data_response("criterias retrieved", &criteria),
        Err(err) => error_response(err),
    }
}

fn authorize(caller: Option<Extension<CallerIdentity>>) -> Result<CallerIdentity, Response> {
    let Some(Extension(caller)) = caller else {
        let response = ApiResponse::new(StatusCode::UNAUTHORIZED, "authentication required");
        return Err(response.into_response());
    };

    if !caller.role.can_evaluate() {
        warn!(
            user_id = %caller.user_id,
            role = caller.role.label(),
            "evaluation refused for role"
        );
        let response =
            ApiResponse::new(StatusCode::FORBIDDEN, "only testers can evaluate products");
        return Err(response.into_response());
    }

    Ok(caller)
}

fn parse_product_id(raw: &str) -> Result<ProductId, Response> {
    raw.trim().parse::<u64>().map(ProductId).map_err(|_| {
        ApiResponse::new(StatusCode::BAD_REQUEST, "validation error")
            .with_errors(vec![FieldError::new(
                "productId",
                "the product id must be a numeric identifier",
            )])
            .into_response()
    })
}

fn decode_body(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<EvaluationRequestBody, Response> {
    let errors = match body {
        Ok(Json(value)) => match EvaluationRequestBody::from_json(value) {
            Ok(body) => return Ok(body),
            Err(errors) => errors,
        },
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "evaluation body rejected");
            vec![FieldError::new(
                "body",
                "the request body must be a JSON object sent as application/json",
            )]
        }
    };

    Err(ApiResponse::new(StatusCode::BAD_REQUEST, "validation error")
        .with_errors(errors)
        .into_response())
}

fn data_response<T: Serialize>(message: &str, data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => ApiResponse::new(StatusCode::OK, message)
            .with_data(value)
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to serialise response payload");
            ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
                .into_response()
        }
    }
}

pub(crate) fn error_response(err: EvaluationError) -> Response {
    let errors = err.field_errors();
    let (status, message) = match &err {
        EvaluationError::MissingFields(_) => (StatusCode::BAD_REQUEST, "missing field"),
        EvaluationError::Validation(_) => (StatusCode::BAD_REQUEST, "validation error"),
        EvaluationError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "product not found"),
        EvaluationError::CategoryNotFound { .. } => {
            (StatusCode::NOT_FOUND, "product category not found")
        }
        EvaluationError::CriteriaMismatch { .. } => (
            StatusCode::BAD_REQUEST,
            "the submitted criterias do not match the product category",
        ),
        EvaluationError::DuplicateEvaluation { .. } => {
            (StatusCode::CONFLICT, "you have already evaluated this product")
        }
        EvaluationError::Catalog(_) | EvaluationError::Store(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    };

    if err.is_internal() {
        error!(error = %err, "evaluation request failed");
    } else {
        warn!(error = %err, status = status.as_u16(), "evaluation request rejected");
    }

    ApiResponse::new(status, message)
        .with_errors(errors)
        .into_response()
}
