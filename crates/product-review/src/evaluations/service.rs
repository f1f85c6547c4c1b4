use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::config::EvaluationConfig;
use super::domain::{
    EvaluationReceipt, EvaluationRecord, FieldError, RawEvaluationSubmission, UserId,
};
use super::identity::CallerIdentity;
use super::repository::{
    EvaluationStore, EvaluationTransaction, NewCriteriaEvaluation, NewEvaluation, StoreError,
};
use super::scoring::{match_scores, weighted_average};
use super::validation::validate_submission;
use crate::catalog::{
    resolve_applicable_criteria, CatalogError, CatalogRepository, Category, CategoryId, Criteria,
    CriteriaId, Product, ProductId,
};

/// Service composing the catalog lookups, criteria inheritance, scoring, and evaluation store.
pub struct EvaluationSubmissionService<C, S> {
    catalog: Arc<C>,
    evaluations: Arc<S>,
    config: EvaluationConfig,
}

impl<C, S> EvaluationSubmissionService<C, S>
where
    C: CatalogRepository + 'static,
    S: EvaluationStore + 'static,
{
    pub fn new(catalog: Arc<C>, evaluations: Arc<S>, config: EvaluationConfig) -> Self {
        Self {
            catalog,
            evaluations,
            config,
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Validate, score, and store a tester's evaluation of a product.
    pub fn submit(
        &self,
        caller: &CallerIdentity,
        submission: RawEvaluationSubmission,
    ) -> Result<EvaluationReceipt, EvaluationError> {
        let submission = validate_submission(submission, &self.config)?;
        let product = self.product(submission.product_id)?;
        let category = self.category_of(&product)?;
        let applicable =
            resolve_applicable_criteria(&*self.catalog, &category, self.config.max_category_depth)?;

        let applicable_ids: HashSet<CriteriaId> =
            applicable.iter().map(|criteria| criteria.id).collect();
        let unknown = submission.unknown_criteria(&applicable_ids);
        if !unknown.is_empty() {
            warn!(
                product_id = %product.id,
                category_id = %category.id,
                unknown = ?unknown,
                "submitted criteria do not apply to the product category"
            );
            return Err(EvaluationError::CriteriaMismatch { unknown });
        }

        if self
            .evaluations
            .find_one(product.id, caller.user_id)?
            .is_some()
        {
            return Err(EvaluationError::DuplicateEvaluation {
                product_id: product.id,
                user_id: caller.user_id,
            });
        }

        let matched = match_scores(&applicable, &submission.scores);
        let average = weighted_average(&matched).ok_or_else(|| {
            EvaluationError::Validation(vec![FieldError::new(
                "criterias",
                "the scored criteria carry no weight",
            )])
        })?;

        let mut tx = self.evaluations.begin()?;
        let evaluation = tx.create_evaluation(NewEvaluation {
            product_id: product.id,
            user_id: caller.user_id,
            average,
            comment: submission.comment,
            created_at: Utc::now(),
        })?;
        for score in &matched {
            tx.create_criteria_evaluation(NewCriteriaEvaluation {
                evaluation_id: evaluation.id,
                criteria_id: score.criteria.id,
                value: score.value,
            })?;
        }
        tx.commit()?;

        info!(
            evaluation_id = %evaluation.id,
            product_id = %product.id,
            user_id = %caller.user_id,
            average,
            scored = matched.len(),
            "evaluation created"
        );

        Ok(EvaluationReceipt {
            evaluation_id: evaluation.id,
            average,
        })
    }

    /// Criteria a tester may score for the product, inherited ones included.
    pub fn applicable_criteria(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Criteria>, EvaluationError> {
        let product = self.product(product_id)?;
        let category = self.category_of(&product)?;
        let criteria =
            resolve_applicable_criteria(&*self.catalog, &category, self.config.max_category_depth)?;
        Ok(criteria)
    }

    /// Committed evaluations of the product with their criteria rows.
    pub fn evaluations_for(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<EvaluationRecord>, EvaluationError> {
        let product = self.product(product_id)?;
        let records = self.evaluations.for_product(product.id)?;
        Ok(records)
    }

    fn product(&self, product_id: ProductId) -> Result<Product, EvaluationError> {
        self.catalog
            .product(product_id)?
            .ok_or(EvaluationError::ProductNotFound(product_id))
    }

    fn category_of(&self, product: &Product) -> Result<Category, EvaluationError> {
        self.catalog
            .category(product.category_id)?
            .ok_or(EvaluationError::CategoryNotFound {
                product_id: product.id,
                category_id: product.category_id,
            })
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("missing fields: {}", join_fields(.0))]
    MissingFields(Vec<FieldError>),
    #[error("validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
    #[error("category {category_id} of product {product_id} not found")]
    CategoryNotFound {
        product_id: ProductId,
        category_id: CategoryId,
    },
    #[error("criteria {unknown:?} do not apply to the product category")]
    CriteriaMismatch { unknown: Vec<CriteriaId> },
    #[error("user {user_id} already evaluated product {product_id}")]
    DuplicateEvaluation {
        product_id: ProductId,
        user_id: UserId,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(StoreError),
}

impl EvaluationError {
    /// Field annotations for the caller, empty for errors that are not field-specific.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            EvaluationError::MissingFields(errors) | EvaluationError::Validation(errors) => {
                errors.clone()
            }
            EvaluationError::CriteriaMismatch { unknown } => unknown
                .iter()
                .map(|id| {
                    FieldError::new(
                        "criterias",
                        format!("criterion {id} does not apply to this product"),
                    )
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the failure comes from a collaborator rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, EvaluationError::Catalog(_) | EvaluationError::Store(_))
    }
}

impl From<StoreError> for EvaluationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict {
                product_id,
                user_id,
            } => EvaluationError::DuplicateEvaluation {
                product_id,
                user_id,
            },
            other => EvaluationError::Store(other),
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
