use chrono::{DateTime, Utc};

use super::domain::{CriteriaEvaluation, Evaluation, EvaluationId, EvaluationRecord, UserId};
use crate::catalog::{CriteriaId, ProductId};

/// Evaluation header staged inside a transaction; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvaluation {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub average: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Criteria row staged inside a transaction; the store assigns the id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewCriteriaEvaluation {
    pub evaluation_id: EvaluationId,
    pub criteria_id: CriteriaId,
    pub value: f64,
}

/// Storage abstraction for evaluations and their criteria rows.
///
/// Implementations must enforce uniqueness of `(product_id, user_id)` when a transaction
/// commits and report a violation as [`StoreError::Conflict`].
pub trait EvaluationStore: Send + Sync {
    type Transaction<'a>: EvaluationTransaction
    where
        Self: 'a;

    fn find_one(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Evaluation>, StoreError>;

    fn for_product(&self, product_id: ProductId) -> Result<Vec<EvaluationRecord>, StoreError>;

    fn begin(&self) -> Result<Self::Transaction<'_>, StoreError>;
}

/// Unit of work over the evaluation tables.
///
/// Nothing staged is visible to readers before [`commit`](Self::commit) succeeds; dropping an
/// uncommitted transaction discards every staged row.
pub trait EvaluationTransaction {
    fn create_evaluation(&mut self, evaluation: NewEvaluation) -> Result<Evaluation, StoreError>;

    fn create_criteria_evaluation(
        &mut self,
        row: NewCriteriaEvaluation,
    ) -> Result<CriteriaEvaluation, StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an evaluation already exists for product {product_id} and user {user_id}")]
    Conflict { product_id: ProductId, user_id: UserId },
    #[error("evaluation store unavailable: {0}")]
    Unavailable(String),
}
