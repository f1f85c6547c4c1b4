use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CriteriaId, ProductId};

numeric_id!(
    /// Identifier of an authenticated account, as decoded by the gateway.
    UserId
);
numeric_id!(
    /// Identifier of a stored evaluation.
    EvaluationId
);
numeric_id!(
    /// Identifier of a stored per-criterion score.
    CriteriaEvaluationId
);

/// Submission exactly as received: every field may be absent and `criterias` is still
/// untyped so that shape errors can be reported instead of rejected by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvaluationSubmission {
    #[serde(default, rename = "productId")]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub criterias: Option<Value>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Tester supplied raw score for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaScore {
    pub criteria_id: CriteriaId,
    pub value: f64,
}

/// Field-annotated problem reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Stored evaluation header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: EvaluationId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub average: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Stored per-criterion score owned by an [`Evaluation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaEvaluation {
    pub id: CriteriaEvaluationId,
    pub evaluation_id: EvaluationId,
    pub criteria_id: CriteriaId,
    pub value: f64,
}

/// An evaluation together with all of its criteria rows.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub evaluation: Evaluation,
    pub criterias: Vec<CriteriaEvaluation>,
}

impl EvaluationRecord {
    pub fn view(&self) -> EvaluationView {
        EvaluationView {
            id: self.evaluation.id,
            user_id: self.evaluation.user_id,
            average: self.evaluation.average,
            comment: self.evaluation.comment.clone(),
            created_at: self.evaluation.created_at,
            criterias: self
                .criterias
                .iter()
                .map(|row| CriteriaScore {
                    criteria_id: row.criteria_id,
                    value: row.value,
                })
                .collect(),
        }
    }
}

/// Public representation of a stored evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationView {
    pub id: EvaluationId,
    pub user_id: UserId,
    pub average: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub criterias: Vec<CriteriaScore>,
}

/// Acknowledgment returned once an evaluation and its scores are committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReceipt {
    pub evaluation_id: EvaluationId,
    pub average: f64,
}
