//! Tester evaluation workflow: submission validation, criteria conformance against the
//! inherited criteria set, weighted scoring, and transactional persistence.

mod config;
pub mod domain;
pub mod identity;
pub mod repository;
pub mod router;
pub(crate) mod scoring;
pub mod service;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use config::EvaluationConfig;
pub use domain::{
    CriteriaEvaluation, CriteriaEvaluationId, CriteriaScore, Evaluation, EvaluationId,
    EvaluationReceipt, EvaluationRecord, EvaluationView, FieldError, RawEvaluationSubmission,
    UserId,
};
pub use identity::{CallerIdentity, UserRole};
pub use repository::{
    EvaluationStore, EvaluationTransaction, NewCriteriaEvaluation, NewEvaluation, StoreError,
};
pub use router::{evaluation_router, ApiResponse};
pub use scoring::{match_scores, round2, weighted_average, MatchedScore};
pub use service::{EvaluationError, EvaluationSubmissionService};
