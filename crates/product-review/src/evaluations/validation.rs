use std::collections::HashSet;

use serde_json::Value;

use super::config::EvaluationConfig;
use super::domain::{CriteriaScore, FieldError, RawEvaluationSubmission};
use super::service::EvaluationError;
use crate::catalog::{CriteriaId, ProductId};

/// Submission that passed the presence and shape checks.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedSubmission {
    pub product_id: ProductId,
    pub comment: String,
    pub scores: Vec<CriteriaScore>,
}

impl ValidatedSubmission {
    /// Submitted criteria ids that are not part of `applicable`, in submission order.
    pub fn unknown_criteria(&self, applicable: &HashSet<CriteriaId>) -> Vec<CriteriaId> {
        self.scores
            .iter()
            .map(|score| score.criteria_id)
            .filter(|id| !applicable.contains(id))
            .collect()
    }
}

/// Presence check followed by shape and length validation.
///
/// Each stage reports every problem it finds; the shape stage only runs once all required
/// fields are present.
pub(crate) fn validate_submission(
    raw: RawEvaluationSubmission,
    config: &EvaluationConfig,
) -> Result<ValidatedSubmission, EvaluationError> {
    let RawEvaluationSubmission {
        product_id,
        criterias,
        comment,
    } = raw;

    let criterias = criterias.filter(|value| !value.is_null());
    let comment = comment.filter(|comment| !comment.is_empty());

    let mut missing = Vec::new();
    if criterias.is_none() {
        missing.push(missing_field("criterias"));
    }
    if comment.is_none() {
        missing.push(missing_field("comment"));
    }
    if product_id.is_none() {
        missing.push(missing_field("productId"));
    }

    let (Some(product_id), Some(criterias), Some(comment)) = (product_id, criterias, comment)
    else {
        return Err(EvaluationError::MissingFields(missing));
    };

    let mut errors = Vec::new();
    let scores = parse_scores(criterias, &mut errors);

    let comment = comment.trim().to_string();
    let length = comment.chars().count();
    if length < config.comment_min_length || length > config.comment_max_length {
        errors.push(FieldError::new(
            "comment",
            format!(
                "the comment must contain between {} and {} characters",
                config.comment_min_length, config.comment_max_length
            ),
        ));
    }

    if !errors.is_empty() {
        return Err(EvaluationError::Validation(errors));
    }

    Ok(ValidatedSubmission {
        product_id,
        comment,
        scores,
    })
}

fn missing_field(field: &str) -> FieldError {
    FieldError::new(field, format!("the field {field} is missing"))
}

fn parse_scores(criterias: Value, errors: &mut Vec<FieldError>) -> Vec<CriteriaScore> {
    let Value::Array(entries) = criterias else {
        errors.push(FieldError::new("criterias", "the criterias must be an array"));
        return Vec::new();
    };

    if entries.is_empty() {
        errors.push(FieldError::new(
            "criterias",
            "at least one criterion score is required",
        ));
        return Vec::new();
    }

    let mut scores = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let field = format!("criterias[{index}]");
        let score = match serde_json::from_value::<CriteriaScore>(entry) {
            Ok(score) => score,
            Err(_) => {
                errors.push(FieldError::new(
                    field,
                    "each criterion score must be an object {criteriaId, value}",
                ));
                continue;
            }
        };

        if !(score.value.is_finite() && score.value >= 0.0) {
            errors.push(FieldError::new(
                field,
                "the value must be a non-negative number",
            ));
            continue;
        }
        if !seen.insert(score.criteria_id) {
            errors.push(FieldError::new(
                field,
                format!("criterion {} is scored more than once", score.criteria_id),
            ));
            continue;
        }

        scores.push(score);
    }

    scores
}
