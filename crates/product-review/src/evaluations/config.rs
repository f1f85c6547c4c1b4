use serde::{Deserialize, Serialize};

/// Bounds applied while validating and scoring submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Minimum trimmed comment length, in characters.
    pub comment_min_length: usize,
    /// Maximum trimmed comment length, in characters.
    pub comment_max_length: usize,
    /// Number of categories (the product's own included) visited when inheriting criteria.
    pub max_category_depth: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            comment_min_length: 3,
            comment_max_length: 500,
            max_category_depth: 32,
        }
    }
}
