use super::domain::CriteriaScore;
use crate::catalog::Criteria;

/// An applicable criterion paired with the value the tester gave it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedScore<'a> {
    pub criteria: &'a Criteria,
    pub value: f64,
}

/// Pair every applicable criterion with the submitted value, in applicable-set order.
/// Criteria the tester did not score are skipped.
pub fn match_scores<'a>(
    applicable: &'a [Criteria],
    scores: &[CriteriaScore],
) -> Vec<MatchedScore<'a>> {
    applicable
        .iter()
        .filter_map(|criteria| {
            scores
                .iter()
                .find(|score| score.criteria_id == criteria.id)
                .map(|score| MatchedScore {
                    criteria,
                    value: score.value,
                })
        })
        .collect()
}

/// Coefficient-weighted mean of the matched values, multiplied by 100 and rounded to two decimals.
///
/// Returns `None` when the coefficients do not sum to a positive number, which includes an
/// empty `matched` slice.
pub fn weighted_average(matched: &[MatchedScore<'_>]) -> Option<f64> {
    let mut sum_values = 0.0_f64;
    let mut sum_coefficients = 0.0_f64;
    for score in matched {
        sum_values += score.criteria.coefficient * score.value;
        sum_coefficients += score.criteria.coefficient;
    }

    if !(sum_coefficients.is_finite() && sum_coefficients > 0.0) {
        return None;
    }

    let average = round2(sum_values / sum_coefficients * 100.0);
    average.is_finite().then_some(average)
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
