use std::collections::HashSet;

use tracing::warn;

use super::domain::{Category, CategoryId, Criteria, CriteriaId};
use super::repository::{CatalogError, CatalogRepository};

/// Collect the criteria applicable to `category`: its own criteria followed by those of every
/// ancestor up to the root.
///
/// The category tree is external data, so the walk stops at the first revisited category, at a
/// dangling `parent_id`, or after `max_depth` categories, whichever comes first. Criteria ids
/// are reported once even if the tree hands the same criterion out twice.
pub fn resolve_applicable_criteria<C>(
    catalog: &C,
    category: &Category,
    max_depth: usize,
) -> Result<Vec<Criteria>, CatalogError>
where
    C: CatalogRepository + ?Sized,
{
    let mut visited: HashSet<CategoryId> = HashSet::new();
    let mut seen_criteria: HashSet<CriteriaId> = HashSet::new();
    let mut applicable = Vec::new();
    let mut current = Some(category.clone());

    while let Some(node) = current.take() {
        if !visited.insert(node.id) {
            warn!(
                category_id = %category.id,
                revisited = %node.id,
                "category tree contains a cycle; stopping criteria inheritance"
            );
            break;
        }
        if visited.len() > max_depth {
            warn!(
                category_id = %category.id,
                max_depth,
                "category ancestry exceeds configured depth; stopping criteria inheritance"
            );
            break;
        }

        for criteria in catalog.criteria_for_category(node.id)? {
            if seen_criteria.insert(criteria.id) {
                applicable.push(criteria);
            }
        }

        if let Some(parent_id) = node.parent_id {
            current = catalog.category(parent_id)?;
            if current.is_none() {
                warn!(
                    category_id = %node.id,
                    parent_id = %parent_id,
                    "parent category missing; stopping criteria inheritance"
                );
            }
        }
    }

    Ok(applicable)
}
