use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{Category, Criteria, Product};

/// Catalog snapshot used to hydrate in-memory repositories.
///
/// The JSON layout mirrors the admin export: `{"categories": [..], "products": [..],
/// "criterias": [..]}` with camelCase field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub criterias: Vec<Criteria>,
}

impl CatalogSeed {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        let seed: CatalogSeed = serde_json::from_reader(reader)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Reject snapshots that would break identity or reference integrity.
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id) {
                return Err(SeedError::Invalid(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
        }

        for category in &self.categories {
            if let Some(parent_id) = category.parent_id {
                if !category_ids.contains(&parent_id) {
                    return Err(SeedError::Invalid(format!(
                        "category {} references unknown parent {parent_id}",
                        category.id
                    )));
                }
            }
        }

        let mut product_ids = HashSet::new();
        for product in &self.products {
            if !product_ids.insert(product.id) {
                return Err(SeedError::Invalid(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            if !category_ids.contains(&product.category_id) {
                return Err(SeedError::Invalid(format!(
                    "product {} references unknown category {}",
                    product.id, product.category_id
                )));
            }
        }

        let mut criteria_ids = HashSet::new();
        for criteria in &self.criterias {
            if !criteria_ids.insert(criteria.id) {
                return Err(SeedError::Invalid(format!(
                    "duplicate criteria id {}",
                    criteria.id
                )));
            }
            if !(criteria.coefficient.is_finite() && criteria.coefficient > 0.0) {
                return Err(SeedError::Invalid(format!(
                    "criteria {} must have a positive coefficient",
                    criteria.id
                )));
            }
            if !category_ids.contains(&criteria.category_id) {
                return Err(SeedError::Invalid(format!(
                    "criteria {} references unknown category {}",
                    criteria.id, criteria.category_id
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read catalog seed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog seed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid catalog seed: {0}")]
    Invalid(String),
}
