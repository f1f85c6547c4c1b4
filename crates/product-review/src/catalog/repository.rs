use super::domain::{Category, CategoryId, Criteria, Product, ProductId};

/// Typed finders over the catalog so the evaluation workflow can run against any backing store.
pub trait CatalogRepository: Send + Sync {
    fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;
    fn category(&self, id: CategoryId) -> Result<Option<Category>, CatalogError>;
    /// Criteria defined directly on the category, ancestors excluded.
    fn criteria_for_category(&self, id: CategoryId) -> Result<Vec<Criteria>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}
