//! Read-side catalog model: products, the category tree, and the weighted criteria attached to
//! each category.

pub mod domain;
pub mod repository;
pub mod resolver;
pub mod seed;

pub use domain::{Category, CategoryId, Criteria, CriteriaId, Product, ProductId};
pub use repository::{CatalogError, CatalogRepository};
pub use resolver::resolve_applicable_criteria;
pub use seed::{CatalogSeed, SeedError};
