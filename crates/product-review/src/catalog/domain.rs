use serde::{Deserialize, Serialize};

numeric_id!(
    /// Identifier of a product listed in the catalog.
    ProductId
);
numeric_id!(
    /// Identifier of a node in the category tree.
    CategoryId
);
numeric_id!(
    /// Identifier of an evaluation criterion.
    CriteriaId
);

/// Catalog entry testers evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
}

/// Category node; `parent_id` links towards the root of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Weighted evaluation axis owned by a single category and inherited by its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    pub id: CriteriaId,
    pub name: String,
    pub coefficient: f64,
    pub category_id: CategoryId,
}
