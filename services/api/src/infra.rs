use metrics_exporter_prometheus::PrometheusHandle;
use product_review::catalog::{
    CatalogError, CatalogRepository, CatalogSeed, Category, CategoryId, Criteria, CriteriaId,
    Product, ProductId,
};
use product_review::evaluations::{
    CriteriaEvaluation, CriteriaEvaluationId, Evaluation, EvaluationId, EvaluationRecord,
    EvaluationStore, EvaluationTransaction, NewCriteriaEvaluation, NewEvaluation, StoreError,
    UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read-only catalog hydrated from a [`CatalogSeed`].
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryCatalog {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    criterias: Vec<Criteria>,
}

impl InMemoryCatalog {
    pub(crate) fn from_seed(seed: CatalogSeed) -> Self {
        Self {
            categories: seed
                .categories
                .into_iter()
                .map(|category| (category.id, category))
                .collect(),
            products: seed
                .products
                .into_iter()
                .map(|product| (product.id, product))
                .collect(),
            criterias: seed.criterias,
        }
    }

    pub(crate) fn product_count(&self) -> usize {
        self.products.len()
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.get(&id).cloned())
    }

    fn category(&self, id: CategoryId) -> Result<Option<Category>, CatalogError> {
        Ok(self.categories.get(&id).cloned())
    }

    fn criteria_for_category(&self, id: CategoryId) -> Result<Vec<Criteria>, CatalogError> {
        Ok(self
            .criterias
            .iter()
            .filter(|criteria| criteria.category_id == id)
            .cloned()
            .collect())
    }
}

/// Evaluation store keeping committed records in memory.
///
/// Writes are staged on the transaction and applied under a single lock at commit, where the
/// one-evaluation-per-user-and-product rule is enforced.
#[derive(Debug, Default)]
pub(crate) struct InMemoryEvaluationStore {
    records: Mutex<Vec<EvaluationRecord>>,
    evaluation_ids: AtomicU64,
    criteria_ids: AtomicU64,
}

impl InMemoryEvaluationStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<EvaluationRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("evaluation store mutex poisoned".to_string()))
    }
}

impl EvaluationStore for InMemoryEvaluationStore {
    type Transaction<'a> = InMemoryTransaction<'a>;

    fn find_one(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Evaluation>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .iter()
            .map(|record| &record.evaluation)
            .find(|evaluation| evaluation.product_id == product_id && evaluation.user_id == user_id)
            .cloned())
    }

    fn for_product(&self, product_id: ProductId) -> Result<Vec<EvaluationRecord>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .iter()
            .filter(|record| record.evaluation.product_id == product_id)
            .cloned()
            .collect())
    }

    fn begin(&self) -> Result<InMemoryTransaction<'_>, StoreError> {
        Ok(InMemoryTransaction {
            store: self,
            staged: None,
        })
    }
}

pub(crate) struct InMemoryTransaction<'a> {
    store: &'a InMemoryEvaluationStore,
    staged: Option<EvaluationRecord>,
}

impl EvaluationTransaction for InMemoryTransaction<'_> {
    fn create_evaluation(&mut self, evaluation: NewEvaluation) -> Result<Evaluation, StoreError> {
        if self.staged.is_some() {
            return Err(StoreError::Unavailable(
                "transaction already holds an evaluation".to_string(),
            ));
        }
        let id = self.store.evaluation_ids.fetch_add(1, Ordering::Relaxed) + 1;
        let evaluation = Evaluation {
            id: EvaluationId(id),
            product_id: evaluation.product_id,
            user_id: evaluation.user_id,
            average: evaluation.average,
            comment: evaluation.comment,
            created_at: evaluation.created_at,
        };
        self.staged = Some(EvaluationRecord {
            evaluation: evaluation.clone(),
            criterias: Vec::new(),
        });
        Ok(evaluation)
    }

    fn create_criteria_evaluation(
        &mut self,
        row: NewCriteriaEvaluation,
    ) -> Result<CriteriaEvaluation, StoreError> {
        let staged = match self.staged.as_mut() {
            Some(staged) if staged.evaluation.id == row.evaluation_id => staged,
            _ => {
                return Err(StoreError::Unavailable(format!(
                    "evaluation {} is not part of this transaction",
                    row.evaluation_id
                )))
            }
        };
        let id = self.store.criteria_ids.fetch_add(1, Ordering::Relaxed) + 1;
        let row = CriteriaEvaluation {
            id: CriteriaEvaluationId(id),
            evaluation_id: row.evaluation_id,
            criteria_id: row.criteria_id,
            value: row.value,
        };
        staged.criterias.push(row);
        Ok(row)
    }

    fn commit(self) -> Result<(), StoreError> {
        let Some(staged) = self.staged else {
            return Ok(());
        };
        let mut guard = self.store.lock()?;
        let taken = guard.iter().any(|record| {
            record.evaluation.product_id == staged.evaluation.product_id
                && record.evaluation.user_id == staged.evaluation.user_id
        });
        if taken {
            return Err(StoreError::Conflict {
                product_id: staged.evaluation.product_id,
                user_id: staged.evaluation.user_id,
            });
        }
        guard.push(staged);
        Ok(())
    }
}

/// Small electronics catalog used when no seed file is configured.
pub(crate) fn demo_catalog_seed() -> CatalogSeed {
    let category = |id: u64, title: &str, parent: Option<u64>| Category {
        id: CategoryId(id),
        title: title.to_string(),
        parent_id: parent.map(CategoryId),
    };
    let criteria = |id: u64, name: &str, coefficient: f64, category: u64| Criteria {
        id: CriteriaId(id),
        name: name.to_string(),
        coefficient,
        category_id: CategoryId(category),
    };

    CatalogSeed {
        categories: vec![
            category(1, "Electronics", None),
            category(2, "Audio", Some(1)),
            category(3, "Headphones", Some(2)),
            category(4, "Smartphones", Some(1)),
        ],
        products: vec![
            Product {
                id: ProductId(1),
                name: "Studio One".to_string(),
                brand: "Acme".to_string(),
                category_id: CategoryId(3),
                description: "Closed-back over-ear headphones".to_string(),
                price: 199.0,
                image: None,
            },
            Product {
                id: ProductId(2),
                name: "Pocket X".to_string(),
                brand: "Acme".to_string(),
                category_id: CategoryId(4),
                description: "Compact smartphone".to_string(),
                price: 549.0,
                image: None,
            },
        ],
        criterias: vec![
            criteria(1, "Durability", 1.0, 1),
            criteria(2, "Sound quality", 3.0, 2),
            criteria(3, "Comfort", 2.0, 3),
            criteria(4, "Camera", 3.0, 4),
            criteria(5, "Battery life", 2.0, 4),
        ],
    }
}
