use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::{json, Value};

use crate::catalog::{
    CatalogError, CatalogRepository, Category, CategoryId, Criteria, CriteriaId, Product,
    ProductId,
};
use crate::evaluations::domain::{
    CriteriaEvaluation, CriteriaEvaluationId, Evaluation, EvaluationId, EvaluationRecord,
    RawEvaluationSubmission, UserId,
};
use crate::evaluations::identity::{CallerIdentity, UserRole};
use crate::evaluations::repository::{
    EvaluationStore, EvaluationTransaction, NewCriteriaEvaluation, NewEvaluation, StoreError,
};
use crate::evaluations::{EvaluationConfig, EvaluationSubmissionService};

pub(super) const HEADPHONES: ProductId = ProductId(100);
pub(super) const ORPHAN: ProductId = ProductId(200);
pub(super) const BUILD_QUALITY: CriteriaId = CriteriaId(1);
pub(super) const SOUND: CriteriaId = CriteriaId(2);
pub(super) const DURABILITY: CriteriaId = CriteriaId(4);
pub(super) const CAMERA: CriteriaId = CriteriaId(5);

pub(super) fn evaluation_config() -> EvaluationConfig {
    EvaluationConfig {
        comment_min_length: 3,
        comment_max_length: 40,
        max_category_depth: 8,
    }
}

pub(super) fn tester(id: u64) -> CallerIdentity {
    CallerIdentity {
        user_id: UserId(id),
        role: UserRole::Tester,
    }
}

/// Electronics (durability) > Headphones (build quality, sound); Phones (camera) is a sibling.
pub(super) fn catalog() -> MemoryCatalog {
    let category = |id: u64, title: &str, parent: Option<u64>| Category {
        id: CategoryId(id),
        title: title.to_string(),
        parent_id: parent.map(CategoryId),
    };
    let criteria = |id: CriteriaId, name: &str, coefficient: f64, category: u64| Criteria {
        id,
        name: name.to_string(),
        coefficient,
        category_id: CategoryId(category),
    };
    let product = |id: ProductId, name: &str, category: u64| Product {
        id,
        name: name.to_string(),
        brand: "Acme".to_string(),
        category_id: CategoryId(category),
        description: String::new(),
        price: 99.0,
        image: None,
    };

    MemoryCatalog {
        categories: vec![
            category(1, "Electronics", None),
            category(2, "Headphones", Some(1)),
            category(3, "Phones", Some(1)),
        ],
        products: vec![
            product(HEADPHONES, "Studio One", 2),
            product(ORPHAN, "Discontinued", 99),
        ],
        criteria: vec![
            criteria(DURABILITY, "Durability", 1.0, 1),
            criteria(BUILD_QUALITY, "Build quality", 2.0, 2),
            criteria(SOUND, "Sound", 3.0, 2),
            criteria(CAMERA, "Camera", 4.0, 3),
        ],
    }
}

pub(super) fn submission(scores: Value, comment: &str) -> RawEvaluationSubmission {
    RawEvaluationSubmission {
        product_id: Some(HEADPHONES),
        criterias: Some(scores),
        comment: Some(comment.to_string()),
    }
}

/// Build quality 0.8 and sound 0.9: `round2(100 * (2 * 0.8 + 3 * 0.9) / 5)` = 86.0.
pub(super) fn headphone_scores() -> Value {
    json!([
        {"criteriaId": BUILD_QUALITY.0, "value": 0.8},
        {"criteriaId": SOUND.0, "value": 0.9},
    ])
}

pub(super) fn build_service() -> (
    EvaluationSubmissionService<MemoryCatalog, MemoryStore>,
    Arc<MemoryStore>,
) {
    let store = Arc::new(MemoryStore::default());
    let service =
        EvaluationSubmissionService::new(Arc::new(catalog()), store.clone(), evaluation_config());
    (service, store)
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    pub(super) categories: Vec<Category>,
    pub(super) products: Vec<Product>,
    pub(super) criteria: Vec<Criteria>,
}

impl CatalogRepository for MemoryCatalog {
    fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.iter().find(|product| product.id == id).cloned())
    }

    fn category(&self, id: CategoryId) -> Result<Option<Category>, CatalogError> {
        Ok(self
            .categories
            .iter()
            .find(|category| category.id == id)
            .cloned())
    }

    fn criteria_for_category(&self, id: CategoryId) -> Result<Vec<Criteria>, CatalogError> {
        Ok(self
            .criteria
            .iter()
            .filter(|criteria| criteria.category_id == id)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableCatalog;

impl CatalogRepository for UnavailableCatalog {
    fn product(&self, _id: ProductId) -> Result<Option<Product>, CatalogError> {
        Err(CatalogError::Unavailable("catalog offline".to_string()))
    }

    fn category(&self, _id: CategoryId) -> Result<Option<Category>, CatalogError> {
        Err(CatalogError::Unavailable("catalog offline".to_string()))
    }

    fn criteria_for_category(&self, _id: CategoryId) -> Result<Vec<Criteria>, CatalogError> {
        Err(CatalogError::Unavailable("catalog offline".to_string()))
    }
}

/// Transactional store double. See [`MemoryStore::failing_on_row`] and
/// [`MemoryStore::with_blind_reads`] for the failure switches.
#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<Vec<EvaluationRecord>>,
    sequence: AtomicU64,
    fail_on_criteria_row: Option<usize>,
    blind_reads: bool,
}

impl MemoryStore {
    /// Store whose `find_one` never sees committed rows.
    pub(super) fn with_blind_reads() -> Self {
        Self {
            blind_reads: true,
            ..Self::default()
        }
    }

    /// Store that fails the `row`-th criteria write (1-based) of every transaction.
    pub(super) fn failing_on_row(row: usize) -> Self {
        Self {
            fail_on_criteria_row: Some(row),
            ..Self::default()
        }
    }

    pub(super) fn records(&self) -> Vec<EvaluationRecord> {
        self.records.lock().expect("store mutex poisoned").clone()
    }

    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl EvaluationStore for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn find_one(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Evaluation>, StoreError> {
        if self.blind_reads {
            return Ok(None);
        }
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .map(|record| &record.evaluation)
            .find(|evaluation| {
                evaluation.product_id == product_id && evaluation.user_id == user_id
            })
            .cloned())
    }

    fn for_product(&self, product_id: ProductId) -> Result<Vec<EvaluationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.evaluation.product_id == product_id)
            .cloned()
            .collect())
    }

    fn begin(&self) -> Result<MemoryTransaction<'_>, StoreError> {
        Ok(MemoryTransaction {
            store: self,
            staged: None,
        })
    }
}

pub(super) struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    staged: Option<EvaluationRecord>,
}

impl EvaluationTransaction for MemoryTransaction<'_> {
    fn create_evaluation(&mut self, evaluation: NewEvaluation) -> Result<Evaluation, StoreError> {
        let evaluation = Evaluation {
            id: EvaluationId(self.store.next_id()),
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
        let Some(staged) = self.staged.as_mut() else {
            return Err(StoreError::Unavailable("no staged evaluation".to_string()));
        };
        if self.store.fail_on_criteria_row == Some(staged.criterias.len() + 1) {
            return Err(StoreError::Unavailable("write failed".to_string()));
        }
        let row = CriteriaEvaluation {
            id: CriteriaEvaluationId(self.store.next_id()),
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
        let mut guard = self.store.records.lock().expect("store mutex poisoned");
        let duplicate = guard.iter().any(|record| {
            record.evaluation.product_id == staged.evaluation.product_id
                && record.evaluation.user_id == staged.evaluation.user_id
        });
        if duplicate {
            return Err(StoreError::Conflict {
                product_id: staged.evaluation.product_id,
                user_id: staged.evaluation.user_id,
            });
        }
        guard.push(staged);
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl EvaluationStore for UnavailableStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn find_one(
        &self,
        _product_id: ProductId,
        _user_id: UserId,
    ) -> Result<Option<Evaluation>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn for_product(&self, _product_id: ProductId) -> Result<Vec<EvaluationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn begin(&self) -> Result<MemoryTransaction<'_>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Seed a committed evaluation directly, bypassing the service.
pub(super) fn seed_evaluation(store: &MemoryStore, product_id: ProductId, user_id: UserId) {
    let mut tx = store.begin().expect("begin");
    tx.create_evaluation(NewEvaluation {
        product_id,
        user_id,
        average: 50.0,
        comment: "seeded".to_string(),
        created_at: Utc::now(),
    })
    .expect("stage evaluation");
    tx.commit().expect("commit");
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
