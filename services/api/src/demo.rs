use crate::infra::{InMemoryCatalog, InMemoryEvaluationStore};
use crate::server::load_catalog_seed;
use clap::Args;
use product_review::catalog::{CatalogRepository, Criteria, ProductId};
use product_review::config::AppConfig;
use product_review::error::AppError;
use product_review::evaluations::{
    CallerIdentity, EvaluationConfig, EvaluationReceipt, EvaluationStore,
    EvaluationSubmissionService, RawEvaluationSubmission, UserId, UserRole,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// JSON catalog snapshot to evaluate against (defaults to the built-in demo catalog)
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Product to evaluate (defaults to the first product with applicable criteria)
    #[arg(long)]
    pub(crate) product_id: Option<u64>,
    /// Account id of the demo tester
    #[arg(long, default_value_t = 1)]
    pub(crate) tester_id: u64,
    /// Score applied to every criterion
    #[arg(long, default_value_t = 0.8)]
    pub(crate) score: f64,
}

pub(crate) fn run_demo(mut args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    if args.seed.is_none() {
        args.seed = config.catalog.seed_path;
    }

    run_demo_with(args, config.evaluation)?;
    Ok(())
}

/// Run the narrated walkthrough; returns the receipt of the first submission when it was stored.
pub(crate) fn run_demo_with(
    args: DemoArgs,
    evaluation: EvaluationConfig,
) -> Result<Option<EvaluationReceipt>, AppError> {
    let DemoArgs {
        seed,
        product_id,
        tester_id,
        score,
    } = args;

    let seed = load_catalog_seed(seed.as_ref())?;
    let mut product_ids: Vec<ProductId> = seed.products.iter().map(|product| product.id).collect();
    product_ids.sort();

    let service = EvaluationSubmissionService::new(
        Arc::new(InMemoryCatalog::from_seed(seed)),
        Arc::new(InMemoryEvaluationStore::default()),
        evaluation,
    );
    let caller = CallerIdentity {
        user_id: UserId(tester_id),
        role: UserRole::Tester,
    };

    println!("Product review demo");
    let Some((product_id, criteria)) = pick_product(&service, product_id, &product_ids) else {
        println!("  No product with applicable criteria found in the catalog");
        return Ok(None);
    };

    println!("  Product {product_id}: {} applicable criteria", criteria.len());
    for criteria in &criteria {
        println!(
            "    - [{}] {} (coefficient {})",
            criteria.id, criteria.name, criteria.coefficient
        );
    }

    let submission = RawEvaluationSubmission {
        product_id: Some(product_id),
        criterias: Some(json!(criteria
            .iter()
            .map(|criteria| json!({"criteriaId": criteria.id, "value": score}))
            .collect::<Vec<_>>())),
        comment: Some("Submitted from the command line demo".to_string()),
    };

    let receipt = match service.submit(&caller, submission.clone()) {
        Ok(receipt) => {
            println!(
                "\n  Evaluation {} stored with average {:.2}",
                receipt.evaluation_id, receipt.average
            );
            receipt
        }
        Err(err) => {
            println!("\n  Submission rejected: {}", err);
            return Ok(None);
        }
    };

    match service.submit(&caller, submission) {
        Ok(_) => println!("  Second submission unexpectedly accepted"),
        Err(err) => println!("  Second submission rejected: {}", err),
    }

    match service.evaluations_for(product_id) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            match serde_json::to_string_pretty(&views) {
                Ok(json) => println!("\n  Stored evaluations:\n{}", json),
                Err(err) => println!("\n  Stored evaluations unavailable: {}", err),
            }
        }
        Err(err) => println!("\n  Stored evaluations unavailable: {}", err),
    }

    Ok(Some(receipt))
}

fn pick_product<C, S>(
    service: &EvaluationSubmissionService<C, S>,
    requested: Option<u64>,
    product_ids: &[ProductId],
) -> Option<(ProductId, Vec<Criteria>)>
where
    C: CatalogRepository + 'static,
    S: EvaluationStore + 'static,
{
    let candidates: Vec<ProductId> = match requested {
        Some(id) => vec![ProductId(id)],
        None => product_ids.to_vec(),
    };

    candidates.into_iter().find_map(|product_id| {
        service
            .applicable_criteria(product_id)
            .ok()
            .filter(|criteria| !criteria.is_empty())
            .map(|criteria| (product_id, criteria))
    })
}
