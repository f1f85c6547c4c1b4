use crate::cli::ServeArgs;
use crate::infra::{demo_catalog_seed, AppState, InMemoryCatalog, InMemoryEvaluationStore};
use crate::routes::with_evaluation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use product_review::catalog::CatalogSeed;
use product_review::config::AppConfig;
use product_review::error::AppError;
use product_review::evaluations::EvaluationSubmissionService;
use product_review::telemetry;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(seed) = args.seed.take() {
        config.catalog.seed_path = Some(seed);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(InMemoryCatalog::from_seed(load_catalog_seed(
        config.catalog.seed_path.as_ref(),
    )?));
    let evaluations = Arc::new(InMemoryEvaluationStore::default());
    let evaluation_service = Arc::new(EvaluationSubmissionService::new(
        catalog,
        evaluations,
        config.evaluation.clone(),
    ));

    let app = with_evaluation_routes(evaluation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "product review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Load the configured catalog snapshot, falling back to the built-in demo catalog.
pub(crate) fn load_catalog_seed(path: Option<&PathBuf>) -> Result<CatalogSeed, AppError> {
    match path {
        Some(path) => {
            let seed = CatalogSeed::from_path(path)?;
            info!(
                path = %path.display(),
                products = seed.products.len(),
                categories = seed.categories.len(),
                criterias = seed.criterias.len(),
                "catalog seed loaded"
            );
            Ok(seed)
        }
        None => {
            info!("no catalog seed configured, using the demo catalog");
            Ok(demo_catalog_seed())
        }
    }
}
