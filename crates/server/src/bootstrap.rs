use std::sync::Arc;

use axum::Router;
use salespoint_catalog::HttpProductCatalog;
use salespoint_core::config::{AppConfig, ConfigError, LoadOptions};
use salespoint_db::repositories::{
    SqlCampaignRepository, SqlInventoryOpRepository, SqlProductRepository, SqlSaleRepository,
    SqlSoldLineRepository,
};
use salespoint_db::{connect_from, migrations, DbPool};
use salespoint_sales::{CampaignService, InventoryReconciler, SaleTotalsService, SoldLineService};
use thiserror::Error;
use tracing::info;

use crate::{catalog_api, health};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub campaigns: Arc<CampaignService>,
    pub ledger: Arc<SoldLineService>,
    products: Arc<SqlProductRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("catalog client setup failed: {0}")]
    Catalog(salespoint_catalog::CatalogError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool =
        connect_from(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(url = %config.database.url, "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!("database migrations applied");

    let campaigns_repo = Arc::new(SqlCampaignRepository::new(db_pool.clone()));
    let sales_repo = Arc::new(SqlSaleRepository::new(db_pool.clone()));
    let lines_repo = Arc::new(SqlSoldLineRepository::new(db_pool.clone()));
    let ops_repo = Arc::new(SqlInventoryOpRepository::new(db_pool.clone()));
    let products = Arc::new(SqlProductRepository::new(db_pool.clone()));

    let catalog =
        Arc::new(HttpProductCatalog::new(&config.catalog).map_err(BootstrapError::Catalog)?);
    info!(base_url = %config.catalog.base_url, "catalog client configured");

    let campaigns = Arc::new(CampaignService::new(campaigns_repo));
    let reconciler = Arc::new(InventoryReconciler::new(Arc::clone(&catalog) as _, ops_repo));
    let totals = Arc::new(SaleTotalsService::new(
        Arc::clone(&sales_repo) as _,
        Arc::clone(&lines_repo) as _,
    ));
    let ledger = Arc::new(SoldLineService::new(
        sales_repo,
        lines_repo,
        catalog,
        Arc::clone(&campaigns),
        reconciler,
        totals,
    ));

    Ok(Application { config, db_pool, campaigns, ledger, products })
}

impl Application {
    /// Health endpoint plus the catalog-side product routes, one router.
    pub fn router(&self) -> Router {
        health::router(self.db_pool.clone())
            .merge(catalog_api::router(Arc::clone(&self.products) as _))
    }
}
