use actix_web::{App, HttpServer, middleware::Logger};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoicable::{
  adapters::http::{BillRouteDependencies, configure_bill_routes},
  domain::bill::{BillRepository, BillService, BillServiceDependencies, InvoiceLineRepository},
  infrastructure::{
    config::{Config, DatabaseConfig},
    pdf::WkHtmlToPdfGenerator,
    persistence::{InMemoryBillStore, PostgresBillRepository, PostgresInvoiceLineRepository},
    reference::RandomReferenceGenerator,
    rendering::TeraBillRenderer,
  },
};

type Repositories = (Arc<dyn BillRepository>, Arc<dyn InvoiceLineRepository>);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "invoicable=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting invoicable");

  let config = Config::load().context("Failed to load configuration")?;
  tracing::info!("Configuration loaded successfully");

  let (bill_repo, line_repo) = match &config.database {
    Some(database) => postgres_repositories(database).await?,
    None => {
      tracing::warn!("No [database] configured, bills are kept in memory");
      let store = Arc::new(InMemoryBillStore::new());
      (store.clone() as Arc<dyn BillRepository>, store as Arc<dyn InvoiceLineRepository>)
    }
  };

  let renderer = TeraBillRenderer::new(config.bill.templates_dir.as_deref().map(Path::new))
    .context("Failed to load bill templates")?;
  let default_currency = config
    .bill
    .currency()
    .context("Invalid bill.default_currency")?;

  let bill_service = Arc::new(BillService::new(BillServiceDependencies {
    bill_repo,
    line_repo,
    renderer: Arc::new(renderer),
    pdf_generator: Arc::new(WkHtmlToPdfGenerator::new(
      config.pdf.wkhtmltopdf_path.clone(),
      Some(config.pdf.page_size.clone()),
    )),
    reference_generator: Arc::new(RandomReferenceGenerator::new()),
    default_currency,
  }));
  let routes = BillRouteDependencies::from_service(bill_service);

  let server_host = config.server.host.clone();
  let server_port = config.server.port;
  tracing::info!("Starting HTTP server on {}:{}", server_host, server_port);

  HttpServer::new(move || {
    let routes = routes.clone();
    App::new()
      .wrap(Logger::default())
      .configure(|cfg| configure_bill_routes(cfg, routes))
  })
  .bind((server_host.as_str(), server_port))
  .with_context(|| format!("Failed to bind {}:{}", server_host, server_port))?
  .run()
  .await?;

  Ok(())
}

async fn postgres_repositories(database: &DatabaseConfig) -> anyhow::Result<Repositories> {
  tracing::info!("Connecting to database");

  let pool = tokio::time::timeout(
    Duration::from_secs(database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(database.max_connections)
      .acquire_timeout(Duration::from_secs(database.acquire_timeout_seconds))
      .connect(&database.url),
  )
  .await
  .map_err(|_| {
    anyhow::anyhow!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      database.connect_timeout_seconds
    )
  })?
  .context("Failed to connect to database")?;
  tracing::info!("Database connection pool created");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .context("Failed to run database migrations")?;
  tracing::info!("Database migrations completed");

  Ok((
    Arc::new(PostgresBillRepository::new(pool.clone())),
    Arc::new(PostgresInvoiceLineRepository::new(pool)),
  ))
}
