//! Idempotent `Articles` schema bootstrap
//!
//! For every target connection:
//! 1. check the metadata view for the table
//! 2. create it when absent
//! 3. count rows
//! 4. insert the two seed articles when empty
//!
//! Each target gets its own connection, released whether or not the steps
//! succeed. A failing target is recorded in the [`BootstrapReport`] and the
//! remaining targets still run.

mod sql_server;
mod sqlite;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::{Backend, BootstrapMode, Config};
use crate::db::describe_target;
use crate::error::{Error, Result};
use crate::schema::{TableSchema, ARTICLES};

pub use sql_server::{SqlServerConnector, SqlServerSession, SqlServerTableBuilder, SQL_SERVER_SEEDS};
pub use sqlite::{SqliteConnector, SqliteSession, SqliteTableBuilder, SQLITE_SEEDS};

/// A default article inserted into an empty table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedArticle {
    pub title: &'static str,
    pub content: &'static str,
    pub is_pinned: bool,
    pub created_by: &'static str,
}

/// What the bootstrap changed on one target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStatus {
    pub created: bool,
    pub seeded_rows: u64,
}

impl TableStatus {
    pub fn is_noop(&self) -> bool {
        !self.created && self.seeded_rows == 0
    }
}

/// Schema operations on one open connection
#[async_trait]
pub trait SchemaSession: Send + Sized {
    async fn table_exists(&mut self, table: &TableSchema) -> Result<bool>;

    async fn create_table(&mut self, table: &TableSchema) -> Result<()>;

    async fn row_count(&mut self, table: &TableSchema) -> Result<i64>;

    /// Insert the seed articles in a single statement, returning rows inserted
    async fn insert_seed_rows(&mut self, seeds: &[SeedArticle]) -> Result<u64>;

    async fn close(self) -> Result<()>;
}

/// Opens schema sessions for connection strings
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: SchemaSession;

    async fn connect(&self, connection_string: &str) -> Result<Self::Session>;
}

/// Source of tenant connection strings, read from the master database
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn tenant_connection_strings(&self, master_connection_string: &str) -> Result<Vec<String>>;
}

/// Result of bootstrapping one target
#[derive(Debug)]
pub struct BootstrapOutcome {
    /// Credential-free description of the target
    pub target: String,
    pub result: Result<TableStatus>,
}

impl BootstrapOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-target outcomes of a bootstrap run, in the order targets were processed
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub outcomes: Vec<BootstrapOutcome>,
}

impl BootstrapReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &BootstrapOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BootstrapOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(BootstrapOutcome::is_success)
    }
}

impl From<BootstrapOutcome> for BootstrapReport {
    fn from(outcome: BootstrapOutcome) -> Self {
        Self {
            outcomes: vec![outcome],
        }
    }
}

/// Create the `Articles` table if missing and seed it if empty.
pub async fn ensure_articles_table<S: SchemaSession>(
    session: &mut S,
    seeds: &[SeedArticle],
) -> Result<TableStatus> {
    let mut status = TableStatus::default();

    if !session.table_exists(&ARTICLES).await? {
        session.create_table(&ARTICLES).await?;
        status.created = true;
        info!("{} table created.", ARTICLES.name);
    }

    if session.row_count(&ARTICLES).await? == 0 {
        status.seeded_rows = session.insert_seed_rows(seeds).await?;
        info!("Inserted default articles: {} rows.", status.seeded_rows);
    }

    Ok(status)
}

/// Bootstrap one target over a connection that is opened and closed here.
pub async fn bootstrap_target<C: Connector>(
    connector: &C,
    connection_string: &str,
    seeds: &[SeedArticle],
) -> Result<TableStatus> {
    let mut session = connector.connect(connection_string).await?;
    let result = ensure_articles_table(&mut session, seeds).await;

    if let Err(e) = session.close().await {
        warn!(
            "Closing connection to {} failed: {}",
            describe_target(connection_string),
            e
        );
    }

    result
}

/// Bootstrap each target in turn, recording failures without stopping.
pub async fn bootstrap_each<C: Connector>(
    connector: &C,
    connection_strings: &[String],
    seeds: &[SeedArticle],
) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    for connection_string in connection_strings {
        let target = describe_target(connection_string);
        let result = bootstrap_target(connector, connection_string, seeds).await;

        match &result {
            Ok(_) => info!("Articles table processed (tenant DB): {}", target),
            Err(e) => error!("[{}] Error processing tenant DB: {}", target, e),
        }

        report.outcomes.push(BootstrapOutcome { target, result });
    }

    report
}

/// Startup entry point: resolve the connection string and bootstrap the
/// configured backend.
///
/// Only an unresolvable connection string is returned as an error; every
/// store failure is logged and kept in the report.
pub async fn run(config: &Config, connection_string: Option<&str>) -> Result<BootstrapReport> {
    let connection_string = config.database.resolve_connection_string(connection_string)?;

    let report: BootstrapReport = match (config.database.backend, config.bootstrap.mode) {
        (Backend::Sqlite, mode) => {
            if mode == BootstrapMode::Tenants {
                warn!("Tenant bootstrap is not supported for SQLite; bootstrapping the single target");
            }
            SqliteTableBuilder::new(connection_string).build_database().await.into()
        }
        (Backend::SqlServer, BootstrapMode::Master) => SqlServerTableBuilder::new(connection_string)
            .build_master_database()
            .await
            .into(),
        (Backend::SqlServer, BootstrapMode::Tenants) => {
            SqlServerTableBuilder::new(connection_string)
                .build_tenant_databases()
                .await
        }
    };

    let failed = report.failed().count();
    if failed > 0 {
        warn!(
            "Articles bootstrap finished with {} of {} targets failing",
            failed,
            report.outcomes.len()
        );
    }

    Ok(report)
}

/// Wrap a per-target result into an outcome, logging it the way the
/// single-target builders do.
fn single_outcome(connection_string: &str, label: &str, result: Result<TableStatus>) -> BootstrapOutcome {
    match &result {
        Ok(_) => info!("Articles table processed ({})", label),
        Err(e) => error!("Error processing {}: {}", label, e),
    }
    BootstrapOutcome {
        target: describe_target(connection_string),
        result,
    }
}

fn directory_failure(master_connection_string: &str, e: Error) -> BootstrapReport {
    error!(
        "Reading tenant connection strings from {} failed: {}",
        describe_target(master_connection_string),
        e
    );
    BootstrapOutcome {
        target: describe_target(master_connection_string),
        result: Err(e),
    }
    .into()
}
