use async_trait::async_trait;
use tiberius::ToSql;
use tracing::info;

use super::{
    bootstrap_each, bootstrap_target, directory_failure, single_outcome, BootstrapOutcome,
    BootstrapReport, Connector, SchemaSession, SeedArticle, TenantDirectory,
};
use crate::db::connection::{connect_tds, count_from_row, sql_server_config, TdsClient};
use crate::error::Result;
use crate::schema::{Dialect, TableSchema};

pub const SQL_SERVER_SEEDS: [SeedArticle; 2] = [
    SeedArticle {
        title: "Welcome to the Board",
        content: "This is the first announcement.",
        is_pinned: true,
        created_by: "(System)",
    },
    SeedArticle {
        title: "Sample Post",
        content: "Feel free to write articles here.",
        is_pinned: false,
        created_by: "(System)",
    },
];

/// Opens TDS connections and reads the tenant directory
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerConnector;

pub struct SqlServerSession {
    client: TdsClient,
}

impl SqlServerSession {
    pub fn new(client: TdsClient) -> Self {
        Self { client }
    }

    async fn scalar(&mut self, sql: String) -> Result<i64> {
        let row = self.client.simple_query(sql).await?.into_row().await?;
        count_from_row(row)
    }
}

#[async_trait]
impl Connector for SqlServerConnector {
    type Session = SqlServerSession;

    async fn connect(&self, connection_string: &str) -> Result<SqlServerSession> {
        let config = sql_server_config(connection_string)?;
        Ok(SqlServerSession::new(connect_tds(&config).await?))
    }
}

#[async_trait]
impl TenantDirectory for SqlServerConnector {
    async fn tenant_connection_strings(&self, master_connection_string: &str) -> Result<Vec<String>> {
        let config = sql_server_config(master_connection_string)?;
        let mut client = connect_tds(&config).await?;

        let rows = client
            .simple_query("SELECT ConnectionString FROM dbo.Tenants")
            .await?
            .into_first_result()
            .await?;

        let mut tenants = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(connection_string) = row.try_get::<&str, _>("ConnectionString")? {
                if !connection_string.trim().is_empty() {
                    tenants.push(connection_string.to_string());
                }
            }
        }

        client.close().await?;
        Ok(tenants)
    }
}

#[async_trait]
impl SchemaSession for SqlServerSession {
    async fn table_exists(&mut self, table: &TableSchema) -> Result<bool> {
        Ok(self.scalar(table.exists_sql(Dialect::SqlServer)).await? > 0)
    }

    async fn create_table(&mut self, table: &TableSchema) -> Result<()> {
        self.client
            .simple_query(table.create_table_sql(Dialect::SqlServer))
            .await?
            .into_results()
            .await?;
        Ok(())
    }

    async fn row_count(&mut self, table: &TableSchema) -> Result<i64> {
        self.scalar(table.count_sql(Dialect::SqlServer)).await
    }

    async fn insert_seed_rows(&mut self, seeds: &[SeedArticle]) -> Result<u64> {
        if seeds.is_empty() {
            return Ok(0);
        }

        let values = (0..seeds.len())
            .map(|i| {
                let p = i * 4;
                format!("(@P{}, @P{}, @P{}, @P{})", p + 1, p + 2, p + 3, p + 4)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO [dbo].[Articles] (Title, Content, IsPinned, CreatedBy) VALUES {}",
            values
        );

        let params: Vec<&dyn ToSql> = seeds
            .iter()
            .flat_map(|seed| {
                [
                    &seed.title as &dyn ToSql,
                    &seed.content as &dyn ToSql,
                    &seed.is_pinned as &dyn ToSql,
                    &seed.created_by as &dyn ToSql,
                ]
            })
            .collect();

        let result = self.client.execute(sql, &params).await?;
        Ok(result.total())
    }

    async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Bootstraps the `Articles` table on a SQL Server master database and,
/// optionally, on every tenant database it lists.
pub struct SqlServerTableBuilder<C = SqlServerConnector> {
    master_connection_string: String,
    connector: C,
}

impl SqlServerTableBuilder {
    pub fn new(master_connection_string: impl Into<String>) -> Self {
        Self::with_connector(master_connection_string, SqlServerConnector)
    }
}

impl<C> SqlServerTableBuilder<C> {
    pub fn with_connector(master_connection_string: impl Into<String>, connector: C) -> Self {
        Self {
            master_connection_string: master_connection_string.into(),
            connector,
        }
    }
}

impl<C: Connector> SqlServerTableBuilder<C> {
    pub async fn build_master_database(&self) -> BootstrapOutcome {
        let result = bootstrap_target(
            &self.connector,
            &self.master_connection_string,
            &SQL_SERVER_SEEDS,
        )
        .await;
        single_outcome(&self.master_connection_string, "master DB", result)
    }
}

impl<C: Connector + TenantDirectory> SqlServerTableBuilder<C> {
    /// Bootstrap every tenant listed in the master's `dbo.Tenants`, one at a time.
    pub async fn build_tenant_databases(&self) -> BootstrapReport {
        let tenants = match self
            .connector
            .tenant_connection_strings(&self.master_connection_string)
            .await
        {
            Ok(tenants) => tenants,
            Err(e) => return directory_failure(&self.master_connection_string, e),
        };

        info!("Bootstrapping Articles table for {} tenant databases", tenants.len());
        bootstrap_each(&self.connector, &tenants, &SQL_SERVER_SEEDS).await
    }
}
