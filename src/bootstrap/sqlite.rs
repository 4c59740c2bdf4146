use async_trait::async_trait;
use sqlx::{Connection, SqliteConnection};

use super::{bootstrap_target, single_outcome, BootstrapOutcome, Connector, SchemaSession, SeedArticle};
use crate::db::connection::sqlite_connect_options;
use crate::error::Result;
use crate::schema::{Dialect, TableSchema};

pub const SQLITE_SEEDS: [SeedArticle; 2] = [
    SeedArticle {
        title: "Welcome to the Board",
        content: "This is the first announcement.",
        is_pinned: true,
        created_by: "admin",
    },
    SeedArticle {
        title: "Sample Post",
        content: "Feel free to write articles here.",
        is_pinned: false,
        created_by: "user1",
    },
];

/// Opens plain (unpooled) SQLite connections
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

pub struct SqliteSession {
    conn: SqliteConnection,
}

impl SqliteSession {
    pub fn new(conn: SqliteConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Session = SqliteSession;

    async fn connect(&self, connection_string: &str) -> Result<SqliteSession> {
        let options = sqlite_connect_options(connection_string)?;
        let conn = SqliteConnection::connect_with(&options).await?;
        Ok(SqliteSession::new(conn))
    }
}

#[async_trait]
impl SchemaSession for SqliteSession {
    async fn table_exists(&mut self, table: &TableSchema) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(&table.exists_sql(Dialect::Sqlite))
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn create_table(&mut self, table: &TableSchema) -> Result<()> {
        sqlx::query(&table.create_table_sql(Dialect::Sqlite))
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn row_count(&mut self, table: &TableSchema) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(&table.count_sql(Dialect::Sqlite))
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count)
    }

    async fn insert_seed_rows(&mut self, seeds: &[SeedArticle]) -> Result<u64> {
        if seeds.is_empty() {
            return Ok(0);
        }

        let values = vec!["(?, ?, ?, ?)"; seeds.len()].join(", ");
        let sql = format!(
            "INSERT INTO Articles (Title, Content, IsPinned, CreatedBy) VALUES {}",
            values
        );

        let mut query = sqlx::query(&sql);
        for seed in seeds {
            query = query
                .bind(seed.title)
                .bind(seed.content)
                .bind(seed.is_pinned)
                .bind(seed.created_by);
        }

        Ok(query.execute(&mut self.conn).await?.rows_affected())
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Bootstraps the `Articles` table of a single SQLite database
pub struct SqliteTableBuilder {
    connection_string: String,
}

impl SqliteTableBuilder {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    pub async fn build_database(&self) -> BootstrapOutcome {
        let result = bootstrap_target(&SqliteConnector, &self.connection_string, &SQLITE_SEEDS).await;
        single_outcome(&self.connection_string, "SQLite DB", result)
    }
}
