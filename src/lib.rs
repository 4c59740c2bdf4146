pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;

use std::sync::Arc;

use crate::config::{Backend, Config};
use crate::db::{connect_sqlite_pool, ArticleRepository, SqlServerArticleRepository, SqliteArticleRepository};

pub use crate::error::{Error, Result};

/// Open the article repository for the configured backend.
///
/// `connection_string` overrides the configured default connection.
pub async fn open_repository(
    config: &Config,
    connection_string: Option<&str>,
) -> Result<Arc<dyn ArticleRepository>> {
    let connection_string = config.database.resolve_connection_string(connection_string)?;

    match config.database.backend {
        Backend::Sqlite => {
            let pool = connect_sqlite_pool(&config.database, &connection_string).await?;
            Ok(Arc::new(SqliteArticleRepository::new(pool)))
        }
        Backend::SqlServer => Ok(Arc::new(SqlServerArticleRepository::new(&connection_string)?)),
    }
}
