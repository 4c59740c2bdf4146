#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use article_board::config::Config;
use article_board::db::{connect_sqlite_pool, SqliteArticleRepository};
use article_board::schema::{Dialect, ARTICLES};
use tempfile::TempDir;

/// Configuration with only the given variables set.
pub fn config_with(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
}

pub fn sqlite_connection_string(dir: &TempDir) -> String {
    db_path_string(&dir.path().join("board.db"))
}

pub fn db_path_string(path: &Path) -> String {
    format!("Data Source={}", path.display())
}

/// Repository over a fresh database with an empty, unseeded `Articles` table.
pub async fn empty_repository() -> (TempDir, SqliteArticleRepository) {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository_at(&sqlite_connection_string(&dir)).await;

    sqlx::query(&ARTICLES.create_table_sql(Dialect::Sqlite))
        .execute(repo.pool())
        .await
        .unwrap();

    (dir, repo)
}

pub async fn repository_at(connection_string: &str) -> SqliteArticleRepository {
    let config = config_with(&[]);
    let pool = connect_sqlite_pool(&config.database, connection_string)
        .await
        .unwrap();
    SqliteArticleRepository::new(pool)
}
