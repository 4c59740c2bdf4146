mod common;

use article_board::bootstrap::{self, SqliteTableBuilder, TableStatus};
use article_board::db::ArticleRepository;
use article_board::models::Article;
use article_board::schema::{Dialect, ARTICLES};

use common::{config_with, repository_at, sqlite_connection_string};

#[tokio::test]
async fn fresh_database_is_created_and_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let connection = sqlite_connection_string(&dir);

    let outcome = SqliteTableBuilder::new(connection.as_str()).build_database().await;
    let status = outcome.result.unwrap();
    assert_eq!(status, TableStatus { created: true, seeded_rows: 2 });
    assert_eq!(outcome.target, dir.path().join("board.db").display().to_string());

    let repo = repository_at(&connection).await;
    let articles = repo.get_articles().await.unwrap();
    assert_eq!(articles.len(), 2);

    let sample = &articles[0];
    let welcome = &articles[1];
    assert_eq!(welcome.id, 1);
    assert_eq!(welcome.title, "Welcome to the Board");
    assert!(welcome.is_pinned);
    assert_eq!(welcome.audit.created_by.as_deref(), Some("admin"));
    assert!(welcome.audit.created.is_some());

    assert_eq!(sample.title, "Sample Post");
    assert!(!sample.is_pinned);
    assert_eq!(sample.audit.created_by.as_deref(), Some("user1"));
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let connection = sqlite_connection_string(&dir);
    let builder = SqliteTableBuilder::new(connection.as_str());

    builder.build_database().await.result.unwrap();
    let status = builder.build_database().await.result.unwrap();
    assert!(status.is_noop());

    let repo = repository_at(&connection).await;
    assert_eq!(repo.get_articles().await.unwrap().len(), 2);
}

#[tokio::test]
async fn populated_table_is_not_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let connection = sqlite_connection_string(&dir);

    let repo = repository_at(&connection).await;
    sqlx::query(&ARTICLES.create_table_sql(Dialect::Sqlite))
        .execute(repo.pool())
        .await
        .unwrap();
    repo.add_article(Article::new("Existing", "post")).await.unwrap();

    let status = SqliteTableBuilder::new(connection.as_str())
        .build_database()
        .await
        .result
        .unwrap();
    assert!(status.is_noop());

    let articles = repo.get_articles().await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Existing");
}

#[tokio::test]
async fn emptied_table_is_seeded_again() {
    let dir = tempfile::tempdir().unwrap();
    let connection = sqlite_connection_string(&dir);
    let builder = SqliteTableBuilder::new(connection.as_str());
    builder.build_database().await.result.unwrap();

    let repo = repository_at(&connection).await;
    for article in repo.get_articles().await.unwrap() {
        repo.delete_article(article.id).await.unwrap();
    }

    let status = builder.build_database().await.result.unwrap();
    assert_eq!(status, TableStatus { created: false, seeded_rows: 2 });

    // AUTOINCREMENT never reuses ids
    let ids: Vec<i32> = repo.get_articles().await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![4, 3]);
}

#[tokio::test]
async fn unreachable_target_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-dir").join("board.db");
    let connection = common::db_path_string(&missing);

    let outcome = SqliteTableBuilder::new(connection).build_database().await;
    assert!(!outcome.is_success());
    assert!(outcome.result.unwrap_err().is_store_error());
}

#[tokio::test]
async fn run_resolves_explicit_over_configured_connection() {
    let configured = tempfile::tempdir().unwrap();
    let explicit = tempfile::tempdir().unwrap();
    let configured_connection = sqlite_connection_string(&configured);
    let explicit_connection = sqlite_connection_string(&explicit);

    let config = config_with(&[("DEFAULT_CONNECTION", configured_connection.as_str())]);
    let report = bootstrap::run(&config, Some(explicit_connection.as_str()))
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(explicit.path().join("board.db").exists());
    assert!(!configured.path().join("board.db").exists());
}

#[tokio::test]
async fn tenant_mode_on_sqlite_bootstraps_the_single_target() {
    let dir = tempfile::tempdir().unwrap();
    let connection = sqlite_connection_string(&dir);
    let config = config_with(&[
        ("BOOTSTRAP_MODE", "tenants"),
        ("DEFAULT_CONNECTION", connection.as_str()),
    ]);

    let report = bootstrap::run(&config, None).await.unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.is_success());
}

#[tokio::test]
async fn run_without_connection_fails_loudly() {
    let config = config_with(&[]);
    let err = bootstrap::run(&config, None).await.unwrap_err();
    assert!(!err.is_store_error());
}

#[tokio::test]
async fn in_memory_target_is_reported_as_config_error() {
    let config = config_with(&[("DEFAULT_CONNECTION", "Data Source=:memory:")]);

    let report = bootstrap::run(&config, None).await.unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert!(!report.is_success());

    let outcome = &report.outcomes[0];
    assert!(matches!(outcome.result, Err(article_board::Error::Config(_))));
}
