use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{page_offset, ArticleRepository};
use crate::error::Result;
use crate::models::{Article, ArticleRow, PagingResult};

/// Article repository backed by a SQLite pool
#[derive(Clone)]
pub struct SqliteArticleRepository {
    pool: SqlitePool,
}

impl SqliteArticleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ArticleRepository for SqliteArticleRepository {
    async fn add_article(&self, model: Article) -> Result<Article> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO Articles (Title, Content, IsPinned, CreatedBy, Created, ModifiedBy, Modified)
            VALUES (?1, ?2, ?3, ?4, COALESCE(?5, CURRENT_TIMESTAMP), ?6, ?7)
            RETURNING Id, Title, Content, IsPinned, CreatedBy, Created, ModifiedBy, Modified
            "#,
        )
        .bind(&model.title)
        .bind(&model.content)
        .bind(model.is_pinned)
        .bind(&model.audit.created_by)
        .bind(model.audit.created)
        .bind(&model.audit.modified_by)
        .bind(model.audit.modified)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT Id, Title, Content, IsPinned, CreatedBy, Created, ModifiedBy, Modified
            FROM Articles
            ORDER BY Id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn get_article_by_id(&self, id: i32) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT Id, Title, Content, IsPinned, CreatedBy, Created, ModifiedBy, Modified
            FROM Articles
            WHERE Id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Article::from))
    }

    async fn edit_article(&self, model: Article) -> Result<Article> {
        let result = sqlx::query(
            r#"
            UPDATE Articles
            SET Title = ?1, Content = ?2, IsPinned = ?3, CreatedBy = ?4, ModifiedBy = ?5, Modified = ?6
            WHERE Id = ?7
            "#,
        )
        .bind(&model.title)
        .bind(&model.content)
        .bind(model.is_pinned)
        .bind(&model.audit.created_by)
        .bind(&model.audit.modified_by)
        .bind(model.audit.modified)
        .bind(model.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("Edit of article {} matched no rows", model.id);
        }

        Ok(model)
    }

    async fn delete_article(&self, id: i32) -> Result<()> {
        if self.get_article_by_id(id).await?.is_some() {
            sqlx::query("DELETE FROM Articles WHERE Id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn get_all(&self, page_index: u32, page_size: u32) -> Result<PagingResult<Article>> {
        let (total_records,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Articles")
            .fetch_one(&self.pool)
            .await?;

        if page_size == 0 {
            return Ok(PagingResult::new(vec![], total_records));
        }

        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT Id, Title, Content, IsPinned, CreatedBy, Created, ModifiedBy, Modified
            FROM Articles
            ORDER BY Id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(i64::from(page_size))
        .bind(page_offset(page_index, page_size))
        .fetch_all(&self.pool)
        .await?;

        Ok(PagingResult::new(
            rows.into_iter().map(Article::from).collect(),
            total_records,
        ))
    }
}
