use async_trait::async_trait;
use tiberius::Row;

use super::connection::{connect_tds, count_from_row, sql_server_config, TdsClient};
use super::{page_offset, ArticleRepository};
use crate::error::{Error, Result};
use crate::models::{Article, ArticleRow, PagingResult};

const SELECT_ARTICLES: &str = "SELECT Id, Title, Content, IsPinned, CreatedBy, Created, ModifiedBy, Modified FROM [dbo].[Articles]";

/// Article repository for SQL Server.
///
/// Holds only the parsed connection settings; each call opens its own TDS
/// connection and closes it before returning.
#[derive(Clone)]
pub struct SqlServerArticleRepository {
    config: tiberius::Config,
}

impl SqlServerArticleRepository {
    pub fn new(connection_string: &str) -> Result<Self> {
        Ok(Self {
            config: sql_server_config(connection_string)?,
        })
    }

    async fn connect(&self) -> Result<TdsClient> {
        connect_tds(&self.config).await
    }
}

fn article_from_row(row: &Row) -> Result<Article> {
    let row = ArticleRow {
        id: row.try_get::<i32, _>("Id")?.unwrap_or_default(),
        title: row.try_get::<&str, _>("Title")?.unwrap_or_default().to_string(),
        content: row.try_get::<&str, _>("Content")?.map(str::to_string),
        is_pinned: row.try_get::<bool, _>("IsPinned")?,
        created_by: row.try_get::<&str, _>("CreatedBy")?.map(str::to_string),
        created: row.try_get("Created")?,
        modified_by: row.try_get::<&str, _>("ModifiedBy")?.map(str::to_string),
        modified: row.try_get("Modified")?,
    };
    Ok(row.into())
}

fn articles_from_rows(rows: Vec<Row>) -> Result<Vec<Article>> {
    rows.iter().map(article_from_row).collect()
}

async fn fetch_by_id(client: &mut TdsClient, id: i32) -> Result<Option<Article>> {
    let sql = format!("{} WHERE Id = @P1", SELECT_ARTICLES);
    let row = client.query(sql, &[&id]).await?.into_row().await?;
    row.as_ref().map(article_from_row).transpose()
}

#[async_trait]
impl ArticleRepository for SqlServerArticleRepository {
    async fn add_article(&self, model: Article) -> Result<Article> {
        let mut client = self.connect().await?;

        let row = client
            .query(
                r#"
                INSERT INTO [dbo].[Articles] (Title, Content, IsPinned, CreatedBy, Created, ModifiedBy, Modified)
                OUTPUT INSERTED.Id, INSERTED.Title, INSERTED.Content, INSERTED.IsPinned,
                       INSERTED.CreatedBy, INSERTED.Created, INSERTED.ModifiedBy, INSERTED.Modified
                VALUES (@P1, @P2, @P3, @P4, COALESCE(@P5, GETUTCDATE()), @P6, @P7)
                "#,
                &[
                    &model.title,
                    &model.content,
                    &model.is_pinned,
                    &model.audit.created_by,
                    &model.audit.created,
                    &model.audit.modified_by,
                    &model.audit.modified,
                ],
            )
            .await?
            .into_row()
            .await?
            .ok_or_else(|| {
                Error::SqlServer(tiberius::error::Error::Protocol(
                    "INSERT returned no row".into(),
                ))
            })?;

        let article = article_from_row(&row)?;
        client.close().await?;
        Ok(article)
    }

    async fn get_articles(&self) -> Result<Vec<Article>> {
        let mut client = self.connect().await?;

        let sql = format!("{} ORDER BY Id DESC", SELECT_ARTICLES);
        let rows = client.simple_query(sql).await?.into_first_result().await?;

        client.close().await?;
        articles_from_rows(rows)
    }

    async fn get_article_by_id(&self, id: i32) -> Result<Option<Article>> {
        let mut client = self.connect().await?;
        let article = fetch_by_id(&mut client, id).await?;
        client.close().await?;
        Ok(article)
    }

    async fn edit_article(&self, model: Article) -> Result<Article> {
        let mut client = self.connect().await?;

        let result = client
            .execute(
                r#"
                UPDATE [dbo].[Articles]
                SET Title = @P1, Content = @P2, IsPinned = @P3, CreatedBy = @P4,
                    ModifiedBy = @P5, Modified = @P6
                WHERE Id = @P7
                "#,
                &[
                    &model.title,
                    &model.content,
                    &model.is_pinned,
                    &model.audit.created_by,
                    &model.audit.modified_by,
                    &model.audit.modified,
                    &model.id,
                ],
            )
            .await?;

        if result.total() == 0 {
            tracing::warn!("Edit of article {} matched no rows", model.id);
        }

        client.close().await?;
        Ok(model)
    }

    async fn delete_article(&self, id: i32) -> Result<()> {
        let mut client = self.connect().await?;

        if fetch_by_id(&mut client, id).await?.is_some() {
            client
                .execute("DELETE FROM [dbo].[Articles] WHERE Id = @P1", &[&id])
                .await?;
        }

        client.close().await?;
        Ok(())
    }

    async fn get_all(&self, page_index: u32, page_size: u32) -> Result<PagingResult<Article>> {
        let mut client = self.connect().await?;

        let total = client
            .simple_query("SELECT COUNT_BIG(*) FROM [dbo].[Articles]")
            .await?
            .into_row()
            .await?;
        let total_records = count_from_row(total)?;

        // FETCH NEXT 0 ROWS is rejected by SQL Server
        if page_size == 0 {
            client.close().await?;
            return Ok(PagingResult::new(vec![], total_records));
        }

        let sql = format!(
            "{} ORDER BY Id DESC OFFSET @P1 ROWS FETCH NEXT @P2 ROWS ONLY",
            SELECT_ARTICLES
        );
        let offset = page_offset(page_index, page_size);
        let size = i64::from(page_size);
        let rows = client
            .query(sql, &[&offset, &size])
            .await?
            .into_first_result()
            .await?;

        client.close().await?;
        Ok(PagingResult::new(articles_from_rows(rows)?, total_records))
    }
}
