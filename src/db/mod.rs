pub mod connection;
mod sql_server;
mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Article, PagingResult};

pub use connection::{connect_sqlite_pool, describe_target, TdsClient};
pub use sql_server::SqlServerArticleRepository;
pub use sqlite::SqliteArticleRepository;

/// Storage operations for board articles.
///
/// Every call is self-contained: no state is carried between calls and no
/// transaction spans more than one statement. Store failures surface as the
/// driver's own error.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article; the store assigns `id` and, when unset, `created`
    async fn add_article(&self, model: Article) -> Result<Article>;

    /// All articles, newest first
    async fn get_articles(&self) -> Result<Vec<Article>>;

    async fn get_article_by_id(&self, id: i32) -> Result<Option<Article>>;

    /// Overwrite every column of the row with `model.id` except `Created`.
    /// Last write wins; the model is echoed back.
    async fn edit_article(&self, model: Article) -> Result<Article>;

    /// Delete by id. Deleting a missing id is not an error.
    async fn delete_article(&self, id: i32) -> Result<()>;

    /// Zero-based page of articles, newest first, with the total row count
    async fn get_all(&self, page_index: u32, page_size: u32) -> Result<PagingResult<Article>>;
}

/// Row offset of a zero-based page. Saturates, so a window past the end stays past the end.
pub(crate) fn page_offset(page_index: u32, page_size: u32) -> i64 {
    i64::from(page_index).saturating_mul(i64::from(page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(3, 10), 30);
        assert_eq!(page_offset(u32::MAX, 1), i64::from(u32::MAX));
        assert_eq!(page_offset(u32::MAX, u32::MAX), i64::MAX);
    }
}
