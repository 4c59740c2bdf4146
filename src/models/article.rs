use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Audit columns shared by every board entity. Timestamps are UTC on both backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: Option<String>,
    /// Filled by the store on insert when left unset
    pub created: Option<NaiveDateTime>,
    pub modified_by: Option<String>,
    pub modified: Option<NaiveDateTime>,
}

impl Audit {
    /// Stamp a modification by `by` at the current time.
    pub fn touch(&mut self, by: impl Into<String>) {
        self.modified_by = Some(by.into());
        self.modified = Some(now());
    }
}

/// A post on the board - one row of `Articles`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Article {
    /// Assigned by the store; 0 until persisted
    #[serde(default)]
    pub id: i32,
    #[validate(length(min = 1, max = 255, message = "Please enter a title."))]
    pub title: String,
    #[validate(length(min = 1, message = "Please enter the content."))]
    pub content: String,
    /// Pinned posts are shown as announcements
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Article {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }

    pub fn created_by(mut self, by: impl Into<String>) -> Self {
        self.audit.created_by = Some(by.into());
        self
    }
}

/// An `Articles` row as the store returns it
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "PascalCase")]
pub struct ArticleRow {
    pub id: i32,
    pub title: String,
    /// Nullable in both dialects
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
    pub created_by: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub modified_by: Option<String>,
    pub modified: Option<NaiveDateTime>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            title: row.title,
            content: row.content.unwrap_or_default(),
            is_pinned: row.is_pinned.unwrap_or(false),
            audit: Audit {
                created_by: row.created_by,
                created: row.created,
                modified_by: row.modified_by,
                modified: row.modified,
            },
        }
    }
}

// Stores keep at most millisecond precision; SQLite's CURRENT_TIMESTAMP keeps seconds.
fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_article_is_unpersisted_and_unpinned() {
        let article = Article::new("T1", "C1");
        assert_eq!(article.id, 0);
        assert!(!article.is_pinned);
        assert_eq!(article.audit, Audit::default());
    }

    #[test]
    fn test_builder_helpers() {
        let article = Article::new("Notice", "Read me").pinned().created_by("admin");
        assert!(article.is_pinned);
        assert_eq!(article.audit.created_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_validation_accepts_filled_article() {
        assert!(Article::new("Title", "Body").validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_title_and_content() {
        let errors = Article::new("", "").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("content"));

        let title_message = fields["title"][0].message.as_deref();
        assert_eq!(title_message, Some("Please enter a title."));
    }

    #[test]
    fn test_validation_rejects_long_title() {
        let article = Article::new("x".repeat(256), "Body");
        assert!(article.validate().is_err());

        // 255 characters is the limit, counted in chars not bytes
        let article = Article::new("가".repeat(255), "Body");
        assert!(article.validate().is_ok());
    }

    #[test]
    fn test_row_nulls_map_to_defaults() {
        let row = ArticleRow {
            id: 7,
            title: "Untitled".to_string(),
            content: None,
            is_pinned: None,
            created_by: None,
            created: None,
            modified_by: None,
            modified: None,
        };
        let article = Article::from(row);
        assert_eq!(article.id, 7);
        assert_eq!(article.content, "");
        assert!(!article.is_pinned);
    }

    #[test]
    fn test_touch_sets_modification_audit() {
        let mut article = Article::new("T", "C");
        article.audit.touch("editor");
        assert_eq!(article.audit.modified_by.as_deref(), Some("editor"));
        assert!(article.audit.modified.is_some());
        assert!(article.audit.created.is_none());
    }

    #[test]
    fn test_serializes_audit_fields_flat() {
        let article = Article::new("T", "C").created_by("admin");
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["created_by"], "admin");
        assert!(json.get("audit").is_none());
    }
}
