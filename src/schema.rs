//! Table descriptors and per-dialect DDL rendering
//!
//! The `Articles` table is described once here; the bootstrapper renders its
//! `CREATE TABLE` and metadata checks from this description for each backend.

/// SQL dialect of a target store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    SqlServer,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Store-generated integer primary key
    Identity,
    /// Unicode text; `None` means unbounded
    Text { max_len: Option<u32> },
    Boolean,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    CurrentTimestamp,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

pub const ARTICLES: TableSchema = TableSchema {
    name: "Articles",
    columns: &[
        Column {
            name: "Id",
            ty: ColumnType::Identity,
            nullable: false,
            default: None,
        },
        Column {
            name: "Title",
            ty: ColumnType::Text { max_len: Some(255) },
            nullable: false,
            default: None,
        },
        // Required by validation only, not by the store
        Column {
            name: "Content",
            ty: ColumnType::Text { max_len: None },
            nullable: true,
            default: None,
        },
        Column {
            name: "IsPinned",
            ty: ColumnType::Boolean,
            nullable: true,
            default: Some(ColumnDefault::False),
        },
        Column {
            name: "CreatedBy",
            ty: ColumnType::Text { max_len: Some(255) },
            nullable: true,
            default: None,
        },
        Column {
            name: "Created",
            ty: ColumnType::Timestamp,
            nullable: true,
            default: Some(ColumnDefault::CurrentTimestamp),
        },
        Column {
            name: "ModifiedBy",
            ty: ColumnType::Text { max_len: Some(255) },
            nullable: true,
            default: None,
        },
        Column {
            name: "Modified",
            ty: ColumnType::Timestamp,
            nullable: true,
            default: None,
        },
    ],
};

impl Dialect {
    fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", ident),
            Dialect::Sqlite => ident.to_string(),
        }
    }

    fn type_sql(&self, ty: ColumnType) -> String {
        match (self, ty) {
            (Dialect::SqlServer, ColumnType::Identity) => "INT NOT NULL PRIMARY KEY IDENTITY(1, 1)".to_string(),
            (Dialect::SqlServer, ColumnType::Text { max_len: Some(n) }) => format!("NVARCHAR({})", n),
            (Dialect::SqlServer, ColumnType::Text { max_len: None }) => "NVARCHAR(MAX)".to_string(),
            (Dialect::SqlServer, ColumnType::Boolean) => "BIT".to_string(),
            (Dialect::SqlServer, ColumnType::Timestamp) => "DATETIME".to_string(),
            (Dialect::Sqlite, ColumnType::Identity) => "INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            // SQLite does not enforce declared lengths
            (Dialect::Sqlite, ColumnType::Text { .. }) => "TEXT".to_string(),
            (Dialect::Sqlite, ColumnType::Boolean) => "BOOLEAN".to_string(),
            (Dialect::Sqlite, ColumnType::Timestamp) => "TEXT".to_string(),
        }
    }

    fn default_sql(&self, default: ColumnDefault) -> &'static str {
        match (self, default) {
            (Dialect::SqlServer, ColumnDefault::CurrentTimestamp) => "DEFAULT(GETUTCDATE())",
            (Dialect::SqlServer, ColumnDefault::False) => "DEFAULT(0)",
            (Dialect::Sqlite, ColumnDefault::CurrentTimestamp) => "DEFAULT CURRENT_TIMESTAMP",
            (Dialect::Sqlite, ColumnDefault::False) => "DEFAULT 0",
        }
    }
}

impl Column {
    /// Column definition as it appears inside `CREATE TABLE`.
    pub fn definition(&self, dialect: Dialect) -> String {
        let mut sql = format!("{} {}", dialect.quote(self.name), dialect.type_sql(self.ty));

        if self.ty != ColumnType::Identity {
            sql.push_str(if self.nullable { " NULL" } else { " NOT NULL" });
        }
        if let Some(default) = self.default {
            sql.push(' ');
            sql.push_str(dialect.default_sql(default));
        }
        sql
    }

}

impl TableSchema {
    pub fn qualified_name(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::SqlServer => format!("[dbo].{}", dialect.quote(self.name)),
            Dialect::Sqlite => self.name.to_string(),
        }
    }

    /// Comma separated column names in declaration order.
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.definition(dialect)))
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE {}\n(\n{}\n);",
            self.qualified_name(dialect),
            columns
        )
    }

    /// Query returning a single count: non-zero when the table exists.
    pub fn exists_sql(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::SqlServer => format!(
                "SELECT COUNT_BIG(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = '{}'",
                self.name
            ),
            Dialect::Sqlite => format!(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '{}'",
                self.name
            ),
        }
    }

    pub fn count_sql(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::SqlServer => format!("SELECT COUNT_BIG(*) FROM {}", self.qualified_name(dialect)),
            Dialect::Sqlite => format!("SELECT COUNT(*) FROM {}", self.qualified_name(dialect)),
        }
    }
}
