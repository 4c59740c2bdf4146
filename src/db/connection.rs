//! Connection string handling shared by the repositories and the bootstrapper
//!
//! SQLite targets accept either sqlx URLs (`sqlite:board.db`) or the
//! `Data Source=board.db` form. SQL Server targets use ADO strings parsed by
//! tiberius. Targets are only ever logged through [`describe_target`], which
//! drops credentials.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// A live TDS connection to SQL Server
pub type TdsClient = tiberius::Client<Compat<TcpStream>>;

const SERVER_KEYS: &[&str] = &["server", "data source", "datasource", "address", "addr", "network address"];
const DATABASE_KEYS: &[&str] = &["database", "initial catalog"];
const SQLITE_FILE_KEYS: &[&str] = &["data source", "datasource", "filename"];

/// Split an ADO style `key=value;key=value` string into lowercased keys.
fn ado_pairs(connection_string: &str) -> impl Iterator<Item = (String, &str)> {
    connection_string.split(';').filter_map(|part| {
        let (key, value) = part.split_once('=')?;
        Some((key.trim().to_ascii_lowercase(), value.trim()))
    })
}

fn ado_value<'a>(connection_string: &'a str, keys: &[&str]) -> Option<&'a str> {
    ado_pairs(connection_string)
        .find(|(key, value)| keys.contains(&key.as_str()) && !value.is_empty())
        .map(|(_, value)| value)
}

/// Human readable label for a connection string, without credentials.
pub fn describe_target(connection_string: &str) -> String {
    let trimmed = connection_string.trim();

    if let Some(rest) = trimmed.strip_prefix("sqlite:") {
        let path = rest.trim_start_matches("//");
        let path = path.split('?').next().unwrap_or(path);
        return if path.is_empty() { ":memory:".to_string() } else { path.to_string() };
    }

    let server = ado_value(trimmed, SERVER_KEYS);
    let database = ado_value(trimmed, DATABASE_KEYS);
    match (server, database) {
        (Some(server), Some(database)) => format!("{}/{}", server, database),
        (Some(server), None) => server.to_string(),
        (None, Some(database)) => database.to_string(),
        (None, None) if !trimmed.contains('=') => trimmed.to_string(),
        (None, None) => "<unnamed target>".to_string(),
    }
}

/// Whether a SQLite target names a private in-memory database.
///
/// Each connection to such a target sees its own empty database, so the
/// bootstrapper's connection and the repository pool could never share a table.
fn is_in_memory(connection_string: &str) -> bool {
    if let Some(rest) = connection_string.strip_prefix("sqlite:") {
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = path.trim_start_matches("//");
        return path.is_empty()
            || path == ":memory:"
            || query.split('&').any(|p| p.eq_ignore_ascii_case("mode=memory"));
    }

    let file = if connection_string.contains('=') {
        ado_value(connection_string, SQLITE_FILE_KEYS)
    } else {
        Some(connection_string)
    };
    file.is_some_and(|f| f.eq_ignore_ascii_case(":memory:"))
}

/// Connect options for a SQLite connection string. Missing files are created.
///
/// In-memory targets are rejected: the table must outlive the connection that created it.
pub fn sqlite_connect_options(connection_string: &str) -> Result<SqliteConnectOptions> {
    let trimmed = connection_string.trim();

    if is_in_memory(trimmed) {
        return Err(Error::Config(
            "In-memory SQLite databases are not supported; use a file path".to_string(),
        ));
    }

    let options = if trimmed.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(trimmed)?
    } else if trimmed.contains('=') {
        let file = ado_value(trimmed, SQLITE_FILE_KEYS).ok_or_else(|| {
            Error::Config("SQLite connection string has no Data Source".to_string())
        })?;
        SqliteConnectOptions::new().filename(file)
    } else if trimmed.is_empty() {
        return Err(Error::Config("SQLite connection string is empty".to_string()));
    } else {
        SqliteConnectOptions::new().filename(trimmed)
    };

    Ok(options.create_if_missing(true))
}

/// Open a SQLite pool sized by the database configuration
pub async fn connect_sqlite_pool(config: &DatabaseConfig, connection_string: &str) -> Result<SqlitePool> {
    let options = sqlite_connect_options(connection_string)?;

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(options)
        .await?;

    tracing::info!(
        "SQLite pool for {}: max={}, min={} connections",
        describe_target(connection_string),
        config.max_connections,
        config.min_connections
    );

    Ok(pool)
}

/// Parse an ADO connection string into a tiberius configuration
pub fn sql_server_config(connection_string: &str) -> Result<tiberius::Config> {
    Ok(tiberius::Config::from_ado_string(connection_string)?)
}

/// First column of a single-row count query; no row counts as zero.
pub(crate) fn count_from_row(row: Option<tiberius::Row>) -> Result<i64> {
    match row {
        Some(row) => Ok(row.try_get::<i64, _>(0)?.unwrap_or(0)),
        None => Ok(0),
    }
}

/// Open a fresh TDS connection, following a server-side routing redirect once.
pub async fn connect_tds(config: &tiberius::Config) -> Result<TdsClient> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;

    match tiberius::Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            let mut config = config.clone();
            config.host(&host);
            config.port(port);

            let tcp = TcpStream::connect(config.get_addr()).await?;
            tcp.set_nodelay(true)?;
            Ok(tiberius::Client::connect(config, tcp.compat_write()).await?)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_sql_server_target_hides_credentials() {
        let label = describe_target("Server=db01,1433;Database=Tenant7;User Id=sa;Password=hunter2;");
        assert_eq!(label, "db01,1433/Tenant7");
        assert!(!label.contains("hunter2"));
    }

    #[test]
    fn test_describe_initial_catalog_form() {
        let label = describe_target("Data Source=sql.local;Initial Catalog=Board;Integrated Security=true");
        assert_eq!(label, "sql.local/Board");
    }

    #[test]
    fn test_describe_sqlite_targets() {
        assert_eq!(describe_target("sqlite://board.db?mode=rwc"), "board.db");
        assert_eq!(describe_target("sqlite::memory:"), ":memory:");
        assert_eq!(describe_target("Data Source=articles.db"), "articles.db");
        assert_eq!(describe_target("articles.db"), "articles.db");
    }

    #[test]
    fn test_describe_unknown_keys() {
        assert_eq!(describe_target("Password=secret"), "<unnamed target>");
    }

    #[test]
    fn test_sqlite_options_from_ado_form() {
        let options = sqlite_connect_options("Data Source=board.db;Mode=ReadWriteCreate").unwrap();
        assert!(options.get_filename().ends_with("board.db"));
    }

    #[test]
    fn test_sqlite_options_from_url_and_plain_path() {
        let options = sqlite_connect_options("sqlite:data/board.db").unwrap();
        assert!(options.get_filename().ends_with("board.db"));

        let options = sqlite_connect_options("plain.db").unwrap();
        assert!(options.get_filename().ends_with("plain.db"));
    }

    #[test]
    fn test_sqlite_options_require_a_file() {
        let err = sqlite_connect_options("Mode=ReadOnly").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(matches!(sqlite_connect_options("  ").unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_sqlite_options_reject_in_memory_targets() {
        for target in [
            "Data Source=:memory:",
            ":memory:",
            "sqlite::memory:",
            "sqlite://:memory:",
            "sqlite:board.db?mode=memory",
        ] {
            let err = sqlite_connect_options(target).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{} accepted", target);
        }
        assert!(sqlite_connect_options("sqlite:board.db?mode=rwc").is_ok());
    }

    #[test]
    fn test_count_without_row_is_zero() {
        assert_eq!(count_from_row(None).unwrap(), 0);
    }

    #[test]
    fn test_sql_server_config_parses_ado_string() {
        let config = sql_server_config("Server=db01,1433;Database=Master;User Id=sa;Password=pw").unwrap();
        assert_eq!(config.get_addr(), "db01:1433");
    }
}
