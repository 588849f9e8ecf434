//! Building a SeaORM connection from [`DbConnConfig`].

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::DbConnConfig;
use crate::{DbError, Result};

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    MySql,
    Sqlite,
}

impl DbEngine {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<Self> {
        // Trim only leading spaces/newlines to be forgiving with env files.
        let s = dsn.trim_start();

        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("mysql://") {
            Ok(DbEngine::MySql)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(Some(dsn))))
        }
    }
}

/// Connect using a DSN and optional pool settings.
///
/// In-memory SQLite is pinned to a single connection: every new connection
/// would otherwise open its own empty database.
pub async fn connect(cfg: &DbConnConfig) -> Result<DatabaseConnection> {
    let dsn = cfg.dsn.as_deref().ok_or(DbError::MissingDsn)?;
    let engine = DbEngine::detect(dsn)?;

    let mut opts = ConnectOptions::new(dsn.to_owned());
    opts.sqlx_logging(false);
    if let Some(pool) = &cfg.pool {
        pool.apply(&mut opts);
    }
    if engine == DbEngine::Sqlite && dsn.contains(":memory:") {
        opts.max_connections(1).min_connections(1);
    }

    tracing::debug!(
        ?engine,
        dsn = %redact_credentials_in_dsn(Some(dsn)),
        "connecting"
    );
    Ok(Database::connect(opts).await?)
}

/// Mask the password part of a DSN for logs and error messages.
pub fn redact_credentials_in_dsn(dsn: Option<&str>) -> String {
    match dsn {
        Some(dsn) if dsn.contains('@') => {
            if let Ok(mut parsed) = url::Url::parse(dsn) {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            } else {
                "***".to_string()
            }
        }
        Some(dsn) => dsn.to_string(),
        None => "none".to_string(),
    }
}
