//! SeaORM adapter for `pagekit`.
//!
//! [`SeaRelation`] implements [`pagekit::Relation`] over a `sea_orm::Select`,
//! so any SeaORM query can be paginated with [`pagekit::Counting`] or
//! [`pagekit::WithoutCount`].
//!
//! # Features
//! - `pg`, `mysql`, `sqlite`: enable SeaORM's SQLx backends (`sqlite` by default)
//!
//! # Example
//! ```rust,no_run
//! # async fn demo() -> pagekit_db::Result<()> {
//! use figment::{providers::Serialized, Figment};
//! use pagekit_db::{connect, Settings, DEFAULT_SECTION};
//!
//! let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
//!     "pagination": {
//!         "paging": { "default_per_page": 20 },
//!         "database": { "dsn": "sqlite::memory:" }
//!     }
//! })));
//! let settings = Settings::from_figment(&figment, DEFAULT_SECTION)?;
//! let db = connect(&settings.database.unwrap_or_default()).await?;
//! # let _ = db;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connect;
pub mod relation;

pub use config::{DbConnConfig, PoolCfg, Settings, DEFAULT_SECTION};
pub use connect::{connect, redact_credentials_in_dsn, DbEngine};
pub use relation::{SeaRelation, SelectPaginateExt};

use pagekit::PagingError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Library error type
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("database DSN is not configured")]
    MissingDsn,

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Paging(#[from] PagingError),

    #[error("invalid pagination settings: {0}")]
    Config(#[from] figment::Error),
}
