//! Pagination over query relations.
//!
//! Two strategies wrap a [`Relation`]:
//! - [`Counting`] computes the total row count of the filtered, unpaginated
//!   query once and caches it. Offset, limit and order are stripped before
//!   counting; eager-load includes are stripped only when nothing references
//!   the included tables. Grouped relations count groups, not rows.
//! - [`WithoutCount`] never counts. It fetches `limit + 1` records and uses
//!   the extra one to decide whether a next page exists.
//!
//! Both implement [`Paginatable`]; [`Paginated`] holds either.
//!
//! # Example
//! ```rust,ignore
//! use pagekit::{Counting, CountColumn, CountOptions, Paginatable, PagingConfig};
//!
//! let mut page = Counting::page(relation, 2, &PagingConfig::default()).per(10);
//! let total = page.total_count(CountColumn::All, CountOptions::default()).await?;
//!
//! let mut cheap = page.without_count();
//! cheap.load().await?;
//! if !cheap.last_page().await? { /* render a "next" link */ }
//! ```

pub mod buffer;
pub mod config;
pub mod counting;
pub mod error;
pub mod paginatable;
pub mod relation;
pub mod without_count;

pub use buffer::RecordBuffer;
pub use config::{PagingConfig, DEFAULT_PER_PAGE};
pub use counting::Counting;
pub use error::{PagingError, Result};
pub use paginatable::{Paginatable, Paginated};
pub use relation::{
    Clause, CountCapabilities, CountColumn, CountOptions, CountResult, GroupKey, Relation,
};
pub use without_count::WithoutCount;
