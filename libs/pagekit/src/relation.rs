//! The contract a query relation must satisfy to be paginated.
//!
//! The relation itself (clause composition, SQL generation, materialization)
//! belongs to the query builder. This module only names the handful of
//! capabilities the counting and lookahead extensions rely on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::buffer::RecordBuffer;
use crate::error::PagingError;

/// Clauses that can be removed from a relation with [`Relation::except`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Clause {
    Offset,
    Limit,
    Order,
    Includes,
    Group,
}

/// What to count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CountColumn {
    /// `COUNT(*)`
    #[default]
    All,
    /// `COUNT(column)`, resolved by the relation.
    Column(String),
}

impl CountColumn {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountOptions {
    pub distinct: bool,
}

impl CountOptions {
    pub fn distinct() -> Self {
        Self { distinct: true }
    }
}

/// Values of the grouped columns, in group-by order, rendered as text.
pub type GroupKey = Vec<String>;

/// Result of a count query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountResult {
    Scalar(u64),
    /// One entry per group, in the order the engine returned them.
    Grouped(Vec<(GroupKey, u64)>),
}

impl CountResult {
    /// Pagination total: the row count, or the number of groups.
    pub fn total(&self) -> u64 {
        match self {
            CountResult::Scalar(n) => *n,
            CountResult::Grouped(groups) => groups.len() as u64,
        }
    }
}

/// What the query engine supports when counting. Resolved once, when the
/// relation is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountCapabilities {
    /// The count primitive takes options such as `distinct`. When false the
    /// defaults are passed instead.
    pub accepts_options: bool,
    /// Counting a limited relation is unreliable on this engine, so a plain
    /// [`count`](crate::Counting::count) loads the page and measures it.
    pub count_loaded_when_limited: bool,
}

impl Default for CountCapabilities {
    fn default() -> Self {
        Self {
            accepts_options: true,
            count_loaded_when_limited: false,
        }
    }
}

/// A composable, lazily executed query.
///
/// `set_limit_value` and `set_offset_value` are raw setters: they must not
/// drop loaded records. Anything that should invalidate loaded state goes
/// through [`Relation::reset`].
#[async_trait]
pub trait Relation: Clone + Send + Sync {
    type Record: Clone + Send + Sync;
    type Error: std::error::Error + From<PagingError> + Send + Sync + 'static;

    /// A copy of this relation without the given clauses.
    fn except(&self, clauses: &[Clause]) -> Self;

    /// Whether filters or ordering refer to columns of an eagerly joined table.
    fn references_eager_loaded_tables(&self) -> bool;

    async fn count(
        &self,
        column: &CountColumn,
        options: &CountOptions,
    ) -> Result<CountResult, Self::Error>;

    fn limit_value(&self) -> Option<u64>;
    fn set_limit_value(&mut self, limit: Option<u64>);
    fn offset_value(&self) -> Option<u64>;
    fn set_offset_value(&mut self, offset: Option<u64>);

    fn is_loaded(&self) -> bool;

    /// Execute the query and materialize records. No-op when already loaded.
    async fn load(&mut self) -> Result<(), Self::Error>;

    fn records(&self) -> &RecordBuffer<Self::Record>;
    fn records_mut(&mut self) -> &mut RecordBuffer<Self::Record>;

    /// Drop loaded records so the next access re-executes.
    fn reset(&mut self);

    /// Human readable, singular name of the record type.
    fn human_model_name(&self) -> String;

    fn capabilities(&self) -> CountCapabilities {
        CountCapabilities::default()
    }
}
