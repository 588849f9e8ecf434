//! Count-free pagination by limit+1 lookahead.

use async_trait::async_trait;
use tracing::debug;

use crate::counting::Counting;
use crate::error::PagingError;
use crate::paginatable::Paginatable;
use crate::relation::{CountColumn, CountOptions, Relation};

/// A relation that never runs a count query.
///
/// Loading fetches one record more than the page size; whether that extra
/// record came back decides if there is a next page. The extra record is
/// dropped, so callers never see more than `limit` records.
#[derive(Clone, Debug)]
pub struct WithoutCount<R: Relation> {
    inner: Counting<R>,
    has_next: bool,
}

impl<R: Relation> WithoutCount<R> {
    pub fn new(inner: Counting<R>) -> Self {
        Self {
            inner,
            has_next: false,
        }
    }

    pub fn relation(&self) -> &R {
        self.inner.relation()
    }

    /// Mutable access to the relation. Invalidates loaded records first.
    pub fn relation_mut(&mut self) -> &mut R {
        self.has_next = false;
        self.inner.relation_mut()
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    /// Whether the last load saw a record past the page.
    pub fn has_next(&self) -> bool {
        self.has_next
    }
}

#[async_trait]
impl<R: Relation> Paginatable for WithoutCount<R> {
    type Record = R::Record;
    type Error = R::Error;

    async fn load(&mut self) -> Result<(), R::Error> {
        let relation = &mut self.inner.relation;
        let limit = match relation.limit_value() {
            Some(limit) if !relation.is_loaded() => limit,
            _ => return relation.load().await,
        };

        self.has_next = false;
        relation.set_limit_value(Some(limit.saturating_add(1)));
        let loaded = relation.load().await;
        relation.set_limit_value(Some(limit));
        loaded?;

        let records = relation.records_mut();
        if !records.is_empty() {
            let extra = usize::try_from(limit).unwrap_or(usize::MAX);
            self.has_next = records.remove_at(extra).is_some();
        }
        debug!(limit, has_next = self.has_next, "loaded page with lookahead");
        Ok(())
    }

    fn records(&self) -> &[R::Record] {
        self.inner.records()
    }

    async fn total_count(
        &mut self,
        _column: CountColumn,
        _options: CountOptions,
    ) -> Result<u64, R::Error> {
        Err(PagingError::CountUnsupported.into())
    }

    fn limit_value(&self) -> Option<u64> {
        self.inner.limit_value()
    }

    fn offset_value(&self) -> Option<u64> {
        self.inner.offset_value()
    }

    async fn last_page(&mut self) -> Result<bool, R::Error> {
        Ok(!self.out_of_range().await? && !self.has_next)
    }

    async fn out_of_range(&mut self) -> Result<bool, R::Error> {
        if !self.inner.relation.is_loaded() {
            self.load().await?;
        }
        Ok(self.inner.records().is_empty())
    }

    fn entry_name(&self) -> String {
        self.inner.entry_name()
    }

    fn reset(&mut self) {
        self.has_next = false;
        self.inner.reset();
    }
}
