use async_trait::async_trait;

use crate::counting::Counting;
use crate::error::PagingError;
use crate::relation::{CountColumn, CountOptions, Relation};
use crate::without_count::WithoutCount;

/// A relation that can answer page-navigation questions.
///
/// Page arithmetic (`current_page`, `first_page`, `next_page`, `prev_page`)
/// is shared; the counting and count-avoiding variants differ in how they
/// decide `last_page` and `out_of_range`, and in whether `total_count` is
/// available at all.
#[async_trait]
pub trait Paginatable: Send {
    type Record: Clone + Send + Sync;
    type Error: std::error::Error + From<PagingError> + Send + Sync + 'static;

    async fn load(&mut self) -> Result<(), Self::Error>;

    /// Records of the current page; empty until loaded.
    fn records(&self) -> &[Self::Record];

    async fn total_count(
        &mut self,
        column: CountColumn,
        options: CountOptions,
    ) -> Result<u64, Self::Error>;

    fn limit_value(&self) -> Option<u64>;
    fn offset_value(&self) -> Option<u64>;

    async fn last_page(&mut self) -> Result<bool, Self::Error>;
    async fn out_of_range(&mut self) -> Result<bool, Self::Error>;

    fn entry_name(&self) -> String;

    fn reset(&mut self);

    fn current_page(&self) -> Result<u64, PagingError> {
        match self.limit_value() {
            Some(limit) if limit > 0 => Ok(self.offset_value().unwrap_or(0) / limit + 1),
            _ => Err(PagingError::ZeroPerPage),
        }
    }

    async fn total_pages(&mut self) -> Result<u64, Self::Error> {
        let limit = match self.limit_value() {
            Some(limit) if limit > 0 => limit,
            _ => return Err(PagingError::ZeroPerPage.into()),
        };
        let total = self
            .total_count(CountColumn::All, CountOptions::default())
            .await?;
        Ok(total.div_ceil(limit))
    }

    fn first_page(&self) -> Result<bool, PagingError> {
        Ok(self.current_page()? == 1)
    }

    async fn next_page(&mut self) -> Result<Option<u64>, Self::Error> {
        if self.last_page().await? || self.out_of_range().await? {
            return Ok(None);
        }
        Ok(Some(self.current_page()? + 1))
    }

    async fn prev_page(&mut self) -> Result<Option<u64>, Self::Error> {
        if self.first_page()? || self.out_of_range().await? {
            return Ok(None);
        }
        Ok(Some(self.current_page()? - 1))
    }
}

/// Either pagination strategy behind one type.
#[derive(Debug)]
pub enum Paginated<R: Relation> {
    Counting(Counting<R>),
    WithoutCount(WithoutCount<R>),
}

impl<R: Relation> Paginated<R> {
    /// Switch to limit+1 lookahead. Already count-avoiding relations are
    /// returned as they are.
    pub fn without_count(self) -> Self {
        match self {
            Paginated::Counting(c) => Paginated::WithoutCount(c.without_count()),
            other => other,
        }
    }

    pub fn is_counting(&self) -> bool {
        matches!(self, Paginated::Counting(_))
    }

    pub fn relation(&self) -> &R {
        match self {
            Paginated::Counting(c) => c.relation(),
            Paginated::WithoutCount(w) => w.relation(),
        }
    }
}

impl<R: Relation> From<Counting<R>> for Paginated<R> {
    fn from(c: Counting<R>) -> Self {
        Paginated::Counting(c)
    }
}

impl<R: Relation> From<WithoutCount<R>> for Paginated<R> {
    fn from(w: WithoutCount<R>) -> Self {
        Paginated::WithoutCount(w)
    }
}

#[async_trait]
impl<R: Relation> Paginatable for Paginated<R> {
    type Record = R::Record;
    type Error = R::Error;

    async fn load(&mut self) -> Result<(), R::Error> {
        match self {
            Paginated::Counting(c) => c.load().await,
            Paginated::WithoutCount(w) => w.load().await,
        }
    }

    fn records(&self) -> &[R::Record] {
        match self {
            Paginated::Counting(c) => c.records(),
            Paginated::WithoutCount(w) => w.records(),
        }
    }

    async fn total_count(
        &mut self,
        column: CountColumn,
        options: CountOptions,
    ) -> Result<u64, R::Error> {
        match self {
            Paginated::Counting(c) => c.total_count(column, options).await,
            Paginated::WithoutCount(w) => w.total_count(column, options).await,
        }
    }

    fn limit_value(&self) -> Option<u64> {
        self.relation().limit_value()
    }

    fn offset_value(&self) -> Option<u64> {
        self.relation().offset_value()
    }

    async fn last_page(&mut self) -> Result<bool, R::Error> {
        match self {
            Paginated::Counting(c) => c.last_page().await,
            Paginated::WithoutCount(w) => w.last_page().await,
        }
    }

    async fn out_of_range(&mut self) -> Result<bool, R::Error> {
        match self {
            Paginated::Counting(c) => c.out_of_range().await,
            Paginated::WithoutCount(w) => w.out_of_range().await,
        }
    }

    fn entry_name(&self) -> String {
        match self {
            Paginated::Counting(c) => c.entry_name(),
            Paginated::WithoutCount(w) => w.entry_name(),
        }
    }

    fn reset(&mut self) {
        match self {
            Paginated::Counting(c) => c.reset(),
            Paginated::WithoutCount(w) => w.reset(),
        }
    }
}
