//! Total-count pagination.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::config::PagingConfig;
use crate::paginatable::Paginatable;
use crate::relation::{Clause, CountColumn, CountOptions, CountResult, Relation};
use crate::without_count::WithoutCount;

/// A relation paginated by page number, with a cached total count.
///
/// The total reflects the filtered but unpaginated result set and is
/// computed at most once until [`Paginatable::reset`] is called. Arguments
/// passed to later `total_count` calls are ignored while the cache is warm.
#[derive(Clone, Debug)]
pub struct Counting<R: Relation> {
    pub(crate) relation: R,
    total_count: Option<u64>,
    config: PagingConfig,
}

impl<R: Relation> Counting<R> {
    pub fn new(relation: R) -> Self {
        Self::with_config(relation, PagingConfig::default())
    }

    pub fn with_config(relation: R, config: PagingConfig) -> Self {
        Self {
            relation,
            total_count: None,
            config,
        }
    }

    /// Select page `page` (1-based; 0 is treated as 1) using the configured
    /// default page size.
    pub fn page(mut relation: R, page: u64, config: &PagingConfig) -> Self {
        let per = config.clamp_per_page(None);
        relation.reset();
        relation.set_limit_value(Some(per));
        relation.set_offset_value(Some(page.max(1).saturating_sub(1).saturating_mul(per)));
        Self::with_config(relation, *config)
    }

    /// Change the page size, keeping the current page position.
    pub fn per(mut self, per: u64) -> Self {
        let per = self.config.clamp_per_page(Some(per));
        let offset = match (self.relation.offset_value(), self.relation.limit_value()) {
            (Some(offset), Some(limit)) if limit > 0 => offset / limit * per,
            (offset, _) => offset.unwrap_or(0),
        };
        let relation = self.relation_mut();
        relation.set_limit_value(Some(per));
        relation.set_offset_value(Some(offset));
        self
    }

    pub fn relation(&self) -> &R {
        &self.relation
    }

    /// Mutable access to the relation. Invalidates the cached total and any
    /// loaded records first.
    pub fn relation_mut(&mut self) -> &mut R {
        self.reset();
        &mut self.relation
    }

    pub fn into_inner(self) -> R {
        self.relation
    }

    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    /// Cached total, if one has been computed.
    pub fn cached_total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Plain count of the relation as it stands, pagination clauses included.
    ///
    /// On engines flagged with `count_loaded_when_limited` a limited,
    /// non-distinct count loads the page and measures it instead.
    pub async fn count(
        &mut self,
        column: CountColumn,
        options: CountOptions,
    ) -> Result<u64, R::Error> {
        let caps = self.relation.capabilities();
        if caps.count_loaded_when_limited
            && self.relation.limit_value().is_some()
            && !options.distinct
        {
            self.relation.load().await?;
            return Ok(self.relation.records().len() as u64);
        }
        let options = if caps.accepts_options {
            options
        } else {
            CountOptions::default()
        };
        Ok(self.relation.count(&column, &options).await?.total())
    }

    /// Opt out of counting: pages are detected with limit+1 lookahead.
    pub fn without_count(self) -> WithoutCount<R> {
        WithoutCount::new(self)
    }
}

#[async_trait]
impl<R: Relation> Paginatable for Counting<R> {
    type Record = R::Record;
    type Error = R::Error;

    async fn load(&mut self) -> Result<(), R::Error> {
        self.relation.load().await
    }

    fn records(&self) -> &[R::Record] {
        self.relation.records().as_slice()
    }

    async fn total_count(
        &mut self,
        column: CountColumn,
        options: CountOptions,
    ) -> Result<u64, R::Error> {
        if let Some(total) = self.total_count {
            trace!(total, "total count served from cache");
            return Ok(total);
        }

        // ORDER BY may reference columns a count projection does not have.
        let mut stripped = self
            .relation
            .except(&[Clause::Offset, Clause::Limit, Clause::Order]);

        let keep_includes = self.relation.references_eager_loaded_tables();
        if !keep_includes {
            stripped = stripped.except(&[Clause::Includes]);
        }

        let options = if self.relation.capabilities().accepts_options {
            options
        } else {
            CountOptions::default()
        };

        let result = stripped.count(&column, &options).await?;
        let total = result.total();
        debug!(
            total,
            keep_includes,
            grouped = matches!(result, CountResult::Grouped(_)),
            "computed total count"
        );

        self.total_count = Some(total);
        Ok(total)
    }

    fn limit_value(&self) -> Option<u64> {
        self.relation.limit_value()
    }

    fn offset_value(&self) -> Option<u64> {
        self.relation.offset_value()
    }

    async fn last_page(&mut self) -> Result<bool, R::Error> {
        let current = self.current_page()?;
        Ok(current == self.total_pages().await?)
    }

    async fn out_of_range(&mut self) -> Result<bool, R::Error> {
        let current = self.current_page()?;
        Ok(current > self.total_pages().await?)
    }

    fn entry_name(&self) -> String {
        self.relation.human_model_name().to_lowercase()
    }

    fn reset(&mut self) {
        self.total_count = None;
        self.relation.reset();
    }
}
