//! SeaORM-backed [`Relation`].
//!
//! `sea_orm::Select<E>` cannot report or drop its limit, order or joins once
//! applied, so [`SeaRelation`] keeps those clauses alongside the base select
//! (which carries the filters) and assembles the statement on demand.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use pagekit::{
    Clause, CountCapabilities, CountColumn, CountOptions, CountResult, Counting, GroupKey,
    PagingConfig, RecordBuffer, Relation,
};
use sea_orm::sea_query::{Alias, Asterisk, Expr, Func, IntoCondition, Query, SimpleExpr};
use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, IntoSimpleExpr, Iterable, JoinType, Order,
    PrimaryKeyToColumn, QueryFilter, QueryOrder, QueryResult, QuerySelect, QueryTrait,
    RelationDef, Select,
};
use tracing::debug;

use crate::DbError;

const COUNT_ALIAS: &str = "num_items";
const TARGET_ALIAS: &str = "count_target";
const SUBQUERY_ALIAS: &str = "sub_query";

/// Builds the join for an include. `RelationDef` is not `Clone`, so the
/// definition is rebuilt for every statement.
type RelationFactory = Arc<dyn Fn() -> RelationDef + Send + Sync>;

/// An eagerly joined table.
#[derive(Clone)]
struct Include {
    table: String,
    def: RelationFactory,
}

impl fmt::Debug for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include").field("table", &self.table).finish()
    }
}

/// A lazily executed SeaORM query with separately tracked pagination clauses.
///
/// Holds a connection object; its lifetime/ownership is up to the caller
/// (`DatabaseConnection` clones share one pool).
#[derive(Clone, Debug)]
pub struct SeaRelation<E, C>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    conn: C,
    base: Select<E>,
    includes: Vec<Include>,
    references: Vec<String>,
    order: Vec<(E::Column, Order)>,
    group: Vec<E::Column>,
    limit: Option<u64>,
    offset: Option<u64>,
    capabilities: CountCapabilities,
    loaded: bool,
    records: RecordBuffer<E::Model>,
}

impl<E, C> SeaRelation<E, C>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    /// Wrap a select. Counts always run over the full statement wrapped as a
    /// subquery, which every SeaORM backend supports, so the default
    /// capabilities apply until overridden with
    /// [`SeaRelation::with_capabilities`].
    pub fn new(conn: C, select: Select<E>) -> Self {
        Self {
            conn,
            base: select,
            includes: Vec::new(),
            references: Vec::new(),
            order: Vec::new(),
            group: Vec::new(),
            limit: None,
            offset: None,
            capabilities: CountCapabilities::default(),
            loaded: false,
            records: RecordBuffer::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: CountCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn filter<F: IntoCondition>(mut self, filter: F) -> Self {
        self.base = self.base.filter(filter);
        self.invalidate();
        self
    }

    /// Eagerly join `table` (a `LEFT JOIN`) through the relation `def` builds,
    /// e.g. `|| post::Relation::Author.def()`.
    ///
    /// Rows of this relation are deduplicated while any include is present,
    /// so a has-many join never repeats a record or inflates a count.
    pub fn includes<F>(mut self, table: impl Into<String>, def: F) -> Self
    where
        F: Fn() -> RelationDef + Send + Sync + 'static,
    {
        self.includes.push(Include {
            table: table.into(),
            def: Arc::new(def),
        });
        self.invalidate();
        self
    }

    /// Declare that filters or ordering use columns of `table`.
    pub fn references(mut self, table: impl Into<String>) -> Self {
        self.references.push(table.into());
        self
    }

    pub fn order_by(mut self, col: E::Column, order: Order) -> Self {
        self.order.push((col, order));
        self.invalidate();
        self
    }

    pub fn group_by(mut self, col: E::Column) -> Self {
        self.group.push(col);
        self.invalidate();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self.invalidate();
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self.invalidate();
        self
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// SQL `load` would run, with values inlined.
    pub fn to_sql(&self) -> String {
        self.build_select()
            .build(self.conn.get_database_backend())
            .to_string()
    }

    fn invalidate(&mut self) {
        self.loaded = false;
        self.records = RecordBuffer::default();
    }

    fn build_select(&self) -> Select<E> {
        let mut select = self.base.clone();
        for include in &self.includes {
            select = select.join(JoinType::LeftJoin, (include.def)());
        }
        if !self.includes.is_empty() {
            select = select.distinct();
        }
        for col in &self.group {
            select = select.group_by(*col);
        }
        for (col, order) in &self.order {
            select = select.order_by(*col, order.clone());
        }
        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }
        if let Some(offset) = self.offset {
            select = select.offset(offset);
        }
        select
    }

    /// The counted expression: the named column, or the primary key for
    /// `All` (COUNT(DISTINCT *) is not SQL; distinct rows are distinct keys).
    fn count_target(column: &CountColumn) -> Result<SimpleExpr, DbErr> {
        match column {
            CountColumn::All => E::PrimaryKey::iter()
                .next()
                .map(|pk| pk.into_column().into_simple_expr())
                .ok_or_else(|| DbErr::Custom("entity has no primary key".to_owned())),
            CountColumn::Column(name) => E::Column::from_str(name)
                .map(IntoSimpleExpr::into_simple_expr)
                .map_err(|_| DbErr::Custom(format!("unknown column: {name}"))),
        }
    }

    fn count_fn(column: &CountColumn, distinct: bool, target: SimpleExpr) -> SimpleExpr {
        match (column, distinct) {
            (CountColumn::All, false) => Func::count(Expr::col(Asterisk)).into(),
            (_, true) => Func::count_distinct(target).into(),
            (_, false) => Func::count(target).into(),
        }
    }

    /// Count the rows `load` would return: the full statement, limit and
    /// offset included, is wrapped as a subquery.
    async fn scalar_count(
        &self,
        column: &CountColumn,
        options: &CountOptions,
    ) -> Result<u64, DbErr> {
        let target = Self::count_target(column)?;
        let inner = self
            .build_select()
            .expr_as(target, TARGET_ALIAS)
            .into_query();

        let outer_target = Expr::col((Alias::new(SUBQUERY_ALIAS), Alias::new(TARGET_ALIAS)));
        let mut outer = Query::select();
        outer
            .expr_as(
                Self::count_fn(column, options.distinct, outer_target.into()),
                Alias::new(COUNT_ALIAS),
            )
            .from_subquery(inner, Alias::new(SUBQUERY_ALIAS));

        let stmt = self.conn.get_database_backend().build(&outer);
        debug!(sql = %stmt, "executing count");
        let n: i64 = match self.conn.query_one(stmt).await? {
            Some(row) => row.try_get("", COUNT_ALIAS)?,
            None => 0,
        };
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn grouped_count(
        &self,
        column: &CountColumn,
        options: &CountOptions,
    ) -> Result<CountResult, DbErr> {
        // joined rows repeat a record; count each record once per group
        let distinct = options.distinct || !self.includes.is_empty();
        let count = Self::count_fn(column, distinct, Self::count_target(column)?);
        let select = self.build_select();

        let aliases: Vec<String> = (0..self.group.len())
            .map(|i| format!("group_key_{i}"))
            .collect();

        let mut select = select.select_only();
        for (col, alias) in self.group.iter().zip(&aliases) {
            select = select.expr_as((*col).into_simple_expr(), alias.as_str());
        }
        select = select.expr_as(count, COUNT_ALIAS);

        let stmt = select.build(self.conn.get_database_backend());
        debug!(sql = %stmt, "executing grouped count");
        let rows = self.conn.query_all(stmt).await?;

        let groups = rows
            .iter()
            .map(|row| {
                let key = aliases
                    .iter()
                    .map(|alias| group_key_part(row, alias))
                    .collect::<Result<GroupKey, DbErr>>()?;
                let n: i64 = row.try_get("", COUNT_ALIAS)?;
                Ok((key, u64::try_from(n).unwrap_or(0)))
            })
            .collect::<Result<Vec<_>, DbErr>>()?;
        Ok(CountResult::Grouped(groups))
    }
}

/// Read one group-by value back as text, whatever its column type.
fn group_key_part(row: &QueryResult, alias: &str) -> Result<String, DbErr> {
    if let Ok(v) = row.try_get::<Option<String>>("", alias) {
        return Ok(v.unwrap_or_default());
    }
    if let Ok(v) = row.try_get::<Option<i64>>("", alias) {
        return Ok(v.map(|n| n.to_string()).unwrap_or_default());
    }
    if let Ok(v) = row.try_get::<Option<f64>>("", alias) {
        return Ok(v.map(|n| n.to_string()).unwrap_or_default());
    }
    let v = row.try_get::<Option<bool>>("", alias)?;
    Ok(v.map(|b| b.to_string()).unwrap_or_default())
}

/// `blog_posts` -> `Blog post`
fn humanize_table_name(table: &str) -> String {
    let mut words: Vec<String> = table
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if let Some(last) = words.last_mut() {
        *last = pluralizer::pluralize(last, 1, false);
    }
    let human = words.join(" ");
    let mut chars = human.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => human,
    }
}

#[async_trait]
impl<E, C> Relation for SeaRelation<E, C>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait + Clone + Send + Sync,
{
    type Record = E::Model;
    type Error = DbError;

    fn except(&self, clauses: &[Clause]) -> Self {
        let mut copy = self.clone();
        copy.invalidate();
        for clause in clauses {
            match clause {
                Clause::Offset => copy.offset = None,
                Clause::Limit => copy.limit = None,
                Clause::Order => copy.order.clear(),
                Clause::Includes => copy.includes.clear(),
                Clause::Group => copy.group.clear(),
            }
        }
        copy
    }

    fn references_eager_loaded_tables(&self) -> bool {
        self.references
            .iter()
            .any(|table| self.includes.iter().any(|i| &i.table == table))
    }

    async fn count(
        &self,
        column: &CountColumn,
        options: &CountOptions,
    ) -> Result<CountResult, DbError> {
        if !self.group.is_empty() {
            return Ok(self.grouped_count(column, options).await?);
        }
        let total = self.scalar_count(column, options).await?;
        Ok(CountResult::Scalar(total))
    }

    fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    fn set_limit_value(&mut self, limit: Option<u64>) {
        self.limit = limit;
    }

    fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    fn set_offset_value(&mut self, offset: Option<u64>) {
        self.offset = offset;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn load(&mut self) -> Result<(), DbError> {
        if self.loaded {
            return Ok(());
        }
        debug!(limit = ?self.limit, offset = ?self.offset, "loading relation");
        let models = self.build_select().all(&self.conn).await?;
        self.records = RecordBuffer::frozen(models);
        self.loaded = true;
        Ok(())
    }

    fn records(&self) -> &RecordBuffer<E::Model> {
        &self.records
    }

    fn records_mut(&mut self) -> &mut RecordBuffer<E::Model> {
        &mut self.records
    }

    fn reset(&mut self) {
        self.invalidate();
    }

    fn human_model_name(&self) -> String {
        let entity = E::default();
        humanize_table_name(entity.table_name())
    }

    fn capabilities(&self) -> CountCapabilities {
        self.capabilities
    }
}

/// Paginate a plain SeaORM select. `page` is 1-based.
pub trait SelectPaginateExt<E: EntityTrait>: Sized {
    fn into_relation<C: ConnectionTrait>(self, conn: C) -> SeaRelation<E, C>;

    /// Page `page` (1-based) with the configured default page size.
    fn page<C>(self, conn: C, page: u64, cfg: &PagingConfig) -> Counting<SeaRelation<E, C>>
    where
        E::Model: Sync,
        C: ConnectionTrait + Clone + Send + Sync;
}

impl<E: EntityTrait> SelectPaginateExt<E> for Select<E> {
    fn into_relation<C: ConnectionTrait>(self, conn: C) -> SeaRelation<E, C> {
        SeaRelation::new(conn, self)
    }

    fn page<C>(self, conn: C, page: u64, cfg: &PagingConfig) -> Counting<SeaRelation<E, C>>
    where
        E::Model: Sync,
        C: ConnectionTrait + Clone + Send + Sync,
    {
        Counting::page(SeaRelation::new(conn, self), page, cfg)
    }
}
