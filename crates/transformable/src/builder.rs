use std::sync::{Arc, LazyLock};

use transformable_orm::{
    Boolean, Builder, Column, Direction, Operator, OrderSpec, Query, Value, Where,
};

use crate::column::{translate_bare, translate_column};
use crate::map::TranslationMap;

static EMPTY: LazyLock<TranslationMap> = LazyLock::new(TranslationMap::new);

/// A [`Builder`] that records desired names and rewrites them to actual
/// column names when SQL is generated.
///
/// Every column slot is qualified with the builder's table on the way out.
/// Raw select expressions, raw predicates and raw sort expressions are never
/// rewritten.
#[derive(Debug, Clone)]
pub struct TransformingQueryBuilder {
    base: Builder,
    map: Option<Arc<TranslationMap>>,
}

impl TransformingQueryBuilder {
    /// Wraps `base`. Until a map is attached no names are translated.
    #[must_use]
    pub const fn new(base: Builder) -> Self {
        Self { base, map: None }
    }

    /// Attaches the translation map used when SQL is generated.
    #[must_use]
    pub fn with_translation_map(mut self, map: Arc<TranslationMap>) -> Self {
        self.map = Some(map);
        self
    }

    /// The attached map, or an empty one.
    #[must_use]
    pub fn translation_map(&self) -> &TranslationMap {
        self.map.as_deref().unwrap_or(&*EMPTY)
    }

    /// The wrapped builder.
    #[must_use]
    pub const fn base(&self) -> &Builder {
        &self.base
    }

    fn map_base(mut self, f: impl FnOnce(Builder) -> Builder) -> Self {
        self.base = f(self.base);
        self
    }

    /// See [`Builder::select`].
    #[must_use]
    pub fn select<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map_base(|b| b.select(columns))
    }

    /// See [`Builder::select_raw`].
    #[must_use]
    pub fn select_raw(self, sql: impl Into<String>) -> Self {
        self.map_base(|b| b.select_raw(sql))
    }

    /// See [`Builder::where`](Builder::r#where).
    #[must_use]
    pub fn r#where(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map_base(|b| b.r#where(column, value))
    }

    /// See [`Builder::where_op`].
    #[must_use]
    pub fn where_op(
        self, column: impl Into<String>, operator: Operator, value: impl Into<Value>,
    ) -> Self {
        self.map_base(|b| b.where_op(column, operator, value))
    }

    /// See [`Builder::or_where`].
    #[must_use]
    pub fn or_where(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map_base(|b| b.or_where(column, value))
    }

    /// See [`Builder::or_where_op`].
    #[must_use]
    pub fn or_where_op(
        self, column: impl Into<String>, operator: Operator, value: impl Into<Value>,
    ) -> Self {
        self.map_base(|b| b.or_where_op(column, operator, value))
    }

    /// See [`Builder::where_in`].
    #[must_use]
    pub fn where_in(
        self, column: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.map_base(|b| b.where_in(column, values))
    }

    /// See [`Builder::where_not_in`].
    #[must_use]
    pub fn where_not_in(
        self, column: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.map_base(|b| b.where_not_in(column, values))
    }

    /// See [`Builder::where_null`].
    #[must_use]
    pub fn where_null(self, column: impl Into<String>) -> Self {
        self.map_base(|b| b.where_null(column))
    }

    /// See [`Builder::where_not_null`].
    #[must_use]
    pub fn where_not_null(self, column: impl Into<String>) -> Self {
        self.map_base(|b| b.where_not_null(column))
    }

    /// See [`Builder::where_between`].
    #[must_use]
    pub fn where_between(
        self, column: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>,
    ) -> Self {
        self.map_base(|b| b.where_between(column, low, high))
    }

    /// See [`Builder::where_like`].
    #[must_use]
    pub fn where_like(self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.map_base(|b| b.where_like(column, pattern))
    }

    /// Adds an `AND ( ... )` group. `f` receives an empty builder sharing
    /// this builder's map.
    #[must_use]
    pub fn where_nested(self, f: impl FnOnce(Self) -> Self) -> Self {
        self.push_nested(f, Boolean::And)
    }

    /// Adds an `OR ( ... )` group. `f` receives an empty builder sharing
    /// this builder's map.
    #[must_use]
    pub fn or_where_nested(self, f: impl FnOnce(Self) -> Self) -> Self {
        self.push_nested(f, Boolean::Or)
    }

    fn push_nested(mut self, f: impl FnOnce(Self) -> Self, boolean: Boolean) -> Self {
        let group = f(Self {
            base: self.base.fresh(),
            map: self.map.clone(),
        });
        self.base.push_group(group.base.wheres().to_vec(), boolean);
        self
    }

    /// See [`Builder::where_raw`]. The fragment is never rewritten.
    #[must_use]
    pub fn where_raw(
        self, sql: impl Into<String>, bindings: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.map_base(|b| b.where_raw(sql, bindings))
    }

    /// See [`Builder::order_by`].
    #[must_use]
    pub fn order_by(self, column: impl Into<String>, direction: Direction) -> Self {
        self.map_base(|b| b.order_by(column, direction))
    }

    /// See [`Builder::order_by_desc`].
    #[must_use]
    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.map_base(|b| b.order_by_desc(column))
    }

    /// See [`Builder::order_by_raw`]. The expression is never rewritten.
    #[must_use]
    pub fn order_by_raw(self, sql: impl Into<String>, direction: Direction) -> Self {
        self.map_base(|b| b.order_by_raw(sql, direction))
    }

    /// See [`Builder::limit`].
    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        self.map_base(|b| b.limit(limit))
    }

    /// See [`Builder::offset`].
    #[must_use]
    pub fn offset(self, offset: u64) -> Self {
        self.map_base(|b| b.offset(offset))
    }

    fn translate(&self, reference: &str) -> String {
        translate_column(self.translation_map(), self.base.table(), reference)
    }

    /// The SELECT list with every column reference translated and qualified.
    #[must_use]
    pub fn rewritten_columns(&self) -> Vec<Column> {
        self.base
            .columns()
            .iter()
            .map(|column| match column {
                Column::Name(reference) => Column::Name(self.translate(reference)),
                raw @ Column::Raw(_) => raw.clone(),
            })
            .collect()
    }

    /// The WHERE list with every column slot translated and qualified,
    /// including those inside nested groups.
    #[must_use]
    pub fn rewritten_wheres(&self) -> Vec<Where> {
        let translate = |reference: &str| self.translate(reference);
        self.base.wheres().iter().cloned().map(|w| w.map_columns(&translate)).collect()
    }

    /// The ORDER BY list with every column translated and qualified.
    #[must_use]
    pub fn rewritten_orders(&self) -> Vec<OrderSpec> {
        self.base
            .orders()
            .iter()
            .map(|order| match order {
                OrderSpec::Column { column, direction } => OrderSpec::Column {
                    column: self.translate(column),
                    direction: *direction,
                },
                raw @ OrderSpec::Raw { .. } => raw.clone(),
            })
            .collect()
    }

    // A copy of the base builder holding the rewritten state. The recorded
    // desired names are left as they are.
    fn rewritten(&self) -> Builder {
        let columns = self.rewritten_columns();
        let wheres = self.rewritten_wheres();
        let orders = self.rewritten_orders();

        tracing::trace!(
            table = %self.base.table(),
            columns = columns.len(),
            wheres = wheres.len(),
            orders = orders.len(),
            mapped = self.translation_map().len(),
            "rewrote column references"
        );

        let mut base = self.base.clone();
        base.set_columns(columns);
        base.set_wheres(wheres);
        base.set_orders(orders);
        base
    }

    /// Build the SELECT query from the rewritten state.
    #[must_use]
    pub fn build(&self) -> Query {
        self.rewritten().build()
    }

    /// The SELECT SQL for the rewritten state.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.build().sql
    }

    /// Build an UPDATE of the rows matching the rewritten state. SET columns
    /// are translated but not qualified.
    #[must_use]
    pub fn update<I, K, V>(&self, values: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let map = self.translation_map();
        let values: Vec<(String, Value)> = values
            .into_iter()
            .map(|(column, value)| (translate_bare(map, column.as_ref()), value.into()))
            .collect();
        self.rewritten().update(values)
    }

    /// Build an INSERT of a single row. Columns are translated but not
    /// qualified.
    #[must_use]
    pub fn insert<I, K, V>(&self, values: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let map = self.translation_map();
        let values: Vec<(String, Value)> = values
            .into_iter()
            .map(|(column, value)| (translate_bare(map, column.as_ref()), value.into()))
            .collect();
        self.base.insert(values)
    }

    /// Build a DELETE of the rows matching the rewritten state.
    #[must_use]
    pub fn delete(&self) -> Query {
        self.rewritten().delete()
    }
}
