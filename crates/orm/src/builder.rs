use std::str::FromStr;

use anyhow::bail;
use sea_query::{
    Alias, Asterisk, ColumnRef, Expr, IntoIden, Order, SimpleExpr, TableRef, Value,
};

use crate::filter::{Boolean, Operator, Where, fold};
use crate::query::{Grammar, Query};

/// One entry in the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// A column reference, bare or table-qualified.
    Name(String),
    /// A raw SQL expression, emitted verbatim.
    Raw(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => bail!("order direction must be \"asc\" or \"desc\", got \"{other}\""),
        }
    }
}

impl From<Direction> for Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Self::Asc,
            Direction::Desc => Self::Desc,
        }
    }
}

/// One entry in the ORDER BY list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    /// Sort on a column reference.
    Column {
        /// Column reference, bare or table-qualified.
        column: String,
        /// Sort direction.
        direction: Direction,
    },
    /// Sort on a raw SQL expression.
    Raw {
        /// SQL expression.
        sql: String,
        /// Sort direction.
        direction: Direction,
    },
}

impl OrderSpec {
    /// The column slot of this entry, if it has one.
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Column { column, .. } => Some(column),
            Self::Raw { .. } => None,
        }
    }
}

/// Builder for queries against a single table.
///
/// The builder only accumulates state; nothing is serialised until
/// [`Builder::build`] (or one of the write statements) is called.
#[derive(Debug, Clone)]
pub struct Builder {
    table: String,
    grammar: Grammar,
    columns: Vec<Column>,
    wheres: Vec<Where>,
    orders: Vec<OrderSpec>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Builder {
    /// Creates a builder for `table` using `grammar`.
    #[must_use]
    pub fn new(table: impl Into<String>, grammar: Grammar) -> Self {
        Self {
            table: table.into(),
            grammar,
            columns: Vec::new(),
            wheres: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Creates an empty builder for the same table and grammar.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self::new(self.table.clone(), self.grammar)
    }

    /// The table this builder selects from.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The grammar used for SQL generation.
    #[must_use]
    pub const fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Current SELECT list.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Current WHERE list.
    #[must_use]
    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    /// Current ORDER BY list.
    #[must_use]
    pub fn orders(&self) -> &[OrderSpec] {
        &self.orders
    }

    /// Replace the SELECT list.
    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
    }

    /// Replace the WHERE list.
    pub fn set_wheres(&mut self, wheres: Vec<Where>) {
        self.wheres = wheres;
    }

    /// Replace the ORDER BY list.
    pub fn set_orders(&mut self, orders: Vec<OrderSpec>) {
        self.orders = orders;
    }

    /// Adds columns to the SELECT list.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(|c| Column::Name(c.into())));
        self
    }

    /// Adds a raw expression to the SELECT list.
    #[must_use]
    pub fn select_raw(mut self, sql: impl Into<String>) -> Self {
        self.columns.push(Column::Raw(sql.into()));
        self
    }

    /// Adds an `AND column = value` predicate.
    #[must_use]
    pub fn r#where(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    /// Adds an `AND column <op> value` predicate.
    #[must_use]
    pub fn where_op(
        mut self, column: impl Into<String>, operator: Operator, value: impl Into<Value>,
    ) -> Self {
        self.wheres.push(Where::Basic {
            column: column.into(),
            operator,
            value: value.into(),
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `OR column = value` predicate.
    #[must_use]
    pub fn or_where(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.or_where_op(column, Operator::Eq, value)
    }

    /// Adds an `OR column <op> value` predicate.
    #[must_use]
    pub fn or_where_op(
        mut self, column: impl Into<String>, operator: Operator, value: impl Into<Value>,
    ) -> Self {
        self.wheres.push(Where::Basic {
            column: column.into(),
            operator,
            value: value.into(),
            boolean: Boolean::Or,
        });
        self
    }

    /// Adds an `AND column IN (values)` predicate.
    #[must_use]
    pub fn where_in(
        mut self, column: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.wheres.push(Where::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `AND column NOT IN (values)` predicate.
    #[must_use]
    pub fn where_not_in(
        mut self, column: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.wheres.push(Where::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `AND column IS NULL` predicate.
    #[must_use]
    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Where::Null {
            column: column.into(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `AND column IS NOT NULL` predicate.
    #[must_use]
    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Where::Null {
            column: column.into(),
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `AND column BETWEEN low AND high` predicate.
    #[must_use]
    pub fn where_between(
        mut self, column: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>,
    ) -> Self {
        self.wheres.push(Where::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `AND column LIKE pattern` predicate.
    #[must_use]
    pub fn where_like(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.wheres.push(Where::Like {
            column: column.into(),
            pattern: pattern.into(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an `AND ( ... )` group built by `f` on an empty builder.
    #[must_use]
    pub fn where_nested(self, f: impl FnOnce(Self) -> Self) -> Self {
        self.push_nested(f, Boolean::And)
    }

    /// Adds an `OR ( ... )` group built by `f` on an empty builder.
    #[must_use]
    pub fn or_where_nested(self, f: impl FnOnce(Self) -> Self) -> Self {
        self.push_nested(f, Boolean::Or)
    }

    fn push_nested(mut self, f: impl FnOnce(Self) -> Self, boolean: Boolean) -> Self {
        let group = f(self.fresh());
        self.push_group(group.wheres, boolean);
        self
    }

    /// Adds a predicate group. Empty groups are dropped.
    pub fn push_group(&mut self, wheres: Vec<Where>, boolean: Boolean) {
        if !wheres.is_empty() {
            self.wheres.push(Where::Nested { wheres, boolean });
        }
    }

    /// Adds an `AND <sql>` predicate with bound values.
    #[must_use]
    pub fn where_raw(
        mut self, sql: impl Into<String>, bindings: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.wheres.push(Where::Raw {
            sql: sql.into(),
            bindings: bindings.into_iter().map(Into::into).collect(),
            boolean: Boolean::And,
        });
        self
    }

    /// Adds an ORDER BY clause.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(OrderSpec::Column {
            column: column.into(),
            direction,
        });
        self
    }

    /// Adds a descending ORDER BY clause.
    #[must_use]
    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    /// Adds an ORDER BY clause on a raw expression.
    #[must_use]
    pub fn order_by_raw(mut self, sql: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(OrderSpec::Raw {
            sql: sql.into(),
            direction,
        });
        self
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build the SELECT query.
    #[must_use]
    pub fn build(&self) -> Query {
        let mut statement = sea_query::Query::select();

        if self.columns.is_empty() {
            statement.column(Asterisk);
        }
        for column in &self.columns {
            match column {
                Column::Name(reference) => {
                    statement.column(column_ref(&self.table, reference));
                }
                Column::Raw(sql) => {
                    statement.expr(Expr::cust(sql.clone()));
                }
            }
        }

        statement.from(table_ref(&self.table));

        if let Some(filter) = fold(self.wheres.clone(), &self.table) {
            statement.and_where(filter);
        }

        for order in &self.orders {
            match order {
                OrderSpec::Column { column, direction } => {
                    statement.order_by(column_ref(&self.table, column), (*direction).into());
                }
                OrderSpec::Raw { sql, direction } => {
                    statement.order_by_expr(Expr::cust(sql.clone()), (*direction).into());
                }
            }
        }

        if let Some(limit) = self.limit {
            statement.limit(limit);
        }

        if let Some(offset) = self.offset {
            statement.offset(offset);
        }

        let (sql, values) = statement.build(self.grammar);
        self.finish("select", sql, values)
    }

    /// SQL text of the SELECT query.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.build().sql
    }

    /// Build an UPDATE of the matching rows.
    #[must_use]
    pub fn update<I, K, V>(&self, values: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut statement = sea_query::Query::update();
        statement.table(table_ref(&self.table));

        for (column, value) in values {
            let value: Value = value.into();
            statement.value(Alias::new(column), value);
        }

        if let Some(filter) = fold(self.wheres.clone(), &self.table) {
            statement.and_where(filter);
        }

        let (sql, values) = statement.build(self.grammar);
        self.finish("update", sql, values)
    }

    /// Build an INSERT of a single row. An empty row inserts
    /// `DEFAULT VALUES`.
    #[must_use]
    pub fn insert<I, K, V>(&self, values: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut statement = sea_query::Query::insert();
        statement.into_table(table_ref(&self.table));

        let (columns, row): (Vec<Alias>, Vec<SimpleExpr>) = values
            .into_iter()
            .map(|(column, value)| (Alias::new(column), SimpleExpr::Value(value.into())))
            .unzip();

        if columns.is_empty() {
            statement.or_default_values();
        } else {
            statement.columns(columns);
            statement.values_panic(row);
        }

        let (sql, values) = statement.build(self.grammar);
        self.finish("insert", sql, values)
    }

    /// Build a DELETE of the matching rows.
    #[must_use]
    pub fn delete(&self) -> Query {
        let mut statement = sea_query::Query::delete();
        statement.from_table(table_ref(&self.table));

        if let Some(filter) = fold(self.wheres.clone(), &self.table) {
            statement.and_where(filter);
        }

        let (sql, values) = statement.build(self.grammar);
        self.finish("delete", sql, values)
    }

    fn finish(&self, kind: &str, sql: String, values: sea_query::Values) -> Query {
        let values: Vec<Value> = values.into_iter().collect();

        tracing::debug!(
            table = %self.table,
            kind,
            sql = %sql,
            param_count = values.len(),
            "Builder generated SQL"
        );

        Query { sql, values }
    }
}

/// Resolve a column reference against `default_table`.
///
/// `table.column` keeps its table, a bare `column` is qualified with
/// `default_table`, and `*` / `table.*` become asterisks.
#[must_use]
pub fn column_ref(default_table: &str, reference: &str) -> ColumnRef {
    let reference = reference.trim();
    let (table, column) = reference.rsplit_once('.').unwrap_or((default_table, reference));

    if column == "*" {
        let table = table.rsplit_once('.').map_or(table, |(_, table)| table);
        return ColumnRef::TableAsterisk(Alias::new(table).into_iden());
    }
    table_column(table, column)
}

/// A fully qualified `table.column` reference. A `schema.table` qualifier is
/// kept as two identifiers.
#[must_use]
pub fn table_column(table: &str, column: &str) -> ColumnRef {
    let column = Alias::new(column).into_iden();
    match table.rsplit_once('.') {
        Some((schema, table)) => ColumnRef::SchemaTableColumn(
            Alias::new(schema).into_iden(),
            Alias::new(table).into_iden(),
            column,
        ),
        None => ColumnRef::TableColumn(Alias::new(table).into_iden(), column),
    }
}

/// A table name, split into schema and table when it is `schema.table`.
#[must_use]
pub fn table_ref(table: &str) -> TableRef {
    match table.rsplit_once('.') {
        Some((schema, table)) => {
            TableRef::SchemaTable(Alias::new(schema).into_iden(), Alias::new(table).into_iden())
        }
        None => TableRef::Table(Alias::new(table).into_iden()),
    }
}
