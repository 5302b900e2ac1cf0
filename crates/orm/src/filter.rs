use sea_query::{Expr, ExprTrait, SimpleExpr, Value};

use crate::builder::column_ref;

/// Connector joining a predicate to the predicates before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    /// `... AND predicate`
    #[default]
    And,
    /// `... OR predicate`
    Or,
}

/// Comparison operator for a basic predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// column = value
    #[default]
    Eq,
    /// column != value
    Ne,
    /// column > value
    Gt,
    /// column >= value
    Gte,
    /// column < value
    Lt,
    /// column <= value
    Lte,
}

/// One entry in a builder's WHERE list.
///
/// Every variant except [`Where::Nested`] and [`Where::Raw`] carries a
/// `column` reference, which may be bare (`name`) or table-qualified
/// (`table.name`).
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// column <op> value
    Basic {
        /// Column reference.
        column: String,
        /// Comparison operator.
        operator: Operator,
        /// Bound value.
        value: Value,
        /// Connector to the previous predicate.
        boolean: Boolean,
    },
    /// column [NOT] IN (values)
    In {
        /// Column reference.
        column: String,
        /// Candidate values.
        values: Vec<Value>,
        /// NOT IN when true.
        negated: bool,
        /// Connector to the previous predicate.
        boolean: Boolean,
    },
    /// column IS [NOT] NULL
    Null {
        /// Column reference.
        column: String,
        /// IS NOT NULL when true.
        negated: bool,
        /// Connector to the previous predicate.
        boolean: Boolean,
    },
    /// column [NOT] BETWEEN low AND high
    Between {
        /// Column reference.
        column: String,
        /// Lower bound.
        low: Value,
        /// Upper bound.
        high: Value,
        /// NOT BETWEEN when true.
        negated: bool,
        /// Connector to the previous predicate.
        boolean: Boolean,
    },
    /// column [NOT] LIKE pattern
    Like {
        /// Column reference.
        column: String,
        /// LIKE pattern.
        pattern: String,
        /// NOT LIKE when true.
        negated: bool,
        /// Connector to the previous predicate.
        boolean: Boolean,
    },
    /// A parenthesised group of predicates.
    Nested {
        /// Grouped predicates.
        wheres: Vec<Self>,
        /// Connector to the previous predicate.
        boolean: Boolean,
    },
    /// A raw SQL fragment with its bindings.
    Raw {
        /// SQL fragment.
        sql: String,
        /// Values bound to the fragment's placeholders.
        bindings: Vec<Value>,
        /// Connector to the previous predicate.
        boolean: Boolean,
    },
}

impl Where {
    /// The column slot of this predicate, if it has one.
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Basic { column, .. }
            | Self::In { column, .. }
            | Self::Null { column, .. }
            | Self::Between { column, .. }
            | Self::Like { column, .. } => Some(column),
            Self::Nested { .. } | Self::Raw { .. } => None,
        }
    }

    /// The connector to the previous predicate.
    #[must_use]
    pub const fn boolean(&self) -> Boolean {
        match self {
            Self::Basic { boolean, .. }
            | Self::In { boolean, .. }
            | Self::Null { boolean, .. }
            | Self::Between { boolean, .. }
            | Self::Like { boolean, .. }
            | Self::Nested { boolean, .. }
            | Self::Raw { boolean, .. } => *boolean,
        }
    }

    /// Rewrite every column slot with `f`, descending into nested groups.
    ///
    /// Operators, values, connectors and grouping are left as they are. Raw
    /// fragments are never touched.
    #[must_use]
    pub fn map_columns(self, f: &impl Fn(&str) -> String) -> Self {
        match self {
            Self::Basic {
                column,
                operator,
                value,
                boolean,
            } => Self::Basic {
                column: f(&column),
                operator,
                value,
                boolean,
            },
            Self::In {
                column,
                values,
                negated,
                boolean,
            } => Self::In {
                column: f(&column),
                values,
                negated,
                boolean,
            },
            Self::Null {
                column,
                negated,
                boolean,
            } => Self::Null {
                column: f(&column),
                negated,
                boolean,
            },
            Self::Between {
                column,
                low,
                high,
                negated,
                boolean,
            } => Self::Between {
                column: f(&column),
                low,
                high,
                negated,
                boolean,
            },
            Self::Like {
                column,
                pattern,
                negated,
                boolean,
            } => Self::Like {
                column: f(&column),
                pattern,
                negated,
                boolean,
            },
            Self::Nested { wheres, boolean } => Self::Nested {
                wheres: wheres.into_iter().map(|w| w.map_columns(f)).collect(),
                boolean,
            },
            raw @ Self::Raw { .. } => raw,
        }
    }

    /// Convert the predicate to a ``SeaQuery`` ``SimpleExpr``, qualifying bare
    /// columns with `default_table`.
    #[must_use]
    pub fn into_expr(self, default_table: &str) -> SimpleExpr {
        match self {
            Self::Basic {
                column,
                operator,
                value,
                ..
            } => {
                let col = resolve_column(default_table, &column);
                match operator {
                    Operator::Eq => col.eq(value),
                    Operator::Ne => col.ne(value),
                    Operator::Gt => col.gt(value),
                    Operator::Gte => col.gte(value),
                    Operator::Lt => col.lt(value),
                    Operator::Lte => col.lte(value),
                }
            }
            Self::In {
                column,
                values,
                negated,
                ..
            } => {
                let col = resolve_column(default_table, &column);
                if negated { col.is_not_in(values) } else { col.is_in(values) }
            }
            Self::Null {
                column, negated, ..
            } => {
                let col = resolve_column(default_table, &column);
                if negated { col.is_not_null() } else { col.is_null() }
            }
            Self::Between {
                column,
                low,
                high,
                negated,
                ..
            } => {
                let col = resolve_column(default_table, &column);
                if negated { col.not_between(low, high) } else { col.between(low, high) }
            }
            Self::Like {
                column,
                pattern,
                negated,
                ..
            } => {
                let col = resolve_column(default_table, &column);
                if negated { col.not_like(pattern) } else { col.like(pattern) }
            }
            Self::Nested { wheres, .. } => {
                // an empty group is satisfied by every row
                fold(wheres, default_table).unwrap_or_else(|| Expr::value(true))
            }
            Self::Raw { sql, bindings, .. } => Expr::cust_with_values(sql, bindings),
        }
    }
}

/// Fold predicates left to right using each entry's connector.
///
/// The connector of the first predicate is ignored. Returns `None` when
/// `wheres` is empty.
pub fn fold(wheres: Vec<Where>, default_table: &str) -> Option<SimpleExpr> {
    let mut wheres = wheres.into_iter();
    let first = wheres.next()?.into_expr(default_table);
    Some(wheres.fold(first, |acc, predicate| match predicate.boolean() {
        Boolean::And => acc.and(predicate.into_expr(default_table)),
        Boolean::Or => acc.or(predicate.into_expr(default_table)),
    }))
}

fn resolve_column(default_table: &str, column: &str) -> SimpleExpr {
    Expr::col(column_ref(default_table, column)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_slot() {
        let basic = Where::Basic {
            column: "name".to_string(),
            operator: Operator::Eq,
            value: "x".into(),
            boolean: Boolean::Or,
        };
        assert_eq!(basic.column(), Some("name"));
        assert_eq!(basic.boolean(), Boolean::Or);

        let raw = Where::Raw {
            sql: "1 = 1".to_string(),
            bindings: Vec::new(),
            boolean: Boolean::And,
        };
        assert_eq!(raw.column(), None);
    }

    #[test]
    fn map_columns_preserves_structure() {
        let nested = Where::Nested {
            wheres: vec![
                Where::Null {
                    column: "a".to_string(),
                    negated: true,
                    boolean: Boolean::And,
                },
                Where::Raw {
                    sql: "a = ?".to_string(),
                    bindings: vec![1.into()],
                    boolean: Boolean::Or,
                },
            ],
            boolean: Boolean::Or,
        };

        let mapped = nested.map_columns(&|c: &str| c.to_uppercase());
        let Where::Nested { wheres, boolean } = mapped else {
            panic!("expected nested group");
        };
        assert_eq!(boolean, Boolean::Or);
        assert_eq!(wheres[0].column(), Some("A"));
        assert!(matches!(&wheres[1], Where::Raw { sql, .. } if sql == "a = ?"));
    }

    #[test]
    fn fold_empty() {
        assert!(fold(Vec::new(), "users").is_none());
    }
}
