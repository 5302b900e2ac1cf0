use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use fromenv::FromEnv;
use sea_query::backend::{
    EscapeBuilder, OperLeftAssocDecider, PrecedenceDecider, QuotedBuilder, TableRefBuilder,
};
use sea_query::prepare::SqlWriter;
use sea_query::{BinOper, Oper, Quote, SimpleExpr, SubQueryStatement, Value};

/// A generated SQL statement together with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text with placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub values: Vec<Value>,
}

/// SQL grammar used to serialise builder state.
///
/// Identifiers are always double-quoted; the placeholder style is the only
/// dialect difference the builders care about.
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    /// Identifier quote.
    pub quote: Quote,
    /// "?" or "$"
    pub placeholder: &'static str,
    /// false for "?", true for "$1, $2, ..."
    pub numbered: bool,
}

impl Default for Grammar {
    // should work for `Postgres` and `Sqlite`
    fn default() -> Self {
        Self::numbered()
    }
}

impl Grammar {
    /// Postgres-style numbered placeholders (`$1`, `$2`, ...).
    #[must_use]
    pub fn numbered() -> Self {
        Self {
            quote: Quote::new(b'"'),
            placeholder: "$",
            numbered: true,
        }
    }

    /// Positional placeholders (`?`).
    #[must_use]
    pub fn positional() -> Self {
        Self {
            quote: Quote::new(b'"'),
            placeholder: "?",
            numbered: false,
        }
    }

    /// The grammar selected by `ORM_SQL_PLACEHOLDER`, numbered when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the options cannot be loaded or name an unknown
    /// placeholder style.
    pub fn from_env() -> Result<Self> {
        Self::try_from(&GrammarOptions::load()?)
    }
}

/// Grammar options loaded from environment variables.
#[derive(Debug, Clone, FromEnv)]
pub struct GrammarOptions {
    /// Placeholder style: `$` for numbered or `?` for positional.
    #[env(from = "ORM_SQL_PLACEHOLDER", default = "$")]
    pub placeholder: String,
}

impl GrammarOptions {
    /// Load grammar options from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variables cannot be read.
    pub fn load() -> Result<Self> {
        Self::from_env().finalize().context("issue loading grammar options")
    }
}

impl TryFrom<&GrammarOptions> for Grammar {
    type Error = anyhow::Error;

    fn try_from(options: &GrammarOptions) -> Result<Self> {
        match options.placeholder.trim() {
            "$" => Ok(Self::numbered()),
            "?" => Ok(Self::positional()),
            other => bail!("unsupported placeholder style '{other}'; expected '$' or '?'"),
        }
    }
}

impl QuotedBuilder for Grammar {
    fn quote(&self) -> Quote {
        self.quote
    }
}

impl EscapeBuilder for Grammar {}

impl TableRefBuilder for Grammar {}

impl OperLeftAssocDecider for Grammar {
    fn well_known_left_associative(&self, op: &BinOper) -> bool {
        // same set as sea-query 0.32 `common_well_known_left_associative`
        matches!(
            op,
            BinOper::And | BinOper::Or | BinOper::Add | BinOper::Sub | BinOper::Mul | BinOper::Mod
        )
    }
}

impl PrecedenceDecider for Grammar {
    fn inner_expr_well_known_greater_precedence(
        &self, inner: &SimpleExpr, outer_oper: &Oper,
    ) -> bool {
        match inner {
            SimpleExpr::Column(_)
            | SimpleExpr::Value(_)
            | SimpleExpr::Constant(_)
            | SimpleExpr::Keyword(_)
            | SimpleExpr::Tuple(_)
            | SimpleExpr::FunctionCall(_) => true,
            // a single predicate binds tighter than AND / OR; groups keep
            // their parentheses
            SimpleExpr::Binary(_, op, _) => {
                !matches!(op, BinOper::And | BinOper::Or)
                    && matches!(outer_oper, Oper::BinOper(BinOper::And | BinOper::Or))
            }
            _ => false,
        }
    }
}

impl sea_query::backend::QueryBuilder for Grammar {
    fn prepare_query_statement(&self, query: &SubQueryStatement, sql: &mut dyn SqlWriter) {
        match query {
            SubQueryStatement::SelectStatement(s) => self.prepare_select_statement(s, sql),
            SubQueryStatement::InsertStatement(s) => self.prepare_insert_statement(s, sql),
            SubQueryStatement::UpdateStatement(s) => self.prepare_update_statement(s, sql),
            SubQueryStatement::DeleteStatement(s) => self.prepare_delete_statement(s, sql),
            SubQueryStatement::WithStatement(s) => self.prepare_with_query(s, sql),
        }
    }

    fn prepare_value(&self, value: &Value, sql: &mut dyn SqlWriter) {
        sql.push_param(value.clone(), self);
    }

    fn placeholder(&self) -> (&str, bool) {
        (self.placeholder, self.numbered)
    }

    fn insert_default_values(&self, _num_rows: u32, sql: &mut dyn SqlWriter) {
        // writing into the statement buffer cannot fail
        let _ = sql.write_str("DEFAULT VALUES");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_from_options() {
        let options = GrammarOptions {
            placeholder: "?".to_string(),
        };
        let grammar = Grammar::try_from(&options).unwrap();
        assert_eq!(grammar.placeholder, "?");
        assert!(!grammar.numbered);

        let options = GrammarOptions {
            placeholder: " $ ".to_string(),
        };
        let grammar = Grammar::try_from(&options).unwrap();
        assert_eq!(grammar.placeholder, "$");
        assert!(grammar.numbered);
    }

    #[test]
    fn grammar_rejects_unknown_placeholder() {
        let options = GrammarOptions {
            placeholder: ":".to_string(),
        };
        let err = Grammar::try_from(&options).unwrap_err();
        assert!(err.to_string().contains("unsupported placeholder style"));
    }
}
