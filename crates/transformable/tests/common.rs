//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use transformable::{Definition, TranslationMap};
use transformable_orm::{Accessors, Attributes, Grammar, ModelDef, Value};

pub const TABLE: &str = "tbl_Database_Table";

// A model addressed by its storage column names.
pub fn actual_model() -> Arc<Definition> {
    Definition::new(
        ModelDef::new(TABLE)
            .primary_key("PK_Database_ID")
            .class_name("ActualDatabaseModel")
            .appends(["DB_Name", "DB_Description", "FK_Foreign_Key_ID"])
            .grammar(Grammar::positional()),
        TranslationMap::new(),
    )
}

// The same table addressed by friendly names.
pub fn desired_model() -> Arc<Definition> {
    Definition::new(
        ModelDef::new(TABLE).class_name("DesiredDatabaseModel").grammar(Grammar::positional()),
        desired_map(),
    )
}

pub fn desired_map() -> TranslationMap {
    TranslationMap::from([
        ("id", "PK_Database_ID"),
        ("name", "DB_Name"),
        ("description", "DB_Description"),
        ("foreign_key_id", "FK_DB_Foreign_Key_ID"),
    ])
}

// Desired model with a setter on a mapped name and a getter on an unmapped one.
pub fn audited_model() -> Arc<Definition> {
    Definition::new(
        ModelDef::new(TABLE)
            .class_name("AuditedModel")
            .accessors(Accessors::new().setter("name", record_name).getter("label", label))
            .grammar(Grammar::positional()),
        desired_map(),
    )
}

fn record_name(attributes: &mut Attributes, value: Value) {
    attributes.set("name_changed", true);
    attributes.set("name", value);
}

fn label(attributes: &Attributes, _value: Option<Value>) -> Option<Value> {
    let Some(Value::String(Some(name))) = attributes.get("DB_Name") else {
        return None;
    };
    Some(Value::from(format!("#{name}")))
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier quotes and grouping
/// parentheses, then normalizing whitespace. Preserves string literals.
fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '"' | '(' | ')' if !in_single_quote => {
                // Strip identifier quoting and precedence parentheses to avoid brittle comparisons.
            }
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// This helper normalizes SQL to avoid brittle exact-string matching with ``SeaQuery`` output.
/// It strips identifier quotes and parentheses, normalizes whitespace, and checks that
/// fragments appear sequentially in the generated SQL.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            use std::io::Write;
            let mut stderr = std::io::stderr();
            writeln!(stderr, "*** fragment-canonical: {fragment_canonical}").unwrap();
            writeln!(stderr, "*** actual-canonical-sql: {actual_canonical}").unwrap();
            stderr.flush().unwrap();

            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}

/// Assert that SQL does not contain a fragment anywhere.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_excludes(actual: &str, fragment: &str) {
    let actual_canonical = canonicalize_sql(actual);
    let fragment_canonical = canonicalize_sql(fragment);
    assert!(
        !actual_canonical.contains(&fragment_canonical),
        "unexpected SQL fragment `{fragment_canonical}` found in `{actual_canonical}`"
    );
}
