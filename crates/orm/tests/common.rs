//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use transformable_orm::{Accessors, Attributes, Grammar, ModelDef, Value};

// Common test models used across multiple test files

pub fn users() -> Arc<ModelDef> {
    Arc::new(ModelDef::new("users").class_name("User"))
}

pub fn items() -> Arc<ModelDef> {
    Arc::new(ModelDef::new("items").class_name("Item").grammar(Grammar::positional()))
}

pub fn accounts() -> Arc<ModelDef> {
    Arc::new(
        ModelDef::new("accounts")
            .primary_key("account_id")
            .class_name("BankAccount")
            .accessors(Accessors::new().setter("email", lowercase_email).getter("domain", domain))
            .visible(["account_id", "email"])
            .appends(["domain"]),
    )
}

fn lowercase_email(attributes: &mut Attributes, value: Value) {
    let value = match value {
        Value::String(Some(email)) => Value::from(email.to_lowercase()),
        other => other,
    };
    attributes.set("email", value);
}

fn domain(attributes: &Attributes, _value: Option<Value>) -> Option<Value> {
    let Some(Value::String(Some(email))) = attributes.get("email") else {
        return None;
    };
    email.split_once('@').map(|(_, domain)| Value::from(domain))
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
