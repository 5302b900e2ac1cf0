//! Integration tests for WHERE predicates.
//!
//! Tests the public API as users would interact with it.

#![allow(missing_docs)]

mod common;

use common::{assert_sql_contains, users};
use transformable_orm::{Boolean, Operator, Value, Where};

#[test]
fn filter_like_pattern() {
    let query = users().query().where_like("name", "%john%").build();

    assert_sql_contains(&query.sql, &["WHERE", "users.name", "LIKE", "$1"]);
    assert_eq!(query.values, vec![Value::from("%john%")]);
}

#[test]
fn filter_between_values() {
    let query = users().query().where_between("id", 1, 100).build();

    assert_sql_contains(&query.sql, &["WHERE", "users.id", "BETWEEN", "$1", "AND", "$2"]);
    assert_eq!(query.values, vec![Value::from(1), Value::from(100)]);
}

#[test]
fn filter_in_and_not_in() {
    let query = users().query().where_in("id", [1, 2]).where_not_in("role", ["guest"]).build();

    assert_sql_contains(
        &query.sql,
        &["WHERE users.id IN $1, $2 AND users.role NOT IN $3"],
    );
    assert_eq!(query.values.len(), 3);
}

#[test]
fn filter_null_checks() {
    let query = users().query().where_null("deleted_at").where_not_null("email").build();

    assert_sql_contains(
        &query.sql,
        &["WHERE users.deleted_at IS NULL AND users.email IS NOT NULL"],
    );
    assert!(query.values.is_empty());
}

#[test]
fn filter_comparison_operators() {
    let query = users()
        .query()
        .where_op("a", Operator::Ne, 1)
        .where_op("b", Operator::Lt, 2)
        .or_where_op("c", Operator::Lte, 3)
        .build();

    assert_sql_contains(&query.sql, &["users.a <> $1 AND users.b < $2 OR users.c <= $3"]);
}

#[test]
fn filter_raw_fragment() {
    let query = users().query().where_raw("1 = 1", Vec::<Value>::new()).r#where("id", 5).build();

    assert_sql_contains(&query.sql, &["WHERE 1 = 1 AND users.id = $1"]);
    assert_eq!(query.values, vec![Value::from(5)]);
}

#[test]
fn filter_state_records_connectors() {
    let builder = users().query().r#where("id", 1).or_where("name", "x");
    let wheres = builder.wheres();

    assert_eq!(wheres.len(), 2);
    assert_eq!(wheres[0].boolean(), Boolean::And);
    assert_eq!(wheres[1].boolean(), Boolean::Or);
    assert!(matches!(
        &wheres[1],
        Where::Basic { column, operator: Operator::Eq, .. } if column == "name"
    ));
}
