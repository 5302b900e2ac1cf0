//! Model and query-builder layer for SQL databases.
//!
//! Provides attribute storage with an explicit accessor registry, a fluent
//! query builder that keeps its select/where/order state inspectable until SQL
//! is generated, and ``SeaQuery``-backed SQL generation.
//!
//! # Quick Start
//!
//! ## Define a Model
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! let users = Arc::new(
//!     ModelDef::new("users")
//!         .class_name("User")
//!         .accessors(Accessors::new().setter("email", lowercase_email)),
//! );
//! ```
//!
//! ## Attributes
//!
//! ```ignore
//! let mut user = Model::with_attributes(&users, [("name", "Ada"), ("email", "ADA@EXAMPLE.COM")]);
//! user.set_attribute("name", "Grace".into());
//! let name: String = user.get("name")?;
//!
//! // Hydrate from a fetched row; mutators are skipped.
//! let user = Model::from_row(&users, row);
//! ```
//!
//! ## Queries
//!
//! ```ignore
//! let query = users
//!     .query()
//!     .r#where("active", true)
//!     .or_where_nested(|q| q.where_null("deleted_at").where_op("logins", Operator::Gt, 10))
//!     .order_by("name", Direction::Asc)
//!     .limit(10)
//!     .build();
//!
//! // Persisting
//! let query = user.save_query(); // UPDATE ... WHERE "users"."id" = $n, or INSERT
//! ```
//!
//! The generated [`Query`] carries SQL text and bound values; executing it is
//! left to the database driver.

mod attributes;
mod builder;
mod filter;
mod model;
mod query;

pub use attributes::{Attributes, FetchValue, Field, HasAttributes, Row, value_to_json};
pub use builder::{Builder, Column, Direction, OrderSpec, column_ref, table_column, table_ref};
pub use filter::{Boolean, Operator, Where};
pub use model::{Accessors, Getter, Model, ModelDef, Setter};
pub use query::{Grammar, GrammarOptions, Query};
// Attribute and parameter values are ``SeaQuery`` values.
pub use sea_query::Value;
