//! Friendly attribute names for `transformable-orm` models.
//!
//! A [`TranslationMap`] declares, per model, which *desired* attribute names
//! application code uses and which *actual* columns store them. Models built
//! from a [`Definition`] read and write through the map, and their queries
//! are rewritten to actual column names just before SQL is generated.
//!
//! # Quick Start
//!
//! ```ignore
//! use transformable::{Definition, TransformableModel, TranslationMap};
//! use transformable_orm::{Direction, HasAttributes, ModelDef};
//!
//! let things = Definition::new(
//!     ModelDef::new("tbl_T"),
//!     TranslationMap::from([("id", "PK_ID"), ("name", "DB_Name")]),
//! );
//!
//! // Stored under `DB_Name`, read back as `name`.
//! let mut thing = TransformableModel::with_attributes(&things, [("name", "widget")]);
//! let name: String = thing.get("name")?;
//!
//! // SELECT * FROM "tbl_T" WHERE "tbl_T"."PK_ID" = $1 ORDER BY "tbl_T"."DB_Name" ASC
//! let sql = things.where_key(1).order_by("name", Direction::Asc).to_sql();
//! ```
//!
//! Names that are not in the map pass through unchanged. Translation never
//! fails; bad references surface as database errors when the SQL runs.

mod builder;
mod column;
mod map;
mod model;

pub use builder::TransformingQueryBuilder;
pub use column::{ColumnReference, extract_column, translate_bare, translate_column};
pub use map::TranslationMap;
pub use model::{Definition, TransformableModel};
