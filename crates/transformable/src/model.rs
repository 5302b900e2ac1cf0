use std::sync::Arc;

use transformable_orm::{Attributes, HasAttributes, Model, ModelDef, Query, Row, Value};

use crate::builder::TransformingQueryBuilder;
use crate::column::translate_column;
use crate::map::TranslationMap;

/// A model definition paired with its translation map.
///
/// The definition's primary key and visible/appended attribute lists are
/// expressed in desired names.
#[derive(Debug)]
pub struct Definition {
    model: Arc<ModelDef>,
    map: Arc<TranslationMap>,
}

impl Definition {
    /// Pairs `model` with `map`.
    ///
    /// When `model` declares no visible or appended attributes, both default
    /// to the map's desired names so that serialisation exposes them.
    #[must_use]
    pub fn new(mut model: ModelDef, map: TranslationMap) -> Arc<Self> {
        if !map.is_invertible() {
            tracing::warn!(
                table = %model.table,
                "translation map sends several desired names to one column"
            );
        }

        let desired: Vec<String> = map.desired_names().map(ToString::to_string).collect();
        if model.visible.is_empty() {
            model.visible.clone_from(&desired);
        }
        if model.appends.is_empty() {
            model.appends = desired;
        }

        Arc::new(Self {
            model: Arc::new(model),
            map: Arc::new(map),
        })
    }

    /// The underlying model definition.
    #[must_use]
    pub const fn model_def(&self) -> &Arc<ModelDef> {
        &self.model
    }

    /// The translation map.
    #[must_use]
    pub const fn translation_map(&self) -> &Arc<TranslationMap> {
        &self.map
    }

    /// A fresh translating builder for this model's table.
    #[must_use]
    pub fn query(&self) -> TransformingQueryBuilder {
        TransformingQueryBuilder::new(self.model.query())
            .with_translation_map(Arc::clone(&self.map))
    }

    /// A query constrained to the row with primary key `id`.
    #[must_use]
    pub fn where_key(&self, id: impl Into<Value>) -> TransformingQueryBuilder {
        self.query().r#where(self.model.primary_key.clone(), id)
    }

    /// A query constrained to the rows whose primary key is in `ids`.
    #[must_use]
    pub fn where_key_in(
        &self, ids: impl IntoIterator<Item = impl Into<Value>>,
    ) -> TransformingQueryBuilder {
        self.query().where_in(self.model.primary_key.clone(), ids)
    }
}

/// A model addressed by desired names and stored by actual column names.
#[derive(Debug, Clone)]
pub struct TransformableModel {
    def: Arc<Definition>,
    base: Model,
}

impl TransformableModel {
    /// Creates an empty, unsaved model.
    #[must_use]
    pub fn new(def: &Arc<Definition>) -> Self {
        Self {
            def: Arc::clone(def),
            base: Model::new(&def.model),
        }
    }

    /// Creates an unsaved model, assigning `attributes` by desired name.
    #[must_use]
    pub fn with_attributes<I, K, V>(def: &Arc<Definition>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut model = Self::new(def);
        model.fill(attributes);
        model
    }

    /// Hydrates a persisted model from a row whose fields carry actual column
    /// names.
    #[must_use]
    pub fn from_row(def: &Arc<Definition>, row: Row) -> Self {
        Self {
            def: Arc::clone(def),
            base: Model::from_row(&def.model, row),
        }
    }

    /// The underlying model, keyed by actual names.
    #[must_use]
    pub const fn base(&self) -> &Model {
        &self.base
    }

    /// The translation map.
    #[must_use]
    pub fn translation_map(&self) -> &TranslationMap {
        &self.def.map
    }

    /// Whether the model was loaded from storage.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.base.exists()
    }

    /// Whether any attribute changed since the model was loaded.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.base.is_dirty()
    }

    /// Mark the current attributes as persisted.
    pub fn sync_original(&mut self) {
        self.base.sync_original();
    }

    /// Whether reading `key` is intercepted, either by the map or by a getter.
    #[must_use]
    pub fn has_get_mutator(&self, key: &str) -> bool {
        self.def.map.contains(key) || self.base.has_get_mutator(key)
    }

    /// Whether writing `key` is intercepted, either by the map or by a setter.
    #[must_use]
    pub fn has_set_mutator(&self, key: &str) -> bool {
        self.def.map.contains(key) || self.base.has_set_mutator(key)
    }

    /// Resolve the value read for `key`.
    ///
    /// A desired name reads whatever is stored under its actual column;
    /// `value` is ignored. Other keys go through the base getter.
    #[must_use]
    pub fn mutate_attribute(&self, key: &str, value: Option<Value>) -> Option<Value> {
        match self.def.map.get(key) {
            Some(actual) => self.base.get_attribute(actual),
            None => self.base.mutate_attribute(key, value),
        }
    }

    /// The primary key as declared (a desired name).
    #[must_use]
    pub fn key_name(&self) -> &str {
        self.base.key_name()
    }

    /// The primary key's storage column.
    #[must_use]
    pub fn translated_key_name(&self) -> &str {
        self.def.map.actual_name(self.base.key_name())
    }

    /// The primary key value.
    #[must_use]
    pub fn key(&self) -> Option<Value> {
        self.get_attribute(self.key_name())
    }

    /// The foreign key other tables use to refer to this model.
    ///
    /// A mapped primary key is referred to by its storage column; otherwise
    /// the name is derived from the class name.
    #[must_use]
    pub fn foreign_key(&self) -> String {
        match self.def.map.get(self.key_name()) {
            Some(actual) => actual.to_string(),
            None => self.base.foreign_key(),
        }
    }

    /// `table.column`, with `column` stripped of any qualifier and translated.
    #[must_use]
    pub fn qualify_column(&self, column: &str) -> String {
        translate_column(&self.def.map, self.base.table(), column)
    }

    /// A fresh translating builder for this model's table.
    #[must_use]
    pub fn new_query(&self) -> TransformingQueryBuilder {
        TransformingQueryBuilder::new(self.base.new_query())
            .with_translation_map(Arc::clone(&self.def.map))
    }

    /// Constrain `query` to this model's row, comparing the primary key's
    /// storage column.
    #[must_use]
    pub fn set_keys_for_save_query(
        &self, query: TransformingQueryBuilder,
    ) -> TransformingQueryBuilder {
        let column = self.translated_key_name();
        query.r#where(column, self.base.key_for_save_query(column))
    }

    /// The statement that would persist this model.
    #[must_use]
    pub fn save_query(&self) -> Query {
        if self.exists() {
            let dirty = self.storable(self.base.dirty());
            self.set_keys_for_save_query(self.new_query()).update(dirty)
        } else {
            self.new_query().insert(self.storable(self.base.attributes().clone()))
        }
    }

    /// The statement that would delete this model.
    #[must_use]
    pub fn delete_query(&self) -> Query {
        self.set_keys_for_save_query(self.new_query()).delete()
    }

    /// Stored attributes renamed to desired names where a mapping exists.
    #[must_use]
    pub fn transformed_attributes(&self) -> Attributes {
        let inverse = self.def.map.inverse();
        self.base
            .attributes()
            .iter()
            .map(|(key, value)| (inverse.get(key).copied().unwrap_or(key), value.clone()))
            .collect()
    }

    // Drops values a custom setter stored under a desired name; only actual
    // columns are written.
    fn storable(&self, attributes: Attributes) -> Attributes {
        attributes
            .into_iter()
            .filter(|(key, _)| self.def.map.get(key).is_none_or(|actual| actual == key.as_str()))
            .collect()
    }
}

impl HasAttributes for TransformableModel {
    fn get_attribute(&self, key: &str) -> Option<Value> {
        if self.def.map.contains(key) {
            self.mutate_attribute(key, None)
        } else {
            self.base.get_attribute(key)
        }
    }

    fn set_attribute(&mut self, key: &str, value: Value) {
        let Some(actual) = self.def.map.get(key) else {
            self.base.set_attribute(key, value);
            return;
        };

        // a setter declared for the desired name still runs for its side effects
        if self.base.has_set_mutator(key) {
            self.base.set_attribute(key, value.clone());
        }
        self.base.set_attribute(actual, value);
    }

    fn visible_keys(&self) -> Vec<String> {
        self.base.visible_keys()
    }
}
