use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use heck::ToSnakeCase;
use sea_query::Value;

use crate::attributes::{Attributes, HasAttributes, Row};
use crate::builder::Builder;
use crate::query::{Grammar, Query};

/// Custom read accessor: receives the stored attributes and the raw value.
pub type Getter = fn(&Attributes, Option<Value>) -> Option<Value>;

/// Custom write mutator: stores (a transformation of) the value itself.
pub type Setter = fn(&mut Attributes, Value);

/// Registry of custom accessors, built once when a model is defined.
#[derive(Clone, Default)]
pub struct Accessors {
    getters: HashMap<String, Getter>,
    setters: HashMap<String, Setter>,
}

impl Accessors {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a getter for `key`.
    #[must_use]
    pub fn getter(mut self, key: impl Into<String>, getter: Getter) -> Self {
        self.getters.insert(key.into(), getter);
        self
    }

    /// Registers a setter for `key`.
    #[must_use]
    pub fn setter(mut self, key: impl Into<String>, setter: Setter) -> Self {
        self.setters.insert(key.into(), setter);
        self
    }

    /// The getter registered for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Getter> {
        self.getters.get(key).copied()
    }

    /// The setter registered for `key`.
    #[must_use]
    pub fn set(&self, key: &str) -> Option<Setter> {
        self.setters.get(key).copied()
    }
}

impl fmt::Debug for Accessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessors")
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Static description of a model: where it lives and how it is accessed.
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Storage table.
    pub table: String,
    /// Primary key attribute name.
    pub primary_key: String,
    /// Model name, used to derive foreign key names.
    pub class_name: String,
    /// Custom accessors.
    pub accessors: Accessors,
    /// Attributes exposed on serialisation. Empty exposes every stored attribute.
    pub visible: Vec<String>,
    /// Computed attributes added on serialisation.
    pub appends: Vec<String>,
    /// Grammar used by this model's queries.
    pub grammar: Grammar,
}

impl ModelDef {
    /// Creates a definition for `table` with an `id` primary key.
    ///
    /// The class name defaults to the table name.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            class_name: table.clone(),
            table,
            primary_key: "id".to_string(),
            accessors: Accessors::default(),
            visible: Vec::new(),
            appends: Vec::new(),
            grammar: Grammar::default(),
        }
    }

    /// Like [`ModelDef::new`], with the grammar chosen by the environment
    /// (see [`Grammar::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar options are invalid.
    pub fn from_env(table: impl Into<String>) -> Result<Self> {
        Ok(Self::new(table).grammar(Grammar::from_env()?))
    }

    /// Sets the primary key name.
    #[must_use]
    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    /// Sets the class name used for foreign key derivation.
    #[must_use]
    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    /// Sets the accessor registry.
    #[must_use]
    pub fn accessors(mut self, accessors: Accessors) -> Self {
        self.accessors = accessors;
        self
    }

    /// Sets the visible attribute list.
    #[must_use]
    pub fn visible<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visible = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the appended attribute list.
    #[must_use]
    pub fn appends<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.appends = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the SQL grammar.
    #[must_use]
    pub const fn grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// A fresh query builder for this model's table.
    #[must_use]
    pub fn query(&self) -> Builder {
        Builder::new(self.table.clone(), self.grammar)
    }

    /// `table.column`
    #[must_use]
    pub fn qualify_column(&self, column: &str) -> String {
        format!("{}.{column}", self.table)
    }

    /// A query constrained to the row with primary key `id`.
    #[must_use]
    pub fn where_key(&self, id: impl Into<Value>) -> Builder {
        self.query().r#where(self.qualify_column(&self.primary_key), id)
    }

    /// The conventional foreign key other tables use to refer to this model.
    #[must_use]
    pub fn foreign_key(&self) -> String {
        format!("{}_{}", self.class_name.to_snake_case(), self.primary_key)
    }
}

/// A single model instance backed by a [`ModelDef`].
#[derive(Debug, Clone)]
pub struct Model {
    def: Arc<ModelDef>,
    attributes: Attributes,
    original: Attributes,
    exists: bool,
}

impl Model {
    /// Creates an empty, unsaved model.
    #[must_use]
    pub fn new(def: &Arc<ModelDef>) -> Self {
        Self {
            def: Arc::clone(def),
            attributes: Attributes::new(),
            original: Attributes::new(),
            exists: false,
        }
    }

    /// Creates an unsaved model, assigning `attributes` through the mutators.
    #[must_use]
    pub fn with_attributes<I, K, V>(def: &Arc<ModelDef>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut model = Self::new(def);
        model.fill(attributes);
        model
    }

    /// Hydrates a persisted model from a fetched row without running mutators.
    #[must_use]
    pub fn from_row(def: &Arc<ModelDef>, row: Row) -> Self {
        let attributes: Attributes =
            row.fields.into_iter().map(|field| (field.name, field.value)).collect();
        Self {
            def: Arc::clone(def),
            original: attributes.clone(),
            attributes,
            exists: true,
        }
    }

    /// The model definition.
    #[must_use]
    pub fn def(&self) -> &ModelDef {
        &self.def
    }

    /// Raw stored attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Whether the model was loaded from storage.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// The storage table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.def.table
    }

    /// The primary key attribute name.
    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.def.primary_key
    }

    /// The primary key value.
    #[must_use]
    pub fn key(&self) -> Option<Value> {
        self.get_attribute(self.key_name())
    }

    /// The conventional foreign key other tables use to refer to this model.
    #[must_use]
    pub fn foreign_key(&self) -> String {
        self.def.foreign_key()
    }

    /// `table.column`
    #[must_use]
    pub fn qualify_column(&self, column: &str) -> String {
        self.def.qualify_column(column)
    }

    /// Whether a getter is registered for `key`.
    #[must_use]
    pub fn has_get_mutator(&self, key: &str) -> bool {
        self.def.accessors.get(key).is_some()
    }

    /// Whether a setter is registered for `key`.
    #[must_use]
    pub fn has_set_mutator(&self, key: &str) -> bool {
        self.def.accessors.set(key).is_some()
    }

    /// Run the getter for `key` over `value`.
    #[must_use]
    pub fn mutate_attribute(&self, key: &str, value: Option<Value>) -> Option<Value> {
        match self.def.accessors.get(key) {
            Some(getter) => getter(&self.attributes, value),
            None => value,
        }
    }

    /// A fresh query builder for this model's table.
    #[must_use]
    pub fn new_query(&self) -> Builder {
        self.def.query()
    }

    /// Constrain `query` to this model's row.
    #[must_use]
    pub fn set_keys_for_save_query(&self, query: Builder) -> Builder {
        query.r#where(self.key_name(), self.key_for_save_query(self.key_name()))
    }

    /// The key value as it was loaded, falling back to the current value.
    ///
    /// `column` is the storage name of the primary key.
    #[must_use]
    pub fn key_for_save_query(&self, column: &str) -> Value {
        self.original
            .get(column)
            .or_else(|| self.attributes.get(column))
            .cloned()
            .unwrap_or(Value::Int(None))
    }

    /// Attributes changed since the model was loaded.
    #[must_use]
    pub fn dirty(&self) -> Attributes {
        self.attributes
            .iter()
            .filter(|(key, value)| self.original.get(key) != Some(*value))
            .map(|(key, value)| (key, value.clone()))
            .collect()
    }

    /// Whether any attribute changed since the model was loaded.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty().is_empty()
    }

    /// Mark the current attributes as persisted.
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
        self.exists = true;
    }

    /// The statement that would persist this model.
    ///
    /// Persisted models produce an UPDATE of their dirty attributes, keyed by
    /// the primary key; new models produce an INSERT of every attribute.
    #[must_use]
    pub fn save_query(&self) -> Query {
        if self.exists {
            self.set_keys_for_save_query(self.new_query()).update(self.dirty())
        } else {
            self.new_query().insert(self.attributes.clone())
        }
    }

    /// The statement that would delete this model.
    #[must_use]
    pub fn delete_query(&self) -> Query {
        self.set_keys_for_save_query(self.new_query()).delete()
    }
}

impl HasAttributes for Model {
    fn get_attribute(&self, key: &str) -> Option<Value> {
        let value = self.attributes.get(key).cloned();
        if self.has_get_mutator(key) { self.mutate_attribute(key, value) } else { value }
    }

    fn set_attribute(&mut self, key: &str, value: Value) {
        match self.def.accessors.set(key) {
            Some(setter) => setter(&mut self.attributes, value),
            None => self.attributes.set(key, value),
        }
    }

    fn visible_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = if self.def.visible.is_empty() {
            self.attributes.keys().map(ToString::to_string).collect()
        } else {
            self.def.visible.clone()
        };
        for key in &self.def.appends {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(attributes: &mut Attributes, value: Value) {
        let value = match value {
            Value::String(Some(s)) => Value::from(s.to_uppercase()),
            other => other,
        };
        attributes.set("name", value);
    }

    fn greeting(attributes: &Attributes, _value: Option<Value>) -> Option<Value> {
        let name = attributes.get("name")?;
        let Value::String(Some(name)) = name else {
            return None;
        };
        Some(Value::from(format!("Hello, {name}")))
    }

    fn def() -> Arc<ModelDef> {
        Arc::new(
            ModelDef::new("users")
                .class_name("BlogUser")
                .accessors(Accessors::new().setter("name", upper).getter("greeting", greeting))
                .appends(["greeting"]),
        )
    }

    #[test]
    fn setters_and_getters_run() {
        let model = Model::with_attributes(&def(), [("name", "ada")]);
        assert_eq!(model.attributes().get("name"), Some(&Value::from("ADA")));
        assert_eq!(model.get_attribute("greeting"), Some(Value::from("Hello, ADA")));
        assert!(model.has_set_mutator("name"));
        assert!(!model.has_get_mutator("name"));
    }

    #[test]
    fn foreign_key_is_derived_from_class_name() {
        let model = Model::new(&def());
        assert_eq!(model.foreign_key(), "blog_user_id");
        assert_eq!(model.qualify_column("name"), "users.name");
    }

    #[test]
    fn hydrated_models_are_clean() {
        let row: Row = [("id", Value::from(1)), ("name", Value::from("ADA"))].into_iter().collect();
        let mut model = Model::from_row(&def(), row);
        assert!(model.exists());
        assert!(!model.is_dirty());

        model.set_attribute("name", Value::from("grace"));
        assert!(model.is_dirty());
        assert_eq!(model.dirty().keys().collect::<Vec<_>>(), vec!["name"]);

        model.sync_original();
        assert!(!model.is_dirty());
    }

    #[test]
    fn visible_keys_include_appends() {
        let model = Model::with_attributes(&def(), [("name", "ada")]);
        assert_eq!(model.visible_keys(), vec!["name".to_string(), "greeting".to_string()]);
        assert_eq!(
            model.to_json(),
            serde_json::json!({"name": "ADA", "greeting": "Hello, ADA"})
        );
    }
}
