//! Schema definitions for reactive models
//!
//! A schema declares the addressable fields of a model type: mutable
//! fields with default values and immutable fields with constant values.
//! The union of both key sets is the instance's field set; nothing
//! outside it can be read or written.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative field schema for a model type
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Mutable field name -> default value
    fields: BTreeMap<String, Value>,

    /// Immutable field name -> constant value; fixed for every instance
    immutable_fields: BTreeMap<String, Value>,
}

impl ModelSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a mutable field with a default value
    pub fn field(mut self, name: impl Into<String>, default: Value) -> Self {
        self.fields.insert(name.into(), default);
        self
    }

    /// Declare an immutable field with a constant value
    pub fn immutable(mut self, name: impl Into<String>, constant: Value) -> Self {
        self.immutable_fields.insert(name.into(), constant);
        self
    }

    /// Check whether a name is in the union schema
    pub fn contains(&self, name: &str) -> bool {
        self.immutable_fields.contains_key(name) || self.fields.contains_key(name)
    }

    pub fn is_immutable(&self, name: &str) -> bool {
        self.immutable_fields.contains_key(name)
    }

    /// Writable means declared mutable and not overridden as immutable
    pub fn is_mutable(&self, name: &str) -> bool {
        self.fields.contains_key(name) && !self.immutable_fields.contains_key(name)
    }

    /// Default (or constant) value for a union-schema name; immutable
    /// entries win on key collision
    pub fn default_of(&self, name: &str) -> Option<&Value> {
        self.immutable_fields
            .get(name)
            .or_else(|| self.fields.get(name))
    }

    /// Iterate every union-schema name exactly once
    pub fn union_keys(&self) -> impl Iterator<Item = &str> {
        self.immutable_fields
            .keys()
            .chain(
                self.fields
                    .keys()
                    .filter(|k| !self.immutable_fields.contains_key(*k)),
            )
            .map(String::as_str)
    }

    /// Compose two schemas by value-level union; `other` wins on key
    /// collision. Produces a new schema consumed by the same model
    /// constructor; there is no runtime inheritance.
    pub fn extend(&self, other: &ModelSchema) -> ModelSchema {
        let mut combined = self.clone();
        for (name, default) in &other.fields {
            combined.fields.insert(name.clone(), default.clone());
        }
        for (name, constant) in &other.immutable_fields {
            combined
                .immutable_fields
                .insert(name.clone(), constant.clone());
        }
        combined
    }
}
