//! The reactive model instance
//!
//! A `ReactiveModel` owns one field slot per union-schema key and exposes
//! the governed accessor layer over them: plain and path-qualified reads,
//! rejected-write governance for immutable and unknown fields, computed
//! registration, and change watchers. All misuse degrades to a logged
//! no-op; nothing here is fatal.

use super::computed::{ComputedCell, ComputedSpec};
use super::error::ModelError;
use super::field::FieldStore;
use super::schema::ModelSchema;
use super::watch::{ChangeWatcher, WatchSpec};
use crate::value::{self, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-scoped instance counter; ids are unique and monotonically
/// increasing for the lifetime of the process
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A live model instance built from a schema
///
/// Interior state uses single-threaded cells (the concurrency model is
/// one logical thread per instance), so the type is deliberately not
/// `Send`.
pub struct ReactiveModel {
    id: u64,
    schema: ModelSchema,
    stores: BTreeMap<String, FieldStore>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReactiveModel {
    /// Build an instance by merging construction data over the schema.
    ///
    /// Immutable fields always take their schema constant; mutable fields
    /// resolve supplied data over a clone of their default. Data keys
    /// outside the union schema are dropped.
    pub fn new(schema: ModelSchema, mut data: BTreeMap<String, Value>) -> Self {
        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);

        let mut stores = BTreeMap::new();
        for key in schema.union_keys() {
            let default = schema.default_of(key).cloned().unwrap_or(Value::Null);
            let supplied = if schema.is_immutable(key) {
                None
            } else {
                data.remove(key)
            };
            let resolved = value::resolve_value(&default, supplied);
            stores.insert(key.to_string(), FieldStore::new(resolved));
        }
        if !data.is_empty() {
            log::debug!(
                "Model {}: dropped {} construction keys outside the schema",
                id,
                data.len()
            );
        }

        let now = Utc::now();
        Self {
            id,
            schema,
            stores,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an instance from a JSON object of construction data
    pub fn from_json(schema: ModelSchema, json: &str) -> Result<Self, ModelError> {
        let parsed: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ModelError::Serialization(e.to_string()))?;
        match Value::from(parsed) {
            Value::Map(entries) => Ok(Self::new(schema, entries)),
            _ => Err(ModelError::Serialization(
                "construction data must be a JSON object".to_string(),
            )),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Refreshed on every successful mutation
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Read a field's current value.
    ///
    /// Computed fields evaluate their getter. Data fields return an owned
    /// clone of the stored tree, so the caller can traverse it freely
    /// without reaching the governed storage. Names outside the union
    /// schema (and watcher placeholders) read as `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(cell) = self.stores.get(key).and_then(|s| s.computed.as_ref()) {
            return Some(cell.evaluate(self));
        }
        if !self.schema.contains(key) {
            return None;
        }
        self.stores.get(key).map(|store| store.value.clone())
    }

    /// Read a nested value with a dotted path ("profile.age")
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let segments = value::split_path(path)?;
        let (head, rest) = segments.split_first()?;
        if rest.is_empty() {
            return self.get(head);
        }

        if let Some(cell) = self.stores.get(*head).and_then(|s| s.computed.as_ref()) {
            let derived = cell.evaluate(self);
            return value::get_by_path(&derived, rest).cloned();
        }
        if !self.schema.contains(head) {
            return None;
        }
        let store = self.stores.get(*head)?;
        value::get_by_path(&store.value, rest).cloned()
    }

    /// Write a field, logging and leaving state unchanged on rejection
    pub fn set_value(&mut self, key: &str, value: Value) -> &mut Self {
        if let Err(err) = self.write_field(key, value) {
            log::warn!("Rejected write on model {}: {}", self.id, err);
        }
        self
    }

    /// Write a field, returning the rejection instead of logging it
    pub fn try_set_value(&mut self, key: &str, value: Value) -> Result<&mut Self, ModelError> {
        self.write_field(key, value)?;
        Ok(self)
    }

    /// Write a nested value with a dotted path, logging on rejection.
    ///
    /// A single-segment path behaves exactly like `set_value`. Deeper
    /// paths write through to the stored tree; they refresh the update
    /// timestamp but bypass the head field's watcher.
    pub fn set_path(&mut self, path: &str, value: Value) -> &mut Self {
        if let Err(err) = self.write_path(path, value) {
            log::warn!("Rejected write on model {}: {}", self.id, err);
        }
        self
    }

    /// Path write, returning the rejection instead of logging it
    pub fn try_set_path(&mut self, path: &str, value: Value) -> Result<&mut Self, ModelError> {
        self.write_path(path, value)?;
        Ok(self)
    }

    /// Merge a batch of updates: keys outside the union schema are
    /// dropped, surviving keys go through `set_value` in the order
    /// encountered. Fields are only ever overwritten, never removed.
    pub fn update_data(&mut self, data: impl IntoIterator<Item = (String, Value)>) -> &mut Self {
        for (key, value) in data {
            if !self.schema.contains(&key) {
                log::debug!("Model {}: dropped unknown update key '{}'", self.id, key);
                continue;
            }
            self.set_value(&key, value);
        }
        self
    }

    /// Register a getter-only computed field
    pub fn computed(
        &mut self,
        key: &str,
        getter: impl Fn(&ReactiveModel) -> Value + 'static,
    ) -> &mut Self {
        self.computed_with(key, ComputedSpec::getter(getter))
    }

    /// Register a computed field from a full getter/setter spec.
    ///
    /// A name already taken by a schema field or another computed is
    /// rejected: the collision is logged at error level and the cell is
    /// not installed.
    pub fn computed_with(&mut self, key: &str, spec: ComputedSpec) -> &mut Self {
        if let Err(err) = self.install_computed(key, spec) {
            log::error!("Rejected computed on model {}: {}", self.id, err);
        }
        self
    }

    /// Computed registration, returning the rejection instead of logging
    pub fn try_computed_with(
        &mut self,
        key: &str,
        spec: ComputedSpec,
    ) -> Result<&mut Self, ModelError> {
        self.install_computed(key, spec)?;
        Ok(self)
    }

    /// Last value a computed field's getter produced, if it has run
    pub fn last_computed(&self, key: &str) -> Option<Value> {
        let cell = self.stores.get(key)?.computed.as_ref()?;
        if cell.has_evaluated() {
            cell.last_computed()
        } else {
            None
        }
    }

    /// Watch a field with a bare handler
    pub fn watch(
        &mut self,
        key: &str,
        handler: impl FnMut(&Value, &Value) + 'static,
    ) -> &mut Self {
        self.watch_with(key, WatchSpec::handler(handler))
    }

    /// Watch a field with a full spec.
    ///
    /// The key is not validated: a watcher may be registered before its
    /// field exists, and the placeholder slot this creates stays outside
    /// the union schema (it cannot be read or written). The baseline is
    /// the spec's override, else the field's current value, else `Null`.
    pub fn watch_with(&mut self, key: &str, spec: WatchSpec) -> &mut Self {
        let WatchSpec {
            handler,
            baseline,
            deep,
            immediate,
        } = spec;

        let baseline = baseline
            .or_else(|| self.get(key))
            .unwrap_or(Value::Null);
        let mut watcher = ChangeWatcher::new(baseline, deep, handler);
        if immediate {
            watcher.fire_immediate();
        }

        let store = self
            .stores
            .entry(key.to_string())
            .or_insert_with(|| FieldStore::new(Value::Null));
        store.watcher = Some(watcher);
        self
    }

    /// Map snapshot of every stored data field.
    ///
    /// Computed fields are not evaluated and watcher placeholders are
    /// excluded; the snapshot is a clone and never aliases the stores.
    pub fn data(&self) -> Value {
        let entries = self
            .stores
            .iter()
            .filter(|(key, store)| store.computed.is_none() && self.schema.contains(key))
            .map(|(key, store)| (key.clone(), store.value.clone()))
            .collect();
        Value::Map(entries)
    }

    /// JSON rendering of the `data()` snapshot
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(&self.data()).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    fn write_field(&mut self, key: &str, value: Value) -> Result<(), ModelError> {
        // Computed names route to their setter; a getter-only cell makes
        // the write a silent no-op
        let routed = self
            .stores
            .get(key)
            .and_then(|s| s.computed.as_ref())
            .map(ComputedCell::setter);
        if let Some(setter) = routed {
            if let Some(set) = setter {
                set(self, value);
            }
            return Ok(());
        }

        if self.schema.is_immutable(key) {
            return Err(ModelError::ImmutableField(key.to_string()));
        }
        if !self.schema.is_mutable(key) {
            return Err(ModelError::UnknownField(key.to_string()));
        }

        let store = match self.stores.get_mut(key) {
            Some(store) => store,
            None => return Err(ModelError::UnknownField(key.to_string())),
        };
        store.value = value;
        self.updated_at = Utc::now();

        // The slot is fully updated before the handler runs; a panicking
        // handler cannot corrupt the store
        if let Some(watcher) = store.watcher.as_mut() {
            watcher.emit(&store.value);
        }
        Ok(())
    }

    fn write_path(&mut self, path: &str, value: Value) -> Result<(), ModelError> {
        let segments =
            value::split_path(path).ok_or_else(|| ModelError::InvalidPath(path.to_string()))?;
        let (head, rest) = match segments.split_first() {
            Some(parts) => parts,
            None => return Err(ModelError::InvalidPath(path.to_string())),
        };
        if rest.is_empty() {
            return self.write_field(head, value);
        }

        if self.schema.is_immutable(head) {
            return Err(ModelError::ImmutableField(head.to_string()));
        }
        if !self.schema.is_mutable(head) {
            return Err(ModelError::UnknownField(head.to_string()));
        }

        let store = match self.stores.get_mut(*head) {
            Some(store) => store,
            None => return Err(ModelError::UnknownField(head.to_string())),
        };
        value::set_by_path(&mut store.value, rest, value);
        self.updated_at = Utc::now();
        Ok(())
    }

    fn install_computed(&mut self, key: &str, spec: ComputedSpec) -> Result<(), ModelError> {
        let taken = self.schema.contains(key)
            || self
                .stores
                .get(key)
                .is_some_and(|store| store.computed.is_some());
        if taken {
            return Err(ModelError::NameCollision(key.to_string()));
        }

        let store = self
            .stores
            .entry(key.to_string())
            .or_insert_with(|| FieldStore::new(Value::Null));
        store.computed = Some(ComputedCell::new(spec));
        Ok(())
    }
}

impl fmt::Debug for ReactiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveModel")
            .field("id", &self.id)
            .field("fields", &self.stores.keys().collect::<Vec<_>>())
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn schema() -> ModelSchema {
        ModelSchema::new()
            .field("count", Value::int(0))
            .field(
                "profile",
                Value::map([("name", Value::string("x")), ("age", Value::int(1))]),
            )
            .immutable("kind", Value::string("user"))
    }

    fn data(entries: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = ReactiveModel::new(schema(), BTreeMap::new());
        let b = ReactiveModel::new(schema(), BTreeMap::new());
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_construction_applies_defaults() {
        let model = ReactiveModel::new(schema(), BTreeMap::new());

        assert_eq!(model.get("count"), Some(Value::int(0)));
        assert_eq!(model.get_path("profile.name"), Some(Value::string("x")));
        assert_eq!(model.get("kind"), Some(Value::string("user")));
    }

    #[test]
    fn test_construction_merges_supplied_maps() {
        let model = ReactiveModel::new(
            schema(),
            data(vec![("profile", Value::map([("age", Value::int(2))]))]),
        );

        assert_eq!(model.get_path("profile.age"), Some(Value::int(2)));
        // Unsupplied sibling keeps its default
        assert_eq!(model.get_path("profile.name"), Some(Value::string("x")));
    }

    #[test]
    fn test_construction_ignores_data_for_immutable_fields() {
        let model = ReactiveModel::new(
            schema(),
            data(vec![("kind", Value::string("admin"))]),
        );
        assert_eq!(model.get("kind"), Some(Value::string("user")));
    }

    #[test]
    fn test_construction_drops_unknown_keys() {
        let model = ReactiveModel::new(schema(), data(vec![("bogus", Value::int(9))]));
        assert_eq!(model.get("bogus"), None);
    }

    #[test]
    fn test_instances_do_not_alias() {
        let mut a = ReactiveModel::new(schema(), BTreeMap::new());
        let b = ReactiveModel::new(schema(), BTreeMap::new());

        a.set_path("profile.age", Value::int(99));
        assert_eq!(b.get_path("profile.age"), Some(Value::int(1)));
    }

    #[test]
    fn test_set_value_round_trip() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.set_value("count", Value::int(5));
        assert_eq!(model.get("count"), Some(Value::int(5)));
    }

    #[test]
    fn test_rejected_writes_leave_state_unchanged() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());

        model
            .set_value("kind", Value::string("admin"))
            .set_value("bogus", Value::int(1));

        assert_eq!(model.get("kind"), Some(Value::string("user")));
        assert_eq!(model.get("bogus"), None);
        assert_eq!(
            model.try_set_value("kind", Value::Null).err(),
            Some(ModelError::ImmutableField("kind".to_string()))
        );
        assert_eq!(
            model.try_set_value("bogus", Value::Null).err(),
            Some(ModelError::UnknownField("bogus".to_string()))
        );
    }

    #[test]
    fn test_returned_reads_are_detached_views() {
        let model = ReactiveModel::new(schema(), BTreeMap::new());

        let mut view = model.get("profile").unwrap();
        value::set_by_path(&mut view, &["age"], Value::int(77));

        assert_eq!(model.get_path("profile.age"), Some(Value::int(1)));
    }

    #[test]
    fn test_set_path_writes_through() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());

        model.set_path("profile.age", Value::int(30));
        assert_eq!(model.get_path("profile.age"), Some(Value::int(30)));

        // Intermediates are created on demand
        model.set_path("profile.address.city", Value::string("Paris"));
        assert_eq!(
            model.get_path("profile.address.city"),
            Some(Value::string("Paris"))
        );
    }

    #[test]
    fn test_set_path_rejections() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());

        assert_eq!(
            model.try_set_path("kind.x", Value::int(1)).err(),
            Some(ModelError::ImmutableField("kind".to_string()))
        );
        assert_eq!(
            model.try_set_path("bogus.x", Value::int(1)).err(),
            Some(ModelError::UnknownField("bogus".to_string()))
        );
        assert_eq!(
            model.try_set_path("profile..age", Value::int(1)).err(),
            Some(ModelError::InvalidPath("profile..age".to_string()))
        );
    }

    #[test]
    fn test_update_data_filters_and_applies() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());

        model.update_data(data(vec![
            ("count", Value::int(3)),
            ("bogus", Value::int(9)),
            ("kind", Value::string("admin")),
        ]));

        assert_eq!(model.get("count"), Some(Value::int(3)));
        assert_eq!(model.get("bogus"), None);
        // The immutable key survives the filter but is rejected downstream
        assert_eq!(model.get("kind"), Some(Value::string("user")));
    }

    #[test]
    fn test_updated_at_refreshes_on_mutation() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        let constructed = model.updated_at();

        model.set_value("count", Value::int(1));
        assert!(model.updated_at() >= constructed);
        assert_eq!(model.created_at(), constructed);
    }

    #[test]
    fn test_computed_always_reflects_current_fields() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.computed("double", |m| {
            Value::int(m.get("count").and_then(|v| v.as_int()).unwrap_or(0) * 2)
        });

        assert_eq!(model.get("double"), Some(Value::int(0)));
        model.set_value("count", Value::int(21));
        assert_eq!(model.get("double"), Some(Value::int(42)));
        assert_eq!(model.last_computed("double"), Some(Value::int(42)));
    }

    #[test]
    fn test_computed_collision_is_rejected() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.computed("count", |_| Value::int(-1));

        // The data field is untouched and no cell was installed
        assert_eq!(model.get("count"), Some(Value::int(0)));
        assert_eq!(model.last_computed("count"), None);
        assert_eq!(
            model
                .try_computed_with("kind", ComputedSpec::getter(|_| Value::Null))
                .err(),
            Some(ModelError::NameCollision("kind".to_string()))
        );
    }

    #[test]
    fn test_computed_setter_routes_writes() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.computed_with(
            "alias",
            ComputedSpec::getter(|m| m.get("count").unwrap_or(Value::Null))
                .with_setter(|m, v| {
                    m.set_value("count", v);
                }),
        );

        model.set_value("alias", Value::int(12));
        assert_eq!(model.get("count"), Some(Value::int(12)));
        assert_eq!(model.get("alias"), Some(Value::int(12)));
    }

    #[test]
    fn test_getter_only_computed_ignores_writes() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.computed("fixed", |_| Value::int(7));

        model.set_value("fixed", Value::int(0));
        assert_eq!(model.get("fixed"), Some(Value::int(7)));
    }

    #[test]
    fn test_watcher_fires_through_set_value() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();

        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.watch("count", move |previous, new| {
            sink.borrow_mut().push((previous.clone(), new.clone()));
        });

        model.set_value("count", Value::int(0)); // unchanged, no fire
        model.set_value("count", Value::int(4));

        let calls = fired.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (Value::int(0), Value::int(4)));
    }

    #[test]
    fn test_nested_writes_bypass_top_level_watcher() {
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();

        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.watch("profile", move |_, _| {
            *sink.borrow_mut() += 1;
        });

        model.set_path("profile.age", Value::int(50));
        assert_eq!(*count.borrow(), 0);
        assert_eq!(model.get_path("profile.age"), Some(Value::int(50)));
    }

    #[test]
    fn test_watch_unknown_key_is_allowed_but_not_addressable() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.watch("future", |_, _| {});

        assert_eq!(model.get("future"), None);
        assert_eq!(
            model.try_set_value("future", Value::int(1)).err(),
            Some(ModelError::UnknownField("future".to_string()))
        );
    }

    #[test]
    fn test_data_snapshot_excludes_computed_and_placeholders() {
        let mut model = ReactiveModel::new(schema(), BTreeMap::new());
        model.computed("double", |_| Value::int(0));
        model.watch("phantom", |_, _| {});

        let snapshot = model.data();
        let entries = snapshot.as_map().unwrap();
        assert!(entries.contains_key("count"));
        assert!(entries.contains_key("kind"));
        assert!(!entries.contains_key("double"));
        assert!(!entries.contains_key("phantom"));
    }

    #[test]
    fn test_json_round_trip() {
        let model =
            ReactiveModel::from_json(schema(), r#"{"count": 3, "profile": {"age": 8}}"#).unwrap();

        assert_eq!(model.get("count"), Some(Value::int(3)));
        assert_eq!(model.get_path("profile.age"), Some(Value::int(8)));
        assert_eq!(model.get_path("profile.name"), Some(Value::string("x")));

        let json = model.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["count"], serde_json::json!(3));
        assert_eq!(parsed["profile"]["age"], serde_json::json!(8));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(matches!(
            ReactiveModel::from_json(schema(), "[1, 2]"),
            Err(ModelError::Serialization(_))
        ));
        assert!(matches!(
            ReactiveModel::from_json(schema(), "not json"),
            Err(ModelError::Serialization(_))
        ));
    }
}
