//! Per-field storage slots

use super::computed::ComputedCell;
use super::watch::ChangeWatcher;
use crate::value::Value;

/// A single owned field slot: the current value plus the field's
/// computed/watcher attachments, if any. Owned exclusively by the model
/// instance and destroyed with it.
pub(crate) struct FieldStore {
    pub(crate) value: Value,
    pub(crate) computed: Option<ComputedCell>,
    pub(crate) watcher: Option<ChangeWatcher>,
}

impl FieldStore {
    pub(crate) fn new(value: Value) -> Self {
        Self {
            value,
            computed: None,
            watcher: None,
        }
    }
}
