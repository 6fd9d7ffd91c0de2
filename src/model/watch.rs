//! Change watchers for model fields
//!
//! A watcher holds the last value it observed for one field and fires its
//! handler when a newly written value differs. Equality is structural
//! (values are owned trees), so "deep" mode exists for container fields:
//! it forces a fire even when the new container compares equal, at the
//! cost of possible false positives.

use crate::value::Value;

/// Handler invoked as `(previous, new)` when a watched field changes
pub type WatchHandler = Box<dyn FnMut(&Value, &Value)>;

/// Configuration for a watcher registration
pub struct WatchSpec {
    pub(crate) handler: WatchHandler,
    pub(crate) baseline: Option<Value>,
    pub(crate) deep: bool,
    pub(crate) immediate: bool,
}

impl WatchSpec {
    /// Watch with a bare handler and default options
    pub fn handler(handler: impl FnMut(&Value, &Value) + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            baseline: None,
            deep: false,
            immediate: false,
        }
    }

    /// Override the captured baseline value
    pub fn baseline(mut self, value: Value) -> Self {
        self.baseline = Some(value);
        self
    }

    /// Fire on container values even when they compare equal
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Fire the handler once at registration with the initial baseline
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }
}

/// A registered change watcher: the last-observed baseline, the equality
/// policy, and the handler to fire. Owned by its field slot.
pub(crate) struct ChangeWatcher {
    baseline: Value,
    deep: bool,
    handler: WatchHandler,
}

impl ChangeWatcher {
    pub(crate) fn new(baseline: Value, deep: bool, handler: WatchHandler) -> Self {
        Self {
            baseline,
            deep,
            handler,
        }
    }

    /// Registration-time fire: there is no previous observation yet, so
    /// the handler sees `(Null, baseline)`.
    pub(crate) fn fire_immediate(&mut self) {
        let baseline = self.baseline.clone();
        (self.handler)(&Value::Null, &baseline);
    }

    /// Observe a newly written value.
    ///
    /// An unchanged value does not fire, except for containers in deep
    /// mode. On fire the baseline is replaced before the handler returns
    /// control, so a panicking handler cannot desync it.
    pub(crate) fn emit(&mut self, new: &Value) {
        if *new == self.baseline && !(self.deep && new.is_container()) {
            return;
        }
        let previous = std::mem::replace(&mut self.baseline, new.clone());
        (self.handler)(&previous, &self.baseline);
    }
}
