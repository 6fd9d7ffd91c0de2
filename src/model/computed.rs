//! Computed (derived) field cells
//!
//! A computed field is produced by a getter closure bound to the owning
//! model, with an optional setter. The cell keeps last-computed
//! bookkeeping, but reads always re-run the getter: derived values stay
//! consistent with the fields they read without any invalidation
//! protocol.

use super::instance::ReactiveModel;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Getter closure bound to the owning model
pub type ComputedGetter = Rc<dyn Fn(&ReactiveModel) -> Value>;

/// Setter closure bound to the owning model
pub type ComputedSetter = Rc<dyn Fn(&mut ReactiveModel, Value)>;

/// Configuration for a computed field: a getter and an optional setter
pub struct ComputedSpec {
    pub(crate) getter: ComputedGetter,
    pub(crate) setter: Option<ComputedSetter>,
}

impl ComputedSpec {
    /// Getter-only computed; writes through it are silent no-ops
    pub fn getter(get: impl Fn(&ReactiveModel) -> Value + 'static) -> Self {
        Self {
            getter: Rc::new(get),
            setter: None,
        }
    }

    /// Attach a setter invoked on writes to the computed field
    pub fn with_setter(mut self, set: impl Fn(&mut ReactiveModel, Value) + 'static) -> Self {
        self.setter = Some(Rc::new(set));
        self
    }
}

/// A derived field cell: the getter/setter pair plus last-computed
/// bookkeeping. Lives for the owning instance's lifetime and is never
/// shared across instances.
pub(crate) struct ComputedCell {
    getter: ComputedGetter,
    setter: Option<ComputedSetter>,
    state: RefCell<CellState>,
}

#[derive(Default)]
struct CellState {
    cached: Option<Value>,
    evaluated: bool,
}

impl ComputedCell {
    pub(crate) fn new(spec: ComputedSpec) -> Self {
        Self {
            getter: spec.getter,
            setter: spec.setter,
            state: RefCell::new(CellState::default()),
        }
    }

    /// Run the getter against the model and record the result.
    ///
    /// The cache is written only after the getter returns, so a panicking
    /// getter leaves the previous bookkeeping intact.
    pub(crate) fn evaluate(&self, model: &ReactiveModel) -> Value {
        let value = (self.getter)(model);
        let mut state = self.state.borrow_mut();
        state.cached = Some(value.clone());
        state.evaluated = true;
        value
    }

    pub(crate) fn setter(&self) -> Option<ComputedSetter> {
        self.setter.clone()
    }

    /// Last value the getter produced, if it has run at least once
    pub(crate) fn last_computed(&self) -> Option<Value> {
        self.state.borrow().cached.clone()
    }

    pub(crate) fn has_evaluated(&self) -> bool {
        self.state.borrow().evaluated
    }
}
