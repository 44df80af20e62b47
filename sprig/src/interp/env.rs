//! Environment for variable bindings
//!
//! An environment is a chain of frames. Frames are shared through `EnvRef`
//! so a closure keeps the frame it was created in alive after the creating
//! call returns. Each name maps to a `Binding` slot; `set!` writes through the
//! slot, so every holder of the frame observes the new value.

use super::Value;
use super::error::{InterpResult, RuntimeError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared reference to an environment frame
pub type EnvRef = Rc<RefCell<Environment>>;

/// Mutable storage location for one bound name
#[derive(Debug, Clone)]
pub struct Binding(Rc<RefCell<Value>>);

impl Binding {
    pub fn new(value: Value) -> Self {
        Binding(Rc::new(RefCell::new(value)))
    }

    /// Current content of the slot
    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Replace the content in place
    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = value;
    }

    /// Whether both handles refer to the same slot
    pub fn same_slot(&self, other: &Binding) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// One frame of bindings
#[derive(Default)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
    /// Enclosing frame for lexical scoping
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new root frame
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create a new frame with a parent
    pub fn with_parent(parent: EnvRef) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this frame only. An existing slot here is overwritten in
    /// place; enclosing frames are never consulted.
    pub fn define(&mut self, name: String, value: Value) {
        match self.bindings.get(&name) {
            Some(slot) => slot.set(value),
            None => {
                self.bindings.insert(name, Binding::new(value));
            }
        }
    }

    /// Find the slot for `name`, innermost frame first
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        if let Some(slot) = self.bindings.get(name) {
            Some(slot.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().lookup(name)
        } else {
            None
        }
    }

    /// Current value bound to `name` anywhere in the chain
    pub fn get(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|slot| slot.get())
    }

    /// Overwrite an existing binding found anywhere in the chain. Never
    /// creates a binding.
    pub fn assign(&self, name: &str, value: Value) -> InterpResult<()> {
        let slot = self
            .lookup(name)
            .ok_or_else(|| RuntimeError::unbound_variable(name))?;
        slot.set(value);
        Ok(())
    }

    /// Check if a name is bound anywhere in the chain
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Names bound in this frame, sorted
    pub fn local_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn parent(&self) -> Option<&EnvRef> {
        self.parent.as_ref()
    }
}

// Values may hold closures that capture this very frame, so only names are
// printed.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.local_names())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Create an empty child frame
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent)).into_ref()
}

/// Create a child frame of `parent` pre-populated with `bindings`
pub fn extend<I>(parent: &EnvRef, bindings: I) -> EnvRef
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut frame = Environment::with_parent(Rc::clone(parent));
    for (name, value) in bindings {
        frame.define(name, value);
    }
    frame.into_ref()
}
