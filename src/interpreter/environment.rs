use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Bindings of a single scope.
type Scope = HashMap<Rc<str>, Value>;

/// A lexical scope chained to its enclosing scope.
///
/// Cloning an `Environment` yields another handle to the same scope, which is
/// how closures keep the scope they were declared in alive.
#[derive(Clone)]
pub struct Environment {
    values: Rc<RefCell<Scope>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: Rc::new(RefCell::new(HashMap::new())),
            parent: None,
        }
    }

    pub fn with_parent(parent: &Environment) -> Self {
        Self {
            values: Rc::new(RefCell::new(HashMap::new())),
            parent: Some(Rc::new(parent.clone())),
        }
    }

    /// Binds `name` in this scope, shadowing any binding further up the chain.
    pub fn define(&self, name: Rc<str>, value: Value) {
        self.values.borrow_mut().insert(name, value);
    }

    /// Looks `name` up, innermost scope first.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Overwrites the nearest existing binding of `name`.
    /// Returns false, creating nothing, when no scope binds it.
    pub fn set(&self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.borrow_mut().get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.set(name, value),
            None => false,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
            || self.parent.as_ref().is_some_and(|parent| parent.has(name))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Values can hold closures over this scope, so only the names are shown.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.borrow();
        let mut names: Vec<&str> = values.keys().map(|name| name.as_ref()).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("parent", &self.parent)
            .finish()
    }
}
