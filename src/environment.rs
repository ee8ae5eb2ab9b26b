use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One frame of name-to-value bindings.  Frames are shared behind
/// `Rc<RefCell<..>>`: every closure, instance and block scope that needs a
/// frame keeps it alive.  Classes and bound methods create reference
/// cycles through their closures; those are tolerated for the lifetime of
/// the interpreter.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditionally bind `name` in this frame.  Redefinition is allowed.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Read `name` from the frame exactly `distance` parent hops up.
    ///
    /// This is the resolver-directed fast path: the resolver has already
    /// proven the binding exists at that depth, so a miss is a bug in the
    /// resolver rather than in the program being run.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        if distance == 0 {
            self.values
                .get(name)
                .cloned()
                .unwrap_or_else(|| unreachable!("resolved variable '{}' missing from its scope", name))
        } else {
            self.enclosing
                .as_ref()
                .unwrap_or_else(|| unreachable!("resolved variable '{}' pointed past the root scope", name))
                .borrow()
                .get_at(distance - 1, name)
        }
    }

    /// Overwrite `name` in the frame exactly `distance` parent hops up.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
        } else {
            self.enclosing
                .as_ref()
                .unwrap_or_else(|| unreachable!("resolved variable '{}' pointed past the root scope", name))
                .borrow_mut()
                .assign_at(distance - 1, name, value);
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
