//! Chained variable scopes used by the evaluator.
//!
//! Every block, call frame, bound method and `super` binding gets its own
//! [`Environment`] pointing at the enclosing one. Environments are shared via
//! `Rc<RefCell<_>>` because closures keep their defining scope alive.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to an environment.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap `self` in a fresh shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind a user‑declared name. Fails if the name already lives in *this*
    /// scope.
    pub fn declare(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            return Err(LoxError::runtime(
                name,
                format!("Redeclare existing variable: \"{}\".", name.lexeme),
            ));
        }

        debug!("Declaring '{}'", name.lexeme);
        self.values.insert(name.lexeme.clone(), value);
        Ok(())
    }

    /// Unchecked binding for interpreter‑internal names (`this`, `super`, natives).
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup walking outward through every enclosing scope.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(LoxError::runtime(
                name,
                "Dereference an undefined variable.",
            )),
        }
    }

    /// Dynamic assignment walking outward through every enclosing scope.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(LoxError::runtime(
                name,
                "Assign value to an undefined variable.",
            )),
        }
    }

    /// Lookup restricted to this scope.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// The environment `distance` hops outward from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// The binding of `name` in the scope exactly `distance` hops outward.
pub fn lookup_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    let scope: EnvRef = ancestor(env, distance)?;
    let value: Option<Value> = scope.borrow().get_local(name);
    value
}

/// Read `name` exactly `distance` hops outward, as recorded by the resolver.
pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
    lookup_at(env, distance, &name.lexeme)
        .ok_or_else(|| LoxError::runtime(name, "Undefined identifier."))
}

/// Write `name` exactly `distance` hops outward, as recorded by the resolver.
pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
    match ancestor(env, distance) {
        Some(scope) => scope.borrow_mut().assign(name, value),
        None => Err(LoxError::runtime(name, "Undefined identifier.")),
    }
}

impl fmt::Debug for Environment {
    // Values may point back at this scope through closures, so only names are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
