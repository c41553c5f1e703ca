//! Everything that can be invoked with `(...)`: user functions and methods,
//! classes (as constructors) and native functions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can be called by the evaluator.
pub trait Callable {
    /// Number of arguments the callee expects.
    fn arity(&self) -> usize;

    /// Invoke with already evaluated arguments. The caller has checked the
    /// argument count against [`Callable::arity`].
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

// ───────────────────────────── natives ─────────────────────────────

/// Host function exposed to Nad programs.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&mut Interpreter, &[Value]) -> Result<Value>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);
        (self.func)(interpreter, &arguments)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}/{})", self.name, self.arity)
    }
}

/// Natives installed into every fresh global environment.
pub fn natives() -> Vec<NativeFunction> {
    vec![NativeFunction {
        name: "clock",
        arity: 0,
        func: clock,
    }]
}

/// Seconds since the Unix epoch, with microsecond resolution.
fn clock(_interpreter: &mut Interpreter, _arguments: &[Value]) -> Result<Value> {
    let seconds: f64 = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    info!("Native function 'clock' returned: {}", seconds);
    Ok(Value::Number(seconds))
}

// ───────────────────────────── functions ───────────────────────────

/// A user function, method or anonymous function closed over its
/// defining environment.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// `None` for anonymous functions.
    pub fn name(&self) -> Option<&str> {
        self.declaration.name.as_ref().map(|t| t.lexeme.as_str())
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: &Rc<RefCell<Instance>>) -> Rc<Function> {
        let mut scope: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        scope.define("this", Value::Instance(Rc::clone(instance)));

        Rc::new(Function::new(
            Rc::clone(&self.declaration),
            scope.into_ref(),
            self.is_initializer,
        ))
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling function {:?}", self.name());

        let mut frame: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, value) in self.declaration.params.iter().zip(arguments) {
            frame.declare(param, value)?;
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, frame.into_ref())?;

        if self.is_initializer {
            return Ok(self.closure.borrow().get_local("this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

// ───────────────────────────── classes ─────────────────────────────

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Own methods first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }
}

impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or(0)
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        info!("Instantiating class '{}'", self.name);

        let instance: Rc<RefCell<Instance>> =
            Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method("init") {
            initializer.bind(&instance).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| &s.name))
            .field("methods", &methods)
            .finish()
    }
}

// ──────────────────────────── instances ────────────────────────────

pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Field lookup, falling back to a method bound to `this`.
    pub fn get(this: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        if let Some(value) = this.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method: Option<Rc<Function>> = this.borrow().class.find_method(&name.lexeme);

        match method {
            Some(method) => Ok(Value::Function(method.bind(this))),
            None => Err(LoxError::runtime(
                name,
                format!("property '{}' does not exist.", name.lexeme),
            )),
        }
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    // Fields may refer back to the instance itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}
