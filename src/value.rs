//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, Class, Function, Instance, NativeFunction};

/// Every value a Nad program can produce.
///
/// Scalars are stored inline; strings are immutable and shared. Functions,
/// classes and instances are reference types compared by identity.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    NativeFunction(Rc<NativeFunction>),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// View the value as something that can be invoked with `(...)`.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::NativeFunction(native) => Some(native.as_ref() as &dyn Callable),
            Value::Function(function) => Some(function.as_ref() as &dyn Callable),
            Value::Class(class) => Some(class as &dyn Callable),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // 3.0 → "3", 2.5 → "2.5", 1/0 → "inf", -0.0 → "-0"
                let negative_zero: bool = *n == 0.0 && n.is_sign_negative();
                if !negative_zero
                    && n.is_finite()
                    && n.fract() == 0.0
                    && n.abs() < i64::MAX as f64
                {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(_) => write!(f, "<native fn>"),

            Value::Function(function) => match function.name() {
                Some(name) => write!(f, "<function {}>", name),
                None => write!(f, "<anonymous function>"),
            },

            Value::Class(class) => write!(f, "<class '{}'>", class.name),

            Value::Instance(instance) => {
                write!(f, "<instance of '{}'>", instance.borrow().class.name)
            }
        }
    }
}
