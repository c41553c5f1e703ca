//! Tree‑walking evaluator.
//!
//! Statements return a [`Flow`] so `return`, `break` and `continue` unwind
//! through ordinary `Result` plumbing; every scope switch goes through
//! [`Interpreter::execute_block`], which restores the previous environment on
//! every exit path.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{natives, Class, Function, Instance};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Deepest chain of nested Nad calls before `Stack overflow.` is raised.
pub const MAX_CALL_DEPTH: usize = 1000;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Resolution side table: expression → number of hops to its binding.
    locals: HashMap<ExprId, usize>,
    /// Print the value of top‑level expression statements (prompt mode).
    echo_expressions: bool,
    /// Nad calls currently on the host stack.
    call_depth: usize,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to stdout, with the native functions defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        for native in natives() {
            debug!("Defining native function '{}'", native.name);
            globals
                .borrow_mut()
                .define(native.name, Value::NativeFunction(Rc::new(native)));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            echo_expressions: false,
            call_depth: 0,
            out,
        }
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo_expressions = echo;
    }

    /// Record that `id` refers to a binding `depth` scopes outward.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Resolved {:?} at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    pub fn at_global_scope(&self) -> bool {
        Rc::ptr_eq(&self.environment, &self.globals)
    }

    /// Execute a whole program. Stops at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.environment = Rc::clone(&self.globals);
                return Err(e);
            }
        }

        self.out.flush()?;
        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Run `statements` inside `env`, then switch back to the previous
    /// environment whatever the outcome.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, env);
        let result: Result<Flow> = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                escape => return Ok(escape),
            }
        }

        Ok(Flow::Normal)
    }

    // ───────────────────────────── statements ─────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                let value: Value = self.evaluate(expr)?;

                if self.echo_expressions && self.at_global_scope() {
                    writeln!(self.out, "{}", value)?;
                }
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value: Value = self.evaluate(initializer)?;
                self.environment.borrow_mut().declare(name, value)?;
            }

            Stmt::Block(statements) => {
                let scope: EnvRef =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                return self.execute_block(statements, scope);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }

                    if let Some(increment) = increment {
                        self.evaluate(increment)?;
                    }
                }

                debug!("Exited while loop");
            }

            Stmt::Function(declaration) => {
                let function: Value = self.make_function(declaration);

                if let Some(name) = &declaration.name {
                    self.environment.borrow_mut().declare(name, function)?;
                    info!("Function '{}' defined", name.lexeme);
                }
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                return Ok(Flow::Return(value));
            }

            Stmt::Jump { keyword } => {
                return Ok(match keyword.token_type {
                    TokenType::BREAK => Flow::Break,
                    _ => Flow::Continue,
                });
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods)?,
        }

        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token: &Token = match expr {
                        Expr::Variable { name: super_name, .. } => super_name,
                        _ => name,
                    };

                    return Err(LoxError::runtime(
                        token,
                        format!("'{}' is not a class.", token.lexeme),
                    ));
                }
            },
            None => None,
        };

        self.environment.borrow_mut().declare(name, Value::Nil)?;

        // Methods of a subclass close over an extra scope holding `super`.
        let method_env: EnvRef = match &superclass {
            Some(class) => {
                let mut scope = Environment::with_enclosing(Rc::clone(&self.environment));
                scope.define("super", Value::Class(Rc::clone(class)));
                scope.into_ref()
            }
            None => Rc::clone(&self.environment),
        };

        let mut table: HashMap<String, Rc<Function>> = HashMap::with_capacity(methods.len());

        for method in methods {
            if let Some(method_name) = &method.name {
                let function = Function::new(
                    Rc::clone(method),
                    Rc::clone(&method_env),
                    method_name.lexeme == "init",
                );
                table.insert(method_name.lexeme.clone(), Rc::new(function));
            }
        }

        let class = Class::new(name.lexeme.clone(), superclass, table);
        info!("Class '{}' defined", name.lexeme);

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))
    }

    fn make_function(&self, declaration: &Rc<FunctionDecl>) -> Value {
        Value::Function(Rc::new(Function::new(
            Rc::clone(declaration),
            Rc::clone(&self.environment),
            false,
        )))
    }

    // ──────────────────────────── expressions ─────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(Rc::clone(s)),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Missing a numeric operand")),
                    },
                    _ => Ok(Value::Bool(!right.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                // Only the boolean `true` selects the first branch.
                if self.evaluate(condition)? == Value::Bool(true) {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign {
                id,
                name,
                operator,
                value,
            } => {
                let value: Value = self.evaluate(value)?;

                let value: Value = if operator.token_type == TokenType::EQUAL {
                    value
                } else {
                    let current: Value = self.look_up_variable(*id, name)?;
                    compound(operator, current, value)?
                };

                match self.locals.get(id) {
                    Some(&depth) => {
                        environment::assign_at(&self.environment, depth, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let callable = callee.as_callable().ok_or_else(|| {
                    LoxError::runtime(paren, "The expression before '(' is not callable.")
                })?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expect {} arguments but found {} arguments.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(LoxError::runtime(paren, "Stack overflow."));
                }

                self.call_depth += 1;
                let result = callable.call(self, values);
                self.call_depth -= 1;

                result
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Invalid field access.")),
            },

            Expr::Set {
                object,
                name,
                operator,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only objects have properties."));
                };

                let value: Value = self.evaluate(value)?;

                let value: Value = if operator.token_type == TokenType::EQUAL {
                    value
                } else {
                    let current: Value = Instance::get(&instance, name)?;
                    compound(operator, current, value)?
                };

                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Function { declaration, .. } => Ok(self.make_function(declaration)),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::AND => {
                return if left.is_truthy() {
                    self.evaluate(right)
                } else {
                    Ok(left)
                };
            }
            TokenType::OR => {
                return if left.is_truthy() {
                    Ok(left)
                } else {
                    self.evaluate(right)
                };
            }
            _ => {}
        }

        let right: Value = self.evaluate(right)?;

        let value: Value = match operator.token_type {
            TokenType::COMMA => right,

            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => Value::String(Rc::from(format!("{}{}", a, b))),
                _ => {
                    return Err(LoxError::runtime(
                        operator,
                        "Both operands must be either strings or numerics",
                    ))
                }
            },

            TokenType::EQUAL_EQUAL => Value::Bool(left == right),
            TokenType::BANG_EQUAL => Value::Bool(left != right),

            _ => {
                let (a, b) = numeric_operands(operator, &left, &right)?;

                match operator.token_type {
                    TokenType::MINUS => Value::Number(a - b),
                    TokenType::STAR => Value::Number(a * b),
                    TokenType::SLASH => Value::Number(a / b),
                    TokenType::PERCENT => Value::Number(a % b),
                    TokenType::LESS => Value::Bool(a < b),
                    TokenType::LESS_EQUAL => Value::Bool(a <= b),
                    TokenType::GREATER => Value::Bool(a > b),
                    TokenType::GREATER_EQUAL => Value::Bool(a >= b),
                    _ => {
                        return Err(LoxError::runtime(
                            operator,
                            format!("Unsupported binary operator '{}'.", operator.lexeme),
                        ))
                    }
                }
            }
        };

        Ok(value)
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let depth: usize = self
            .locals
            .get(&id)
            .copied()
            .ok_or_else(|| LoxError::runtime(keyword, "Undefined identifier."))?;

        let Value::Class(superclass) = environment::get_at(&self.environment, depth, keyword)?
        else {
            return Err(LoxError::runtime(keyword, "Undefined identifier."));
        };

        let receiver: Option<Value> = depth
            .checked_sub(1)
            .and_then(|d| environment::lookup_at(&self.environment, d, "this"));

        let Some(Value::Instance(instance)) = receiver else {
            return Err(LoxError::runtime(keyword, "Undefined identifier."));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(found.bind(&instance))),
            None => Err(LoxError::runtime(
                keyword,
                format!("The superclass does not own method '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&depth) => environment::get_at(&self.environment, depth, name),
            None => self.globals.borrow().get(name),
        }
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("globals", &self.globals.borrow())
            .field("locals", &self.locals.len())
            .field("echo_expressions", &self.echo_expressions)
            .finish()
    }
}

/// Apply `+=` / `-=` to the current value of a variable or property.
fn compound(operator: &Token, current: Value, value: Value) -> Result<Value> {
    match operator.token_type {
        TokenType::PLUS_EQUAL => match (current, value) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(Rc::from(format!("{}{}", a, b)))),
            _ => Err(LoxError::runtime(
                operator,
                "Both operands must be either strings or numerics.",
            )),
        },
        TokenType::MINUS_EQUAL => {
            let (a, b) = numeric_operands(operator, &current, &value)?;
            Ok(Value::Number(a - b))
        }
        _ => Ok(value),
    }
}

fn numeric_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Both operands must be numeric")),
    }
}
