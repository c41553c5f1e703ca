//! Syntax tree produced by the [`Parser`](crate::parser::Parser) and consumed by
//! the resolver, the evaluator and the AST printer.
//!
//! Nodes own their tokens, and function bodies sit behind an `Rc` so a function
//! value can keep its declaration alive after the statement list that defined
//! it (e.g. a previous prompt line) is gone.

use std::rc::Rc;

use crate::token::Token;

/// Stable identity of a name‑referencing expression (`Variable`, `Assign`,
/// `This`, `Super`). Assigned by the parser, used as the key of the
/// interpreter's resolution side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub usize);

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(Rc<str>),

    /// `true` or `false`.
    Bool(bool),

    /// The `nil` literal.
    Nil,
}

/// Parameters and body shared by named functions, methods and anonymous
/// function literals.
#[derive(Debug)]
pub struct FunctionDecl {
    /// `None` for an anonymous `func (…) { … }` expression.
    pub name: Option<Token>,

    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Infix binary operator, including `,`, `&&` and `||`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Prefix `-` or `!`.
    Unary { operator: Token, right: Box<Expr> },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// A literal constant.
    Literal(LiteralValue),

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Variable read.
    Variable { id: ExprId, name: Token },

    /// `name = value`, `name += value` or `name -= value`.
    Assign {
        id: ExprId,
        name: Token,
        /// The `=`, `+=` or `-=` token.
        operator: Token,
        value: Box<Expr>,
    },

    /// Function, method or constructor call.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// `object.name = value` (or `+=` / `-=`).
    Set {
        object: Box<Expr>,
        name: Token,
        operator: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Anonymous `func (params) { body }`.
    Function {
        keyword: Token,
        declaration: Rc<FunctionDecl>,
    },
}

/// **Abstract‑Syntax‑Tree node** for *statements*. A program is a sequence of
/// these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration. A missing initializer is a `nil` literal.
    Var { name: Token, initializer: Expr },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops desugar into one carrying an `increment`.
    While {
        condition: Expr,
        body: Box<Stmt>,
        increment: Option<Expr>,
    },

    /// Named function declaration.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    /// `break` or `continue`, identified by the keyword's token type.
    Jump { keyword: Token },

    /// `class NAME (< SUPER)? { methods }`
    Class {
        name: Token,
        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
