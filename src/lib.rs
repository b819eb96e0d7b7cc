//! maltree - a tree-walking evaluator for a small Lisp
//!
//! This crate reads Lisp source text into a [`ast::Value`] tree, evaluates it
//! against a chain of lexically scoped environments and prints results back to
//! text. The language is deliberately small:
//!
//! ```text
//! (def! x 10)                          ; bind in the current environment
//! (let* (a 1 b (+ a 1)) (* a b))       ; sequential local bindings
//! (if (< x 5) "small" "large")         ; everything but false and nil is truthy
//! (do (prn "side effect") 42)          ; sequencing
//! ((fn* (a & rest) rest) 1 2 3)        ; closures with rest parameters
//! [1 (+ 1 1) 3]                        ; vectors evaluate their elements
//! {:a 1 "b" (+ 1 1)}                   ; hash-maps keep insertion order
//! ```
//!
//! ## Values
//!
//! Integers, strings, symbols (symbols starting with `:` are keywords and
//! evaluate to themselves), `true`/`false`, `nil`, lists, vectors, hash-maps
//! and functions. A list and a vector with equal elements compare equal.
//!
//! ## Modules
//!
//! - `tokenizer`: splits source text into tokens
//! - `reader`: builds the value tree from tokens
//! - `ast`: the value data model and construction helpers
//! - `printer`: readable and display rendering of values
//! - `env`: environment frames
//! - `evaluator`: evaluation, special forms and closure application
//! - `builtinops`: the primitive function library

use std::fmt;

/// Default nesting limit for the reader.
/// Deeper input is rejected instead of exhausting the stack while parsing.
pub const MAX_READ_DEPTH: usize = 512;

/// Categorizes the different kinds of reader errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReadErrorKind {
    /// Input ended while a list, vector, map or quote form was still open
    UnexpectedEof,
    /// A closing delimiter that does not match the open form
    MismatchedDelimiter,
    /// A token that cannot start a form (a stray closing delimiter)
    UnexpectedToken,
    /// String literal without a matching closing quote
    UnbalancedString,
    /// Hash-map literal with a key but no value
    OddMapLiteral,
    /// Hash-map key that is not an atom
    InvalidMapKey,
    /// Integer literal that does not fit the number type
    InvalidNumber,
    /// Nesting exceeded the configured reader depth
    TooDeeplyNested,
}

/// A structured error describing a reader failure.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReadError {
    pub kind: ReadErrorKind,
    pub message: String,
    /// The offending token, if there was one
    pub found: Option<String>,
}

impl ReadError {
    pub fn new(kind: ReadErrorKind, message: impl Into<String>, found: Option<String>) -> Self {
        ReadError {
            kind,
            message: message.into(),
            found,
        }
    }

    pub fn unexpected_eof() -> Self {
        Self::new(ReadErrorKind::UnexpectedEof, "unexpected end of input", None)
    }

    pub fn mismatched(expected: &str, found: &str) -> Self {
        Self::new(
            ReadErrorKind::MismatchedDelimiter,
            format!("expected '{expected}' but found '{found}'"),
            Some(found.to_owned()),
        )
    }
}

/// Reader settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Maximum nesting of lists, vectors, maps and quote forms
    pub max_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            max_depth: MAX_READ_DEPTH,
        }
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ReadError(ReadError),
    EvalError(String),
    TypeError(String),
    SymbolNotFound(String),
    NotAFunction(String),
    DivisionByZero,
    ArityError {
        name: String,
        expected: Arity,
        got: usize,
    },
}

impl Error {
    pub fn arity_error(name: impl Into<String>, expected: Arity, got: usize) -> Self {
        Error::ArityError {
            name: name.into(),
            expected,
            got,
        }
    }

    /// Build a type error naming the expected kind and the value actually seen
    pub fn wrong_type(expected: &str, got: &ast::Value) -> Self {
        Error::TypeError(format!("expected {expected} but got {}", got.type_name()))
    }
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        Error::ReadError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadError(e) => write!(f, "ReadError: {}", e.message),
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::SymbolNotFound(name) => write!(f, "symbol not found: '{name}'"),
            Error::NotAFunction(kind) => write!(f, "expected a function but got {kind}"),
            Error::DivisionByZero => write!(f, "division by zero"),
            Error::ArityError {
                name,
                expected,
                got,
            } => write!(
                f,
                "wrong number of arguments to '{name}': expected {expected}, got {got}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Read one form from `input`, evaluate it in `env` and print the result readably.
///
/// Returns `Ok(None)` when the input holds no form (blank line or only a comment).
pub fn rep(input: &str, env: &env::Env) -> Result<Option<String>, Error> {
    match reader::read_str(input)? {
        Some(form) => {
            let result = evaluator::eval(&form, env)?;
            Ok(Some(printer::pr_str(&result, true)))
        }
        None => Ok(None),
    }
}

pub mod ast;
pub mod builtinops;
pub mod env;
pub mod evaluator;
pub mod printer;
pub mod reader;
pub mod tokenizer;

pub use builtinops::Arity;
