//! This module defines the value data model shared by the reader, printer and
//! evaluator. The main enum, [`Value`], is the closed set of everything a form
//! can be and everything evaluation can produce: nil, booleans, integers,
//! strings, symbols, lists, vectors, hash-maps and functions. Functions are a
//! second closed enum, [`Function`], covering native builtins, the special
//! form markers and user closures.
//!
//! Ergonomic helper functions such as [`val`], [`sym`], [`list`] and
//! [`vector`] are provided for building trees in code and tests, together with
//! `From` conversions for common Rust types. Equality is customized: a list
//! and a vector with equal elements are equal, and functions compare by
//! identity.

use crate::Error;
use crate::builtinops::Arity;
use crate::env::Env;
use std::rc::Rc;

/// Type alias for number values in interpreter
pub type NumberType = i64;

/// Canonical erased builtin signature: the calling environment and the
/// already evaluated arguments.
pub type BuiltinFn = dyn Fn(&Env, &[Value]) -> Result<Value, Error>;

/// Symbol that switches a parameter list into rest-binding mode
pub(crate) const REST_MARKER: &str = "&";

/// The forms whose arguments reach the evaluator unevaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Def,
    Let,
    If,
    Do,
    Fn,
}

impl SpecialForm {
    pub const ALL: [SpecialForm; 5] = [
        SpecialForm::Def,
        SpecialForm::Let,
        SpecialForm::If,
        SpecialForm::Do,
        SpecialForm::Fn,
    ];

    /// The symbol the form is bound to in the global environment
    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::Def => "def!",
            SpecialForm::Let => "let*",
            SpecialForm::If => "if",
            SpecialForm::Do => "do",
            SpecialForm::Fn => "fn*",
        }
    }

    /// Number of argument forms the special form accepts
    pub fn arity(self) -> Arity {
        match self {
            SpecialForm::Def => Arity::Exact(2),
            SpecialForm::Let | SpecialForm::Fn => Arity::AtLeast(1),
            SpecialForm::If => Arity::Range(2, 3),
            SpecialForm::Do => Arity::Any,
        }
    }
}

/// A native operation callable from Lisp code.
#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub arity: Arity,
    // Stored behind an Rc so hosts can register closures, not only fn items.
    func: Rc<BuiltinFn>,
}

impl Builtin {
    pub fn new<F>(name: impl Into<String>, arity: Arity, func: F) -> Self
    where
        F: Fn(&Env, &[Value]) -> Result<Value, Error> + 'static,
    {
        Builtin {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    /// Check the argument count, then run the operation
    pub fn call(&self, env: &Env, args: &[Value]) -> Result<Value, Error> {
        self.arity.validate(&self.name, args.len())?;
        (self.func)(env, args)
    }
}

/// A closure parameter list, split into positional names and an optional
/// rest name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pub positional: Vec<String>,
    pub rest: Option<String>,
}

impl Params {
    /// Validate the elements of an `fn*` binding list.
    ///
    /// Every element must be a symbol, and `&` must be followed by exactly one
    /// more symbol.
    pub fn from_forms(forms: &[Value]) -> Result<Params, Error> {
        let mut params = Params::default();
        let mut names = forms.iter();

        while let Some(form) = names.next() {
            let name = match form {
                Value::Symbol(name) => name,
                other => return Err(Error::wrong_type("a symbol in fn* parameters", other)),
            };

            if name != REST_MARKER {
                params.positional.push(name.clone());
                continue;
            }

            params.rest = match (names.next(), names.next()) {
                (Some(Value::Symbol(rest)), None) if rest != REST_MARKER => Some(rest.clone()),
                (Some(other), None) if !matches!(other, Value::Symbol(_)) => {
                    return Err(Error::wrong_type("a symbol in fn* parameters", other));
                }
                _ => {
                    return Err(Error::EvalError(
                        "'&' must be followed by exactly one parameter name".to_owned(),
                    ));
                }
            };
        }

        Ok(params)
    }
}

/// A user function created by `fn*`.
#[derive(Clone)]
pub struct Closure {
    pub params: Params,
    pub body: Vec<Value>,
    /// The environment active where the closure was created
    pub env: Env,
}

/// Everything that can sit in call position.
#[derive(Clone)]
pub enum Function {
    Builtin(Builtin),
    SpecialForm(SpecialForm),
    Closure(Closure),
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::Builtin(builtin) => write!(f, "Builtin({})", builtin.name),
            Function::SpecialForm(form) => write!(f, "SpecialForm({})", form.name()),
            Function::Closure(closure) => write!(
                f,
                "Closure(params={:?}, body={:?})",
                closure.params, closure.body
            ),
        }
    }
}

/// Core value type in interpreter
///
/// To build a tree, use the ergonomic helper functions:
/// - `val(42)` for values, `sym("name")` for symbols
/// - `val([1, 2, 3])` or `list(vec![...])` for lists, `vector(vec![...])` for vectors
/// - `hash_map(vec![key, value, ...])` for maps
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    /// Numbers (integers only)
    Number(NumberType),
    String(String),
    /// Symbols; names starting with ':' are keywords
    Symbol(String),
    List(Vec<Value>),
    Vector(Vec<Value>),
    /// Alternating keys and values in insertion order; always even length
    HashMap(Vec<Value>),
    Function(Rc<Function>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn elements(
            f: &mut std::fmt::Formatter<'_>,
            name: &str,
            items: &[Value],
        ) -> std::fmt::Result {
            write!(f, "{name}(")?;
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{v:?}")?;
            }
            write!(f, ")")
        }

        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(items) => elements(f, "List", items),
            Value::Vector(items) => elements(f, "Vector", items),
            Value::HashMap(items) => elements(f, "HashMap", items),
            Value::Function(func) => write!(f, "{func:?}"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(Rc::new(func))
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<&Value> for NumberType {
    type Error = Error;

    fn try_from(value: &Value) -> Result<NumberType, Error> {
        match value {
            Value::Number(n) => Ok(*n),
            other => Err(Error::wrong_type("a number", other)),
        }
    }
}

/// Helper function for creating symbols
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from anything convertible
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

pub fn nil() -> Value {
    Value::Nil
}

pub fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

pub fn vector(items: Vec<Value>) -> Value {
    Value::Vector(items)
}

/// Build a hash-map from alternating keys and values.
/// The caller keeps the even-length invariant; the reader enforces it for literals.
pub fn hash_map(items: Vec<Value>) -> Value {
    debug_assert!(items.len() % 2 == 0, "hash-map needs key/value pairs");
    Value::HashMap(items)
}

impl Value {
    /// Lowercase kind name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) if self.is_keyword() => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::HashMap(_) => "hash-map",
            Value::Function(_) => "function",
        }
    }

    /// Everything is true except `false` and `nil`
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self, Value::Symbol(name) if name.starts_with(':'))
    }

    /// The elements of a list or vector
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Vector(items) => Some(items),
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
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            // Lists and vectors compare across variants
            (
                Value::List(a) | Value::Vector(a),
                Value::List(b) | Value::Vector(b),
            ) => a == b,
            (Value::HashMap(a), Value::HashMap(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
