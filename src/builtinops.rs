//! Built-in operations registry.
//!
//! Every primitive is an ordinary function over already evaluated arguments
//! with the signature `fn(&Env, &[Value]) -> Result<Value, Error>`, paired
//! with the [`Arity`] that is checked before the call:
//!
//! ```text
//! (+ 1 2 3)            ; arithmetic, checked for overflow
//! (< 1 2 3)            ; comparisons chain over adjacent pairs
//! (= [1 2] (list 1 2)) ; structural equality
//! (count (list 1 2))   ; sequence helpers
//! (str "a" 1)          ; printing and string building
//! ```
//!
//! ## Functions vs Special Forms
//!
//! Everything here evaluates all arguments before application. The forms
//! that control evaluation (`def!`, `let*`, `if`, `do`, `fn*`) are
//! [`crate::ast::SpecialForm`] values handled by the evaluator and are not
//! part of this registry.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** as `fn(&Env, &[Value]) -> Result<Value, Error>`
//! 2. **Add it to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering edge cases and error conditions

use crate::Error;
use crate::ast::{NumberType, Value};
use crate::env::Env;
use crate::printer::pr_str;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Expected number of arguments for a function or special form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    /// Inclusive bounds
    Range(usize, usize),
    Any,
}

impl Arity {
    /// Check `got` arguments against this arity, naming `name` in the error
    pub fn validate(&self, name: &str, got: usize) -> Result<(), Error> {
        let ok = match *self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Range(min, max) => (min..=max).contains(&got),
            Arity::Any => true,
        };

        if ok {
            Ok(())
        } else {
            Err(Error::arity_error(name, *self, got))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any number"),
        }
    }
}

/// Signature shared by every registered primitive
pub type OperationFn = fn(&Env, &[Value]) -> Result<Value, Error>;

/// Definition of a built-in operation
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    /// The symbol this operation is bound to in the global environment
    pub id: &'static str,
    pub func: OperationFn,
    /// Expected number of arguments
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Identifiers are unique within the registry
        self.id == other.id
    }
}

//
// Builtin Function Implementations
//

fn numbers(args: &[Value]) -> Result<Vec<NumberType>, Error> {
    args.iter().map(NumberType::try_from).collect()
}

fn overflow(operation: &str) -> Error {
    Error::EvalError(format!("Integer overflow in {operation}"))
}

// Macro to generate numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(_env: &Env, args: &[Value]) -> Result<Value, Error> {
            let nums = numbers(args)?;
            // Chain comparisons: all adjacent pairs must satisfy the comparison
            Ok(Value::Bool(nums.windows(2).all(|pair| pair[0] $op pair[1])))
        }
    };
}

numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_ge, >=);

fn builtin_add(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    let mut sum: NumberType = 0;
    for n in numbers(args)? {
        sum = sum.checked_add(n).ok_or_else(|| overflow("addition"))?;
    }
    Ok(Value::Number(sum))
}

fn builtin_sub(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let result = match nums.as_slice() {
        [] => return Err(Error::arity_error("-", Arity::AtLeast(1), 0)),
        [only] => only.checked_neg().ok_or_else(|| overflow("negation"))?,
        [first, rest @ ..] => {
            let mut result = *first;
            for n in rest {
                result = result.checked_sub(*n).ok_or_else(|| overflow("subtraction"))?;
            }
            result
        }
    };
    Ok(Value::Number(result))
}

fn builtin_mul(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    let mut product: NumberType = 1;
    for n in numbers(args)? {
        product = product
            .checked_mul(n)
            .ok_or_else(|| overflow("multiplication"))?;
    }
    Ok(Value::Number(product))
}

fn checked_div(dividend: NumberType, divisor: NumberType) -> Result<NumberType, Error> {
    if divisor == 0 {
        return Err(Error::DivisionByZero);
    }
    dividend
        .checked_div(divisor)
        .ok_or_else(|| overflow("division"))
}

/// Integer division truncating toward zero; `(/ x)` is `1 / x`
fn builtin_div(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let result = match nums.as_slice() {
        [] => return Err(Error::arity_error("/", Arity::AtLeast(1), 0)),
        [only] => checked_div(1, *only)?,
        [first, rest @ ..] => {
            let mut result = *first;
            for n in rest {
                result = checked_div(result, *n)?;
            }
            result
        }
    };
    Ok(Value::Number(result))
}

/// Structural equality of every argument with the first
fn builtin_equal(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    let Some((first, rest)) = args.split_first() else {
        return Err(Error::arity_error("=", Arity::AtLeast(1), 0));
    };
    Ok(Value::Bool(rest.iter().all(|value| value == first)))
}

fn builtin_list(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(args.to_vec()))
}

fn builtin_is_list(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(
        args.iter().all(|value| matches!(value, Value::List(_))),
    ))
}

fn builtin_is_empty(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    for value in args {
        match value.as_sequence() {
            Some(items) if items.is_empty() => {}
            Some(_) => return Ok(Value::Bool(false)),
            None => return Err(Error::wrong_type("a list or vector", value)),
        }
    }
    Ok(Value::Bool(true))
}

fn builtin_count(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    let count = match args {
        [Value::Nil] => 0,
        [value] => match value.as_sequence() {
            Some(items) => items.len(),
            None => return Err(Error::wrong_type("a list, vector or nil", value)),
        },
        _ => return Err(Error::arity_error("count", Arity::Exact(1), args.len())),
    };
    NumberType::try_from(count)
        .map(Value::Number)
        .map_err(|_| overflow("count"))
}

/// Print each argument and join with `separator`
fn join_printed(args: &[Value], print_readably: bool, separator: &str) -> String {
    args.iter()
        .map(|value| pr_str(value, print_readably))
        .collect::<Vec<_>>()
        .join(separator)
}

fn builtin_pr_str(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(join_printed(args, true, " ")))
}

fn builtin_str(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(join_printed(args, false, "")))
}

fn builtin_prn(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    println!("{}", join_printed(args, true, " "));
    Ok(Value::Nil)
}

fn builtin_println(_env: &Env, args: &[Value]) -> Result<Value, Error> {
    println!("{}", join_printed(args, false, " "));
    Ok(Value::Nil)
}

/// Global registry of all built-in operations
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    vec![
        // Arithmetic operations
        BuiltinOp {
            id: "+",
            func: builtin_add,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "-",
            func: builtin_sub,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "*",
            func: builtin_mul,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "/",
            func: builtin_div,
            arity: Arity::AtLeast(1),
        },
        // Comparison operations
        BuiltinOp {
            id: "<",
            func: builtin_lt,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "<=",
            func: builtin_le,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: ">",
            func: builtin_gt,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: ">=",
            func: builtin_ge,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "=",
            func: builtin_equal,
            arity: Arity::AtLeast(1),
        },
        // List operations
        BuiltinOp {
            id: "list",
            func: builtin_list,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "list?",
            func: builtin_is_list,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "empty?",
            func: builtin_is_empty,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "count",
            func: builtin_count,
            arity: Arity::Exact(1),
        },
        // Printing and strings
        BuiltinOp {
            id: "pr-str",
            func: builtin_pr_str,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "str",
            func: builtin_str,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "prn",
            func: builtin_prn,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "println",
            func: builtin_println,
            arity: Arity::Any,
        },
    ]
});

/// Lazy static map from id to BuiltinOp (private - use find_op)
static BUILTIN_BY_ID: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.id, op)).collect()
});

/// Get all builtin operations (for installation into the global environment)
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a builtin operation by its identifier
pub fn find_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_BY_ID.get(id).copied()
}
