use crate::Error;
use crate::ast::{Builtin, Closure, Function, Params, SpecialForm, Value};
use crate::builtinops::get_builtin_ops;
use crate::env::Env;
use crate::reader::read_str;
use tracing::{debug, trace};

/// Definitions evaluated into every global environment
const PRELUDE: &[&str] = &["(def! not (fn* (a) (if a false true)))"];

/// Evaluate `form` in `env`.
///
/// The active environment is a parameter, so any scope entered while
/// evaluating (a `let*` block or a closure call) ends when this returns,
/// whether it succeeds or fails.
pub fn eval(form: &Value, env: &Env) -> Result<Value, Error> {
    trace!(form = %form, "eval");
    match form {
        // Self-evaluating forms
        Value::Nil
        | Value::Bool(_)
        | Value::Number(_)
        | Value::String(_)
        | Value::Function(_) => Ok(form.clone()),
        Value::Symbol(_) if form.is_keyword() => Ok(form.clone()),

        // Variable lookup
        Value::Symbol(name) => env.get(name),

        Value::Vector(items) => Ok(Value::Vector(eval_all(items, env)?)),
        Value::HashMap(items) => Ok(Value::HashMap(eval_all(items, env)?)),

        Value::List(items) => match items.split_first() {
            None => Ok(form.clone()),
            Some((head, args)) => eval_list(head, args, env),
        },
    }
}

/// Evaluate every form left to right
fn eval_all(forms: &[Value], env: &Env) -> Result<Vec<Value>, Error> {
    forms.iter().map(|form| eval(form, env)).collect()
}

/// Evaluate forms in sequence, yielding the last value or Nil
fn eval_body(forms: &[Value], env: &Env) -> Result<Value, Error> {
    let mut result = Value::Nil;
    for form in forms {
        result = eval(form, env)?;
    }
    Ok(result)
}

/// Evaluate a non-empty list: the head decides how the rest is treated
fn eval_list(head: &Value, args: &[Value], env: &Env) -> Result<Value, Error> {
    let func = match eval(head, env)? {
        Value::Function(func) => func,
        other => return Err(Error::NotAFunction(other.type_name().to_owned())),
    };

    match func.as_ref() {
        // Special forms receive their argument forms unevaluated
        Function::SpecialForm(form) => eval_special_form(*form, args, env),
        Function::Builtin(builtin) => {
            let values = eval_all(args, env)?;
            debug!(builtin = %builtin.name, argc = values.len(), "apply builtin");
            builtin.call(env, &values)
        }
        Function::Closure(closure) => {
            let values = eval_all(args, env)?;
            apply_closure(closure, &values)
        }
    }
}

fn eval_special_form(form: SpecialForm, args: &[Value], env: &Env) -> Result<Value, Error> {
    form.arity().validate(form.name(), args.len())?;
    match form {
        SpecialForm::Def => eval_def(args, env),
        SpecialForm::Let => eval_let(args, env),
        SpecialForm::If => eval_if(args, env),
        SpecialForm::Do => eval_body(args, env),
        SpecialForm::Fn => eval_fn(args, env),
    }
}

/// `(def! name expr)`: bind in the current environment
fn eval_def(args: &[Value], env: &Env) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval(expr, env)?;
            debug!(name = %name, value = %value, "def!");
            Ok(env.set(name.clone(), value))
        }
        [other, _] => Err(Error::wrong_type("a symbol as def! name", other)),
        _ => Err(Error::arity_error(
            SpecialForm::Def.name(),
            SpecialForm::Def.arity(),
            args.len(),
        )),
    }
}

/// `(let* (name expr ...) body...)`: sequential bindings in a child scope
fn eval_let(args: &[Value], env: &Env) -> Result<Value, Error> {
    let Some((bindings, body)) = args.split_first() else {
        return Err(Error::arity_error(
            SpecialForm::Let.name(),
            SpecialForm::Let.arity(),
            0,
        ));
    };

    let Some(pairs) = bindings.as_sequence() else {
        return Err(Error::wrong_type("a list or vector of let* bindings", bindings));
    };
    if pairs.len() % 2 != 0 {
        return Err(Error::EvalError(
            "let* bindings need an even number of forms".to_owned(),
        ));
    }

    let local = Env::with_parent(env);
    let mut remaining = pairs;
    while let [name, expr, rest @ ..] = remaining {
        let Value::Symbol(name) = name else {
            return Err(Error::wrong_type("a symbol in let* bindings", name));
        };
        // Later bindings see earlier ones
        let value = eval(expr, &local)?;
        debug!(name = %name, value = %value, "let* binding");
        local.set(name.clone(), value);
        remaining = rest;
    }

    eval_body(body, &local)
}

/// `(if cond then else?)`: only `false` and `nil` are false
fn eval_if(args: &[Value], env: &Env) -> Result<Value, Error> {
    let Some((condition, branches)) = args.split_first() else {
        return Err(Error::arity_error(
            SpecialForm::If.name(),
            SpecialForm::If.arity(),
            0,
        ));
    };

    let condition = eval(condition, env)?;
    match (condition.is_truthy(), branches) {
        (true, [then, ..]) => eval(then, env),
        (false, [_, otherwise]) => eval(otherwise, env),
        // False condition without an else branch
        _ => Ok(Value::Nil),
    }
}

/// `(fn* (params...) body...)`: capture the current environment
fn eval_fn(args: &[Value], env: &Env) -> Result<Value, Error> {
    let Some((params, body)) = args.split_first() else {
        return Err(Error::arity_error(
            SpecialForm::Fn.name(),
            SpecialForm::Fn.arity(),
            0,
        ));
    };

    let params = match params.as_sequence() {
        Some(forms) => Params::from_forms(forms)?,
        None => return Err(Error::wrong_type("a list or vector of fn* parameters", params)),
    };

    Ok(Function::Closure(Closure {
        params,
        body: body.to_vec(),
        env: env.clone(),
    })
    .into())
}

/// Call a closure with evaluated arguments.
///
/// Missing positional arguments are bound to Nil; surplus arguments go to
/// the rest parameter when there is one and are dropped otherwise.
fn apply_closure(closure: &Closure, args: &[Value]) -> Result<Value, Error> {
    debug!(
        params = ?closure.params.positional,
        rest = ?closure.params.rest,
        argc = args.len(),
        "apply closure"
    );

    let local = Env::with_parent(&closure.env);
    for (i, name) in closure.params.positional.iter().enumerate() {
        let value = args.get(i).cloned().unwrap_or(Value::Nil);
        local.set(name.clone(), value);
    }
    if let Some(rest) = &closure.params.rest {
        let surplus = args
            .get(closure.params.positional.len()..)
            .unwrap_or_default();
        local.set(rest.clone(), Value::List(surplus.to_vec()));
    }

    eval_body(&closure.body, &local)
}

fn load_prelude(env: &Env) -> Result<(), Error> {
    for source in PRELUDE {
        if let Some(form) = read_str(source)? {
            eval(&form, env)?;
        }
    }
    Ok(())
}

/// Create a global environment with built-in functions, the special forms
/// and the prelude definitions
pub fn create_global_env() -> Env {
    let env = Env::new();

    // Add all regular functions from the registry
    for op in get_builtin_ops() {
        let builtin = Builtin::new(op.id, op.arity, op.func);
        env.set(op.id, Function::Builtin(builtin).into());
    }

    for form in SpecialForm::ALL {
        env.set(form.name(), Function::SpecialForm(form).into());
    }

    load_prelude(&env).expect("prelude definitions must evaluate");

    env
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::Arity;
    use crate::ast::{list, nil, sym, val, vector};
    use crate::printer::pr_str;

    /// Test result variants for comprehensive testing
    #[derive(Debug)]
    enum TestResult {
        EvalResult(Value),           // Evaluation should succeed with this value
        Printed(&'static str),       // Evaluation should succeed and print readably as this
        Succeeds,                    // Evaluation should succeed with any value
        SpecificError(&'static str), // Evaluation should fail with error containing this string
        AnyError,                    // Evaluation should fail (any error)
    }
    use TestResult::*;

    /// Test environment containing test cases that share state
    struct TestEnvironment(Vec<(&'static str, TestResult)>);

    /// Micro-helper for success cases in comprehensive tests
    fn success<T: Into<Value>>(value: T) -> TestResult {
        EvalResult(val(value))
    }

    /// Macro for setup expressions whose value does not matter (like def! of a function)
    macro_rules! test_setup {
        ($expr:expr) => {
            ($expr, Succeeds)
        };
    }

    /// Run tests in isolated environments with shared state
    fn run_tests_in_environment(test_environments: Vec<TestEnvironment>) {
        for (env_idx, TestEnvironment(test_cases)) in test_environments.iter().enumerate() {
            let env = create_global_env();

            for (test_idx, (input, expected)) in test_cases.iter().enumerate() {
                let test_id = format!("Environment #{} test #{}", env_idx + 1, test_idx + 1);
                execute_test_case(input, expected, &env, &test_id);
            }
        }
    }

    /// Execute a single test case with detailed error reporting
    fn execute_test_case(input: &str, expected: &TestResult, env: &Env, test_id: &str) {
        let form = match read_str(input) {
            Ok(Some(form)) => form,
            other => panic!("{test_id}: unexpected read result for '{input}': {other:?}"),
        };

        match (eval(&form, env), expected) {
            (Ok(actual), EvalResult(expected_val)) => {
                assert_eq!(actual, *expected_val, "{test_id}: '{input}' value mismatch");
            }
            (Ok(actual), Printed(expected_text)) => {
                assert_eq!(
                    pr_str(&actual, true),
                    *expected_text,
                    "{test_id}: '{input}' printed form mismatch"
                );
            }
            (Ok(_), Succeeds) => {}
            (Err(_), AnyError) => {} // Expected generic error
            (Err(e), SpecificError(expected_text)) => {
                let error_msg = format!("{e}");
                assert!(
                    error_msg.contains(expected_text),
                    "{test_id}: '{input}' error should contain '{expected_text}', got: {error_msg}"
                );
            }
            (Ok(actual), AnyError) => {
                panic!("{test_id}: '{input}' expected error, got {actual:?}");
            }
            (Ok(actual), SpecificError(expected_text)) => {
                panic!("{test_id}: '{input}' expected error containing '{expected_text}', got {actual:?}");
            }
            (Err(err), _) => {
                panic!("{test_id}: '{input}' expected {expected:?}, got error {err:?}");
            }
        }
    }

    /// Simplified test runner: every case gets a fresh global environment
    fn run_comprehensive_tests(test_cases: Vec<(&str, TestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let env = create_global_env();
            let test_id = format!("#{}", i + 1);
            execute_test_case(input, expected, &env, &test_id);
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_comprehensive_operations_data_driven() {
        let test_cases = vec![
            // === SELF-EVALUATING FORMS ===
            ("42", success(42)),
            ("-271", success(-271)),
            ("\"hello\"", success("hello")),
            ("nil", EvalResult(nil())),
            ("true", success(true)),
            ("false", success(false)),
            (":keyword", EvalResult(sym(":keyword"))),
            ("()", EvalResult(list(vec![]))),
            ("+", Printed("#<function>")),
            ("if", Printed("#<function>")),
            // === SYMBOL LOOKUP ===
            ("undefined-thing", SpecificError("symbol not found: 'undefined-thing'")),
            ("(undefined-fn 1)", SpecificError("symbol not found: 'undefined-fn'")),
            // === COLLECTIONS EVALUATE THEIR ELEMENTS ===
            ("[1 (+ 1 1) 3]", Printed("[1 2 3]")),
            ("[]", Printed("[]")),
            ("[[(* 2 2)] \"s\"]", Printed("[[4] \"s\"]")),
            ("{:a (+ 1 2) \"b\" [(- 1)]}", Printed("{:a 3 \"b\" [-1]}")),
            ("{}", Printed("{}")),
            ("[1 missing]", SpecificError("symbol not found: 'missing'")),
            ("{:a missing}", SpecificError("symbol not found: 'missing'")),
            // === FUNCTION APPLICATION ===
            ("(+ 1 2)", success(3)),
            ("(+ 1 (* 2 3))", success(7)),
            ("(- 10 (/ 9 3))", success(7)),
            ("(* (+ 1 2) (- 5 1))", success(12)),
            ("((if true + -) 5 3)", success(8)),
            ("((if false + -) 5 3)", success(2)),
            ("(1 2)", SpecificError("expected a function but got number")),
            ("(\"f\" 1)", SpecificError("expected a function but got string")),
            ("(nil)", SpecificError("expected a function but got nil")),
            ("(:kw)", SpecificError("expected a function but got keyword")),
            ("([] 1)", SpecificError("expected a function but got vector")),
            ("(+ 1 \"a\")", SpecificError("expected a number but got string")),
            ("(/ 1 0)", SpecificError("division by zero")),
            ("(count 1 2)", SpecificError("wrong number of arguments to 'count': expected 1, got 2")),
            // Quote shorthand reads fine but quote is not bound
            ("'a", SpecificError("symbol not found: 'quote'")),
            // === IF ===
            ("(if true 1 2)", success(1)),
            ("(if false 1 2)", success(2)),
            ("(if nil 1 2)", success(2)),
            ("(if 0 \"t\" \"f\")", success("t")),
            ("(if \"\" \"t\" \"f\")", success("t")),
            ("(if () \"t\" \"f\")", success("t")),
            ("(if [] \"t\" \"f\")", success("t")),
            ("(if false \"t\" \"f\")", success("f")),
            ("(if nil \"t\" \"f\")", success("f")),
            ("(if true 1)", success(1)),
            ("(if false 1)", EvalResult(nil())),
            ("(if nil 1)", EvalResult(nil())),
            ("(if (< 1 2) (+ 1 1) undefined-branch)", success(2)),
            ("(if (> 1 2) undefined-branch 3)", success(3)),
            ("(if)", SpecificError("wrong number of arguments to 'if': expected 2 to 3, got 0")),
            ("(if true)", SpecificError("wrong number of arguments to 'if'")),
            ("(if true 1 2 3)", SpecificError("got 4")),
            ("(if missing 1 2)", SpecificError("symbol not found: 'missing'")),
            // === DO ===
            ("(do)", EvalResult(nil())),
            ("(do 1 2 3)", success(3)),
            ("(do (def! x 5) (+ x 1))", success(6)),
            ("(do 1 (missing) 3)", SpecificError("symbol not found: 'missing'")),
            // === DEF! ===
            ("(def! x 10)", success(10)),
            ("(def! x (+ 1 2))", success(3)),
            ("(def! :k 1)", success(1)),
            ("(def! 1 2)", SpecificError("expected a symbol as def! name but got number")),
            ("(def! \"x\" 2)", SpecificError("expected a symbol as def! name but got string")),
            ("(def! a)", SpecificError("wrong number of arguments to 'def!': expected 2, got 1")),
            ("(def! a 1 2)", SpecificError("wrong number of arguments to 'def!': expected 2, got 3")),
            ("(def!)", SpecificError("got 0")),
            ("(def! a missing)", SpecificError("symbol not found: 'missing'")),
            // === LET* ===
            ("(let* (x 1 y (+ x 1)) y)", success(2)),
            ("(let* [x 2] (* x x))", success(4)),
            ("(let* (x 1))", EvalResult(nil())),
            ("(let* ())", EvalResult(nil())),
            ("(let* (x 1) 3 x)", success(1)),
            ("(let* (x 1) (let* (x 2) x))", success(2)),
            ("(let* (x 1) (let* (y 2) (+ x y)))", success(3)),
            ("(let* (x 1 x (+ x 10)) x)", success(11)),
            ("(let* (x) x)", SpecificError("even number of forms")),
            ("(let* (x 1 y) x)", SpecificError("even number of forms")),
            ("(let* (1 2) 3)", SpecificError("expected a symbol in let* bindings but got number")),
            ("(let* x 1)", SpecificError("expected a list or vector of let* bindings but got symbol")),
            ("(let*)", SpecificError("wrong number of arguments to 'let*': expected at least 1, got 0")),
            // === FN* ===
            ("(fn* (a) a)", Printed("#<function>")),
            ("((fn* (a b) (+ a b)) 1 2)", success(3)),
            ("((fn* [x] x) 7)", success(7)),
            ("((fn* ()))", EvalResult(nil())),
            ("((fn* () 1 2 3))", success(3)),
            ("((fn* (a & rest) rest) 1 2 3)", success([2, 3])),
            ("((fn* (a & rest) rest) 1)", EvalResult(list(vec![]))),
            ("((fn* (& all) all))", EvalResult(list(vec![]))),
            ("((fn* (& all) all) 1 2)", success([1, 2])),
            ("(list? ((fn* (& all) all) 1))", success(true)),
            ("((fn* (a b) b) 1)", EvalResult(nil())),
            ("((fn* (a b c) (list a b c)) 1)", EvalResult(list(vec![val(1), nil(), nil()]))),
            ("((fn* (a) a) 1 2 3)", success(1)),
            ("((fn* (a) (+ a 1)) (+ 2 3))", success(6)),
            ("(((fn* (a) (fn* (b) (+ a b))) 10) 5)", success(15)),
            ("((fn* (f x) (f x)) (fn* (n) (* n n)) 7)", success(49)),
            ("(fn* (1) 1)", SpecificError("expected a symbol in fn* parameters but got number")),
            ("(fn* (a &) a)", SpecificError("'&' must be followed by exactly one parameter name")),
            ("(fn* (& a b) a)", SpecificError("'&' must be followed")),
            ("(fn* a a)", SpecificError("expected a list or vector of fn* parameters but got symbol")),
            ("(fn*)", SpecificError("wrong number of arguments to 'fn*'")),
            ("((fn* (a) (+ a \"x\")) 1)", SpecificError("expected a number")),
            // === PRELUDE ===
            ("(not false)", success(true)),
            ("(not nil)", success(true)),
            ("(not true)", success(false)),
            ("(not 0)", success(false)),
            ("(not (list))", success(false)),
            // === PRIMITIVES THROUGH THE EVALUATOR ===
            ("(= (list 1 2) [1 2])", success(true)),
            ("(= [1 2] (list 1 3))", success(false)),
            ("(count [1 2 3])", success(3)),
            ("(count nil)", success(0)),
            ("(list? [1])", success(false)),
            ("(list? (list 1))", success(true)),
            ("(empty? ())", success(true)),
            ("(empty? [1])", success(false)),
            ("(str \"a\" 1 :b)", success("a1:b")),
            ("(pr-str \"a\" [1])", success("\"a\" [1]")),
            ("(str [\"a\" \"b\"])", success("[a b]")),
            ("(list 1 (+ 1 1))", success([1, 2])),
            ("(prn \"out\")", EvalResult(nil())),
            ("(println \"out\" 1)", EvalResult(nil())),
        ];

        run_comprehensive_tests(test_cases);
    }

    #[test]
    fn test_vector_results_keep_their_variant() {
        let env = create_global_env();
        let form = read_str("[1 (+ 1 1)]").unwrap().unwrap();
        let result = eval(&form, &env).unwrap();
        assert!(matches!(result, Value::Vector(_)), "got {result:?}");
        // and still equal to a list with the same elements
        assert_eq!(result, val([1, 2]));
        assert_eq!(result, vector(vec![val(1), val(2)]));

        let form = read_str("{:a 1}").unwrap().unwrap();
        assert!(matches!(eval(&form, &env).unwrap(), Value::HashMap(_)));
    }

    #[test]
    fn test_stateful_environments() {
        let environments = vec![
            // === LEXICAL SCOPING ===
            TestEnvironment(vec![
                test_setup!("(def! f (let* (x 1) (fn* () x)))"),
                ("(def! x 99)", success(99)),
                ("(f)", success(1)),
                ("x", success(99)),
            ]),
            // === ERRORS LEAVE THE ENVIRONMENT USABLE ===
            TestEnvironment(vec![
                ("(+ 1 \"a\")", AnyError),
                ("(def! g 5)", success(5)),
                ("g", success(5)),
                ("(undefined)", AnyError),
                ("(+ g 1)", success(6)),
            ]),
            // === SCOPES DO NOT LEAK ===
            TestEnvironment(vec![
                ("(def! y 1)", success(1)),
                ("(let* (y 2) (+ y \"oops\"))", AnyError),
                ("y", success(1)),
                ("(let* (z 3) z)", success(3)),
                ("z", SpecificError("symbol not found: 'z'")),
                ("(let* (a 1) (def! b 2))", success(2)),
                ("b", SpecificError("symbol not found: 'b'")),
                test_setup!("(def! h (fn* () (do (def! inner 7) inner)))"),
                ("(h)", success(7)),
                ("inner", SpecificError("symbol not found: 'inner'")),
            ]),
            // === PARAMETERS SHADOW GLOBALS ===
            TestEnvironment(vec![
                ("(def! a 1)", success(1)),
                ("((fn* (a) a) 2)", success(2)),
                ("((fn* (b) a) 2)", success(1)),
                ("a", success(1)),
                ("(let* (a 5) ((fn* () a)))", success(5)),
            ]),
            // === REDEFINITION ===
            TestEnvironment(vec![
                ("(def! v 1)", success(1)),
                ("(def! v (+ v 1))", success(2)),
                ("v", success(2)),
                test_setup!("(def! plus +)"),
                ("(plus 1 2)", success(3)),
                ("(= plus +)", success(true)),
                test_setup!("(def! when-true if)"),
                ("(when-true true 1 undefined)", success(1)),
            ]),
            // === RECURSION THROUGH GLOBAL NAMES ===
            TestEnvironment(vec![
                test_setup!("(def! fact (fn* (n) (if (<= n 1) 1 (* n (fact (- n 1))))))"),
                ("(fact 5)", success(120)),
                ("(fact 20)", success(2432902008176640000_i64)),
                ("(fact 21)", SpecificError("overflow")),
                test_setup!("(def! fib (fn* (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))"),
                ("(fib 10)", success(55)),
            ]),
            // === MUTUAL RECURSION: names resolve at call time ===
            TestEnvironment(vec![
                test_setup!("(def! is-even (fn* (n) (if (= n 0) true (is-odd (- n 1)))))"),
                test_setup!("(def! is-odd (fn* (n) (if (= n 0) false (is-even (- n 1)))))"),
                ("(is-even 10)", success(true)),
                ("(is-odd 7)", success(true)),
                ("(is-even 7)", success(false)),
            ]),
            // === CLOSURES CAPTURE THEIR DEFINING SCOPE ===
            TestEnvironment(vec![
                test_setup!("(def! make-adder (fn* (n) (fn* (x) (+ x n))))"),
                test_setup!("(def! add5 (make-adder 5))"),
                ("(add5 10)", success(15)),
                ("((make-adder 1) 1)", success(2)),
                ("(add5 1)", success(6)),
                ("n", SpecificError("symbol not found: 'n'")),
            ]),
            // === VARIADIC HELPERS ===
            TestEnvironment(vec![
                test_setup!("(def! count-args (fn* (& xs) (if (empty? xs) 0 (count xs))))"),
                ("(count-args)", success(0)),
                ("(count-args 4 5 6)", success(3)),
                test_setup!("(def! first-or-nil (fn* (a & more) a))"),
                ("(first-or-nil)", EvalResult(nil())),
                ("(first-or-nil 9 8)", success(9)),
            ]),
        ];

        run_tests_in_environment(environments);
    }

    #[test]
    fn test_arity_errors_are_structured() {
        let env = create_global_env();
        for (input, got) in [("(def! a)", 1), ("(def! a 1 2)", 3)] {
            let form = read_str(input).unwrap().unwrap();
            match eval(&form, &env).unwrap_err() {
                crate::Error::ArityError {
                    name,
                    expected,
                    got: actual,
                } => {
                    assert_eq!(name, "def!");
                    assert_eq!(expected, Arity::Exact(2));
                    assert_eq!(actual, got);
                }
                other => panic!("expected ArityError for {input}, got {other:?}"),
            }
        }

        let form = read_str("(def! a 1)").unwrap().unwrap();
        assert_eq!(eval(&form, &env).unwrap(), val(1));
        assert_eq!(env.get("a").unwrap(), val(1));
    }

    #[test]
    fn test_global_env_contents() {
        let env = create_global_env();
        for name in ["+", "-", "*", "/", "=", "count", "prn", "str", "not"] {
            assert!(env.contains(name), "missing {name}");
        }
        for form in SpecialForm::ALL {
            assert!(env.contains(form.name()), "missing special form {}", form.name());
        }

        // Every environment gets its own global frame
        let other = create_global_env();
        env.set("only-here", val(1));
        assert!(!other.contains("only-here"));
    }

    #[test]
    fn test_builtins_receive_calling_environment() {
        let env = create_global_env();
        env.register_builtin_function("lookup-x", Arity::Exact(0), |env, _args| env.get("x"));

        let form = read_str("(let* (x 5) (lookup-x))").unwrap().unwrap();
        assert_eq!(eval(&form, &env).unwrap(), val(5));

        let form = read_str("(lookup-x)").unwrap().unwrap();
        assert!(eval(&form, &env).is_err());

        let form = read_str("(lookup-x 1)").unwrap().unwrap();
        assert!(matches!(
            eval(&form, &env).unwrap_err(),
            crate::Error::ArityError { .. }
        ));
    }

    #[test]
    fn test_arguments_evaluate_left_to_right() {
        let env = create_global_env();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = seen.clone();
        env.register_builtin_function("note", Arity::Exact(1), move |_env, args| {
            log.borrow_mut().push(args[0].clone());
            Ok(args[0].clone())
        });

        let form = read_str("(list (note 1) (note 2) [(note 3)] (note 4))").unwrap().unwrap();
        eval(&form, &env).unwrap();
        assert_eq!(*seen.borrow(), vec![val(1), val(2), val(3), val(4)]);
    }
}
