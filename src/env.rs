use crate::Error;
use crate::ast::{Builtin, Value};
use crate::builtinops::Arity;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One frame of bindings plus the frame it was created in
struct Frame {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
}

/// Environment for variable bindings.
///
/// A cheap, shared handle: cloning an `Env` yields another handle to the
/// same frame, so closures can keep their defining scope alive after the
/// form that created it has returned. `set` only ever touches the frame the
/// handle points at; parents are read-only through a child.
#[derive(Clone)]
pub struct Env(Rc<Frame>);

impl Env {
    /// A root environment with no parent
    pub fn new() -> Self {
        Env(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// A new empty frame whose lookups fall back to `parent`
    pub fn with_parent(parent: &Env) -> Self {
        Env(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    /// Bind `name` in this frame, replacing any previous binding here.
    /// Returns the bound value.
    pub fn set(&self, name: impl Into<String>, value: Value) -> Value {
        self.0
            .bindings
            .borrow_mut()
            .insert(name.into(), value.clone());
        value
    }

    /// Look `name` up in this frame, then in each parent in turn
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let mut current = self;
        loop {
            if let Some(value) = current.0.bindings.borrow().get(name) {
                return Ok(value.clone());
            }
            match &current.0.parent {
                Some(parent) => current = parent,
                None => return Err(Error::SymbolNotFound(name.to_owned())),
            }
        }
    }

    /// Whether `name` resolves anywhere in the chain
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Register a native function in this frame.
    ///
    /// The function receives the calling environment and its evaluated
    /// arguments. `arity` is checked before every call.
    ///
    /// # Example
    /// ```
    /// use maltree::Arity;
    /// use maltree::ast::Value;
    /// use maltree::evaluator::create_global_env;
    ///
    /// let env = create_global_env();
    /// env.register_builtin_function("answer", Arity::Exact(0), |_env, _args| {
    ///     Ok(Value::Number(42))
    /// });
    /// assert_eq!(maltree::rep("(answer)", &env).unwrap().as_deref(), Some("42"));
    /// ```
    pub fn register_builtin_function<F>(&self, name: &str, arity: Arity, func: F)
    where
        F: Fn(&Env, &[Value]) -> Result<Value, Error> + 'static,
    {
        let builtin = Builtin::new(name, arity, func);
        self.set(name, crate::ast::Function::Builtin(builtin).into());
    }

    /// All visible bindings, innermost shadowing outer, sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut frames = Vec::new();
        let mut current = Some(self);
        while let Some(env) = current {
            frames.push(env);
            current = env.0.parent.as_ref();
        }

        let mut merged: HashMap<String, Value> = HashMap::new();
        // Outermost first so inner frames overwrite shadowed names
        for env in frames.into_iter().rev() {
            for (name, value) in env.0.bindings.borrow().iter() {
                merged.insert(name.clone(), value.clone());
            }
        }

        let mut bindings: Vec<(String, Value)> = merged.into_iter().collect();
        bindings.sort_by(|(a, _), (b, _)| a.cmp(b));
        bindings
    }
}

impl Default for Env {
    fn default() -> Self {
        Env::new()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.0.bindings.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Env")
            .field("bindings", &names)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
