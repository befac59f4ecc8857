use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result},
    value::Value,
};

/// Parameter symbol that introduces a variadic binding.
pub const VARIADIC_MARKER: &str = "&";

pub type EnvironmentRef = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    parent: Option<EnvironmentRef>,
    bindings: IndexMap<String, Value>,
}

impl Environment {
    pub fn new() -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: None,
            bindings: IndexMap::new(),
        }))
    }

    pub fn with_parent(parent: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            bindings: IndexMap::new(),
        }))
    }

    /// Creates a child frame binding `params` to `args` in one step. A `&`
    /// in the parameter list binds the following symbol to a list of every
    /// remaining argument, which may be empty.
    pub fn bind(parent: EnvironmentRef, params: &[String], args: &[Value]) -> Result<EnvironmentRef> {
        let env = Environment::with_parent(parent);
        {
            let mut frame = env.borrow_mut();
            let mut i = 0;
            while i < params.len() {
                if params[i] == VARIADIC_MARKER {
                    let rest_name = params.get(i + 1).ok_or_else(|| {
                        Diagnostic::new(
                            DiagnosticKind::MalformedBindings,
                            "`&` must be followed by a binding name",
                        )
                    })?;
                    let rest = args.get(i..).unwrap_or(&[]).to_vec();
                    frame.set(rest_name.clone(), Value::list(rest));
                    return Ok(Rc::clone(&env));
                }
                let value = args.get(i).ok_or_else(|| {
                    Diagnostic::new(
                        DiagnosticKind::WrongArgumentCount,
                        format!(
                            "function expected {} arguments but received {}",
                            params.len(),
                            args.len()
                        ),
                    )
                })?;
                frame.set(params[i].clone(), value.clone());
                i += 1;
            }
            if args.len() > params.len() {
                return Err(Diagnostic::new(
                    DiagnosticKind::WrongArgumentCount,
                    format!(
                        "function expected {} arguments but received {}",
                        params.len(),
                        args.len()
                    ),
                )
                .into());
            }
        }
        Ok(env)
    }

    /// Defines or overwrites a binding in this frame only.
    pub fn set(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Returns the innermost frame (this one or an ancestor) defining `name`.
    pub fn find(env: &EnvironmentRef, name: &str) -> Option<EnvironmentRef> {
        if env.borrow().bindings.contains_key(name) {
            return Some(Rc::clone(env));
        }
        let parent = env.borrow().parent.clone();
        parent.as_ref().and_then(|parent| Environment::find(parent, name))
    }

    pub fn get(env: &EnvironmentRef, name: &str) -> Result<Value> {
        match Environment::find(env, name) {
            Some(frame) => {
                let frame = frame.borrow();
                Ok(frame
                    .bindings
                    .get(name)
                    .cloned()
                    .unwrap_or_else(Value::nil))
            }
            None => Err(Diagnostic::new(
                DiagnosticKind::UnknownSymbol,
                format!("undefined symbol `{name}`"),
            )
            .into()),
        }
    }
}
