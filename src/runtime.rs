use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result},
    environment::{Environment, EnvironmentRef},
    printer, reader,
    value::{ClosureValue, Value, ValueKind},
};

/// Forms evaluated into the root environment before any user code runs.
const PRELUDE: &[&str] = &[
    "(def! not (fn* (a) (if a false true)))",
    "(def! load-file (fn* (f) (eval (read-string (str \"(do \" (slurp f) \"\\nnil)\")))))",
];

pub struct Interpreter {
    env: EnvironmentRef,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_args(Vec::new())
    }

    /// Builds an interpreter whose root environment exposes `args` to
    /// evaluated code as the `*ARGV*` list.
    pub fn with_args(args: Vec<String>) -> Self {
        let env = Environment::new();
        env.borrow_mut().set(
            "*ARGV*".to_string(),
            Value::list(args.into_iter().map(Value::string).collect()),
        );
        let mut interpreter = Self { env };
        crate::stdlib::install(&interpreter.env);
        interpreter
            .install_prelude()
            .expect("prelude forms are well-formed");
        interpreter
    }

    pub fn root_env(&self) -> EnvironmentRef {
        Rc::clone(&self.env)
    }

    fn install_prelude(&mut self) -> Result<()> {
        for source in PRELUDE {
            self.eval_source(source)?;
        }
        Ok(())
    }

    /// Read one form from `source` and evaluate it in the root environment.
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let ast = reader::read_str(source)?;
        let env = self.root_env();
        self.eval(ast, env)
    }

    /// The read-eval-print contract the REPL and CLI loop over: one form in,
    /// its readable rendering out. Errors leave the root environment intact.
    pub fn rep(&mut self, source: &str) -> Result<String> {
        let value = self.eval_source(source)?;
        Ok(printer::pr_str(&value, true))
    }

    /// The trampoline. Tail positions reassign `ast`/`env` and continue the
    /// loop instead of recursing, so tail calls never grow the host stack.
    pub fn eval(&mut self, mut ast: Value, mut env: EnvironmentRef) -> Result<Value> {
        loop {
            let items = match &*ast.0 {
                ValueKind::List(items) => items.clone(),
                _ => return self.eval_ast(&ast, &env),
            };
            if items.is_empty() {
                return Ok(ast);
            }

            match items[0].as_symbol() {
                Some("def!") => {
                    expect_form_len(&items, 3, "def!")?;
                    let name = items[1].as_symbol().ok_or_else(|| {
                        Diagnostic::new(
                            DiagnosticKind::WrongArgumentType,
                            "`def!` can only define symbols",
                        )
                    })?;
                    let name = name.to_string();
                    let value = self.eval(items[2].clone(), Rc::clone(&env))?;
                    env.borrow_mut().set(name, value.clone());
                    return Ok(value);
                }
                Some("let*") => {
                    expect_form_len(&items, 3, "let*")?;
                    let child = Environment::with_parent(Rc::clone(&env));
                    let bindings = items[1].as_sequence().ok_or_else(|| {
                        Diagnostic::new(
                            DiagnosticKind::MalformedBindings,
                            "first argument to `let*` must be a binding sequence",
                        )
                    })?;
                    if bindings.len() % 2 != 0 {
                        return Err(Diagnostic::new(
                            DiagnosticKind::MalformedBindings,
                            "`let*` bindings must come in symbol/expression pairs",
                        )
                        .into());
                    }
                    for pair in bindings.chunks(2) {
                        let name = pair[0].as_symbol().ok_or_else(|| {
                            Diagnostic::new(
                                DiagnosticKind::MalformedBindings,
                                "`let*` can only bind symbols",
                            )
                        })?;
                        let name = name.to_string();
                        // Evaluated in the child frame so each binding sees
                        // the ones before it.
                        let value = self.eval(pair[1].clone(), Rc::clone(&child))?;
                        child.borrow_mut().set(name, value);
                    }
                    // TCO
                    ast = items[2].clone();
                    env = child;
                }
                Some("do") => {
                    let rest = &items[1..];
                    match rest.len() {
                        0 => ast = Value::nil(),
                        1 => ast = rest[0].clone(),
                        _ => {
                            for form in &rest[..rest.len() - 1] {
                                self.eval(form.clone(), Rc::clone(&env))?;
                            }
                            // TCO
                            ast = rest[rest.len() - 1].clone();
                        }
                    }
                }
                Some("if") => {
                    if items.len() != 3 && items.len() != 4 {
                        return Err(Diagnostic::new(
                            DiagnosticKind::WrongArgumentCount,
                            "`if` takes a condition, a then-branch, and an optional else-branch",
                        )
                        .into());
                    }
                    let condition = self.eval(items[1].clone(), Rc::clone(&env))?;
                    // TCO
                    ast = if condition.is_truthy() {
                        items[2].clone()
                    } else if items.len() == 4 {
                        items[3].clone()
                    } else {
                        Value::nil()
                    };
                }
                Some("fn*") => {
                    expect_form_len(&items, 3, "fn*")?;
                    let params = items[1].as_sequence().ok_or_else(|| {
                        Diagnostic::new(
                            DiagnosticKind::WrongArgumentType,
                            "`fn*` needs a parameter sequence",
                        )
                    })?;
                    let params = params
                        .iter()
                        .map(|param| {
                            param.as_symbol().map(str::to_string).ok_or_else(|| {
                                Diagnostic::new(
                                    DiagnosticKind::WrongArgumentType,
                                    format!("parameters must be symbols, found {}", param.type_name()),
                                )
                                .into()
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    return Ok(Value::new(ValueKind::Closure(ClosureValue {
                        params,
                        body: items[2].clone(),
                        env: Rc::clone(&env),
                    })));
                }
                Some("quote") => {
                    expect_form_len(&items, 2, "quote")?;
                    return Ok(items[1].clone());
                }
                Some("quasiquote") => {
                    expect_form_len(&items, 2, "quasiquote")?;
                    // Pure tree rewrite; the rewritten form re-enters the loop.
                    ast = quasiquote(&items[1]);
                }
                _ => {
                    let evaluated = self.eval_ast(&ast, &env)?;
                    let ValueKind::List(items) = &*evaluated.0 else {
                        unreachable!("eval_ast preserves the container kind");
                    };
                    let [callee, args @ ..] = items.as_slice() else {
                        unreachable!("the call form is non-empty");
                    };
                    match &*callee.0 {
                        ValueKind::NativeFunction(function) => {
                            return function.call(self, args);
                        }
                        ValueKind::Closure(closure) => {
                            // TCO: bind parameters and loop on the body
                            // instead of recursing.
                            env = Environment::bind(Rc::clone(&closure.env), &closure.params, args)?;
                            ast = closure.body.clone();
                        }
                        _ => {
                            return Err(Diagnostic::new(
                                DiagnosticKind::NotCallable,
                                format!("{} is not callable", callee.type_name()),
                            )
                            .into());
                        }
                    }
                }
            }
        }
    }

    /// Structural evaluation: symbols resolve, containers rebuild with
    /// evaluated contents, everything else is itself.
    fn eval_ast(&mut self, ast: &Value, env: &EnvironmentRef) -> Result<Value> {
        match &*ast.0 {
            ValueKind::Symbol(name) => Environment::get(env, name),
            ValueKind::List(items) => Ok(Value::list(self.eval_items(items, env)?)),
            ValueKind::Vector(items) => Ok(Value::vector(self.eval_items(items, env)?)),
            ValueKind::Map(entries) => {
                let mut evaluated = IndexMap::new();
                for (key, value) in entries {
                    evaluated.insert(key.clone(), self.eval(value.clone(), Rc::clone(env))?);
                }
                Ok(Value::map(evaluated))
            }
            _ => Ok(ast.clone()),
        }
    }

    fn eval_items(&mut self, items: &[Value], env: &EnvironmentRef) -> Result<Vec<Value>> {
        items
            .iter()
            .map(|item| self.eval(item.clone(), Rc::clone(env)))
            .collect()
    }

    /// Function application outside the trampoline, for builtins such as
    /// `swap!` that re-enter evaluation.
    pub fn apply(&mut self, callee: &Value, args: &[Value]) -> Result<Value> {
        match &*callee.0 {
            ValueKind::NativeFunction(function) => function.call(self, args),
            ValueKind::Closure(closure) => {
                let env = Environment::bind(Rc::clone(&closure.env), &closure.params, args)?;
                self.eval(closure.body.clone(), env)
            }
            _ => Err(Diagnostic::new(
                DiagnosticKind::NotCallable,
                format!("{} is not callable", callee.type_name()),
            )
            .into()),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_form_len(items: &[Value], expected: usize, form: &str) -> Result<()> {
    if items.len() != expected {
        return Err(Diagnostic::new(
            DiagnosticKind::WrongArgumentCount,
            format!(
                "`{form}` expected {} arguments but received {}",
                expected - 1,
                items.len() - 1
            ),
        )
        .into());
    }
    Ok(())
}

/// Rewrites a quasiquoted tree into `cons`/`concat`/`vec` calls.
fn quasiquote(ast: &Value) -> Value {
    match &*ast.0 {
        ValueKind::List(items) => {
            if let [head, arg] = items.as_slice() {
                if head.as_symbol() == Some("unquote") {
                    return arg.clone();
                }
            }
            quasiquote_sequence(items)
        }
        ValueKind::Vector(items) => {
            Value::list(vec![Value::symbol("vec"), quasiquote_sequence(items)])
        }
        ValueKind::Symbol(_) | ValueKind::Map(_) => {
            Value::list(vec![Value::symbol("quote"), ast.clone()])
        }
        _ => ast.clone(),
    }
}

fn quasiquote_sequence(items: &[Value]) -> Value {
    let mut acc = Value::list(Vec::new());
    for item in items.iter().rev() {
        let splice = match &*item.0 {
            ValueKind::List(inner) => match inner.as_slice() {
                [head, arg] if head.as_symbol() == Some("splice-unquote") => Some(arg.clone()),
                _ => None,
            },
            _ => None,
        };
        acc = match splice {
            Some(spliced) => Value::list(vec![Value::symbol("concat"), spliced, acc]),
            None => Value::list(vec![Value::symbol("cons"), quasiquote(item), acc]),
        };
    }
    acc
}
