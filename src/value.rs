use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result},
    environment::EnvironmentRef,
    printer,
    runtime::Interpreter,
};

#[derive(Clone)]
pub struct Value(pub Rc<ValueKind>);

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn nil() -> Self {
        Self::new(ValueKind::Nil)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ValueKind::Bool(value))
    }

    pub fn number(value: f64) -> Self {
        Self::new(ValueKind::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Str(value.into()))
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Symbol(value.into()))
    }

    pub fn list(values: Vec<Value>) -> Self {
        Self::new(ValueKind::List(values))
    }

    pub fn vector(values: Vec<Value>) -> Self {
        Self::new(ValueKind::Vector(values))
    }

    pub fn map(entries: IndexMap<MapKey, Value>) -> Self {
        Self::new(ValueKind::Map(entries))
    }

    pub fn atom(value: Value) -> Self {
        Self::new(ValueKind::Atom(Rc::new(RefCell::new(value))))
    }

    /// Everything except `nil` and `false` counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(&*self.0, ValueKind::Nil | ValueKind::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match &*self.0 {
            ValueKind::Nil => "Nil",
            ValueKind::Bool(_) => "Bool",
            ValueKind::Number(_) => "Number",
            ValueKind::Str(_) => "String",
            ValueKind::Symbol(_) => "Symbol",
            ValueKind::List(_) => "List",
            ValueKind::Vector(_) => "Vector",
            ValueKind::Map(_) => "HashMap",
            ValueKind::Closure(_) => "Function",
            ValueKind::NativeFunction(_) => "Function",
            ValueKind::Atom(_) => "Atom",
        }
    }

    /// The elements of a List or Vector, for operations that treat the two
    /// sequence kinds interchangeably.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match &*self.0 {
            ValueKind::List(items) | ValueKind::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match &*self.0 {
            ValueKind::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Deep equality. Lists and vectors compare element-wise against each
    /// other; atoms and functions compare by identity.
    pub fn deep_eq(&self, other: &Value) -> bool {
        match (&*self.0, &*other.0) {
            (ValueKind::Nil, ValueKind::Nil) => true,
            (ValueKind::Bool(a), ValueKind::Bool(b)) => a == b,
            (ValueKind::Number(a), ValueKind::Number(b)) => a == b,
            (ValueKind::Str(a), ValueKind::Str(b)) => a == b,
            (ValueKind::Symbol(a), ValueKind::Symbol(b)) => a == b,
            (
                ValueKind::List(a) | ValueKind::Vector(a),
                ValueKind::List(b) | ValueKind::Vector(b),
            ) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(l, r)| l.deep_eq(r)),
            (ValueKind::Map(a), ValueKind::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|rhs| value.deep_eq(rhs)))
            }
            (ValueKind::Atom(a), ValueKind::Atom(b)) => Rc::ptr_eq(a, b),
            (ValueKind::Closure(_), ValueKind::Closure(_))
            | (ValueKind::NativeFunction(_), ValueKind::NativeFunction(_)) => {
                Rc::ptr_eq(&self.0, &other.0)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::pr_str(self, true))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::pr_str(self, false))
    }
}

pub enum ValueKind {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Symbol(String),
    List(Vec<Value>),
    Vector(Vec<Value>),
    Map(IndexMap<MapKey, Value>),
    Closure(ClosureValue),
    NativeFunction(NativeFunction),
    Atom(Rc<RefCell<Value>>),
}

/// Hashmap keys are restricted to the scalar value kinds, so the backing
/// map can hash them directly. Numbers are keyed by their bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Nil,
    Bool(bool),
    Number(u64),
    Str(String),
    Symbol(String),
}

impl MapKey {
    pub fn from_value(value: &Value) -> Result<Self> {
        match &*value.0 {
            ValueKind::Nil => Ok(MapKey::Nil),
            ValueKind::Bool(b) => Ok(MapKey::Bool(*b)),
            ValueKind::Number(n) => Ok(MapKey::Number(n.to_bits())),
            ValueKind::Str(s) => Ok(MapKey::Str(s.clone())),
            ValueKind::Symbol(s) => Ok(MapKey::Symbol(s.clone())),
            _ => Err(Diagnostic::new(
                DiagnosticKind::WrongArgumentType,
                format!("{} cannot be used as a hashmap key", value.type_name()),
            )
            .into()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Nil => Value::nil(),
            MapKey::Bool(b) => Value::bool(*b),
            MapKey::Number(bits) => Value::number(f64::from_bits(*bits)),
            MapKey::Str(s) => Value::string(s.clone()),
            MapKey::Symbol(s) => Value::symbol(s.clone()),
        }
    }
}

/// A user function: unevaluated body plus the environment it closed over.
pub struct ClosureValue {
    pub params: Vec<String>,
    pub body: Value,
    pub env: EnvironmentRef,
}

pub struct NativeFunction {
    pub name: &'static str,
    /// `usize::MAX` marks a variadic builtin.
    pub arity: usize,
    pub callback: fn(&mut Interpreter, &[Value]) -> Result<Value>,
}

impl NativeFunction {
    pub fn call(&self, interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
        if self.arity != usize::MAX && args.len() != self.arity {
            return Err(Diagnostic::new(
                DiagnosticKind::WrongArgumentCount,
                format!(
                    "`{}` expected {} arguments but received {}",
                    self.name,
                    self.arity,
                    args.len()
                ),
            )
            .into());
        }
        (self.callback)(interpreter, args)
    }
}
