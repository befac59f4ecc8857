use std::{cell::RefCell, fs, rc::Rc};

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result},
    environment::EnvironmentRef,
    printer, reader,
    runtime::Interpreter,
    value::{NativeFunction, Value, ValueKind},
};

/// Installs the builtin table into the root environment. Runs once at
/// interpreter construction; the table is never touched again.
pub fn install(env: &EnvironmentRef) {
    let mut scope = env.borrow_mut();
    let mut add = |name: &'static str,
                   arity: usize,
                   callback: fn(&mut Interpreter, &[Value]) -> Result<Value>| {
        scope.set(name.to_string(), native(name, arity, callback));
    };

    add("+", 2, math_add);
    add("-", 2, math_sub);
    add("*", 2, math_mul);
    add("/", 2, math_div);

    add("<", 2, cmp_lt);
    add("<=", 2, cmp_le);
    add(">", 2, cmp_gt);
    add(">=", 2, cmp_ge);
    add("=", 2, cmp_eq);

    add("pr-str", usize::MAX, print_pr_str);
    add("str", usize::MAX, print_str);
    add("prn", usize::MAX, print_prn);
    add("println", usize::MAX, print_println);

    add("list", usize::MAX, seq_list);
    add("list?", 1, seq_is_list);
    add("empty?", 1, seq_is_empty);
    add("count", 1, seq_count);
    add("cons", 2, seq_cons);
    add("concat", usize::MAX, seq_concat);
    add("vec", 1, seq_vec);

    add("eval", 1, meta_eval);
    add("read-string", 1, meta_read_string);
    add("slurp", 1, meta_slurp);
    add("with-meta", 2, meta_with_meta);
    add("meta", 1, meta_meta);

    add("atom", 1, atom_new);
    add("atom?", 1, atom_is);
    add("deref", 1, atom_deref);
    add("reset!", 2, atom_reset);
    add("swap!", usize::MAX, atom_swap);
}

fn native(
    name: &'static str,
    arity: usize,
    callback: fn(&mut Interpreter, &[Value]) -> Result<Value>,
) -> Value {
    Value::new(ValueKind::NativeFunction(NativeFunction {
        name,
        arity,
        callback,
    }))
}

fn ensure_min(args: &[Value], min: usize, name: &str) -> Result<()> {
    if args.len() < min {
        return Err(Diagnostic::new(
            DiagnosticKind::WrongArgumentCount,
            format!(
                "`{name}` expected at least {min} arguments but received {}",
                args.len()
            ),
        )
        .into());
    }
    Ok(())
}

fn expect_number(value: &Value, name: &str) -> Result<f64> {
    match &*value.0 {
        ValueKind::Number(n) => Ok(*n),
        _ => Err(Diagnostic::new(
            DiagnosticKind::WrongArgumentType,
            format!("`{name}` expected Number but found {}", value.type_name()),
        )
        .into()),
    }
}

fn expect_string(value: &Value, name: &str) -> Result<String> {
    match &*value.0 {
        ValueKind::Str(s) => Ok(s.clone()),
        _ => Err(Diagnostic::new(
            DiagnosticKind::WrongArgumentType,
            format!("`{name}` expected String but found {}", value.type_name()),
        )
        .into()),
    }
}

fn expect_sequence<'a>(value: &'a Value, name: &str) -> Result<&'a [Value]> {
    value.as_sequence().ok_or_else(|| {
        Diagnostic::new(
            DiagnosticKind::WrongArgumentType,
            format!("`{name}` expected a sequence but found {}", value.type_name()),
        )
        .into()
    })
}

fn expect_atom(value: &Value, name: &str) -> Result<Rc<RefCell<Value>>> {
    match &*value.0 {
        ValueKind::Atom(cell) => Ok(Rc::clone(cell)),
        _ => Err(Diagnostic::new(
            DiagnosticKind::WrongArgumentType,
            format!("`{name}` expected Atom but found {}", value.type_name()),
        )
        .into()),
    }
}

fn math_add(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let a = expect_number(&args[0], "+")?;
    let b = expect_number(&args[1], "+")?;
    Ok(Value::number(a + b))
}

fn math_sub(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let a = expect_number(&args[0], "-")?;
    let b = expect_number(&args[1], "-")?;
    Ok(Value::number(a - b))
}

fn math_mul(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let a = expect_number(&args[0], "*")?;
    let b = expect_number(&args[1], "*")?;
    Ok(Value::number(a * b))
}

/// Division floors its result; every other arithmetic operation is plain
/// IEEE double arithmetic.
fn math_div(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let a = expect_number(&args[0], "/")?;
    let b = expect_number(&args[1], "/")?;
    Ok(Value::number((a / b).floor()))
}

fn cmp_lt(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    comparison(args, "<", |a, b| a < b)
}

fn cmp_le(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    comparison(args, "<=", |a, b| a <= b)
}

fn cmp_gt(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    comparison(args, ">", |a, b| a > b)
}

fn cmp_ge(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    comparison(args, ">=", |a, b| a >= b)
}

fn comparison(args: &[Value], name: &str, cmp: fn(f64, f64) -> bool) -> Result<Value> {
    let a = expect_number(&args[0], name)?;
    let b = expect_number(&args[1], name)?;
    Ok(Value::bool(cmp(a, b)))
}

fn cmp_eq(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::bool(args[0].deep_eq(&args[1])))
}

fn render(args: &[Value], separator: &str, readable: bool) -> String {
    args.iter()
        .map(|arg| printer::pr_str(arg, readable))
        .collect::<Vec<_>>()
        .join(separator)
}

fn print_pr_str(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::string(render(args, " ", true)))
}

fn print_str(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::string(render(args, "", false)))
}

fn print_prn(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    println!("{}", render(args, " ", true));
    Ok(Value::nil())
}

fn print_println(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    println!("{}", render(args, " ", false));
    Ok(Value::nil())
}

fn seq_list(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::list(args.to_vec()))
}

fn seq_is_list(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::bool(matches!(&*args[0].0, ValueKind::List(_))))
}

fn seq_is_empty(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let items = expect_sequence(&args[0], "empty?")?;
    Ok(Value::bool(items.is_empty()))
}

fn seq_count(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let count = args[0].as_sequence().map_or(0, <[Value]>::len);
    Ok(Value::number(count as f64))
}

fn seq_cons(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let rest = expect_sequence(&args[1], "cons")?;
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(args[0].clone());
    items.extend_from_slice(rest);
    Ok(Value::list(items))
}

fn seq_concat(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let mut items = Vec::new();
    for arg in args {
        items.extend_from_slice(expect_sequence(arg, "concat")?);
    }
    Ok(Value::list(items))
}

fn seq_vec(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let items = expect_sequence(&args[0], "vec")?;
    Ok(Value::vector(items.to_vec()))
}

fn meta_eval(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let env = interpreter.root_env();
    interpreter.eval(args[0].clone(), env)
}

fn meta_read_string(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let source = expect_string(&args[0], "read-string")?;
    reader::read_str(&source)
}

fn meta_slurp(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let path = expect_string(&args[0], "slurp")?;
    Ok(Value::string(fs::read_to_string(&path)?))
}

// Values carry no metadata in this runtime; `with-meta`/`meta` exist so
// `^meta form` still reads and evaluates.
fn meta_with_meta(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(args[0].clone())
}

fn meta_meta(_: &mut Interpreter, _: &[Value]) -> Result<Value> {
    Ok(Value::nil())
}

fn atom_new(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::atom(args[0].clone()))
}

fn atom_is(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::bool(matches!(&*args[0].0, ValueKind::Atom(_))))
}

fn atom_deref(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let cell = expect_atom(&args[0], "deref")?;
    let value = cell.borrow().clone();
    Ok(value)
}

fn atom_reset(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let cell = expect_atom(&args[0], "reset!")?;
    *cell.borrow_mut() = args[1].clone();
    Ok(args[1].clone())
}

fn atom_swap(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    ensure_min(args, 2, "swap!")?;
    let cell = expect_atom(&args[0], "swap!")?;
    let mut call_args = Vec::with_capacity(args.len() - 1);
    call_args.push(cell.borrow().clone());
    call_args.extend_from_slice(&args[2..]);
    let result = interpreter.apply(&args[1], &call_args)?;
    *cell.borrow_mut() = result.clone();
    Ok(result)
}
