use crate::value::{Value, ValueKind};

/// Serializes a value back to surface syntax. With `readable` set, strings
/// are quoted and escaped so the output reads back as the same value.
pub fn pr_str(value: &Value, readable: bool) -> String {
    match &*value.0 {
        ValueKind::Nil => "nil".to_string(),
        ValueKind::Bool(b) => b.to_string(),
        ValueKind::Number(n) => n.to_string(),
        ValueKind::Str(s) => {
            if readable {
                escape(s)
            } else {
                s.clone()
            }
        }
        ValueKind::Symbol(s) => s.clone(),
        ValueKind::List(items) => format!("({})", join(items, readable)),
        ValueKind::Vector(items) => format!("[{}]", join(items, readable)),
        ValueKind::Map(entries) => {
            let body = entries
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{} {}",
                        pr_str(&key.to_value(), readable),
                        pr_str(value, readable)
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");
            format!("{{{body}}}")
        }
        ValueKind::Closure(_) => "#<function>".to_string(),
        ValueKind::NativeFunction(fun) => format!("#<builtin {}>", fun.name),
        ValueKind::Atom(cell) => format!("(atom {})", pr_str(&cell.borrow(), readable)),
    }
}

fn join(items: &[Value], readable: bool) -> String {
    items
        .iter()
        .map(|item| pr_str(item, readable))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for ch in raw.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
