use std::fmt::{self, Display, Formatter, Write};

use crate::{ConstValue, Value};

fn write_quoted(s: &str, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_list<T: Display>(items: impl IntoIterator<Item = T>, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('[')?;
    for (i, item) in items.into_iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    f.write_char(']')
}

fn write_object<K: Display, V: Display>(
    object: impl IntoIterator<Item = (K, V)>,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    f.write_char('{')?;
    for (i, (name, value)) in object.into_iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        write!(f, "{name}: {value}")?;
    }
    f.write_char('}')
}

impl Display for ConstValue {
    /// Renders the value in GraphQL literal syntax.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => f.write_str("null"),
            ConstValue::Number(n) => n.fmt(f),
            ConstValue::String(s) => write_quoted(s, f),
            ConstValue::Boolean(b) => b.fmt(f),
            ConstValue::Enum(name) => name.fmt(f),
            ConstValue::List(items) => write_list(items, f),
            ConstValue::Object(map) => write_object(map, f),
        }
    }
}

impl Display for Value {
    /// Renders the value in GraphQL literal syntax.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Variable(name) => write!(f, "${name}"),
            Value::Null => f.write_str("null"),
            Value::Number(n) => n.fmt(f),
            Value::String(s) => write_quoted(s, f),
            Value::Boolean(b) => b.fmt(f),
            Value::Enum(name) => name.fmt(f),
            Value::List(items) => write_list(items, f),
            Value::Object(map) => write_object(map, f),
        }
    }
}
