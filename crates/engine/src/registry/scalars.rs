//! Coercion and serialization of the built-in scalars, plus the dispatch
//! point for custom ones.

use engine_value::ConstValue;
use serde_json::Value;

use super::ScalarType;
use crate::Error;

const INT: &str = "Int";
const FLOAT: &str = "Float";
const STRING: &str = "String";
const BOOLEAN: &str = "Boolean";
const ID: &str = "ID";

/// Whether `name` is one of the five built-in scalar types.
pub fn is_builtin(name: &str) -> bool {
    matches!(name, INT | FLOAT | STRING | BOOLEAN | ID)
}

/// Coerces an input literal or variable value against a scalar type.
pub fn parse(scalar: &ScalarType, value: ConstValue) -> Result<ConstValue, Error> {
    if let Some(parse) = scalar.parse {
        return parse(value);
    }
    match scalar.name.as_str() {
        INT => parse_int(value),
        FLOAT => parse_float(value),
        STRING => match value {
            ConstValue::String(_) => Ok(value),
            other => Err(not_representable(STRING, &other)),
        },
        BOOLEAN => match value {
            ConstValue::Boolean(_) => Ok(value),
            other => Err(not_representable(BOOLEAN, &other)),
        },
        ID => parse_id(value),
        // A custom scalar without a parse hook accepts anything.
        _ => Ok(value),
    }
}

/// Serializes a raw resolver value against a scalar type.
pub fn serialize(scalar: &ScalarType, value: Value) -> Result<ConstValue, Error> {
    if let Some(serialize) = scalar.serialize {
        return serialize(value);
    }
    match scalar.name.as_str() {
        INT => parse_int(ConstValue::from_json(value)),
        FLOAT => parse_float(ConstValue::from_json(value)),
        STRING => match value {
            Value::String(s) => Ok(ConstValue::String(s)),
            other => Err(not_representable(STRING, &ConstValue::from_json(other))),
        },
        BOOLEAN => match value {
            Value::Bool(b) => Ok(ConstValue::Boolean(b)),
            other => Err(not_representable(BOOLEAN, &ConstValue::from_json(other))),
        },
        ID => parse_id(ConstValue::from_json(value)),
        _ => Ok(ConstValue::from_json(value)),
    }
}

fn parse_int(value: ConstValue) -> Result<ConstValue, Error> {
    let ConstValue::Number(number) = &value else {
        return Err(not_representable(INT, &value));
    };
    let Some(int) = number.as_i64() else {
        return Err(Error::new(format!(
            "Int cannot represent non-integer value: {number}"
        )));
    };
    if i32::try_from(int).is_err() {
        return Err(Error::new(format!(
            "Int cannot represent value outside the 32-bit signed range: {int}"
        )));
    }
    Ok(value)
}

fn parse_float(value: ConstValue) -> Result<ConstValue, Error> {
    match &value {
        ConstValue::Number(number) if number.as_f64().is_some() => Ok(value),
        other => Err(not_representable(FLOAT, other)),
    }
}

fn parse_id(value: ConstValue) -> Result<ConstValue, Error> {
    match value {
        ConstValue::String(_) => Ok(value),
        // IDs are commonly produced as integers; they serialize as strings.
        ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
            Ok(ConstValue::String(number.to_string()))
        }
        other => Err(not_representable(ID, &other)),
    }
}

fn not_representable(scalar: &str, value: &ConstValue) -> Error {
    Error::new(format!(
        "{scalar} cannot represent a value of kind {}: {value}",
        value.kind_str()
    ))
}
