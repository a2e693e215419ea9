//! Value types used across the executable document and the engine.
//!
//! Two value spaces are distinguished: [`Value`] may still contain variable
//! references and is what argument positions in a document hold, while
//! [`ConstValue`] is fully resolved and is what coercion and responses work
//! with. [`Value::into_const_with`] bridges the two.

mod display;
mod name;

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use name::Name;
pub use serde_json::Number;

/// Variables of a query, kept in the order the host supplied them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables(IndexMap<Name, ConstValue>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: Name, value: ConstValue) -> Option<ConstValue> {
        self.0.insert(name, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &ConstValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Variables {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

impl FromIterator<(Name, ConstValue)> for Variables {
    fn from_iter<T: IntoIterator<Item = (Name, ConstValue)>>(iter: T) -> Self {
        Variables(iter.into_iter().collect())
    }
}

impl From<IndexMap<Name, ConstValue>> for Variables {
    fn from(map: IndexMap<Name, ConstValue>) -> Self {
        Variables(map)
    }
}

impl<'de> Deserialize<'de> for Variables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<IndexMap<Name, ConstValue>>::deserialize(deserializer)?
            .map(Variables)
            .unwrap_or_default())
    }
}

/// A resolved GraphQL value, for example `1` or `"Fido"`.
///
/// This is the variable-free counterpart of [`Value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConstValue {
    /// `null`.
    #[default]
    Null,
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value, e.g. `SIT`.
    Enum(Name),
    /// A list of values.
    List(Vec<ConstValue>),
    /// An object, with insertion order preserved.
    Object(IndexMap<Name, ConstValue>),
}

impl ConstValue {
    /// Converts a JSON value. Strings stay strings; there is no way to
    /// reconstruct the `Enum` variant from JSON.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConstValue::Null,
            serde_json::Value::Bool(b) => ConstValue::Boolean(b),
            serde_json::Value::Number(n) => ConstValue::Number(n),
            serde_json::Value::String(s) => ConstValue::String(s),
            serde_json::Value::Array(items) => {
                ConstValue::List(items.into_iter().map(ConstValue::from_json).collect())
            }
            serde_json::Value::Object(map) => ConstValue::Object(
                map.into_iter()
                    .map(|(key, value)| (Name::new(key), ConstValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Converts into a JSON value. Enum values become strings.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            ConstValue::Null => serde_json::Value::Null,
            ConstValue::Number(n) => serde_json::Value::Number(n),
            ConstValue::String(s) => serde_json::Value::String(s),
            ConstValue::Boolean(b) => serde_json::Value::Bool(b),
            ConstValue::Enum(name) => serde_json::Value::String(name.to_string()),
            ConstValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(ConstValue::into_json).collect())
            }
            ConstValue::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key.to_string(), value.into_json()))
                    .collect(),
            ),
        }
    }

    /// Lifts into a [`Value`].
    pub fn into_value(self) -> Value {
        match self {
            ConstValue::Null => Value::Null,
            ConstValue::Number(n) => Value::Number(n),
            ConstValue::String(s) => Value::String(s),
            ConstValue::Boolean(b) => Value::Boolean(b),
            ConstValue::Enum(name) => Value::Enum(name),
            ConstValue::List(items) => {
                Value::List(items.into_iter().map(ConstValue::into_value).collect())
            }
            ConstValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into_value()))
                    .collect(),
            ),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConstValue::Null)
    }

    /// A short description of the value's kind, for error messages.
    pub fn kind_str(&self) -> &'static str {
        match self {
            ConstValue::Null => "null",
            ConstValue::Number(_) => "number",
            ConstValue::String(_) => "string",
            ConstValue::Boolean(_) => "boolean",
            ConstValue::Enum(_) => "enum",
            ConstValue::List(_) => "list",
            ConstValue::Object(_) => "object",
        }
    }
}

impl From<serde_json::Value> for ConstValue {
    fn from(value: serde_json::Value) -> Self {
        ConstValue::from_json(value)
    }
}

impl From<ConstValue> for serde_json::Value {
    fn from(value: ConstValue) -> Self {
        value.into_json()
    }
}

impl Serialize for ConstValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConstValue::Null => serializer.serialize_none(),
            ConstValue::Number(n) => n.serialize(serializer),
            ConstValue::String(s) => serializer.serialize_str(s),
            ConstValue::Boolean(b) => serializer.serialize_bool(*b),
            ConstValue::Enum(name) => serializer.serialize_str(name.as_str()),
            ConstValue::List(items) => items.serialize(serializer),
            ConstValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ConstValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(ConstValue::from_json(serde_json::Value::deserialize(
            deserializer,
        )?))
    }
}

/// A GraphQL value as it appears in a document, possibly containing variable
/// references.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// A variable reference, e.g. `$name`.
    Variable(Name),
    /// `null`.
    #[default]
    Null,
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value.
    Enum(Name),
    /// A list of values.
    List(Vec<Value>),
    /// An object, with insertion order preserved.
    Object(IndexMap<Name, Value>),
}

impl Value {
    /// Resolves every variable reference through `f`, producing a
    /// [`ConstValue`].
    pub fn into_const_with<E>(
        self,
        mut f: impl FnMut(Name) -> Result<ConstValue, E>,
    ) -> Result<ConstValue, E> {
        self.into_const_inner(&mut f)
    }

    fn into_const_inner<E>(
        self,
        f: &mut impl FnMut(Name) -> Result<ConstValue, E>,
    ) -> Result<ConstValue, E> {
        Ok(match self {
            Value::Variable(name) => f(name)?,
            Value::Null => ConstValue::Null,
            Value::Number(n) => ConstValue::Number(n),
            Value::String(s) => ConstValue::String(s),
            Value::Boolean(b) => ConstValue::Boolean(b),
            Value::Enum(name) => ConstValue::Enum(name),
            Value::List(items) => ConstValue::List(
                items
                    .into_iter()
                    .map(|item| item.into_const_inner(f))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => ConstValue::Object(
                map.into_iter()
                    .map(|(key, value)| Ok((key, value.into_const_inner(f)?)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Converts without resolving variables; `None` if any are present.
    pub fn into_const(self) -> Option<ConstValue> {
        self.into_const_with(|_| Err(())).ok()
    }
}

impl From<ConstValue> for Value {
    fn from(value: ConstValue) -> Self {
        value.into_value()
    }
}
