//! Node types of an executable document.

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter, Write},
};

use engine_value::{ConstValue, Name, Value};

use crate::Positioned;

/// A prepared executable document: its operations plus its fragment
/// definitions, indexed by name.
#[derive(Debug, Clone)]
pub struct ExecutableDocument {
    pub operations: DocumentOperations,
    pub fragments: HashMap<Name, Positioned<FragmentDefinition>>,
}

/// The operations of a document.
#[derive(Debug, Clone)]
pub enum DocumentOperations {
    /// A single operation, which may be anonymous.
    Single(Positioned<OperationDefinition>),
    /// One or more named operations.
    Multiple(HashMap<Name, Positioned<OperationDefinition>>),
}

impl DocumentOperations {
    /// Iterates over all operations with their names, if any.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&Name>, &Positioned<OperationDefinition>)> + '_> {
        match self {
            DocumentOperations::Single(op) => Box::new(std::iter::once((None, op))),
            DocumentOperations::Multiple(ops) => {
                Box::new(ops.iter().map(|(name, op)| (Some(name), op)))
            }
        }
    }
}

/// The kind of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl Display for OperationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        })
    }
}

/// A single operation: `query Name($var: Type = default) @dir { ... }`.
#[derive(Debug, Clone)]
pub struct OperationDefinition {
    pub ty: OperationType,
    pub variable_definitions: Vec<Positioned<VariableDefinition>>,
    pub directives: Vec<Positioned<Directive>>,
    pub selection_set: Positioned<SelectionSet>,
}

/// A variable declared on an operation.
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    pub name: Positioned<Name>,
    pub var_type: Positioned<Type>,
    pub default_value: Option<Positioned<ConstValue>>,
}

impl VariableDefinition {
    pub fn default_value(&self) -> Option<&ConstValue> {
        self.default_value.as_ref().map(|value| &value.node)
    }
}

/// A type reference: a named type with optional list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub base: BaseType,
    pub nullable: bool,
}

impl Type {
    /// Parses a type reference string such as `[Pet!]!`. Returns `None` for
    /// malformed input.
    pub fn new(ty: &str) -> Option<Self> {
        let (ty, nullable) = match ty.strip_suffix('!') {
            Some(inner) => (inner, false),
            None => (ty, true),
        };
        let base = match ty.strip_prefix('[') {
            Some(inner) => BaseType::List(Box::new(Type::new(inner.strip_suffix(']')?)?)),
            None => {
                if ty.is_empty() || ty.contains(|c| matches!(c, '[' | ']' | '!')) {
                    return None;
                }
                BaseType::Named(Name::new(ty))
            }
        };
        Some(Type { base, nullable })
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.base.fmt(f)?;
        if !self.nullable {
            f.write_char('!')?;
        }
        Ok(())
    }
}

/// The innermost part of a type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Named(Name),
    List(Box<Type>),
}

impl Display for BaseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Named(name) => name.fmt(f),
            BaseType::List(ty) => write!(f, "[{ty}]"),
        }
    }
}

/// An ordered list of selections.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    pub items: Vec<Positioned<Selection>>,
}

/// A single selection.
#[derive(Debug, Clone)]
pub enum Selection {
    Field(Positioned<Field>),
    FragmentSpread(Positioned<FragmentSpread>),
    InlineFragment(Positioned<InlineFragment>),
}

impl Selection {
    pub fn directives(&self) -> &Vec<Positioned<Directive>> {
        match self {
            Selection::Field(field) => &field.node.directives,
            Selection::FragmentSpread(spread) => &spread.node.directives,
            Selection::InlineFragment(fragment) => &fragment.node.directives,
        }
    }
}

/// A field selection.
#[derive(Debug, Clone)]
pub struct Field {
    pub alias: Option<Positioned<Name>>,
    pub name: Positioned<Name>,
    pub arguments: Vec<(Positioned<Name>, Positioned<Value>)>,
    pub directives: Vec<Positioned<Directive>>,
    pub selection_set: Positioned<SelectionSet>,
}

impl Field {
    /// The key under which this field appears in the response: the alias if
    /// present, the field name otherwise.
    pub fn response_key(&self) -> &Positioned<Name> {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    pub fn get_argument(&self, name: &str) -> Option<&Positioned<Value>> {
        self.arguments
            .iter()
            .find(|(arg_name, _)| arg_name.node == name)
            .map(|(_, value)| value)
    }
}

/// A fragment definition: `fragment Name on Type { ... }`.
#[derive(Debug, Clone)]
pub struct FragmentDefinition {
    pub type_condition: Positioned<TypeCondition>,
    pub directives: Vec<Positioned<Directive>>,
    pub selection_set: Positioned<SelectionSet>,
}

/// The `on Type` clause of a fragment.
#[derive(Debug, Clone)]
pub struct TypeCondition {
    pub on: Positioned<Name>,
}

/// A fragment spread: `...Name`.
#[derive(Debug, Clone)]
pub struct FragmentSpread {
    pub fragment_name: Positioned<Name>,
    pub directives: Vec<Positioned<Directive>>,
}

/// An inline fragment: `... on Type { ... }`.
#[derive(Debug, Clone)]
pub struct InlineFragment {
    pub type_condition: Option<Positioned<TypeCondition>>,
    pub directives: Vec<Positioned<Directive>>,
    pub selection_set: Positioned<SelectionSet>,
}

/// A directive applied to a selection or definition.
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: Positioned<Name>,
    pub arguments: Vec<(Positioned<Name>, Positioned<Value>)>,
}

impl Directive {
    pub fn get_argument(&self, name: &str) -> Option<&Positioned<Value>> {
        self.arguments
            .iter()
            .find(|(arg_name, _)| arg_name.node == name)
            .map(|(_, value)| value)
    }
}
