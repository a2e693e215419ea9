//! The schema side of the engine: named types, their contracts, and the
//! registry that resolves late-bound references between them.
//!
//! Type references (`MetaFieldType`, `InputValueType`) are plain strings in
//! GraphQL notation (`[Pet!]!`). Wrapping modifiers are destructured with
//! [`MetaTypeName`] and the terminal name is looked up in the registry on
//! demand, so mutually recursive type definitions need no eager cycles and a
//! non-null can never wrap another non-null.

pub mod introspection;
pub mod scalars;

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use engine_ast::types::{BaseType as ParsedBaseType, OperationType, Type as ParsedType};
use engine_value::ConstValue;
use indexmap::{IndexMap, IndexSet};

use crate::{
    error::referenced_by,
    resolvers::{PropertyResolver, Resolver, TypeResolver},
    Error, SchemaError,
};

fn strip_brackets(type_name: &str) -> Option<&str> {
    type_name.strip_prefix('[').map(|rest| &rest[..rest.len() - 1])
}

/// A type reference string destructured one level: the outermost wrapper, or
/// the bare name once no wrappers remain.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MetaTypeName<'a> {
    List(&'a str),
    NonNull(&'a str),
    Named(&'a str),
}

impl<'a> fmt::Display for MetaTypeName<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MetaTypeName::Named(name) => write!(f, "{name}"),
            MetaTypeName::NonNull(name) => write!(f, "{name}!"),
            MetaTypeName::List(name) => write!(f, "[{name}]"),
        }
    }
}

impl<'a> MetaTypeName<'a> {
    #[inline]
    pub fn create(type_name: &str) -> MetaTypeName<'_> {
        if let Some(type_name) = type_name.strip_suffix('!') {
            MetaTypeName::NonNull(type_name)
        } else if let Some(type_name) = strip_brackets(type_name) {
            MetaTypeName::List(type_name)
        } else {
            MetaTypeName::Named(type_name)
        }
    }

    #[inline]
    pub fn concrete_typename(type_name: &str) -> &str {
        match MetaTypeName::create(type_name) {
            MetaTypeName::List(type_name) => Self::concrete_typename(type_name),
            MetaTypeName::NonNull(type_name) => Self::concrete_typename(type_name),
            MetaTypeName::Named(type_name) => type_name,
        }
    }

    #[inline]
    pub fn is_non_null(&self) -> bool {
        matches!(self, MetaTypeName::NonNull(_))
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        match self {
            MetaTypeName::List(_) => true,
            MetaTypeName::NonNull(ty) => MetaTypeName::create(ty).is_list(),
            MetaTypeName::Named(name) => name.ends_with(']'),
        }
    }
}

/// Defines basic string conversion functionality for a string wrapper.
macro_rules! def_type_reference {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The terminal named type, with all wrappers stripped.
            pub fn named_type(&self) -> &str {
                MetaTypeName::concrete_typename(&self.0)
            }

            pub fn is_non_null(&self) -> bool {
                MetaTypeName::create(&self.0).is_non_null()
            }

            pub fn is_nullable(&self) -> bool {
                !self.is_non_null()
            }

            pub fn is_list(&self) -> bool {
                MetaTypeName::create(&self.0).is_list()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> $ty {
                $ty(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> $ty {
                $ty(value)
            }
        }
    };
}

/// A reference to the type of an output field, e.g. `[Pet!]!`.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct MetaFieldType(String);

def_type_reference!(MetaFieldType);

/// A reference to the type of an input position, e.g. `DogCommand!`.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct InputValueType(String);

def_type_reference!(InputValueType);

/// Deprecation state of a field or enum value.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq)]
pub enum Deprecation {
    #[default]
    NoDeprecated,
    Deprecated {
        reason: Option<String>,
    },
}

impl Deprecation {
    #[inline]
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Deprecation::Deprecated { .. })
    }

    #[inline]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecation::NoDeprecated => None,
            Deprecation::Deprecated { reason } => reason.as_deref(),
        }
    }
}

/// An input value: an argument of a field or directive, or a field of an
/// input object.
#[derive(Debug, Clone)]
pub struct MetaInputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: InputValueType,
    pub default_value: Option<ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<InputValueType>) -> MetaInputValue {
        MetaInputValue {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> MetaInputValue {
        MetaInputValue {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_default(self, default: ConstValue) -> MetaInputValue {
        MetaInputValue {
            default_value: Some(default),
            ..self
        }
    }
}

/// An output field of an object or interface type.
#[derive(Debug, Clone)]
pub struct MetaField {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, MetaInputValue>,
    pub ty: MetaFieldType,
    pub deprecation: Deprecation,
}

impl MetaField {
    pub fn new(name: impl Into<String>, ty: impl Into<MetaFieldType>) -> MetaField {
        MetaField {
            name: name.into(),
            description: None,
            args: IndexMap::new(),
            ty: ty.into(),
            deprecation: Deprecation::NoDeprecated,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        MetaField {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_argument(mut self, argument: MetaInputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    pub fn with_deprecation(self, deprecation: Deprecation) -> Self {
        MetaField { deprecation, ..self }
    }
}

/// Custom scalar hook: validates and canonicalizes an input literal.
pub type ScalarParseFn = fn(ConstValue) -> Result<ConstValue, Error>;
/// Custom scalar hook: turns a raw resolver value into an output value.
pub type ScalarSerializeFn = fn(serde_json::Value) -> Result<ConstValue, Error>;

/// A scalar type. The five built-ins get their behavior from
/// [`scalars`]; custom scalars may install their own hooks and otherwise
/// pass values through unchanged.
#[derive(Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
    pub parse: Option<ScalarParseFn>,
    pub serialize: Option<ScalarSerializeFn>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> ScalarType {
        ScalarType {
            name: name.into(),
            description: None,
            specified_by_url: None,
            parse: None,
            serialize: None,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        ScalarType {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_parse(self, parse: ScalarParseFn) -> Self {
        ScalarType {
            parse: Some(parse),
            ..self
        }
    }

    pub fn with_serialize(self, serialize: ScalarSerializeFn) -> Self {
        ScalarType {
            serialize: Some(serialize),
            ..self
        }
    }
}

impl Debug for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarType")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// An object type: named fields plus the resolver that produces their raw
/// values.
#[derive(Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub implements: IndexSet<String>,
    pub fields: IndexMap<String, MetaField>,
    pub resolver: Arc<dyn Resolver>,
}

impl ObjectType {
    /// A new object type resolving fields by property access on the parent
    /// value; see [`PropertyResolver`].
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = MetaField>) -> ObjectType {
        ObjectType {
            name: name.into(),
            description: None,
            implements: IndexSet::new(),
            fields: fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
            resolver: Arc::new(PropertyResolver),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        ObjectType {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_resolver(self, resolver: impl Resolver + 'static) -> Self {
        ObjectType {
            resolver: Arc::new(resolver),
            ..self
        }
    }

    pub fn implement(mut self, interface: impl Into<String>) -> Self {
        self.implements.insert(interface.into());
        self
    }

    #[inline]
    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }
}

impl Debug for ObjectType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("implements", &self.implements)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// An interface type. The type resolver picks the concrete object type at
/// completion time.
#[derive(Clone)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
    pub possible_types: IndexSet<String>,
    pub type_resolver: Arc<dyn TypeResolver>,
}

impl InterfaceType {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = MetaField>,
        type_resolver: impl TypeResolver + 'static,
    ) -> Self {
        InterfaceType {
            name: name.into(),
            description: None,
            fields: fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
            possible_types: IndexSet::new(),
            type_resolver: Arc::new(type_resolver),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        InterfaceType {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }
}

impl Debug for InterfaceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("possible_types", &self.possible_types)
            .finish_non_exhaustive()
    }
}

/// A union type over a set of object types.
#[derive(Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: IndexSet<String>,
    pub type_resolver: Arc<dyn TypeResolver>,
}

impl UnionType {
    pub fn new<T: Into<String>>(
        name: impl Into<String>,
        possible_types: impl IntoIterator<Item = T>,
        type_resolver: impl TypeResolver + 'static,
    ) -> UnionType {
        UnionType {
            name: name.into(),
            description: None,
            possible_types: possible_types.into_iter().map(Into::into).collect(),
            type_resolver: Arc::new(type_resolver),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        UnionType {
            description: Some(description.into()),
            ..self
        }
    }
}

impl Debug for UnionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionType")
            .field("name", &self.name)
            .field("possible_types", &self.possible_types)
            .finish_non_exhaustive()
    }
}

/// One declared value of an enum type. `value` is the internal value the
/// resolvers work with; serialization maps it back to `name`.
#[derive(Debug, Clone)]
pub struct MetaEnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Deprecation,
    pub value: Option<ConstValue>,
}

impl MetaEnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        MetaEnumValue {
            name: name.into(),
            description: None,
            deprecation: Deprecation::NoDeprecated,
            value: None,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        MetaEnumValue {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_deprecation(self, deprecation: Deprecation) -> Self {
        MetaEnumValue { deprecation, ..self }
    }

    pub fn with_value(self, value: ConstValue) -> Self {
        MetaEnumValue {
            value: Some(value),
            ..self
        }
    }

    /// The internal value resolvers see when this enum value is coerced:
    /// the declared one, or the external name itself.
    pub fn internal_value(&self) -> ConstValue {
        self.value
            .clone()
            .unwrap_or_else(|| ConstValue::Enum(self.name.as_str().into()))
    }
}

/// An enum type with its ordered values.
#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, MetaEnumValue>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = MetaEnumValue>) -> Self {
        EnumType {
            name: name.into(),
            description: None,
            values: values
                .into_iter()
                .map(|value| (value.name.clone(), value))
                .collect(),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        EnumType {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn value(&self, name: &str) -> Option<&MetaEnumValue> {
        self.values.get(name)
    }
}

/// An input object type with its ordered input fields.
#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub input_fields: IndexMap<String, MetaInputValue>,
}

impl InputObjectType {
    pub fn new(
        name: impl Into<String>,
        input_fields: impl IntoIterator<Item = MetaInputValue>,
    ) -> Self {
        InputObjectType {
            name: name.into(),
            description: None,
            input_fields: input_fields
                .into_iter()
                .map(|value| (value.name.clone(), value))
                .collect(),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        InputObjectType {
            description: Some(description.into()),
            ..self
        }
    }
}

/// A named GraphQL type.
#[derive(Debug, Clone)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl From<ScalarType> for MetaType {
    fn from(val: ScalarType) -> Self {
        MetaType::Scalar(val)
    }
}

impl From<ObjectType> for MetaType {
    fn from(val: ObjectType) -> Self {
        MetaType::Object(val)
    }
}

impl From<InterfaceType> for MetaType {
    fn from(val: InterfaceType) -> Self {
        MetaType::Interface(val)
    }
}

impl From<UnionType> for MetaType {
    fn from(val: UnionType) -> Self {
        MetaType::Union(val)
    }
}

impl From<EnumType> for MetaType {
    fn from(val: EnumType) -> Self {
        MetaType::Enum(val)
    }
}

impl From<InputObjectType> for MetaType {
    fn from(val: InputObjectType) -> Self {
        MetaType::InputObject(val)
    }
}

impl MetaType {
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(inner) => &inner.name,
            MetaType::Object(inner) => &inner.name,
            MetaType::Interface(inner) => &inner.name,
            MetaType::Union(inner) => &inner.name,
            MetaType::Enum(inner) => &inner.name,
            MetaType::InputObject(inner) => &inner.name,
        }
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        match self {
            MetaType::Scalar(inner) => inner.description.as_deref(),
            MetaType::Object(inner) => inner.description.as_deref(),
            MetaType::Interface(inner) => inner.description.as_deref(),
            MetaType::Union(inner) => inner.description.as_deref(),
            MetaType::Enum(inner) => inner.description.as_deref(),
            MetaType::InputObject(inner) => inner.description.as_deref(),
        }
    }

    /// The `__TypeKind` of this type.
    pub fn kind(&self) -> &'static str {
        match self {
            MetaType::Scalar(_) => "SCALAR",
            MetaType::Object(_) => "OBJECT",
            MetaType::Interface(_) => "INTERFACE",
            MetaType::Union(_) => "UNION",
            MetaType::Enum(_) => "ENUM",
            MetaType::InputObject(_) => "INPUT_OBJECT",
        }
    }

    pub fn object(&self) -> Option<&ObjectType> {
        match self {
            MetaType::Object(inner) => Some(inner),
            _ => None,
        }
    }

    #[inline]
    pub fn fields(&self) -> Option<&IndexMap<String, MetaField>> {
        match self {
            MetaType::Object(inner) => Some(&inner.fields),
            MetaType::Interface(inner) => Some(&inner.fields),
            _ => None,
        }
    }

    #[inline]
    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields().and_then(|fields| fields.get(name))
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_)
        )
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface(_) | MetaType::Union(_))
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Enum(_) | MetaType::Scalar(_))
    }

    #[inline]
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            MetaType::Enum(_) | MetaType::Scalar(_) | MetaType::InputObject(_)
        )
    }

    #[inline]
    pub fn is_possible_type(&self, type_name: &str) -> bool {
        match self {
            MetaType::Interface(inner) => inner.possible_types.contains(type_name),
            MetaType::Union(inner) => inner.possible_types.contains(type_name),
            MetaType::Object(inner) => inner.name == type_name,
            _ => false,
        }
    }

    #[inline]
    pub fn possible_types(&self) -> Option<&IndexSet<String>> {
        match self {
            MetaType::Interface(inner) => Some(&inner.possible_types),
            MetaType::Union(inner) => Some(&inner.possible_types),
            _ => None,
        }
    }
}

/// Where a directive may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveLocation::Query => "QUERY",
            DirectiveLocation::Mutation => "MUTATION",
            DirectiveLocation::Subscription => "SUBSCRIPTION",
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
            DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
            DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
            DirectiveLocation::VariableDefinition => "VARIABLE_DEFINITION",
            DirectiveLocation::Schema => "SCHEMA",
            DirectiveLocation::Scalar => "SCALAR",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

/// A directive definition known to the schema. Only `@skip` and `@include`
/// have executable semantics in this engine; other definitions are carried
/// for introspection.
#[derive(Debug, Clone)]
pub struct MetaDirective {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub args: IndexMap<String, MetaInputValue>,
    pub is_repeatable: bool,
}

impl MetaDirective {
    pub fn new(
        name: impl Into<String>,
        locations: impl IntoIterator<Item = DirectiveLocation>,
    ) -> Self {
        MetaDirective {
            name: name.into(),
            description: None,
            locations: locations.into_iter().collect(),
            args: IndexMap::new(),
            is_repeatable: false,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        MetaDirective {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_argument(mut self, argument: MetaInputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }
}

/// All named types of a schema, indexed by name.
#[derive(Debug, Clone)]
pub struct Registry {
    pub types: BTreeMap<String, MetaType>,
    pub directives: IndexMap<String, MetaDirective>,
    pub implements: HashMap<String, HashSet<String>>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub disable_introspection: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            types: BTreeMap::new(),
            directives: IndexMap::new(),
            implements: HashMap::new(),
            query_type: "Query".to_string(),
            mutation_type: None,
            subscription_type: None,
            disable_introspection: false,
        }
    }
}

impl Registry {
    pub fn insert_type(&mut self, ty: impl Into<MetaType>) {
        let ty = ty.into();
        self.types.insert(ty.name().to_string(), ty);
    }

    /// Looks up a type by its exact name.
    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    /// Looks up the named type behind a possibly wrapped type reference.
    pub fn concrete_type_by_name(&self, type_name: &str) -> Option<&MetaType> {
        self.types.get(MetaTypeName::concrete_typename(type_name))
    }

    /// Resolves an AST type reference to its named type.
    pub fn concrete_type_by_parsed_type(&self, query_type: &ParsedType) -> Option<&MetaType> {
        match &query_type.base {
            ParsedBaseType::Named(name) => self.types.get(name.as_str()),
            ParsedBaseType::List(ty) => self.concrete_type_by_parsed_type(ty),
        }
    }

    pub fn query_root(&self) -> &MetaType {
        self.types
            .get(&self.query_type)
            .expect("validated at schema build time")
    }

    pub fn mutation_root(&self) -> Option<&MetaType> {
        self.mutation_type
            .as_deref()
            .and_then(|name| self.types.get(name))
    }

    /// The root object for an operation kind, or why it cannot be executed.
    pub fn root_type(&self, operation_type: OperationType) -> Result<&ObjectType, Error> {
        match operation_type {
            OperationType::Query => self
                .query_root()
                .object()
                .ok_or_else(|| Error::new("The schema query root is not an object type")),
            OperationType::Mutation => self
                .mutation_root()
                .and_then(MetaType::object)
                .ok_or_else(|| Error::new("Schema is not configured for mutations.")),
            OperationType::Subscription => {
                Err(Error::new("Subscriptions are not supported by this engine."))
            }
        }
    }

    pub fn add_implements(&mut self, ty: &str, interface: &str) {
        self.implements
            .entry(ty.to_string())
            .or_default()
            .insert(interface.to_string());
    }

    /// Whether `ty` declares that it implements `interface`.
    pub fn type_implements(&self, ty: &str, interface: &str) -> bool {
        self.implements
            .get(ty)
            .is_some_and(|interfaces| interfaces.contains(interface))
    }

    pub fn add_directive(&mut self, directive: MetaDirective) {
        self.directives.insert(directive.name.to_string(), directive);
    }

    /// Checks that every reference resolves and sits in a legal position.
    /// Also derives interface membership from object `implements` lists.
    pub(crate) fn validate(&mut self) -> Result<(), SchemaError> {
        let mut interface_members: Vec<(String, String)> = Vec::new();

        for ty in self.types.values() {
            match ty {
                MetaType::Object(object) => {
                    self.validate_fields(&object.name, &object.fields)?;
                    for interface in &object.implements {
                        match self.types.get(interface) {
                            Some(MetaType::Interface(_)) => {
                                interface_members.push((interface.clone(), object.name.clone()));
                            }
                            Some(_) => {
                                return Err(SchemaError::NotAnInterface {
                                    object: object.name.clone(),
                                    interface: interface.clone(),
                                })
                            }
                            None => {
                                return Err(SchemaError::UnknownType {
                                    name: interface.clone(),
                                    referenced_by: object.name.clone(),
                                })
                            }
                        }
                    }
                }
                MetaType::Interface(interface) => {
                    self.validate_fields(&interface.name, &interface.fields)?;
                }
                MetaType::Union(union) => {
                    for member in &union.possible_types {
                        match self.types.get(member) {
                            Some(MetaType::Object(_)) => {}
                            Some(_) => {
                                return Err(SchemaError::NonObjectUnionMember {
                                    union_name: union.name.clone(),
                                    member: member.clone(),
                                })
                            }
                            None => {
                                return Err(SchemaError::UnknownType {
                                    name: member.clone(),
                                    referenced_by: union.name.clone(),
                                })
                            }
                        }
                    }
                }
                MetaType::InputObject(input_object) => {
                    for input in input_object.input_fields.values() {
                        self.validate_input_position(&input_object.name, &input.name, &input.ty)?;
                    }
                }
                MetaType::Scalar(_) | MetaType::Enum(_) => {}
            }
        }

        for directive in self.directives.values() {
            for arg in directive.args.values() {
                self.validate_input_position(&format!("@{}", directive.name), &arg.name, &arg.ty)?;
            }
        }

        for (interface, member) in interface_members {
            self.add_implements(&member, &interface);
            if let Some(MetaType::Interface(interface)) = self.types.get_mut(&interface) {
                interface.possible_types.insert(member);
            }
        }

        match self.types.get(&self.query_type) {
            Some(MetaType::Object(_)) => {}
            _ => return Err(SchemaError::InvalidRootType(self.query_type.clone())),
        }
        if let Some(mutation_type) = &self.mutation_type {
            match self.types.get(mutation_type) {
                Some(MetaType::Object(_)) => {}
                _ => return Err(SchemaError::InvalidRootType(mutation_type.clone())),
            }
        }

        Ok(())
    }

    fn validate_fields(
        &self,
        type_name: &str,
        fields: &IndexMap<String, MetaField>,
    ) -> Result<(), SchemaError> {
        for field in fields.values() {
            let target = field.ty.named_type();
            let Some(target_ty) = self.types.get(target) else {
                return Err(SchemaError::UnknownType {
                    name: target.to_string(),
                    referenced_by: referenced_by(type_name, &field.name),
                });
            };
            if matches!(target_ty, MetaType::InputObject(_)) {
                return Err(SchemaError::NotOutputType {
                    name: target.to_string(),
                    referenced_by: referenced_by(type_name, &field.name),
                });
            }
            for arg in field.args.values() {
                self.validate_input_position(
                    &referenced_by(type_name, &field.name),
                    &arg.name,
                    &arg.ty,
                )?;
            }
        }
        Ok(())
    }

    fn validate_input_position(
        &self,
        owner: &str,
        name: &str,
        ty: &InputValueType,
    ) -> Result<(), SchemaError> {
        let target = ty.named_type();
        let Some(target_ty) = self.types.get(target) else {
            return Err(SchemaError::UnknownType {
                name: target.to_string(),
                referenced_by: referenced_by(owner, name),
            });
        };
        if !target_ty.is_input() {
            return Err(SchemaError::NotInputType {
                name: target.to_string(),
                referenced_by: referenced_by(owner, name),
            });
        }
        Ok(())
    }
}
