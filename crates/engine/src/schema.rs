//! Schema construction and the execution entry point.

use std::sync::{Arc, Mutex};

use engine_ast::types::{DocumentOperations, ExecutableDocument, OperationDefinition, OperationType};
use engine_ast::Positioned;
use engine_value::ConstValue;

use crate::{
    context::{ContextSelectionSet, Data, QueryEnv, QueryEnvInner, SchemaEnv},
    query_path::QueryPath,
    registry::{
        introspection, DirectiveLocation, MetaDirective, MetaInputValue, MetaType, ObjectType,
        Registry, ScalarType,
    },
    request::Request,
    resolver_utils::{coerce_variables, resolve_container},
    resolvers::ResolvedValue,
    response::Response,
    SchemaError, ServerError,
};

/// Assembles a [`Schema`]: root types, additional named types, directives
/// and schema-scoped data.
pub struct SchemaBuilder {
    registry: Registry,
    data: Data,
}

impl SchemaBuilder {
    /// Register a named type that is only reachable through an interface or
    /// union membership, or any other type referenced by name.
    pub fn register(mut self, ty: impl Into<MetaType>) -> Self {
        self.registry.insert_type(ty);
        self
    }

    pub fn mutation(mut self, mutation: ObjectType) -> Self {
        self.registry.mutation_type = Some(mutation.name.clone());
        self.registry.insert_type(mutation);
        self
    }

    pub fn directive(mut self, directive: MetaDirective) -> Self {
        self.registry.add_directive(directive);
        self
    }

    /// Insert data accessible from every resolver of every request.
    pub fn data<D: std::any::Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    /// Refuse to serve `__schema`/`__type` unless a request forces them on.
    pub fn disable_introspection(mut self) -> Self {
        self.registry.disable_introspection = true;
        self
    }

    /// Registers the built-ins and validates every type reference.
    pub fn finish(mut self) -> Result<Schema, SchemaError> {
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            if !self.registry.types.contains_key(name) {
                self.registry.insert_type(ScalarType::new(name));
            }
        }

        let executable_locations = [
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ];
        self.registry.add_directive(
            MetaDirective::new("skip", executable_locations)
                .with_description("Directs the executor to skip this field or fragment when the `if` argument is true.")
                .with_argument(MetaInputValue::new("if", "Boolean!").with_description("Skipped when true.")),
        );
        self.registry.add_directive(
            MetaDirective::new("include", executable_locations)
                .with_description("Directs the executor to include this field or fragment only when the `if` argument is true.")
                .with_argument(MetaInputValue::new("if", "Boolean!").with_description("Included when true.")),
        );
        self.registry.add_directive(
            MetaDirective::new(
                "deprecated",
                [DirectiveLocation::FieldDefinition, DirectiveLocation::EnumValue],
            )
            .with_description("Marks an element of a GraphQL schema as no longer supported.")
            .with_argument(
                MetaInputValue::new("reason", "String")
                    .with_default(ConstValue::String("No longer supported".to_string())),
            ),
        );

        introspection::register(&mut self.registry);

        self.registry.validate()?;

        Ok(Schema {
            env: SchemaEnv::new(self.registry, self.data),
        })
    }
}

/// An executable schema: the registry plus schema-scoped data, cheap to
/// clone and immutable once built.
#[derive(Clone, Debug)]
pub struct Schema {
    env: SchemaEnv,
}

impl Schema {
    /// Starts a schema with the given query root object.
    pub fn build(query: ObjectType) -> SchemaBuilder {
        let mut registry = Registry {
            query_type: query.name.clone(),
            ..Registry::default()
        };
        registry.insert_type(query);
        SchemaBuilder {
            registry,
            data: Data::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.env.registry
    }

    /// Executes one operation of a prepared document and produces the
    /// response tree.
    pub fn execute(&self, document: ExecutableDocument, request: Request) -> Response {
        let operation = match select_operation(document.operations, request.operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(error) => return Response::from_errors(vec![error]),
        };

        let operation_type = operation.node.ty;
        tracing::debug!(%operation_type, "executing operation");

        if operation_type == OperationType::Subscription {
            return Response::from_errors(vec![ServerError::new(
                "Subscriptions are not supported by this engine.",
                Some(operation.pos),
            )]);
        }

        let root = match self.env.registry.root_type(operation_type) {
            Ok(root) => root,
            Err(error) => {
                return Response::from_errors(vec![ServerError::new(error.message, Some(operation.pos))])
            }
        };

        let variables =
            match coerce_variables(&self.env.registry, &operation.node, &request.variables) {
                Ok(variables) => variables,
                Err(errors) => return Response::from_errors(errors),
            };

        let query_env = QueryEnv::new(QueryEnvInner {
            variables,
            operation,
            fragments: document.fragments,
            ctx_data: Arc::new(request.data),
            errors: Mutex::new(Vec::new()),
            introspection_state: request.introspection_state,
        });

        let data = {
            let ctx = ContextSelectionSet {
                ty: root,
                path: QueryPath::empty(),
                item: &query_env.operation.node.selection_set,
                schema_env: &self.env,
                query_env: &query_env,
            };

            // Root fields resolve serially in collection order; an error
            // escaping here came through a non-null root field and nulls the
            // whole data tree.
            match resolve_container(&ctx, &ResolvedValue::null()) {
                Ok(data) => data,
                Err(error) => {
                    let errors = &mut *query_env.errors.lock().expect("errors lock");
                    if !errors
                        .iter()
                        .any(|existing| existing.message == error.message && existing.path == error.path)
                    {
                        errors.push(error);
                    }
                    ConstValue::Null
                }
            }
        };

        Response::new(data, query_env.into_errors())
    }
}

fn select_operation(
    operations: DocumentOperations,
    operation_name: Option<&str>,
) -> Result<Positioned<OperationDefinition>, ServerError> {
    match (operations, operation_name) {
        (DocumentOperations::Single(operation), None) => Ok(operation),
        (DocumentOperations::Single(_), Some(name)) => Err(ServerError::new(
            format!(r#"Unknown operation named "{name}"."#),
            None,
        )),
        (DocumentOperations::Multiple(mut operations), Some(name)) => operations
            .remove(name)
            .ok_or_else(|| ServerError::new(format!(r#"Unknown operation named "{name}"."#), None)),
        (DocumentOperations::Multiple(operations), None) => {
            if operations.len() == 1 {
                Ok(operations.into_values().next().expect("length checked"))
            } else {
                Err(ServerError::new(
                    "Operation name required in a document that defines multiple operations.",
                    None,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::Data,
        registry::{InputObjectType, MetaField, UnionType},
        resolvers::ResolvedValue,
        Error,
    };

    fn no_resolve(_: &ResolvedValue, _: &Data) -> Result<String, Error> {
        Err(Error::new("unused"))
    }

    #[test]
    fn unresolvable_field_type_fails_validation() {
        let err = Schema::build(ObjectType::new("Query", [MetaField::new("x", "Ghost")]))
            .finish()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown type `Ghost` referenced from `Query.x`"
        );
    }

    #[test]
    fn input_objects_are_rejected_in_output_positions() {
        let err = Schema::build(ObjectType::new("Query", [MetaField::new("x", "Filter")]))
            .register(InputObjectType::new(
                "Filter",
                [MetaInputValue::new("q", "String")],
            ))
            .finish()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`Filter` is not an output type but is used as the type of `Query.x`"
        );
    }

    #[test]
    fn union_members_must_be_object_types() {
        let err = Schema::build(ObjectType::new("Query", [MetaField::new("u", "U")]))
            .register(UnionType::new("U", ["Int"], no_resolve))
            .finish()
            .unwrap_err();
        assert_eq!(err.to_string(), "Union `U` member `Int` is not an object type");
    }

    #[test]
    fn objects_may_only_implement_interfaces() {
        let err = Schema::build(ObjectType::new(
            "Query",
            [MetaField::new("x", "Int")],
        ))
        .register(ObjectType::new("Thing", [MetaField::new("x", "Int")]).implement("Int"))
        .finish()
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`Thing` implements `Int`, which is not an interface type"
        );
    }
}
