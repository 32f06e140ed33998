//! Schema graph builder.
//!
//! Walks the services of one requested file and produces its
//! [`RootPackage`]: every method carrying a `(graphql.schema)` directive
//! becomes a query or mutation, request messages seed the input worklist,
//! response messages seed the output worklist, and both worklists are
//! drained in discovery order until every reachable message and enum has
//! been projected.

use crate::error::{Error, Result};
use crate::loader::{Enum, Field, FieldKind, File, Message, Method, Service};
use crate::naming::to_lower_camel_case;
use crate::options::{DefaultValue, OperationDirective, OperationKind};
use crate::resolver::{Imports, Resolver, TypeContext};
use crate::symbols::{Symbol, SymbolTable};
use crate::types::{
    Cardinality, EnumType, EnumValueDef, ExposeStep, FieldValue, InputField, InputType, MethodRef,
    ObjectField, ObjectType, Operation, RootPackage, ServiceBinding, TypeExpr,
};
use prost_types::field_descriptor_proto::Type;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, instrument};

/// Type names every emitted schema defines itself.
const RESERVED_NAMES: [&str; 6] = ["Query", "Mutation", "Int", "Float", "String", "Boolean"];
const RESERVED_OWNER: &str = "<graphql builtin>";

/// How fields that belong to a real oneof group are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OneofPolicy {
    /// Fail with `UnsupportedFieldKind`.
    #[default]
    Reject,
    /// Emit every member as an ordinary nullable field.
    Flatten,
}

/// Builds one [`RootPackage`] per requested file against a shared
/// [`SymbolTable`].
pub struct SchemaBuilder<'s, 'a> {
    symbols: &'s SymbolTable<'a>,
    oneof: OneofPolicy,
}

impl<'s, 'a> SchemaBuilder<'s, 'a> {
    pub fn new(symbols: &'s SymbolTable<'a>) -> Self {
        Self {
            symbols,
            oneof: OneofPolicy::default(),
        }
    }

    pub fn oneof_policy(mut self, policy: OneofPolicy) -> Self {
        self.oneof = policy;
        self
    }

    #[instrument(skip_all, fields(file = %file.name))]
    pub fn build(&self, file: &File) -> Result<RootPackage> {
        if self.symbols.file(&file.name).is_none() {
            return Err(Error::invalid_descriptor(
                &file.name,
                "file is not part of the loaded descriptor set",
            ));
        }
        let alias = self
            .symbols
            .package(&file.package)
            .map(|p| p.alias.clone())
            .ok_or_else(|| {
                Error::invalid_descriptor(
                    &file.name,
                    format!("package `{}` is not registered", file.package),
                )
            })?;

        let mut build = Build {
            symbols: self.symbols,
            resolver: Resolver::new(self.symbols),
            oneof: self.oneof,
            imports: Imports::new(file.package.clone()),
            outputs: Worklist::default(),
            inputs: Worklist::default(),
            enums: Vec::new(),
            enum_seen: HashSet::new(),
            names: RESERVED_NAMES
                .iter()
                .map(|name| (name.to_string(), RESERVED_OWNER.to_string()))
                .collect(),
        };

        let mut services = Vec::new();
        let mut queries = Vec::new();
        let mut mutations = Vec::new();
        let mut query_names = HashMap::new();
        let mut mutation_names = HashMap::new();

        for service in &file.services {
            let mut bound = false;
            for method in &service.methods {
                let Some(directive) = &method.directive else {
                    continue;
                };
                let operation = build.operation(file, service, method, directive)?;
                let (list, seen) = match operation.kind {
                    OperationKind::Query => (&mut queries, &mut query_names),
                    OperationKind::Mutation => (&mut mutations, &mut mutation_names),
                };
                let entity = format!("{}.{}", service.full_name, method.name);
                if let Some(previous) = seen.insert(operation.name.clone(), entity.clone()) {
                    return Err(Error::DuplicateName {
                        name: operation.name,
                        detail: format!(
                            "{} bound to both {previous} and {entity}",
                            operation.kind.as_str()
                        ),
                    });
                }
                debug!(
                    operation = %operation.name,
                    kind = operation.kind.as_str(),
                    rpc = %operation.method.path(),
                    "bound operation"
                );
                list.push(operation);
                bound = true;
            }
            if bound {
                services.push(binding(file, service));
            }
        }

        let mut types = Vec::new();
        while let Some(message) = build.outputs.next() {
            types.push(build.object(message)?);
        }

        let mut inputs = Vec::new();
        while let Some(message) = build.inputs.next() {
            inputs.push(InputType {
                name: format!("{}Input", message.graphql_name()),
                full_name: message.full_name.clone(),
                package: message.package.clone(),
                comment: message.comment.clone(),
                fields: build.input_fields(message, TypeContext::Input)?,
            });
        }
        check_required_cycles(&inputs)?;

        let enums = build.enums.iter().copied().map(enum_type).collect::<Vec<_>>();

        debug!(
            types = types.len(),
            inputs = inputs.len(),
            enums = enums.len(),
            queries = queries.len(),
            mutations = mutations.len(),
            "schema graph built"
        );

        Ok(RootPackage {
            file: file.name.clone(),
            package: file.package.clone(),
            alias,
            services,
            types,
            enums,
            inputs,
            queries,
            mutations,
            imports: build.imports.into_vec(),
        })
    }
}

/// FIFO of messages, each enqueued at most once.
struct Worklist<'a> {
    queue: VecDeque<&'a Message>,
    seen: HashSet<&'a str>,
}

impl<'a> Default for Worklist<'a> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
        }
    }
}

impl<'a> Worklist<'a> {
    fn push(&mut self, message: &'a Message) -> bool {
        if !self.seen.insert(&message.full_name) {
            return false;
        }
        self.queue.push_back(message);
        true
    }

    fn next(&mut self) -> Option<&'a Message> {
        self.queue.pop_front()
    }
}

struct Build<'s, 'a> {
    symbols: &'s SymbolTable<'a>,
    resolver: Resolver<'s, 'a>,
    oneof: OneofPolicy,
    imports: Imports,
    outputs: Worklist<'a>,
    inputs: Worklist<'a>,
    enums: Vec<&'a Enum>,
    enum_seen: HashSet<&'a str>,
    /// GraphQL type name -> fully-qualified name of its source
    names: HashMap<String, String>,
}

impl<'s, 'a> Build<'s, 'a> {
    fn operation(
        &mut self,
        file: &File,
        service: &Service,
        method: &Method,
        directive: &OperationDirective,
    ) -> Result<Operation> {
        let entity = format!("{}.{}", service.full_name, method.name);
        if method.client_streaming || method.server_streaming {
            return Err(Error::malformed(
                &entity,
                "streaming methods cannot be bound to a query or mutation",
            ));
        }

        let (request, request_ref) = self.resolver.message(
            &service.full_name,
            &method.input_type,
            &entity,
            &mut self.imports,
        )?;
        let (response, response_ref) = self.resolver.message(
            &service.full_name,
            &method.output_type,
            &entity,
            &mut self.imports,
        )?;
        self.enqueue_input(request)?;
        self.enqueue_output(response)?;

        let args = self.input_fields(request, TypeContext::Argument)?;
        let (return_type, expose_steps) = match &directive.expose {
            Some(path) => self.expose(&entity, response, path)?,
            None => (TypeExpr::Object(response_ref.clone()), Vec::new()),
        };

        Ok(Operation {
            name: directive
                .name
                .clone()
                .unwrap_or_else(|| to_lower_camel_case(&method.name)),
            kind: directive.kind,
            comment: method.comment.clone(),
            method: MethodRef {
                package: file.package.clone(),
                service: service.full_name.clone(),
                service_name: service.name.clone(),
                method: method.name.clone(),
            },
            request: request_ref,
            response: response_ref,
            args,
            return_type,
            expose: directive.expose.clone(),
            expose_steps,
        })
    }

    /// Walk `path` through `response`; the last field's output type is
    /// the operation's return type.
    fn expose(
        &mut self,
        entity: &str,
        response: &'a Message,
        path: &[String],
    ) -> Result<(TypeExpr, Vec<ExposeStep>)> {
        let joined = path.join(".");
        let mut current = response;
        let mut steps = Vec::with_capacity(path.len());

        for (i, segment) in path.iter().enumerate() {
            let field = current.field(segment).ok_or_else(|| {
                Error::malformed(
                    entity,
                    format!(
                        "expose path `{joined}`: {} has no field `{segment}`",
                        current.full_name
                    ),
                )
            })?;

            self.check_oneof(current, field)?;
            if i + 1 == path.len() {
                let ty = self
                    .resolver
                    .resolve(current, field, TypeContext::Output, &mut self.imports)?;
                self.discover(&ty)?;
                steps.push(self.step(current, field)?);
                return Ok((ty, steps));
            }

            let FieldKind::Message(type_name) = &field.kind else {
                return Err(self.not_traversable(entity, &joined, segment));
            };
            if field.repeated {
                return Err(self.not_traversable(entity, &joined, segment));
            }
            let (next, _) = self.resolver.message(
                &current.full_name,
                type_name,
                &format!("{}.{}", current.full_name, field.name),
                &mut self.imports,
            )?;
            steps.push(self.step(current, field)?);
            current = next;
        }

        Err(Error::malformed(entity, "expose path is empty"))
    }

    fn step(&mut self, owner: &'a Message, field: &Field) -> Result<ExposeStep> {
        let cardinality = if field.repeated {
            Cardinality::Repeated
        } else if field.explicit_presence {
            Cardinality::Optional
        } else {
            Cardinality::Singular
        };

        Ok(ExposeStep {
            field: field.name.clone(),
            owner: self.resolver.message_ref(owner, &mut self.imports),
            value: self.field_value(owner, field)?,
            cardinality,
            oneof: field.oneof.clone(),
        })
    }

    fn field_value(&mut self, owner: &'a Message, field: &Field) -> Result<FieldValue> {
        let entity = format!("{}.{}", owner.full_name, field.name);
        match &field.kind {
            FieldKind::Scalar(kind) => Ok(FieldValue::Scalar(scalar_type_name(*kind))),
            FieldKind::Enum(type_name) => Ok(FieldValue::Enum(self.resolver.enumeration(
                &owner.full_name,
                type_name,
                &entity,
                &mut self.imports,
            )?)),
            FieldKind::Message(type_name) => {
                let (message, reference) = self.resolver.message(
                    &owner.full_name,
                    type_name,
                    &entity,
                    &mut self.imports,
                )?;
                if message.map_entry && field.repeated {
                    let (Some(key), Some(value)) = (message.field("key"), message.field("value"))
                    else {
                        return Err(Error::UnsupportedFieldKind {
                            field: entity,
                            kind: format!("map entry {} without key and value", message.full_name),
                        });
                    };
                    return Ok(FieldValue::Map {
                        key: Box::new(self.field_value(message, key)?),
                        value: Box::new(self.field_value(message, value)?),
                    });
                }
                Ok(FieldValue::Message {
                    boxed: !field.repeated && self.reaches(message, &owner.full_name),
                    reference,
                })
            }
            FieldKind::Group(_) => Err(Error::UnsupportedFieldKind {
                field: entity,
                kind: "group".to_string(),
            }),
        }
    }

    /// Whether `target` can be reached from `from` through singular message
    /// fields. Such a field closes a cycle and is stored boxed.
    fn reaches(&self, from: &'a Message, target: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(message) = stack.pop() {
            if message.full_name == target {
                return true;
            }
            if !seen.insert(message.full_name.as_str()) {
                continue;
            }
            for field in message.fields.iter().filter(|f| !f.repeated) {
                let FieldKind::Message(type_name) = &field.kind else {
                    continue;
                };
                if let Some(Symbol::Message { message: next, .. }) =
                    self.symbols.lookup(&message.full_name, type_name)
                {
                    stack.push(next);
                }
            }
        }
        false
    }

    fn not_traversable(&self, entity: &str, path: &str, segment: &str) -> Error {
        Error::malformed(
            entity,
            format!("expose path `{path}`: `{segment}` is not a singular message field"),
        )
    }

    fn object(&mut self, message: &'a Message) -> Result<ObjectType> {
        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            self.check_oneof(message, field)?;
            let ty = self
                .resolver
                .resolve(message, field, TypeContext::Output, &mut self.imports)?;
            self.discover(&ty)?;
            fields.push(ObjectField {
                name: field.name.clone(),
                ty,
                comment: field.description().map(str::to_string),
            });
        }

        Ok(ObjectType {
            name: message.graphql_name(),
            full_name: message.full_name.clone(),
            package: message.package.clone(),
            comment: message.comment.clone(),
            fields,
        })
    }

    /// Fields of an input object, or the arguments of an operation.
    fn input_fields(
        &mut self,
        message: &'a Message,
        context: TypeContext,
    ) -> Result<Vec<InputField>> {
        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            self.check_oneof(message, field)?;
            let ty = self
                .resolver
                .resolve(message, field, context, &mut self.imports)?;
            self.discover(&ty)?;
            self.check_default(message, field, &ty)?;
            fields.push(InputField {
                name: field.name.clone(),
                ty,
                default: field.options.default.clone(),
                comment: field.description().map(str::to_string),
            });
        }
        Ok(fields)
    }

    fn check_oneof(&self, message: &Message, field: &Field) -> Result<()> {
        match (&field.oneof, self.oneof) {
            (Some(group), OneofPolicy::Reject) => Err(Error::UnsupportedFieldKind {
                field: format!("{}.{}", message.full_name, field.name),
                kind: format!("oneof `{group}`"),
            }),
            _ => Ok(()),
        }
    }

    fn check_default(&self, message: &Message, field: &Field, ty: &TypeExpr) -> Result<()> {
        let Some(DefaultValue::Enum(literal)) = &field.options.default else {
            return Ok(());
        };
        let Some(Symbol::Enum { value, .. }) =
            ty.named().and_then(|r| self.symbols.get(&r.full_name))
        else {
            return Ok(());
        };
        if value.values.iter().any(|v| &v.name == literal) {
            return Ok(());
        }
        Err(Error::malformed(
            format!("{}.{}", message.full_name, field.name),
            format!("default `{literal}` is not a value of {}", value.full_name),
        ))
    }

    /// Enqueue whatever named type `ty` refers to.
    fn discover(&mut self, ty: &TypeExpr) -> Result<()> {
        let (reference, input) = match innermost(ty) {
            TypeExpr::Object(r) | TypeExpr::Enum(r) => (r, false),
            TypeExpr::Input(r) => (r, true),
            _ => return Ok(()),
        };

        match self.symbols.get(&reference.full_name) {
            Some(Symbol::Message { message, .. }) if input => self.enqueue_input(message),
            Some(Symbol::Message { message, .. }) => self.enqueue_output(message),
            Some(Symbol::Enum { value, .. }) => self.enqueue_enum(value),
            None => Err(Error::UnknownTypeReference {
                field: reference.name.clone(),
                type_name: reference.full_name.clone(),
            }),
        }
    }

    fn enqueue_output(&mut self, message: &'a Message) -> Result<()> {
        if self.outputs.push(message) {
            self.claim(message.graphql_name(), &message.full_name)?;
        }
        Ok(())
    }

    fn enqueue_input(&mut self, message: &'a Message) -> Result<()> {
        if self.inputs.push(message) {
            self.claim(format!("{}Input", message.graphql_name()), &message.full_name)?;
        }
        Ok(())
    }

    fn enqueue_enum(&mut self, value: &'a Enum) -> Result<()> {
        if self.enum_seen.insert(&value.full_name) {
            self.claim(value.graphql_name(), &value.full_name)?;
            self.enums.push(value);
        }
        Ok(())
    }

    /// Reserve a GraphQL type name for one protobuf declaration.
    fn claim(&mut self, name: String, full_name: &str) -> Result<()> {
        match self.names.get(&name) {
            Some(owner) if owner == RESERVED_OWNER => Err(Error::DuplicateName {
                detail: format!("{full_name} would redefine a type the schema reserves"),
                name,
            }),
            Some(owner) if owner != full_name => Err(Error::DuplicateName {
                detail: format!("GraphQL type claimed by both {owner} and {full_name}"),
                name,
            }),
            Some(_) => Ok(()),
            None => {
                self.names.insert(name, full_name.to_string());
                Ok(())
            }
        }
    }
}

/// `TYPE_INT64` -> `int64`
fn scalar_type_name(kind: Type) -> String {
    kind.as_str_name()
        .trim_start_matches("TYPE_")
        .to_ascii_lowercase()
}

fn innermost(ty: &TypeExpr) -> &TypeExpr {
    match ty {
        TypeExpr::List(inner) | TypeExpr::NonNull(inner) => innermost(inner),
        other => other,
    }
}

fn binding(file: &File, service: &Service) -> ServiceBinding {
    let options = service.options.as_ref().or(file.options.as_ref());
    ServiceBinding {
        full_name: service.full_name.clone(),
        name: service.name.clone(),
        package: file.package.clone(),
        host: service
            .options
            .as_ref()
            .and_then(|o| o.host.clone())
            .or_else(|| file.options.as_ref().and_then(|o| o.host.clone())),
        insecure: options.map(|o| o.insecure).unwrap_or(false),
        comment: service.comment.clone(),
    }
}

fn enum_type(value: &Enum) -> EnumType {
    EnumType {
        name: value.graphql_name(),
        full_name: value.full_name.clone(),
        package: value.package.clone(),
        comment: value.comment.clone(),
        values: value
            .values
            .iter()
            .map(|v| EnumValueDef {
                name: v.name.clone(),
                number: v.number,
                comment: v.comment.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Reject inputs that can only be satisfied by an infinite value: cycles
/// whose every edge is a singular non-null input field.
fn check_required_cycles(inputs: &[InputType]) -> Result<()> {
    let index: HashMap<&str, usize> = inputs
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    let edges: Vec<Vec<(usize, &str)>> = inputs
        .iter()
        .map(|input| {
            input
                .fields
                .iter()
                .filter_map(|f| match &f.ty {
                    TypeExpr::NonNull(inner) => match inner.as_ref() {
                        TypeExpr::Input(r) => {
                            index.get(r.name.as_str()).map(|j| (*j, f.name.as_str()))
                        }
                        _ => None,
                    },
                    _ => None,
                })
                .collect()
        })
        .collect();

    let mut state = vec![Visit::New; inputs.len()];
    let mut path = Vec::new();
    for start in 0..inputs.len() {
        visit(start, inputs, &edges, &mut state, &mut path)?;
    }
    Ok(())
}

fn visit<'i>(
    node: usize,
    inputs: &'i [InputType],
    edges: &[Vec<(usize, &'i str)>],
    state: &mut [Visit],
    path: &mut Vec<(usize, &'i str)>,
) -> Result<()> {
    if state[node] != Visit::New {
        return Ok(());
    }
    state[node] = Visit::Active;

    for &(next, field) in &edges[node] {
        path.push((node, field));
        match state[next] {
            Visit::Active => {
                let start = path.iter().position(|(n, _)| *n == next).unwrap_or(0);
                let cycle = path[start..]
                    .iter()
                    .map(|(n, _)| inputs[*n].name.as_str())
                    .chain(std::iter::once(inputs[next].name.as_str()))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                let (owner, field) = path[start];
                return Err(Error::UnsupportedFieldKind {
                    field: format!("{}.{}", inputs[owner].full_name, field),
                    kind: format!("required input cycle {cycle}"),
                });
            }
            Visit::New => visit(next, inputs, edges, state, path)?,
            Visit::Done => {}
        }
        path.pop();
    }

    state[node] = Visit::Done;
    Ok(())
}
