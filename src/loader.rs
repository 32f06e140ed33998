//! Descriptor loading.
//!
//! [`load_file`] wraps one raw file descriptor into a [`File`]: package,
//! imports, comments and the declared messages, enums and services in
//! declaration order. Type references are kept as written; resolving them
//! is the job of the symbol table and the resolver.

use crate::descriptor::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    MethodDescriptorProto, ServiceDescriptorProto,
};
use crate::error::{Error, Result};
use crate::options::{
    decode_field_options, decode_method_options, decode_service_options, FieldOptions,
    OperationDirective, ServiceOptions,
};
use prost_types::field_descriptor_proto::{Label, Type};
use std::collections::HashMap;

// Field numbers used in source-code-info paths.
const FILE_MESSAGE_TYPE: i32 = 4;
const FILE_ENUM_TYPE: i32 = 5;
const FILE_SERVICE: i32 = 6;
const MESSAGE_FIELD: i32 = 2;
const MESSAGE_NESTED_TYPE: i32 = 3;
const MESSAGE_ENUM_TYPE: i32 = 4;
const ENUM_VALUE: i32 = 2;
const SERVICE_METHOD: i32 = 2;

/// One compiled `.proto` file.
#[derive(Debug, Clone)]
pub struct File {
    pub name: String,
    pub package: String,
    /// Imported file names.
    pub dependencies: Vec<String>,
    /// `(graphql.file_service)`, the fallback for every service in the file.
    pub options: Option<ServiceOptions>,
    /// Top-level messages, each followed by its nested messages.
    pub messages: Vec<Message>,
    /// Top-level enums, then nested enums in message order.
    pub enums: Vec<Enum>,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone)]
pub struct Message {
    /// Name below the package, `Outer.Inner` for nested messages.
    pub name: String,
    pub full_name: String,
    pub package: String,
    pub fields: Vec<Field>,
    pub oneofs: Vec<String>,
    pub comment: Option<String>,
    pub map_entry: bool,
}

impl Message {
    /// `Outer.Inner` -> `Outer_Inner`
    pub fn graphql_name(&self) -> String {
        self.name.replace('.', "_")
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declared kind of a field. References are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(Type),
    Message(String),
    Enum(String),
    Group(String),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub number: i32,
    pub kind: FieldKind,
    pub repeated: bool,
    /// Name of the real oneof group this field belongs to. proto3
    /// `optional` fields are not group members.
    pub oneof: Option<String>,
    /// Singular field whose absence is observable: message fields,
    /// proto3 `optional` and proto2 `optional`.
    pub explicit_presence: bool,
    pub comment: Option<String>,
    pub options: FieldOptions,
}

impl Field {
    /// The `(graphql.field).comment` override, else the source comment.
    pub fn description(&self) -> Option<&str> {
        self.options
            .comment
            .as_deref()
            .or(self.comment.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub name: String,
    pub full_name: String,
    pub package: String,
    pub values: Vec<EnumValue>,
    pub comment: Option<String>,
}

impl Enum {
    pub fn graphql_name(&self) -> String {
        self.name.replace('.', "_")
    }
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub options: Option<ServiceOptions>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub comment: Option<String>,
    pub directive: Option<OperationDirective>,
}

/// Source comments keyed by descriptor path.
struct Comments(HashMap<Vec<i32>, String>);

impl Comments {
    fn new(raw: &FileDescriptorProto) -> Self {
        let mut map = HashMap::new();
        if let Some(info) = &raw.source_code_info {
            for location in &info.location {
                let text = location
                    .leading_comments
                    .as_deref()
                    .and_then(clean_comment)
                    .or_else(|| location.trailing_comments.as_deref().and_then(clean_comment));
                if let Some(text) = text {
                    map.insert(location.path.clone(), text);
                }
            }
        }
        Self(map)
    }

    fn get(&self, path: &[i32]) -> Option<String> {
        self.0.get(path).cloned()
    }
}

fn clean_comment(raw: &str) -> Option<String> {
    let text = raw
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

struct Loader<'r> {
    file: &'r str,
    package: &'r str,
    proto3: bool,
    comments: Comments,
    messages: Vec<Message>,
    enums: Vec<Enum>,
}

/// Wrap a raw file descriptor. Pure and order-preserving.
pub fn load_file(raw: &FileDescriptorProto) -> Result<File> {
    let name = raw.name();
    if name.is_empty() {
        return Err(Error::invalid_descriptor(
            "<unnamed>",
            "file descriptor has no name",
        ));
    }

    let mut loader = Loader {
        file: name,
        package: raw.package(),
        proto3: raw.syntax() == "proto3",
        comments: Comments::new(raw),
        messages: Vec::new(),
        enums: Vec::new(),
    };

    for (i, message) in raw.message_type.iter().enumerate() {
        loader.load_message(message, "", vec![FILE_MESSAGE_TYPE, i as i32])?;
    }

    // Top-level enums come first, nested ones were collected above.
    let mut enums = Vec::new();
    for (i, enum_type) in raw.enum_type.iter().enumerate() {
        enums.push(loader.load_enum(enum_type, "", vec![FILE_ENUM_TYPE, i as i32])?);
    }
    enums.append(&mut loader.enums);

    let services = raw
        .service
        .iter()
        .enumerate()
        .map(|(i, service)| loader.load_service(service, vec![FILE_SERVICE, i as i32]))
        .collect::<Result<Vec<_>>>()?;

    let options = decode_service_options(
        name,
        raw.options.as_ref().and_then(|o| o.graphql_service.as_ref()),
    )?;

    Ok(File {
        name: name.to_string(),
        package: raw.package().to_string(),
        dependencies: raw.dependency.clone(),
        options,
        messages: loader.messages,
        enums,
        services,
    })
}

impl<'r> Loader<'r> {
    fn qualify(&self, local: &str) -> String {
        if self.package.is_empty() {
            local.to_string()
        } else {
            format!("{}.{}", self.package, local)
        }
    }

    fn scoped(scope: &str, name: &str) -> String {
        if scope.is_empty() {
            name.to_string()
        } else {
            format!("{scope}.{name}")
        }
    }

    fn load_message(&mut self, raw: &DescriptorProto, scope: &str, path: Vec<i32>) -> Result<()> {
        let name = raw.name();
        if name.is_empty() {
            return Err(Error::invalid_descriptor(
                self.file,
                format!("message at {path:?} has no name"),
            ));
        }
        let local = Self::scoped(scope, name);
        let full_name = self.qualify(&local);

        let fields = raw
            .field
            .iter()
            .enumerate()
            .map(|(j, field)| {
                let mut field_path = path.clone();
                field_path.extend([MESSAGE_FIELD, j as i32]);
                self.load_field(raw, field, &full_name, &field_path)
            })
            .collect::<Result<Vec<_>>>()?;

        // Parent precedes its nested messages.
        self.messages.push(Message {
            name: local.clone(),
            full_name,
            package: self.package.to_string(),
            fields,
            oneofs: raw.oneof_decl.iter().map(|o| o.name().to_string()).collect(),
            comment: self.comments.get(&path),
            map_entry: raw
                .options
                .as_ref()
                .map(|o| o.map_entry())
                .unwrap_or(false),
        });

        for (k, nested) in raw.nested_type.iter().enumerate() {
            let mut nested_path = path.clone();
            nested_path.extend([MESSAGE_NESTED_TYPE, k as i32]);
            self.load_message(nested, &local, nested_path)?;
        }

        for (k, nested) in raw.enum_type.iter().enumerate() {
            let mut nested_path = path.clone();
            nested_path.extend([MESSAGE_ENUM_TYPE, k as i32]);
            let loaded = self.load_enum(nested, &local, nested_path)?;
            self.enums.push(loaded);
        }

        Ok(())
    }

    fn load_field(
        &self,
        message: &DescriptorProto,
        raw: &FieldDescriptorProto,
        message_name: &str,
        path: &[i32],
    ) -> Result<Field> {
        let name = raw.name();
        if name.is_empty() {
            return Err(Error::invalid_descriptor(
                self.file,
                format!("field #{} of {message_name} has no name", raw.number()),
            ));
        }
        let entity = format!("{message_name}.{name}");

        let declared = raw
            .r#type
            .and_then(|t| Type::try_from(t).ok())
            .ok_or_else(|| {
                Error::invalid_descriptor(self.file, format!("field {entity} has no type"))
            })?;

        let reference = || {
            let type_name = raw.type_name();
            if type_name.is_empty() {
                Err(Error::invalid_descriptor(
                    self.file,
                    format!("field {entity} has no type name"),
                ))
            } else {
                Ok(type_name.to_string())
            }
        };

        let kind = match declared {
            Type::Message => FieldKind::Message(reference()?),
            Type::Enum => FieldKind::Enum(reference()?),
            Type::Group => FieldKind::Group(reference()?),
            scalar => FieldKind::Scalar(scalar),
        };

        let repeated = raw.label() == Label::Repeated;
        let explicit_presence = !repeated
            && (matches!(kind, FieldKind::Message(_) | FieldKind::Group(_))
                || raw.proto3_optional()
                || (!self.proto3 && raw.label() == Label::Optional));

        let oneof = match raw.oneof_index {
            Some(_) if raw.proto3_optional() => None,
            Some(index) => {
                let group = usize::try_from(index)
                    .ok()
                    .and_then(|i| message.oneof_decl.get(i))
                    .ok_or_else(|| {
                        Error::invalid_descriptor(
                            self.file,
                            format!("field {entity} names missing oneof #{index}"),
                        )
                    })?;
                Some(group.name().to_string())
            }
            None => None,
        };

        let options = decode_field_options(
            &entity,
            declared,
            repeated,
            raw.options.as_ref().and_then(|o| o.graphql_field.as_ref()),
        )?;
        if options.required && oneof.is_some() {
            return Err(Error::malformed(
                &entity,
                "oneof members cannot be required",
            ));
        }

        Ok(Field {
            name: name.to_string(),
            number: raw.number(),
            kind,
            repeated,
            oneof,
            explicit_presence,
            comment: self.comments.get(path),
            options,
        })
    }

    fn load_enum(&self, raw: &EnumDescriptorProto, scope: &str, path: Vec<i32>) -> Result<Enum> {
        let name = raw.name();
        if name.is_empty() {
            return Err(Error::invalid_descriptor(
                self.file,
                format!("enum at {path:?} has no name"),
            ));
        }
        let local = Self::scoped(scope, name);
        let full_name = self.qualify(&local);

        let values = raw
            .value
            .iter()
            .enumerate()
            .map(|(j, value)| {
                if value.name().is_empty() {
                    return Err(Error::invalid_descriptor(
                        self.file,
                        format!("value #{j} of enum {full_name} has no name"),
                    ));
                }
                let mut value_path = path.clone();
                value_path.extend([ENUM_VALUE, j as i32]);
                Ok(EnumValue {
                    name: value.name().to_string(),
                    number: value.number(),
                    comment: self.comments.get(&value_path),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Enum {
            name: local,
            full_name,
            package: self.package.to_string(),
            values,
            comment: self.comments.get(&path),
        })
    }

    fn load_service(&self, raw: &ServiceDescriptorProto, path: Vec<i32>) -> Result<Service> {
        let name = raw.name();
        if name.is_empty() {
            return Err(Error::invalid_descriptor(
                self.file,
                format!("service at {path:?} has no name"),
            ));
        }
        let full_name = self.qualify(name);

        let methods = raw
            .method
            .iter()
            .enumerate()
            .map(|(j, method)| {
                let mut method_path = path.clone();
                method_path.extend([SERVICE_METHOD, j as i32]);
                self.load_method(method, &full_name, &method_path)
            })
            .collect::<Result<Vec<_>>>()?;

        let options = decode_service_options(
            &full_name,
            raw.options.as_ref().and_then(|o| o.graphql_service.as_ref()),
        )?;

        Ok(Service {
            name: name.to_string(),
            comment: self.comments.get(&path),
            full_name,
            options,
            methods,
        })
    }

    fn load_method(
        &self,
        raw: &MethodDescriptorProto,
        service: &str,
        path: &[i32],
    ) -> Result<Method> {
        let name = raw.name();
        if name.is_empty() {
            return Err(Error::invalid_descriptor(
                self.file,
                format!("method at {path:?} of {service} has no name"),
            ));
        }
        let entity = format!("{service}.{name}");
        if raw.input_type().is_empty() || raw.output_type().is_empty() {
            return Err(Error::invalid_descriptor(
                self.file,
                format!("method {entity} is missing its request or response type"),
            ));
        }

        let directive = decode_method_options(
            &entity,
            raw.options.as_ref().and_then(|o| o.graphql_schema.as_ref()),
        )?;

        Ok(Method {
            name: name.to_string(),
            input_type: raw.input_type().to_string(),
            output_type: raw.output_type().to_string(),
            client_streaming: raw.client_streaming(),
            server_streaming: raw.server_streaming(),
            comment: self.comments.get(path),
            directive,
        })
    }
}
