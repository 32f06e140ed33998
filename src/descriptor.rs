//! Wire-compatible subset of `google/protobuf/descriptor.proto` and
//! `google/protobuf/compiler/plugin.proto`.
//!
//! `prost-types` drops unknown fields while decoding, which would lose the
//! `graphql.*` extensions carried by the options messages. Extensions are
//! plain fields on the wire, so the options messages below declare them
//! directly under their extension number (1079) and decode them as typed
//! messages.
//!
//! The builder-style constructors are used by tests and by callers that
//! assemble descriptors in code instead of reading them from `protoc`.

use crate::graphql::{GraphqlField, GraphqlSchema, GraphqlService, GraphqlType};
use prost_types::field_descriptor_proto::{Label, Type};

/// An encoded `CodeGeneratorRequest`, as written by `protoc` to the plugin.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CodeGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    pub file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    pub parameter: Option<String>,
    /// Every file in `file_to_generate` plus everything it imports,
    /// in topological order.
    #[prost(message, repeated, tag = "15")]
    pub proto_file: Vec<FileDescriptorProto>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub package: Option<String>,
    #[prost(string, repeated, tag = "3")]
    pub dependency: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    pub message_type: Vec<DescriptorProto>,
    #[prost(message, repeated, tag = "5")]
    pub enum_type: Vec<EnumDescriptorProto>,
    #[prost(message, repeated, tag = "6")]
    pub service: Vec<ServiceDescriptorProto>,
    #[prost(message, optional, tag = "8")]
    pub options: Option<FileOptions>,
    #[prost(message, optional, tag = "9")]
    pub source_code_info: Option<SourceCodeInfo>,
    #[prost(string, optional, tag = "12")]
    pub syntax: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub field: Vec<FieldDescriptorProto>,
    #[prost(message, repeated, tag = "3")]
    pub nested_type: Vec<DescriptorProto>,
    #[prost(message, repeated, tag = "4")]
    pub enum_type: Vec<EnumDescriptorProto>,
    #[prost(message, optional, tag = "7")]
    pub options: Option<MessageOptions>,
    #[prost(message, repeated, tag = "8")]
    pub oneof_decl: Vec<OneofDescriptorProto>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FieldDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(int32, optional, tag = "3")]
    pub number: Option<i32>,
    #[prost(enumeration = "Label", optional, tag = "4")]
    pub label: Option<i32>,
    #[prost(enumeration = "Type", optional, tag = "5")]
    pub r#type: Option<i32>,
    /// Fully-qualified names start with `.`; anything else is resolved
    /// with protobuf scoping rules.
    #[prost(string, optional, tag = "6")]
    pub type_name: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub default_value: Option<String>,
    #[prost(message, optional, tag = "8")]
    pub options: Option<FieldOptions>,
    #[prost(int32, optional, tag = "9")]
    pub oneof_index: Option<i32>,
    #[prost(string, optional, tag = "10")]
    pub json_name: Option<String>,
    #[prost(bool, optional, tag = "17")]
    pub proto3_optional: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OneofDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnumDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub value: Vec<EnumValueDescriptorProto>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnumValueDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(int32, optional, tag = "2")]
    pub number: Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub method: Vec<MethodDescriptorProto>,
    #[prost(message, optional, tag = "3")]
    pub options: Option<ServiceOptions>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MethodDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub input_type: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub output_type: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub options: Option<MethodOptions>,
    #[prost(bool, optional, tag = "5")]
    pub client_streaming: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub server_streaming: Option<bool>,
}

/// `google.protobuf.FileOptions` with `(graphql.file_service)`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileOptions {
    #[prost(message, optional, tag = "1079")]
    pub graphql_service: Option<GraphqlService>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MessageOptions {
    #[prost(bool, optional, tag = "7")]
    pub map_entry: Option<bool>,
}

/// `google.protobuf.FieldOptions` with `(graphql.field)`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FieldOptions {
    #[prost(message, optional, tag = "1079")]
    pub graphql_field: Option<GraphqlField>,
}

/// `google.protobuf.ServiceOptions` with `(graphql.service)`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceOptions {
    #[prost(message, optional, tag = "1079")]
    pub graphql_service: Option<GraphqlService>,
}

/// `google.protobuf.MethodOptions` with `(graphql.schema)`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MethodOptions {
    #[prost(message, optional, tag = "1079")]
    pub graphql_schema: Option<GraphqlSchema>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SourceCodeInfo {
    #[prost(message, repeated, tag = "1")]
    pub location: Vec<Location>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Location {
    #[prost(int32, repeated, tag = "1")]
    pub path: Vec<i32>,
    #[prost(string, optional, tag = "3")]
    pub leading_comments: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub trailing_comments: Option<String>,
}

impl FileDescriptorProto {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            package: Some(package.into()),
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }
    }

    pub fn with_dependency(mut self, file: impl Into<String>) -> Self {
        self.dependency.push(file.into());
        self
    }

    pub fn with_message(mut self, message: DescriptorProto) -> Self {
        self.message_type.push(message);
        self
    }

    pub fn with_enum(mut self, enum_type: EnumDescriptorProto) -> Self {
        self.enum_type.push(enum_type);
        self
    }

    pub fn with_service(mut self, service: ServiceDescriptorProto) -> Self {
        self.service.push(service);
        self
    }

    /// Attach `(graphql.file_service)` to the file.
    pub fn with_host(mut self, host: impl Into<String>, insecure: bool) -> Self {
        self.options = Some(FileOptions {
            graphql_service: Some(GraphqlService {
                host: host.into(),
                insecure,
            }),
        });
        self
    }

    /// Attach a comment to the declaration at `path`.
    pub fn with_comment(mut self, path: Vec<i32>, comment: impl Into<String>) -> Self {
        self.source_code_info
            .get_or_insert_with(SourceCodeInfo::default)
            .location
            .push(Location {
                path,
                leading_comments: Some(comment.into()),
                trailing_comments: None,
            });
        self
    }
}

impl DescriptorProto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: FieldDescriptorProto) -> Self {
        self.field.push(field);
        self
    }

    pub fn with_nested(mut self, message: DescriptorProto) -> Self {
        self.nested_type.push(message);
        self
    }

    pub fn with_enum(mut self, enum_type: EnumDescriptorProto) -> Self {
        self.enum_type.push(enum_type);
        self
    }

    pub fn with_oneof(mut self, name: impl Into<String>) -> Self {
        self.oneof_decl.push(OneofDescriptorProto {
            name: Some(name.into()),
        });
        self
    }

    pub fn as_map_entry(mut self) -> Self {
        self.options = Some(MessageOptions {
            map_entry: Some(true),
        });
        self
    }
}

impl FieldDescriptorProto {
    pub fn scalar(name: impl Into<String>, number: i32, kind: Type) -> Self {
        Self {
            name: Some(name.into()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(kind as i32),
            ..Default::default()
        }
    }

    /// A message-typed field; `type_name` is used as written.
    pub fn message(name: impl Into<String>, number: i32, type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::scalar(name, number, Type::Message)
        }
    }

    /// An enum-typed field; `type_name` is used as written.
    pub fn enumeration(
        name: impl Into<String>,
        number: i32,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::scalar(name, number, Type::Enum)
        }
    }

    pub fn repeated(mut self) -> Self {
        self.label = Some(Label::Repeated as i32);
        self
    }

    pub fn in_oneof(mut self, index: i32) -> Self {
        self.oneof_index = Some(index);
        self
    }

    /// proto3 `optional`: membership in a synthetic oneof.
    pub fn optional(mut self, synthetic_index: i32) -> Self {
        self.oneof_index = Some(synthetic_index);
        self.proto3_optional = Some(true);
        self
    }

    /// Attach `(graphql.field)` to the field.
    pub fn with_options(mut self, options: GraphqlField) -> Self {
        self.options = Some(FieldOptions {
            graphql_field: Some(options),
        });
        self
    }
}

impl EnumDescriptorProto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.value.push(EnumValueDescriptorProto {
            name: Some(name.into()),
            number: Some(number),
        });
        self
    }
}

impl ServiceDescriptorProto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: MethodDescriptorProto) -> Self {
        self.method.push(method);
        self
    }

    /// Attach `(graphql.service)` to the service.
    pub fn with_host(mut self, host: impl Into<String>, insecure: bool) -> Self {
        self.options = Some(ServiceOptions {
            graphql_service: Some(GraphqlService {
                host: host.into(),
                insecure,
            }),
        });
        self
    }
}

impl MethodDescriptorProto {
    pub fn new(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            input_type: Some(input_type.into()),
            output_type: Some(output_type.into()),
            ..Default::default()
        }
    }

    /// Expose the method as a GraphQL query.
    pub fn as_query(self) -> Self {
        self.with_schema(GraphqlType::Query, "", "")
    }

    /// Expose the method as a GraphQL mutation.
    pub fn as_mutation(self) -> Self {
        self.with_schema(GraphqlType::Mutation, "", "")
    }

    /// Attach `(graphql.schema)` to the method.
    pub fn with_schema(mut self, kind: GraphqlType, name: &str, expose: &str) -> Self {
        self.options = Some(MethodOptions {
            graphql_schema: Some(GraphqlSchema {
                r#type: kind as i32,
                name: name.to_string(),
                expose: expose.to_string(),
            }),
        });
        self
    }

    pub fn as_server_streaming(mut self) -> Self {
        self.server_streaming = Some(true);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_extensions_survive_encoding() {
        let method = MethodDescriptorProto::new("Ping", ".example.Echo", ".example.Echo")
            .with_schema(GraphqlType::Mutation, "doPing", "result");

        let bytes = method.encode_to_vec();
        let decoded = MethodDescriptorProto::decode(bytes.as_slice()).unwrap();

        let schema = decoded.options.unwrap().graphql_schema.unwrap();
        assert_eq!(schema.r#type, GraphqlType::Mutation as i32);
        assert_eq!(schema.name, "doPing");
        assert_eq!(schema.expose, "result");
    }

    #[test]
    fn test_decodes_prost_types_encoding() {
        // Bytes produced by the canonical descriptor types must decode here.
        let canonical = prost_types::FileDescriptorProto {
            name: Some("a.proto".to_string()),
            package: Some("a".to_string()),
            message_type: vec![prost_types::DescriptorProto {
                name: Some("Echo".to_string()),
                field: vec![prost_types::FieldDescriptorProto {
                    name: Some("text".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::String as i32),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let decoded = FileDescriptorProto::decode(canonical.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.name(), "a.proto");
        assert_eq!(decoded.package(), "a");
        assert_eq!(decoded.message_type[0].field[0].r#type(), Type::String);
    }

    #[test]
    fn test_field_helpers() {
        let field = FieldDescriptorProto::message("items", 2, ".a.Item").repeated();
        assert_eq!(field.label(), Label::Repeated);
        assert_eq!(field.r#type(), Type::Message);
        assert_eq!(field.type_name(), ".a.Item");

        let field = FieldDescriptorProto::scalar("name", 1, Type::String).optional(0);
        assert!(field.proto3_optional());
        assert_eq!(field.oneof_index, Some(0));
    }
}
