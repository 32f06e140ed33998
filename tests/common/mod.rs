//! Descriptor fixtures shared by the integration tests.
#![allow(dead_code)]

use protoc_gen_graphql::descriptor::{
    CodeGeneratorRequest, DescriptorProto, EnumDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MethodDescriptorProto, ServiceDescriptorProto,
};
use protoc_gen_graphql::graphql::{GraphqlField, GraphqlType};
use prost_types::field_descriptor_proto::Type;

pub fn request(
    files: Vec<FileDescriptorProto>,
    generate: &[&str],
    parameter: Option<&str>,
) -> CodeGeneratorRequest {
    CodeGeneratorRequest {
        file_to_generate: generate.iter().map(|f| f.to_string()).collect(),
        parameter: parameter.map(str::to_string),
        proto_file: files,
    }
}

/// `message Echo { string text = 1; }` and `service Svc { rpc Ping(Echo) returns (Echo); }`
pub fn echo_file() -> FileDescriptorProto {
    FileDescriptorProto::new("example/echo.proto", "example")
        .with_message(
            DescriptorProto::new("Echo")
                .with_field(FieldDescriptorProto::scalar("text", 1, Type::String)),
        )
        .with_service(
            ServiceDescriptorProto::new("Svc")
                .with_method(
                    MethodDescriptorProto::new("Ping", ".example.Echo", ".example.Echo").as_query(),
                )
                .with_host("echo:50051", true),
        )
        .with_comment(vec![6, 0, 2, 0], " Echo the text back.\n")
}

pub fn common_file() -> FileDescriptorProto {
    FileDescriptorProto::new("common/types.proto", "common.v1")
        .with_message(
            DescriptorProto::new("Money")
                .with_field(FieldDescriptorProto::scalar("units", 1, Type::Int64))
                .with_field(FieldDescriptorProto::enumeration(
                    "currency",
                    2,
                    ".common.v1.Currency",
                )),
        )
        .with_enum(
            EnumDescriptorProto::new("Currency")
                .with_value("EUR", 0)
                .with_value("USD", 1),
        )
        .with_comment(vec![5, 0], " ISO currency.\n")
}

/// A users service referencing `common.v1` and using expose, defaults and
/// required fields.
pub fn users_file() -> FileDescriptorProto {
    let required = GraphqlField {
        required: true,
        ..Default::default()
    };

    FileDescriptorProto::new("users/users.proto", "users")
        .with_dependency("common/types.proto")
        .with_message(
            DescriptorProto::new("User")
                .with_field(
                    FieldDescriptorProto::scalar("id", 1, Type::Int64)
                        .with_options(required.clone()),
                )
                .with_field(FieldDescriptorProto::scalar("name", 2, Type::String))
                .with_field(FieldDescriptorProto::scalar("tags", 3, Type::String).repeated())
                .with_field(FieldDescriptorProto::message("balance", 4, ".common.v1.Money"))
                .with_field(FieldDescriptorProto::message("status", 5, "User.Status"))
                .with_nested(
                    DescriptorProto::new("Status")
                        .with_field(FieldDescriptorProto::scalar("active", 1, Type::Bool)),
                ),
        )
        .with_message(
            DescriptorProto::new("GetUserRequest")
                .with_field(
                    FieldDescriptorProto::scalar("id", 1, Type::Int64).with_options(required),
                )
                .with_field(
                    FieldDescriptorProto::enumeration("currency", 2, ".common.v1.Currency")
                        .with_options(GraphqlField {
                            comment: "Currency to report the balance in".to_string(),
                            default_value: Some("USD".to_string()),
                            required: false,
                        }),
                ),
        )
        .with_message(
            DescriptorProto::new("GetUserResponse")
                .with_field(FieldDescriptorProto::message("user", 1, ".users.User")),
        )
        .with_message(
            DescriptorProto::new("CreateUserRequest")
                .with_field(FieldDescriptorProto::message("user", 1, ".users.User"))
                .with_field(FieldDescriptorProto::scalar("dry_run", 2, Type::Bool).with_options(
                    GraphqlField {
                        default_value: Some("false".to_string()),
                        ..Default::default()
                    },
                )),
        )
        .with_service(
            ServiceDescriptorProto::new("Users")
                .with_method(
                    MethodDescriptorProto::new(
                        "GetUser",
                        ".users.GetUserRequest",
                        ".users.GetUserResponse",
                    )
                    .with_schema(GraphqlType::Query, "user", "user"),
                )
                .with_method(
                    MethodDescriptorProto::new(
                        "CreateUser",
                        ".users.CreateUserRequest",
                        ".users.GetUserResponse",
                    )
                    .as_mutation(),
                )
                .with_method(MethodDescriptorProto::new(
                    "Internal",
                    ".users.GetUserRequest",
                    ".users.GetUserResponse",
                )),
        )
}
