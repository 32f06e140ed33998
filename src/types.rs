//! Schema graph produced by the builder and consumed by the emitters.
//!
//! Everything here is plain data: names are GraphQL names, and references
//! between types go through [`TypeRef`] by name so recursive messages need
//! no back-pointers.

use crate::options::{DefaultValue, OperationKind};
use serde::Serialize;
use std::fmt;

/// Built-in GraphQL scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scalar {
    Int,
    Float,
    Boolean,
    String,
}

impl Scalar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scalar::Int => "Int",
            Scalar::Float => "Float",
            Scalar::Boolean => "Boolean",
            Scalar::String => "String",
        }
    }
}

/// Named reference to an object, input object or enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    /// GraphQL type name
    pub name: String,
    /// Fully-qualified protobuf name
    pub full_name: String,
    pub package: String,
    /// Package alias, set when the type lives outside the root package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Resolved GraphQL type expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Scalar(Scalar),
    Object(TypeRef),
    Input(TypeRef),
    Enum(TypeRef),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeExpr) -> Self {
        TypeExpr::NonNull(Box::new(inner))
    }

    /// The named type under any list/non-null wrappers.
    pub fn named(&self) -> Option<&TypeRef> {
        match self {
            TypeExpr::Scalar(_) => None,
            TypeExpr::Object(r) | TypeExpr::Input(r) | TypeExpr::Enum(r) => Some(r),
            TypeExpr::List(inner) | TypeExpr::NonNull(inner) => inner.named(),
        }
    }

    pub fn is_list(&self) -> bool {
        match self {
            TypeExpr::List(_) => true,
            TypeExpr::NonNull(inner) => inner.is_list(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeExpr {
    /// GraphQL type notation: `String`, `[Echo]`, `Int!`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(s) => f.write_str(s.as_str()),
            TypeExpr::Object(r) | TypeExpr::Input(r) | TypeExpr::Enum(r) => f.write_str(&r.name),
            TypeExpr::List(inner) => write!(f, "[{inner}]"),
            TypeExpr::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Output object projected from a message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectType {
    pub name: String,
    pub full_name: String,
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub fields: Vec<ObjectField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Input object projected from a message (`<Name>Input`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputType {
    pub name: String,
    pub full_name: String,
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub fields: Vec<InputField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumType {
    pub name: String,
    pub full_name: String,
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Query/mutation argument, one per request field
pub type Argument = InputField;

/// The RPC method an operation calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRef {
    pub package: String,
    /// Fully-qualified service name
    pub service: String,
    pub service_name: String,
    pub method: String,
}

impl MethodRef {
    /// `/example.Svc/Ping`
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service, self.method)
    }
}

/// Value stored in a protobuf field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Protobuf scalar type name: `int64`, `string`, `bytes`
    Scalar(String),
    Message {
        reference: TypeRef,
        /// Part of a cycle of singular message fields
        boxed: bool,
    },
    Enum(TypeRef),
    Map {
        key: Box<FieldValue>,
        value: Box<FieldValue>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Always set, absent reads as the zero value
    Singular,
    /// Absence is observable
    Optional,
    Repeated,
}

/// One field walked by an expose path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposeStep {
    pub field: String,
    /// Message declaring the field
    pub owner: TypeRef,
    pub value: FieldValue,
    pub cardinality: Cardinality,
    /// Real oneof group holding the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oneof: Option<String>,
}

/// A query or mutation field bound to one RPC method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub name: String,
    pub kind: OperationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub method: MethodRef,
    pub request: TypeRef,
    pub response: TypeRef,
    pub args: Vec<Argument>,
    pub return_type: TypeExpr,
    /// Response field path returned instead of the whole response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose: Option<Vec<String>>,
    /// The fields `expose` walks, in path order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expose_steps: Vec<ExposeStep>,
}

/// A root-file service that owns at least one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceBinding {
    pub full_name: String,
    pub name: String,
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub insecure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A package referenced from generated code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageImport {
    pub package: String,
    pub alias: String,
}

/// One generation unit: the graph for one requested file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootPackage {
    pub file: String,
    pub package: String,
    pub alias: String,
    pub services: Vec<ServiceBinding>,
    pub types: Vec<ObjectType>,
    pub enums: Vec<EnumType>,
    pub inputs: Vec<InputType>,
    pub queries: Vec<Operation>,
    pub mutations: Vec<Operation>,
    /// Other packages referenced by this root, in first-use order
    pub imports: Vec<PackageImport>,
}

impl RootPackage {
    /// Queries followed by mutations.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.queries.iter().chain(self.mutations.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty() && self.mutations.is_empty()
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn input(&self, name: &str) -> Option<&InputType> {
        self.inputs.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_ref() -> TypeRef {
        TypeRef {
            name: "Echo".to_string(),
            full_name: "example.Echo".to_string(),
            package: "example".to_string(),
            alias: None,
        }
    }

    #[test]
    fn test_type_expr_display() {
        assert_eq!(TypeExpr::Scalar(Scalar::String).to_string(), "String");
        assert_eq!(TypeExpr::Object(echo_ref()).to_string(), "Echo");
        assert_eq!(
            TypeExpr::list(TypeExpr::Scalar(Scalar::Int)).to_string(),
            "[Int]"
        );
        assert_eq!(
            TypeExpr::non_null(TypeExpr::list(TypeExpr::Object(echo_ref()))).to_string(),
            "[Echo]!"
        );
    }

    #[test]
    fn test_type_expr_named() {
        let expr = TypeExpr::non_null(TypeExpr::list(TypeExpr::Enum(echo_ref())));
        assert_eq!(expr.named().map(|r| r.name.as_str()), Some("Echo"));
        assert!(expr.is_list());
        assert_eq!(TypeExpr::Scalar(Scalar::Float).named(), None);
        assert!(!TypeExpr::Scalar(Scalar::Float).is_list());
    }

    #[test]
    fn test_method_path() {
        let method = MethodRef {
            package: "example".to_string(),
            service: "example.Svc".to_string(),
            service_name: "Svc".to_string(),
            method: "Ping".to_string(),
        };
        assert_eq!(method.path(), "/example.Svc/Ping");
    }

    #[test]
    fn test_type_expr_serialization() {
        let expr = TypeExpr::list(TypeExpr::Object(echo_ref()));
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            value,
            json!({
                "list": {
                    "object": {
                        "name": "Echo",
                        "full_name": "example.Echo",
                        "package": "example"
                    }
                }
            })
        );
    }

    #[test]
    fn test_field_value_serialization() {
        let value = FieldValue::Map {
            key: Box::new(FieldValue::Scalar("string".to_string())),
            value: Box::new(FieldValue::Message {
                reference: echo_ref(),
                boxed: false,
            }),
        };
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({
                "map": {
                    "key": { "scalar": "string" },
                    "value": {
                        "message": {
                            "reference": {
                                "name": "Echo",
                                "full_name": "example.Echo",
                                "package": "example"
                            },
                            "boxed": false
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_input_field_serialization_skips_empty() {
        let field = InputField {
            name: "count".to_string(),
            ty: TypeExpr::Scalar(Scalar::Int),
            default: Some(DefaultValue::Int(3)),
            comment: None,
        };
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "count",
                "type": { "scalar": "Int" },
                "default": { "int": 3 }
            })
        );
    }
}
