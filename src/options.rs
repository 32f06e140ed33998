//! Typed decoding of the `graphql.*` extension options.
//!
//! Each scope (file/service, method, field) has one decode function that
//! turns the raw extension message into a validated record. Shape
//! mismatches fail with [`Error::MalformedOption`] instead of being
//! defaulted away.

use crate::error::{Error, Result};
use crate::graphql::{GraphqlField, GraphqlSchema, GraphqlService, GraphqlType};
use crate::naming::is_identifier;
use prost_types::field_descriptor_proto::Type;
use serde::Serialize;

/// `(graphql.service)` / `(graphql.file_service)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOptions {
    pub host: Option<String>,
    pub insecure: bool,
}

/// GraphQL root type a method is exposed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

/// `(graphql.schema)` on a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDirective {
    pub kind: OperationKind,
    /// Overrides the field name derived from the method name.
    pub name: Option<String>,
    /// Response field path returned instead of the whole response.
    pub expose: Option<Vec<String>>,
}

/// Default literal, already checked against the field's protobuf kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Enum value name; its existence is checked by the schema builder.
    Enum(String),
}

/// `(graphql.field)` on a message field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldOptions {
    pub comment: Option<String>,
    pub default: Option<DefaultValue>,
    /// Wrap the resolved type in a non-null marker.
    pub required: bool,
}

/// Decode service-level options (file or service scope).
pub fn decode_service_options(
    entity: &str,
    raw: Option<&GraphqlService>,
) -> Result<Option<ServiceOptions>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let host = raw.host.trim();
    if host.chars().any(char::is_whitespace) {
        return Err(Error::malformed(
            entity,
            format!("host `{}` contains whitespace", raw.host),
        ));
    }

    Ok(Some(ServiceOptions {
        host: (!host.is_empty()).then(|| host.to_string()),
        insecure: raw.insecure,
    }))
}

/// Decode the query/mutation directive of a method.
pub fn decode_method_options(
    entity: &str,
    raw: Option<&GraphqlSchema>,
) -> Result<Option<OperationDirective>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let kind = match GraphqlType::try_from(raw.r#type) {
        Ok(GraphqlType::Query) => OperationKind::Query,
        Ok(GraphqlType::Mutation) => OperationKind::Mutation,
        Err(_) => {
            return Err(Error::malformed(
                entity,
                format!("unknown graphql type {}", raw.r#type),
            ))
        }
    };

    let name = match raw.name.trim() {
        "" => None,
        name if is_identifier(name) => Some(name.to_string()),
        name => {
            return Err(Error::malformed(
                entity,
                format!("`{name}` is not a valid GraphQL field name"),
            ))
        }
    };

    let expose = match raw.expose.trim() {
        "" => None,
        path => {
            let segments: Vec<String> = path.split('.').map(str::to_string).collect();
            if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
                return Err(Error::malformed(
                    entity,
                    format!("expose path `{path}` has invalid segment `{bad}`"),
                ));
            }
            Some(segments)
        }
    };

    Ok(Some(OperationDirective { kind, name, expose }))
}

/// Decode field options, parsing the default literal against `kind`.
pub fn decode_field_options(
    entity: &str,
    kind: Type,
    repeated: bool,
    raw: Option<&GraphqlField>,
) -> Result<FieldOptions> {
    let Some(raw) = raw else {
        return Ok(FieldOptions::default());
    };

    let default = match raw.default_value.as_deref() {
        None => None,
        Some(_) if repeated => {
            return Err(Error::malformed(
                entity,
                "default values are not supported on repeated fields",
            ))
        }
        Some(literal) => Some(parse_default(entity, kind, literal)?),
    };

    let comment = raw.comment.trim();
    Ok(FieldOptions {
        comment: (!comment.is_empty()).then(|| comment.to_string()),
        default,
        required: raw.required,
    })
}

fn parse_default(entity: &str, kind: Type, literal: &str) -> Result<DefaultValue> {
    let mismatch = |expected: &str| {
        Error::malformed(
            entity,
            format!("default `{literal}` is not a valid {expected}"),
        )
    };

    let value = match kind {
        Type::Bool => match literal {
            "true" => DefaultValue::Bool(true),
            "false" => DefaultValue::Bool(false),
            _ => return Err(mismatch("bool")),
        },
        Type::Int32 | Type::Sint32 | Type::Sfixed32 => literal
            .parse::<i32>()
            .map(|v| DefaultValue::Int(v.into()))
            .map_err(|_| mismatch("int32"))?,
        Type::Uint32 | Type::Fixed32 => literal
            .parse::<u32>()
            .map(|v| DefaultValue::Int(v.into()))
            .map_err(|_| mismatch("uint32"))?,
        Type::Int64 | Type::Sint64 | Type::Sfixed64 => literal
            .parse::<i64>()
            .map(DefaultValue::Int)
            .map_err(|_| mismatch("int64"))?,
        Type::Uint64 | Type::Fixed64 => literal
            .parse::<u64>()
            .ok()
            .and_then(|v| i64::try_from(v).ok())
            .map(DefaultValue::Int)
            .ok_or_else(|| mismatch("uint64 within the signed 64-bit range"))?,
        Type::Float | Type::Double => match literal.parse::<f64>() {
            Ok(v) if v.is_finite() => DefaultValue::Float(v),
            _ => return Err(mismatch("finite float")),
        },
        Type::String | Type::Bytes => DefaultValue::String(literal.to_string()),
        Type::Enum if is_identifier(literal) => DefaultValue::Enum(literal.to_string()),
        Type::Enum => return Err(mismatch("enum value name")),
        Type::Message | Type::Group => {
            return Err(Error::malformed(
                entity,
                "default values are not supported on message fields",
            ))
        }
    };

    Ok(value)
}
