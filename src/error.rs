//! Error types for the protobuf-to-GraphQL compiler

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the generator
///
/// Every variant is terminal for the current invocation: the first error
/// aborts the pipeline and is reported to `protoc` as the single error
/// string of the response. Messages carry the fully-qualified name of the
/// offending entity.
#[derive(Error, Debug)]
pub enum Error {
    /// An extension option does not fit the entity it is attached to
    #[error("malformed option on {entity}: {reason}")]
    MalformedOption { entity: String, reason: String },

    /// A descriptor is structurally incomplete
    #[error("invalid descriptor in {file}: {reason}")]
    InvalidDescriptor { file: String, reason: String },

    /// Two declarations claim the same name
    #[error("duplicate name `{name}`: {detail}")]
    DuplicateName { name: String, detail: String },

    /// A field or method names a type missing from the symbol table
    #[error("unknown type `{type_name}` referenced by {field}")]
    UnknownTypeReference { field: String, type_name: String },

    /// A field kind without a GraphQL resolution rule
    #[error("unsupported field kind for {field}: {kind}")]
    UnsupportedFieldKind { field: String, kind: String },

    /// Generator parameter errors
    #[error("invalid generator parameter: {0}")]
    InvalidParameter(String),

    /// Protobuf decode errors
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Protobuf encode errors
    #[error("encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedOption {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_descriptor(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidDescriptor {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code, logged alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Error::MalformedOption { .. } => "MALFORMED_OPTION",
            Error::InvalidDescriptor { .. } => "INVALID_DESCRIPTOR",
            Error::DuplicateName { .. } => "DUPLICATE_NAME",
            Error::UnknownTypeReference { .. } => "UNKNOWN_TYPE_REFERENCE",
            Error::UnsupportedFieldKind { .. } => "UNSUPPORTED_FIELD_KIND",
            Error::InvalidParameter(_) => "INVALID_PARAMETER",
            Error::Decode(_) => "DECODE_ERROR",
            Error::Encode(_) => "ENCODE_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }
}
