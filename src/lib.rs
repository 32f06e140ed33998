//! # protoc-gen-graphql
//!
//! A `protoc` plugin that compiles protobuf services into a GraphQL schema
//! graph and emits bindings wiring every GraphQL query/mutation field to
//! the gRPC method it calls.
//!
//! ## Features
//!
//! - **Extension options**: `(graphql.service)`, `(graphql.schema)` and
//!   `(graphql.field)` from `proto/graphql.proto` control exposure
//! - **Cross-file resolution**: one symbol table over every imported file,
//!   protobuf scoping rules for relative names
//! - **Input/output projection**: messages become object types or
//!   `<Name>Input` input objects depending on where they are used
//! - **Expose paths**: return a nested response field instead of the whole
//!   response
//! - **Backends**: GraphQL SDL, Rust binding tables, JSON graph dump
//!
//! ## Main Components
//!
//! - [`load_file`]: wraps a raw file descriptor
//! - [`SymbolTable`]: every message and enum by fully-qualified name
//! - [`Resolver`]: field kind + [`TypeContext`] to GraphQL type expression
//! - [`SchemaBuilder`]: builds the [`RootPackage`] of one requested file
//! - [`Emitter`]: renders a [`RootPackage`]
//! - [`Generator`]: the whole plugin pipeline
//!
//! ## Example
//!
//! ```rust,no_run
//! use protoc_gen_graphql::descriptor::CodeGeneratorRequest;
//! use protoc_gen_graphql::{GeneratorConfig, Generator, OneofPolicy, Target};
//!
//! # fn example(request: CodeGeneratorRequest) -> protoc_gen_graphql::Result<()> {
//! let config = GeneratorConfig::builder()
//!     .target(Target::Sdl)
//!     .oneof(OneofPolicy::Flatten)
//!     .build();
//!
//! for file in Generator::new(config).generate(&request)? {
//!     println!("{}", file.name());
//! }
//! # Ok(())
//! # }
//! ```

/// Generated types for graphql.proto options.
#[allow(clippy::all)]
pub mod graphql {
    include!("generated/graphql.rs");
}

pub mod config;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod generator;
pub mod loader;
pub mod naming;
pub mod options;
pub mod resolver;
pub mod schema;
pub mod symbols;
pub mod types;

pub use config::{GeneratorConfig, GeneratorConfigBuilder};
pub use emit::{Emitter, JsonEmitter, RustEmitter, SdlEmitter, Target};
pub use error::{Error, Result};
pub use generator::{respond_to_bytes, Generator};
pub use loader::{load_file, File};
pub use options::{DefaultValue, FieldOptions, OperationDirective, OperationKind, ServiceOptions};
pub use resolver::{Imports, Resolver, TypeContext};
pub use schema::{OneofPolicy, SchemaBuilder};
pub use symbols::{Package, Symbol, SymbolTable};
pub use types::{
    Cardinality, EnumType, ExposeStep, FieldValue, InputType, ObjectType, Operation,
    PackageImport, RootPackage, Scalar, ServiceBinding, TypeExpr, TypeRef,
};
