//! Rust binding backend.
//!
//! The output is a module body meant to sit next to the `prost`/`tonic`
//! generated code: it `include!`s one module per referenced package,
//! embeds the SDL, lists every operation with the RPC it calls, and gives
//! each operation a module of typed glue:
//!
//! ```text
//! pub mod query {
//!     pub mod user {
//!         pub type Request = super::super::users::GetUserRequest;
//!         pub type Response = super::super::users::GetUserResponse;
//!         pub type Output = super::super::users::User;
//!         pub fn output(response: Response) -> Option<Output> { .. }
//!         pub async fn call(channel, request) -> Result<Option<Output>, Status> { .. }
//!     }
//! }
//! ```
//!
//! `google.protobuf` types resolve to `prost_types` (and the wrapper types
//! to Rust primitives) the way `prost-build` maps them, so that package is
//! never included.

use super::{generated_header, Emitter, SdlEmitter};
use crate::error::{Error, Result};
use crate::naming::{to_pascal_case, to_snake_case};
use crate::types::{Cardinality, ExposeStep, FieldValue, Operation, RootPackage, TypeRef};
use std::collections::HashSet;

/// Endpoint used for services without a `host` option.
const DEFAULT_ENDPOINT: &str = "localhost:50051";

const WELL_KNOWN_PACKAGE: &str = "google.protobuf";

/// Path from an operation module back to the file root.
const OPERATION_PREFIX: &str = "super::super::";

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn extension(&self) -> &'static str {
        "rs"
    }

    fn emit(&self, root: &RootPackage) -> Result<String> {
        let sdl = SdlEmitter.emit(root)?;

        let mut buf = String::new();
        buf.push_str(&format!("// {}\n\n", generated_header(root)));

        push_package_module(&mut buf, &root.alias, &root.package);
        for import in &root.imports {
            push_package_module(&mut buf, &import.alias, &import.package);
        }

        buf.push_str("/// GraphQL schema for this file.\n");
        buf.push_str(&format!(
            "pub const SCHEMA_SDL: &str = {};\n\n",
            render_str_literal(&sdl)
        ));

        buf.push_str("pub struct ServiceConfig {\n");
        buf.push_str("    pub name: &'static str,\n");
        buf.push_str("    pub endpoint: &'static str,\n");
        buf.push_str("    pub insecure: bool,\n");
        buf.push_str("}\n\n");

        buf.push_str("pub struct OperationBinding {\n");
        buf.push_str("    /// GraphQL root field\n");
        buf.push_str("    pub field: &'static str,\n");
        buf.push_str("    pub service: &'static str,\n");
        buf.push_str("    pub method: &'static str,\n");
        buf.push_str("    /// gRPC path, `/package.Service/Method`\n");
        buf.push_str("    pub path: &'static str,\n");
        buf.push_str("    pub request_type: &'static str,\n");
        buf.push_str("    pub response_type: &'static str,\n");
        buf.push_str("    pub expose: &'static [&'static str],\n");
        buf.push_str("}\n\n");

        push_services(&mut buf, root);

        push_bindings(&mut buf, "QUERIES", root, &root.queries);
        push_bindings(&mut buf, "MUTATIONS", root, &root.mutations);

        push_operation_modules(&mut buf, "query", "QUERIES", root, &root.queries)?;
        push_operation_modules(&mut buf, "mutation", "MUTATIONS", root, &root.mutations)?;

        Ok(buf)
    }
}

fn push_package_module(buf: &mut String, alias: &str, package: &str) {
    if package == WELL_KNOWN_PACKAGE {
        return;
    }
    // prost-build names the file for the empty package `_.rs`.
    let file = if package.is_empty() { "_" } else { package };
    buf.push_str(&format!("pub mod {alias} {{\n"));
    buf.push_str(&format!("    include!(\"{file}.rs\");\n"));
    buf.push_str("}\n\n");
}

fn push_services(buf: &mut String, root: &RootPackage) {
    buf.push_str("pub mod services {\n");
    buf.push_str("    use super::ServiceConfig;\n\n");
    let mut service_consts = Vec::new();
    for service in &root.services {
        let const_name = service_const(&service.full_name);
        let endpoint = normalize_endpoint(
            service.host.as_deref().unwrap_or(DEFAULT_ENDPOINT),
            service.insecure,
        );
        buf.push_str(&format!(
            "    pub const {const_name}: ServiceConfig = ServiceConfig {{\n"
        ));
        buf.push_str(&format!(
            "        name: {},\n",
            render_str_literal(&service.full_name)
        ));
        buf.push_str(&format!(
            "        endpoint: {},\n",
            render_str_literal(&endpoint)
        ));
        buf.push_str(&format!("        insecure: {},\n", service.insecure));
        buf.push_str("    };\n");
        service_consts.push(const_name);
    }
    if !service_consts.is_empty() {
        buf.push('\n');
    }
    buf.push_str("    pub const ALL: &[ServiceConfig] = &[\n");
    for name in service_consts {
        buf.push_str(&format!("        {name},\n"));
    }
    buf.push_str("    ];\n\n");

    buf.push_str("    /// Open a channel to the service, over TLS unless it is insecure.\n");
    buf.push_str("    pub async fn connect(\n");
    buf.push_str("        config: &ServiceConfig,\n");
    buf.push_str(
        "    ) -> Result<::tonic::transport::Channel, ::tonic::transport::Error> {\n",
    );
    buf.push_str(
        "        let endpoint = ::tonic::transport::Endpoint::from_static(config.endpoint);\n",
    );
    buf.push_str("        if config.insecure {\n");
    buf.push_str("            return endpoint.connect().await;\n");
    buf.push_str("        }\n");
    buf.push_str("        endpoint\n");
    buf.push_str("            .tls_config(::tonic::transport::ClientTlsConfig::new())?\n");
    buf.push_str("            .connect()\n");
    buf.push_str("            .await\n");
    buf.push_str("    }\n");
    buf.push_str("}\n\n");
}

fn push_bindings(buf: &mut String, name: &str, root: &RootPackage, operations: &[Operation]) {
    if operations.is_empty() {
        buf.push_str(&format!("pub const {name}: &[OperationBinding] = &[];\n"));
        return;
    }

    buf.push_str(&format!("pub const {name}: &[OperationBinding] = &[\n"));
    for op in operations {
        buf.push_str("    OperationBinding {\n");
        buf.push_str(&format!("        field: {},\n", render_str_literal(&op.name)));
        buf.push_str(&format!(
            "        service: {},\n",
            render_str_literal(&op.method.service)
        ));
        buf.push_str(&format!(
            "        method: {},\n",
            render_str_literal(&op.method.method)
        ));
        buf.push_str(&format!(
            "        path: {},\n",
            render_str_literal(&op.method.path())
        ));
        buf.push_str(&format!(
            "        request_type: {},\n",
            render_str_literal(&rust_type_path(root, &op.request, ""))
        ));
        buf.push_str(&format!(
            "        response_type: {},\n",
            render_str_literal(&rust_type_path(root, &op.response, ""))
        ));
        buf.push_str(&format!(
            "        expose: {},\n",
            render_str_slice(op.expose.as_deref().unwrap_or_default())
        ));
        buf.push_str("    },\n");
    }
    buf.push_str("];\n");
}

/// `pub mod query { pub mod <field> { .. } }`, one module per operation.
fn push_operation_modules(
    buf: &mut String,
    module: &str,
    table: &str,
    root: &RootPackage,
    operations: &[Operation],
) -> Result<()> {
    if operations.is_empty() {
        return Ok(());
    }

    buf.push_str(&format!("\npub mod {module} {{\n"));
    let mut taken = HashSet::new();
    for (index, op) in operations.iter().enumerate() {
        let mut name = to_snake_case(&op.name);
        let mut n = 2;
        while !taken.insert(name.clone()) {
            name = format!("{}_{n}", to_snake_case(&op.name));
            n += 1;
        }

        if index > 0 {
            buf.push('\n');
        }
        buf.push_str(&format!("    /// `{}`: `{}`\n", op.name, op.method.path()));
        buf.push_str(&format!("    pub mod {} {{\n", rust_ident(&name)));
        push_operation(buf, table, index, root, op)?;
        buf.push_str("    }\n");
    }
    buf.push_str("}\n");
    Ok(())
}

fn push_operation(
    buf: &mut String,
    table: &str,
    index: usize,
    root: &RootPackage,
    op: &Operation,
) -> Result<()> {
    let p = OPERATION_PREFIX;
    let (output_type, body) = match op.expose_steps.last() {
        Some(last) => (
            output_type(root, last, &op.name)?,
            expose_expr(root, &op.expose_steps),
        ),
        None => ("Response".to_string(), "Some(response)".to_string()),
    };

    buf.push_str(&format!(
        "        pub type Request = {};\n",
        rust_type_path(root, &op.request, p)
    ));
    buf.push_str(&format!(
        "        pub type Response = {};\n",
        rust_type_path(root, &op.response, p)
    ));
    buf.push_str(&format!("        pub type Output = {output_type};\n\n"));

    buf.push_str(&format!(
        "        pub const BINDING: &{p}OperationBinding = &{p}{table}[{index}];\n"
    ));
    buf.push_str(&format!(
        "        pub const SERVICE: &{p}ServiceConfig = &{p}services::{};\n\n",
        service_const(&op.method.service)
    ));

    buf.push_str("        /// The part of the response returned to GraphQL.\n");
    if op.expose_steps.iter().any(|s| s.oneof.is_some()) {
        buf.push_str("        #[allow(unreachable_patterns)]\n");
    }
    buf.push_str("        pub fn output(response: Response) -> Option<Output> {\n");
    buf.push_str(&format!("            {body}\n"));
    buf.push_str("        }\n\n");

    let client = format!(
        "{p}{}::{}_client::{}Client",
        root.alias,
        to_snake_case(&op.method.service_name),
        op.method.service_name
    );
    buf.push_str("        pub async fn call(\n");
    buf.push_str("            channel: ::tonic::transport::Channel,\n");
    buf.push_str("            request: Request,\n");
    buf.push_str("        ) -> Result<Option<Output>, ::tonic::Status> {\n");
    buf.push_str(&format!("            let mut client = {client}::new(channel);\n"));
    buf.push_str(&format!(
        "            let response = client.{}(request).await?.into_inner();\n",
        rust_ident(&to_snake_case(&op.method.method))
    ));
    buf.push_str("            Ok(output(response))\n");
    buf.push_str("        }\n");
    Ok(())
}

/// Rust type of the last expose step, without the outer `Option`.
fn output_type(root: &RootPackage, last: &ExposeStep, operation: &str) -> Result<String> {
    let value = value_type(root, &last.value, operation)?;
    Ok(match (&last.value, last.cardinality) {
        (FieldValue::Map { .. }, _) => value,
        (_, Cardinality::Repeated) if last.oneof.is_none() => {
            format!("::prost::alloc::vec::Vec<{value}>")
        }
        _ => value,
    })
}

fn value_type(root: &RootPackage, value: &FieldValue, operation: &str) -> Result<String> {
    Ok(match value {
        FieldValue::Scalar(name) => scalar_type(name)
            .ok_or_else(|| Error::UnsupportedFieldKind {
                field: operation.to_string(),
                kind: format!("scalar `{name}`"),
            })?
            .to_string(),
        FieldValue::Message { reference, .. } => rust_type_path(root, reference, OPERATION_PREFIX),
        FieldValue::Enum(_) => "i32".to_string(),
        FieldValue::Map { key, value } => format!(
            "::std::collections::HashMap<{}, {}>",
            value_type(root, key, operation)?,
            value_type(root, value, operation)?
        ),
    })
}

fn scalar_type(name: &str) -> Option<&'static str> {
    Some(match name {
        "double" => "f64",
        "float" => "f32",
        "int32" | "sint32" | "sfixed32" => "i32",
        "int64" | "sint64" | "sfixed64" => "i64",
        "uint32" | "fixed32" => "u32",
        "uint64" | "fixed64" => "u64",
        "bool" => "bool",
        "string" => "::prost::alloc::string::String",
        "bytes" => "::prost::alloc::vec::Vec<u8>",
        _ => return None,
    })
}

/// Body of `output`: walk the steps, `?` on every optional hop.
fn expose_expr(root: &RootPackage, steps: &[ExposeStep]) -> String {
    let mut expr = "response".to_string();
    for (i, step) in steps.iter().enumerate() {
        let last = i + 1 == steps.len();
        let boxed = matches!(step.value, FieldValue::Message { boxed: true, .. });

        if let Some(group) = &step.oneof {
            let variant = format!(
                "{}::{}",
                oneof_path(root, &step.owner, group),
                to_pascal_case(&step.field)
            );
            let scrutinee = format!("{expr}.{}?", rust_ident(&to_snake_case(group)));
            if last {
                let value = if boxed { "*v" } else { "v" };
                return format!("match {scrutinee} {{ {variant}(v) => Some({value}), _ => None }}");
            }
            expr = format!("(match {scrutinee} {{ {variant}(v) => v, _ => return None }})");
            continue;
        }

        let field = rust_ident(&to_snake_case(&step.field));
        if !last {
            expr = format!("{expr}.{field}?");
            continue;
        }
        return match (step.cardinality, boxed) {
            (Cardinality::Optional, true) => format!("{expr}.{field}.map(|v| *v)"),
            (Cardinality::Optional, false) => format!("{expr}.{field}"),
            _ => format!("Some({expr}.{field})"),
        };
    }
    format!("Some({expr})")
}

/// prost puts the oneof enum in a module named after its message.
fn oneof_path(root: &RootPackage, owner: &TypeRef, group: &str) -> String {
    let message = rust_type_path(root, owner, OPERATION_PREFIX);
    let (parent, name) = message.rsplit_once("::").unwrap_or(("", &message));
    let module = to_snake_case(name);
    let enum_name = to_pascal_case(group);
    if parent.is_empty() {
        format!("{module}::{enum_name}")
    } else {
        format!("{parent}::{module}::{enum_name}")
    }
}

/// Path of the prost-generated type: `alias::outer::Inner`, or its
/// `prost_types` counterpart for well-known types.
fn rust_type_path(root: &RootPackage, reference: &TypeRef, prefix: &str) -> String {
    if reference.package == WELL_KNOWN_PACKAGE {
        return well_known_type(reference);
    }

    let alias = reference.alias.as_deref().unwrap_or(&root.alias);
    format!("{prefix}{alias}::{}", nested_path(reference))
}

fn well_known_type(reference: &TypeRef) -> String {
    let primitive = match nested_path(reference).as_str() {
        "Empty" => "()",
        "BoolValue" => "bool",
        "BytesValue" => "::prost::alloc::vec::Vec<u8>",
        "DoubleValue" => "f64",
        "FloatValue" => "f32",
        "Int32Value" => "i32",
        "Int64Value" => "i64",
        "StringValue" => "::prost::alloc::string::String",
        "UInt32Value" => "u32",
        "UInt64Value" => "u64",
        other => return format!("::prost_types::{other}"),
    };
    primitive.to_string()
}

/// `Outer.Inner` below the package -> `outer::Inner`
fn nested_path(reference: &TypeRef) -> String {
    let relative = if reference.package.is_empty() {
        reference.full_name.as_str()
    } else {
        reference
            .full_name
            .strip_prefix(&reference.package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&reference.full_name)
    };

    let parts: Vec<&str> = relative.split('.').collect();
    let mut path = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            path.push_str("::");
        }
        if i < parts.len() - 1 {
            path.push_str(&to_snake_case(part));
        } else {
            path.push_str(part);
        }
    }
    path
}

fn service_const(full_name: &str) -> String {
    full_name.replace('.', "_").to_uppercase()
}

/// Escape identifiers that collide with Rust keywords, as prost does.
fn rust_ident(name: &str) -> String {
    match name {
        "self" | "super" | "crate" | "Self" => format!("{name}_"),
        _ if RUST_KEYWORDS.contains(&name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}

fn normalize_endpoint(endpoint: &str, insecure: bool) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else if insecure {
        format!("http://{endpoint}")
    } else {
        format!("https://{endpoint}")
    }
}

fn render_str_literal(input: &str) -> String {
    format!("\"{}\"", input.escape_default())
}

fn render_str_slice(values: &[String]) -> String {
    if values.is_empty() {
        "&[]".to_string()
    } else {
        let joined = values
            .iter()
            .map(|v| render_str_literal(v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("&[{joined}]")
    }
}
