//! GraphQL SDL backend.

use super::{generated_header, Emitter};
use crate::error::Result;
use crate::options::DefaultValue;
use crate::types::{InputField, ObjectField, Operation, RootPackage};

/// Directive attached to every root field, naming the RPC it calls.
const GRPC_DIRECTIVE: &str =
    "directive @grpc(service: String!, method: String!, expose: String) on FIELD_DEFINITION\n";

/// Field emitted into types that have no fields of their own.
const PLACEHOLDER_FIELD: &str = "  _: Boolean\n";

pub struct SdlEmitter;

impl Emitter for SdlEmitter {
    fn extension(&self) -> &'static str {
        "graphql"
    }

    /// `example/echo.proto` -> `example/echo.graphql`
    fn file_name(&self, root: &RootPackage) -> String {
        let stem = root.file.strip_suffix(".proto").unwrap_or(&root.file);
        format!("{stem}.{}", self.extension())
    }

    fn emit(&self, root: &RootPackage) -> Result<String> {
        let mut buf = String::new();
        buf.push_str(&format!("# {}\n\n", generated_header(root)));
        buf.push_str(GRPC_DIRECTIVE);

        for object in &root.types {
            buf.push('\n');
            push_description(&mut buf, object.comment.as_deref(), "")?;
            buf.push_str(&format!("type {} {{\n", object.name));
            push_object_fields(&mut buf, &object.fields)?;
            buf.push_str("}\n");
        }

        for value in &root.enums {
            buf.push('\n');
            push_description(&mut buf, value.comment.as_deref(), "")?;
            buf.push_str(&format!("enum {} {{\n", value.name));
            for v in &value.values {
                push_description(&mut buf, v.comment.as_deref(), "  ")?;
                buf.push_str(&format!("  {}\n", v.name));
            }
            buf.push_str("}\n");
        }

        for input in &root.inputs {
            buf.push('\n');
            push_description(&mut buf, input.comment.as_deref(), "")?;
            buf.push_str(&format!("input {} {{\n", input.name));
            if input.fields.is_empty() {
                buf.push_str(PLACEHOLDER_FIELD);
            }
            for field in &input.fields {
                push_description(&mut buf, field.comment.as_deref(), "  ")?;
                buf.push_str(&format!("  {}\n", render_input_value(field)?));
            }
            buf.push_str("}\n");
        }

        push_root_type(&mut buf, "Query", &root.queries)?;
        push_root_type(&mut buf, "Mutation", &root.mutations)?;

        Ok(buf)
    }
}

fn push_object_fields(buf: &mut String, fields: &[ObjectField]) -> Result<()> {
    if fields.is_empty() {
        buf.push_str(PLACEHOLDER_FIELD);
    }
    for field in fields {
        push_description(buf, field.comment.as_deref(), "  ")?;
        buf.push_str(&format!("  {}: {}\n", field.name, field.ty));
    }
    Ok(())
}

fn push_root_type(buf: &mut String, name: &str, operations: &[Operation]) -> Result<()> {
    if operations.is_empty() {
        return Ok(());
    }

    buf.push_str(&format!("\ntype {name} {{\n"));
    for op in operations {
        push_description(buf, op.comment.as_deref(), "  ")?;
        buf.push_str(&format!("  {}", op.name));
        push_arguments(buf, &op.args)?;
        buf.push_str(&format!(": {} {}\n", op.return_type, grpc_directive(op)?));
    }
    buf.push_str("}\n");
    Ok(())
}

fn push_arguments(buf: &mut String, args: &[InputField]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    if args.iter().all(|a| a.comment.is_none()) {
        let rendered = args
            .iter()
            .map(render_input_value)
            .collect::<Result<Vec<_>>>()?;
        buf.push_str(&format!("({})", rendered.join(", ")));
        return Ok(());
    }

    buf.push_str("(\n");
    for arg in args {
        push_description(buf, arg.comment.as_deref(), "    ")?;
        buf.push_str(&format!("    {}\n", render_input_value(arg)?));
    }
    buf.push_str("  )");
    Ok(())
}

fn grpc_directive(op: &Operation) -> Result<String> {
    let mut out = format!(
        "@grpc(service: {}, method: {}",
        string_literal(&op.method.service)?,
        string_literal(&op.method.method)?
    );
    if let Some(path) = &op.expose {
        out.push_str(&format!(", expose: {}", string_literal(&path.join("."))?));
    }
    out.push(')');
    Ok(out)
}

/// `name: Type` or `name: Type = default`
fn render_input_value(field: &InputField) -> Result<String> {
    let mut out = format!("{}: {}", field.name, field.ty);
    if let Some(default) = &field.default {
        out.push_str(" = ");
        out.push_str(&render_default(default)?);
    }
    Ok(out)
}

fn render_default(value: &DefaultValue) -> Result<String> {
    Ok(match value {
        DefaultValue::Bool(v) => v.to_string(),
        DefaultValue::Int(v) => v.to_string(),
        DefaultValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.1}"),
        DefaultValue::Float(v) => v.to_string(),
        DefaultValue::String(v) => string_literal(v)?,
        DefaultValue::Enum(v) => v.clone(),
    })
}

/// GraphQL string literal. JSON escapes are a subset of GraphQL's.
fn string_literal(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn push_description(buf: &mut String, comment: Option<&str>, indent: &str) -> Result<()> {
    let Some(comment) = comment else {
        return Ok(());
    };

    if !comment.contains('\n') {
        buf.push_str(&format!("{indent}{}\n", string_literal(comment)?));
        return Ok(());
    }

    buf.push_str(&format!("{indent}\"\"\"\n"));
    for line in comment.replace("\"\"\"", "\\\"\"\"").lines() {
        if line.is_empty() {
            buf.push('\n');
        } else {
            buf.push_str(&format!("{indent}{line}\n"));
        }
    }
    buf.push_str(&format!("{indent}\"\"\"\n"));
    Ok(())
}
