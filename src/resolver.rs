//! Field type resolution.
//!
//! One function maps a field's protobuf kind to a GraphQL type expression
//! for a given [`TypeContext`]. The mapping depends only on the kind, the
//! repetition, the `required` option and the context; referenced types are
//! looked up in the [`SymbolTable`].

use crate::error::{Error, Result};
use crate::loader::{Field, FieldKind, Message};
use crate::symbols::{Symbol, SymbolTable};
use crate::types::{PackageImport, Scalar, TypeExpr, TypeRef};
use prost_types::field_descriptor_proto::Type;
use serde::Serialize;
use std::collections::HashSet;

/// Where a resolved type is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeContext {
    /// Object field or operation return type
    Output,
    /// Input object field
    Input,
    /// Query/mutation argument
    Argument,
}

/// Packages one root refers to outside its own package.
#[derive(Debug, Clone)]
pub struct Imports {
    root: String,
    seen: HashSet<String>,
    list: Vec<PackageImport>,
}

impl Imports {
    pub fn new(root_package: impl Into<String>) -> Self {
        Self {
            root: root_package.into(),
            seen: HashSet::new(),
            list: Vec::new(),
        }
    }

    /// Record `package` under `alias`. Returns whether it was new; the root
    /// package itself is never recorded.
    pub fn register(&mut self, package: &str, alias: &str) -> bool {
        if package == self.root || !self.seen.insert(package.to_string()) {
            return false;
        }
        self.list.push(PackageImport {
            package: package.to_string(),
            alias: alias.to_string(),
        });
        true
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn as_slice(&self) -> &[PackageImport] {
        &self.list
    }

    pub fn into_vec(self) -> Vec<PackageImport> {
        self.list
    }
}

/// GraphQL scalar for a protobuf scalar kind
pub fn scalar_for(kind: Type) -> Option<Scalar> {
    match kind {
        Type::Double | Type::Float => Some(Scalar::Float),
        Type::Int32
        | Type::Int64
        | Type::Uint32
        | Type::Uint64
        | Type::Sint32
        | Type::Sint64
        | Type::Fixed32
        | Type::Fixed64
        | Type::Sfixed32
        | Type::Sfixed64 => Some(Scalar::Int),
        Type::Bool => Some(Scalar::Boolean),
        Type::String | Type::Bytes => Some(Scalar::String),
        Type::Message | Type::Enum | Type::Group => None,
    }
}

pub struct Resolver<'s, 'a> {
    symbols: &'s SymbolTable<'a>,
}

impl<'s, 'a> Resolver<'s, 'a> {
    pub fn new(symbols: &'s SymbolTable<'a>) -> Self {
        Self { symbols }
    }

    /// Resolve `field` of `owner` in `context`.
    pub fn resolve(
        &self,
        owner: &Message,
        field: &Field,
        context: TypeContext,
        imports: &mut Imports,
    ) -> Result<TypeExpr> {
        let entity = format!("{}.{}", owner.full_name, field.name);

        let base = match (&field.kind, context) {
            (FieldKind::Scalar(kind), _) => {
                TypeExpr::Scalar(scalar_for(*kind).ok_or_else(|| Error::UnsupportedFieldKind {
                    field: entity.clone(),
                    kind: format!("{kind:?}"),
                })?)
            }
            (FieldKind::Group(_), _) => {
                return Err(Error::UnsupportedFieldKind {
                    field: entity,
                    kind: "group".to_string(),
                })
            }
            (FieldKind::Message(name), TypeContext::Output) => {
                let (_, r) = self.message(&owner.full_name, name, &entity, imports)?;
                TypeExpr::Object(r)
            }
            (FieldKind::Message(name), TypeContext::Input | TypeContext::Argument) => {
                let (_, r) = self.message(&owner.full_name, name, &entity, imports)?;
                TypeExpr::Input(input_ref(r))
            }
            (FieldKind::Enum(name), _) => {
                TypeExpr::Enum(self.enumeration(&owner.full_name, name, &entity, imports)?)
            }
        };

        let wrapped = if field.repeated {
            TypeExpr::list(base)
        } else {
            base
        };

        Ok(if field.options.required {
            TypeExpr::non_null(wrapped)
        } else {
            wrapped
        })
    }

    /// Look up a message reference written inside `scope`.
    pub fn message(
        &self,
        scope: &str,
        type_name: &str,
        entity: &str,
        imports: &mut Imports,
    ) -> Result<(&'a Message, TypeRef)> {
        match self.symbols.lookup(scope, type_name) {
            Some(Symbol::Message { message, .. }) => {
                Ok((message, self.message_ref(message, imports)))
            }
            _ => Err(unknown(entity, type_name)),
        }
    }

    /// Reference to a message already in hand, registering its package.
    pub fn message_ref(&self, message: &Message, imports: &mut Imports) -> TypeRef {
        TypeRef {
            name: message.graphql_name(),
            full_name: message.full_name.clone(),
            package: message.package.clone(),
            alias: self.register(&message.package, imports),
        }
    }

    /// Look up an enum reference written inside `scope`.
    pub fn enumeration(
        &self,
        scope: &str,
        type_name: &str,
        entity: &str,
        imports: &mut Imports,
    ) -> Result<TypeRef> {
        match self.symbols.lookup(scope, type_name) {
            Some(Symbol::Enum { value, .. }) => {
                let alias = self.register(&value.package, imports);
                Ok(TypeRef {
                    name: value.graphql_name(),
                    full_name: value.full_name.clone(),
                    package: value.package.clone(),
                    alias,
                })
            }
            _ => Err(unknown(entity, type_name)),
        }
    }

    fn register(&self, package: &str, imports: &mut Imports) -> Option<String> {
        if package == imports.root() {
            return None;
        }
        let alias = self.symbols.package(package)?.alias.clone();
        imports.register(package, &alias);
        Some(alias)
    }
}

/// Input-object projection of an output reference.
pub fn input_ref(output: TypeRef) -> TypeRef {
    TypeRef {
        name: format!("{}Input", output.name),
        ..output
    }
}

fn unknown(entity: &str, type_name: &str) -> Error {
    Error::UnknownTypeReference {
        field: entity.to_string(),
        type_name: type_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    };
    use crate::graphql::GraphqlField;
    use crate::loader::{load_file, File};

    fn required() -> GraphqlField {
        GraphqlField {
            required: true,
            ..Default::default()
        }
    }

    fn fixture() -> Vec<File> {
        let common = FileDescriptorProto::new("common.proto", "common")
            .with_message(DescriptorProto::new("Money"))
            .with_enum(EnumDescriptorProto::new("Currency").with_value("EUR", 0));
        let shop = FileDescriptorProto::new("shop.proto", "shop")
            .with_dependency("common.proto")
            .with_message(
                DescriptorProto::new("Item")
                    .with_field(FieldDescriptorProto::scalar("name", 1, Type::String))
                    .with_field(FieldDescriptorProto::scalar("ids", 2, Type::Int64).repeated())
                    .with_field(
                        FieldDescriptorProto::scalar("count", 3, Type::Uint32)
                            .with_options(required()),
                    )
                    .with_field(FieldDescriptorProto::message("price", 4, ".common.Money"))
                    .with_field(FieldDescriptorProto::enumeration(
                        "currency",
                        5,
                        ".common.Currency",
                    ))
                    .with_field(
                        FieldDescriptorProto::message("children", 6, "Item")
                            .repeated()
                            .with_options(required()),
                    )
                    .with_field(FieldDescriptorProto::message("wrong", 7, ".common.Currency"))
                    .with_field(FieldDescriptorProto::message("missing", 8, ".common.Nope"))
                    .with_field(FieldDescriptorProto::message("legacy", 9, "Item"))
                    .with_field(FieldDescriptorProto::message("total", 10, "common.Money")),
            );
        let mut files = vec![load_file(&common).unwrap(), load_file(&shop).unwrap()];
        // Groups cannot be declared through the helpers.
        files[1].messages[0].fields[8].kind = FieldKind::Group(".shop.Item".to_string());
        files
    }

    fn resolve(name: &str, context: TypeContext, imports: &mut Imports) -> Result<TypeExpr> {
        let files = fixture();
        let symbols = SymbolTable::build(&files).unwrap();
        let item = &files[1].messages[0];
        let field = item.field(name).unwrap();
        Resolver::new(&symbols).resolve(item, field, context, imports)
    }

    fn rendered(name: &str, context: TypeContext) -> String {
        resolve(name, context, &mut Imports::new("shop"))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_scalar_mapping() {
        assert_eq!(scalar_for(Type::Double), Some(Scalar::Float));
        assert_eq!(scalar_for(Type::Float), Some(Scalar::Float));
        assert_eq!(scalar_for(Type::Sfixed64), Some(Scalar::Int));
        assert_eq!(scalar_for(Type::Uint64), Some(Scalar::Int));
        assert_eq!(scalar_for(Type::Bool), Some(Scalar::Boolean));
        assert_eq!(scalar_for(Type::Bytes), Some(Scalar::String));
        assert_eq!(scalar_for(Type::Message), None);
    }

    #[test]
    fn test_context_table() {
        let contexts = [TypeContext::Output, TypeContext::Input, TypeContext::Argument];
        let expected = [
            ("name", ["String", "String", "String"]),
            ("ids", ["[Int]", "[Int]", "[Int]"]),
            ("count", ["Int!", "Int!", "Int!"]),
            ("price", ["Money", "MoneyInput", "MoneyInput"]),
            ("currency", ["Currency", "Currency", "Currency"]),
            ("children", ["[Item]!", "[ItemInput]!", "[ItemInput]!"]),
        ];

        for (field, per_context) in expected {
            for (context, want) in contexts.iter().zip(per_context) {
                assert_eq!(rendered(field, *context), want, "{field} in {context:?}");
            }
        }
    }

    #[test]
    fn test_relative_reference_resolves_in_scope() {
        let expr = resolve("total", TypeContext::Output, &mut Imports::new("shop")).unwrap();
        assert_eq!(expr.named().unwrap().full_name, "common.Money");
    }

    #[test]
    fn test_cross_package_alias_registered_once() {
        let mut imports = Imports::new("shop");

        let price = resolve("price", TypeContext::Output, &mut imports).unwrap();
        let currency = resolve("currency", TypeContext::Input, &mut imports).unwrap();
        let own = resolve("children", TypeContext::Output, &mut imports).unwrap();

        assert_eq!(price.named().unwrap().alias.as_deref(), Some("common"));
        assert_eq!(currency.named().unwrap().alias.as_deref(), Some("common"));
        assert_eq!(own.named().unwrap().alias, None);
        assert_eq!(
            imports.as_slice(),
            &[PackageImport {
                package: "common".to_string(),
                alias: "common".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_reference_names_field() {
        let err = resolve("missing", TypeContext::Output, &mut Imports::new("shop")).unwrap_err();
        match err {
            Error::UnknownTypeReference { field, type_name } => {
                assert_eq!(field, "shop.Item.missing");
                assert_eq!(type_name, ".common.Nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_kind_mismatch_is_unknown() {
        let err = resolve("wrong", TypeContext::Output, &mut Imports::new("shop")).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_TYPE_REFERENCE");
    }

    #[test]
    fn test_group_is_unsupported() {
        let err = resolve("legacy", TypeContext::Input, &mut Imports::new("shop")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFieldKind { ref kind, .. } if kind == "group"));
    }

    #[test]
    fn test_imports_ignore_root_and_repeats() {
        let mut imports = Imports::new("shop");
        assert!(!imports.register("shop", "shop"));
        assert!(imports.register("common", "common"));
        assert!(!imports.register("common", "common"));
        assert_eq!(imports.into_vec().len(), 1);
    }
}
