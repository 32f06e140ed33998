//! Cross-file symbol table.
//!
//! Built once over every loaded file (requested files and their imports)
//! and only read afterwards. Messages and enums share one namespace keyed
//! by fully-qualified name without the leading `.`.

use crate::error::{Error, Result};
use crate::loader::{Enum, File, Message};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A resolved message or enum together with its declaring file.
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'a> {
    Message { file: &'a File, message: &'a Message },
    Enum { file: &'a File, value: &'a Enum },
}

impl<'a> Symbol<'a> {
    pub fn full_name(&self) -> &'a str {
        match *self {
            Symbol::Message { message, .. } => &message.full_name,
            Symbol::Enum { value, .. } => &value.full_name,
        }
    }

    pub fn file(&self) -> &'a File {
        match *self {
            Symbol::Message { file, .. } | Symbol::Enum { file, .. } => file,
        }
    }

    pub fn package(&self) -> &'a str {
        &self.file().package
    }
}

/// A protobuf package and the identifier generated code refers to it by.
#[derive(Debug, Clone)]
pub struct Package<'a> {
    pub name: String,
    pub alias: String,
    pub files: Vec<&'a File>,
}

#[derive(Debug)]
pub struct SymbolTable<'a> {
    symbols: HashMap<String, Symbol<'a>>,
    files: HashMap<&'a str, &'a File>,
    packages: Vec<Package<'a>>,
    package_index: HashMap<String, usize>,
}

impl<'a> SymbolTable<'a> {
    /// Register every message and enum of `files`. Package aliases are
    /// assigned in first-seen order.
    pub fn build(files: &'a [File]) -> Result<Self> {
        let mut table = SymbolTable {
            symbols: HashMap::new(),
            files: HashMap::new(),
            packages: Vec::new(),
            package_index: HashMap::new(),
        };
        let mut aliases = HashSet::new();

        for file in files {
            if table.files.insert(&file.name, file).is_some() {
                return Err(Error::DuplicateName {
                    name: file.name.clone(),
                    detail: "file was supplied more than once".to_string(),
                });
            }

            let index = match table.package_index.get(&file.package) {
                Some(index) => *index,
                None => {
                    let alias = unique_alias(&file.package, &mut aliases);
                    debug!(package = %file.package, %alias, "registered package");
                    table.packages.push(Package {
                        name: file.package.clone(),
                        alias,
                        files: Vec::new(),
                    });
                    table
                        .package_index
                        .insert(file.package.clone(), table.packages.len() - 1);
                    table.packages.len() - 1
                }
            };
            table.packages[index].files.push(file);

            for message in &file.messages {
                table.insert(Symbol::Message { file, message })?;
            }
            for value in &file.enums {
                table.insert(Symbol::Enum { file, value })?;
            }
        }

        debug!(
            files = table.files.len(),
            symbols = table.symbols.len(),
            packages = table.packages.len(),
            "symbol table built"
        );
        Ok(table)
    }

    fn insert(&mut self, symbol: Symbol<'a>) -> Result<()> {
        let name = symbol.full_name();
        if let Some(existing) = self.symbols.get(name) {
            return Err(Error::DuplicateName {
                name: name.to_string(),
                detail: format!(
                    "declared in {} and {}",
                    existing.file().name,
                    symbol.file().name
                ),
            });
        }
        self.symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Exact lookup by fully-qualified name; a leading `.` is ignored.
    pub fn get(&self, full_name: &str) -> Option<Symbol<'a>> {
        let name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.symbols.get(name).copied()
    }

    /// Resolve `name` as written inside the declaration `scope` (a
    /// fully-qualified message or package name). Relative names are tried
    /// from the innermost scope outward.
    pub fn lookup(&self, scope: &str, name: &str) -> Option<Symbol<'a>> {
        if name.starts_with('.') {
            return self.get(name);
        }

        let mut scope = scope.strip_prefix('.').unwrap_or(scope);
        loop {
            let candidate = if scope.is_empty() {
                name.to_string()
            } else {
                format!("{scope}.{name}")
            };
            if let Some(symbol) = self.get(&candidate) {
                return Some(symbol);
            }
            if scope.is_empty() {
                return None;
            }
            scope = scope.rsplit_once('.').map(|(outer, _)| outer).unwrap_or("");
        }
    }

    pub fn package(&self, name: &str) -> Option<&Package<'a>> {
        self.package_index.get(name).map(|i| &self.packages[*i])
    }

    pub fn packages(&self) -> &[Package<'a>] {
        &self.packages
    }

    pub fn file(&self, name: &str) -> Option<&'a File> {
        self.files.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// `example.v1` -> `example_v1`, `` -> `root`; later collisions get a
/// numeric suffix.
fn unique_alias(package: &str, taken: &mut HashSet<String>) -> String {
    let base = if package.is_empty() {
        "root".to_string()
    } else {
        package.replace('.', "_")
    };

    let mut alias = base.clone();
    let mut n = 2;
    while taken.contains(&alias) {
        alias = format!("{base}_{n}");
        n += 1;
    }
    taken.insert(alias.clone());
    alias
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};
    use crate::loader::load_file;

    fn load(raw: Vec<FileDescriptorProto>) -> Vec<File> {
        raw.iter().map(|f| load_file(f).unwrap()).collect()
    }

    #[test]
    fn test_registers_messages_and_enums() {
        let files = load(vec![FileDescriptorProto::new("a.proto", "pkg.a")
            .with_message(DescriptorProto::new("Outer").with_nested(DescriptorProto::new("Inner")))
            .with_enum(EnumDescriptorProto::new("Color"))]);
        let table = SymbolTable::build(&files).unwrap();

        assert_eq!(table.len(), 3);
        assert!(matches!(table.get(".pkg.a.Outer"), Some(Symbol::Message { .. })));
        assert!(matches!(table.get("pkg.a.Outer.Inner"), Some(Symbol::Message { .. })));
        assert!(matches!(table.get(".pkg.a.Color"), Some(Symbol::Enum { .. })));
        assert!(table.get(".pkg.a.Missing").is_none());
        assert_eq!(table.file("a.proto").map(|f| f.package.as_str()), Some("pkg.a"));
    }

    #[test]
    fn test_duplicate_message_across_files() {
        let files = load(vec![
            FileDescriptorProto::new("a.proto", "pkg").with_message(DescriptorProto::new("Echo")),
            FileDescriptorProto::new("b.proto", "pkg").with_message(DescriptorProto::new("Echo")),
        ]);

        let err = SymbolTable::build(&files).unwrap_err();
        match err {
            Error::DuplicateName { name, detail } => {
                assert_eq!(name, "pkg.Echo");
                assert!(detail.contains("a.proto") && detail.contains("b.proto"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_message_and_enum_share_namespace() {
        let files = load(vec![FileDescriptorProto::new("a.proto", "pkg")
            .with_message(DescriptorProto::new("Status"))
            .with_enum(EnumDescriptorProto::new("Status"))]);

        let err = SymbolTable::build(&files).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_NAME");
    }

    #[test]
    fn test_duplicate_file() {
        let files = load(vec![
            FileDescriptorProto::new("a.proto", "pkg"),
            FileDescriptorProto::new("a.proto", "pkg"),
        ]);

        let err = SymbolTable::build(&files).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { ref name, .. } if name == "a.proto"));
    }

    #[test]
    fn test_package_aliases() {
        let files = load(vec![
            FileDescriptorProto::new("a.proto", "example.v1"),
            FileDescriptorProto::new("b.proto", "example_v1"),
            FileDescriptorProto::new("c.proto", ""),
            FileDescriptorProto::new("d.proto", "example.v1"),
        ]);
        let table = SymbolTable::build(&files).unwrap();

        let aliases: Vec<(&str, &str)> = table
            .packages()
            .iter()
            .map(|p| (p.name.as_str(), p.alias.as_str()))
            .collect();
        assert_eq!(
            aliases,
            vec![
                ("example.v1", "example_v1"),
                ("example_v1", "example_v1_2"),
                ("", "root"),
            ]
        );
        assert_eq!(table.package("example.v1").unwrap().files.len(), 2);
    }

    #[test]
    fn test_scoped_lookup() {
        let files = load(vec![
            FileDescriptorProto::new("a.proto", "pkg.sub")
                .with_message(
                    DescriptorProto::new("Outer").with_nested(DescriptorProto::new("Item")),
                )
                .with_message(DescriptorProto::new("Item")),
            FileDescriptorProto::new("b.proto", "pkg").with_message(DescriptorProto::new("Shared")),
        ]);
        let table = SymbolTable::build(&files).unwrap();

        let found = |scope: &str, name: &str| table.lookup(scope, name).map(|s| s.full_name());

        // Innermost scope wins.
        assert_eq!(found("pkg.sub.Outer", "Item"), Some("pkg.sub.Outer.Item"));
        assert_eq!(found("pkg.sub", "Item"), Some("pkg.sub.Item"));
        // Walks outward to parent packages.
        assert_eq!(found("pkg.sub.Outer", "Shared"), Some("pkg.Shared"));
        assert_eq!(found("pkg.sub.Outer", "Outer.Item"), Some("pkg.sub.Outer.Item"));
        // Absolute names skip scoping.
        assert_eq!(found("pkg.sub.Outer", ".pkg.sub.Item"), Some("pkg.sub.Item"));
        assert_eq!(found("pkg.sub.Outer", "Missing"), None);
    }
}
