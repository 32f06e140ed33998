//! Output backends.
//!
//! An [`Emitter`] turns one [`RootPackage`] into the text of one output
//! file. The graph carries no host syntax; every backend decides its own.

mod json;
mod rust;
mod sdl;

pub use json::JsonEmitter;
pub use rust::RustEmitter;
pub use sdl::SdlEmitter;

use crate::error::Result;
use crate::types::RootPackage;
use serde::Serialize;

/// Source generation backend
pub trait Emitter {
    /// Extension of the generated file, without the dot.
    fn extension(&self) -> &'static str;

    /// Render `root` into the content of one file.
    fn emit(&self, root: &RootPackage) -> Result<String>;

    /// `example/echo.proto` -> `example/echo.graphql.<ext>`. The SDL
    /// backend drops the infix.
    fn file_name(&self, root: &RootPackage) -> String {
        let stem = root.file.strip_suffix(".proto").unwrap_or(&root.file);
        format!("{stem}.graphql.{}", self.extension())
    }
}

/// Selectable backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[default]
    Rust,
    Sdl,
    Json,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Rust => "rust",
            Target::Sdl => "sdl",
            Target::Json => "json",
        }
    }

    pub fn emitter(&self) -> Box<dyn Emitter> {
        match self {
            Target::Rust => Box::new(RustEmitter),
            Target::Sdl => Box::new(SdlEmitter),
            Target::Json => Box::new(JsonEmitter),
        }
    }
}

/// Header line shared by the text backends.
pub(crate) fn generated_header(root: &RootPackage) -> String {
    format!(
        "@generated by protoc-gen-graphql from {}. Do not edit.",
        root.file
    )
}
