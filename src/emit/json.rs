//! JSON dump of the schema graph.

use super::Emitter;
use crate::error::Result;
use crate::types::RootPackage;

pub struct JsonEmitter;

impl Emitter for JsonEmitter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn emit(&self, root: &RootPackage) -> Result<String> {
        let mut out = serde_json::to_string_pretty(root)?;
        out.push('\n');
        Ok(out)
    }
}
