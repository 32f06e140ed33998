//! Generator configuration.
//!
//! `protoc` passes everything after `--graphql_opt=` (or the part of
//! `--graphql_out=` before `:`) as one parameter string:
//!
//! ```text
//! target=sdl,oneof=flatten
//! ```

use crate::emit::Target;
use crate::error::{Error, Result};
use crate::schema::OneofPolicy;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeneratorConfig {
    pub target: Target,
    pub oneof: OneofPolicy,
}

impl GeneratorConfig {
    /// Create a new config builder
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }

    /// Parse the `key=value,key=value` parameter string. Whitespace is
    /// trimmed and empty parts are skipped.
    pub fn from_parameter(parameter: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        let Some(parameter) = parameter else {
            return Ok(config);
        };

        for part in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                Error::InvalidParameter(format!("expected key=value, got `{part}`"))
            })?;
            match key.trim() {
                "target" => config.target = value.trim().parse()?,
                "oneof" => config.oneof = value.trim().parse()?,
                other => {
                    return Err(Error::InvalidParameter(format!("unknown key `{other}`")));
                }
            }
        }

        Ok(config)
    }
}

/// Builder for [`GeneratorConfig`]
#[derive(Debug, Default)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output backend
    pub fn target(mut self, target: Target) -> Self {
        self.config.target = target;
        self
    }

    /// Treatment of oneof members
    pub fn oneof(mut self, policy: OneofPolicy) -> Self {
        self.config.oneof = policy;
        self
    }

    pub fn build(self) -> GeneratorConfig {
        self.config
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rust" => Ok(Target::Rust),
            "sdl" => Ok(Target::Sdl),
            "json" => Ok(Target::Json),
            other => Err(Error::InvalidParameter(format!(
                "unknown target `{other}` (expected rust, sdl or json)"
            ))),
        }
    }
}

impl FromStr for OneofPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reject" => Ok(OneofPolicy::Reject),
            "flatten" => Ok(OneofPolicy::Flatten),
            other => Err(Error::InvalidParameter(format!(
                "unknown oneof policy `{other}` (expected reject or flatten)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_parameter(None).unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.target, Target::Rust);
        assert_eq!(config.oneof, OneofPolicy::Reject);

        let config = GeneratorConfig::from_parameter(Some("")).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_parse_parameter() {
        let config =
            GeneratorConfig::from_parameter(Some(" target = sdl , oneof=flatten,, ")).unwrap();
        assert_eq!(config.target, Target::Sdl);
        assert_eq!(config.oneof, OneofPolicy::Flatten);
    }

    #[test]
    fn test_invalid_parameters() {
        for param in ["target", "target=go", "oneof=merge", "color=blue"] {
            let err = GeneratorConfig::from_parameter(Some(param)).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{param}");
        }
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::builder()
            .target(Target::Json)
            .oneof(OneofPolicy::Flatten)
            .build();
        assert_eq!(config.target, Target::Json);
        assert_eq!(config.oneof, OneofPolicy::Flatten);
    }
}
