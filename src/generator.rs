//! The plugin pipeline: request in, response out.
//!
//! Load every descriptor, build the symbol table once, then build and emit
//! one [`RootPackage`] per requested file. The response is all-or-nothing:
//! the first error replaces every generated file.

use crate::config::GeneratorConfig;
use crate::descriptor::CodeGeneratorRequest;
use crate::error::{Error, Result};
use crate::loader::{load_file, File};
use crate::schema::SchemaBuilder;
use crate::symbols::SymbolTable;
use crate::types::RootPackage;
use prost::Message;
use prost_types::compiler::code_generator_response::{self, Feature};
use prost_types::compiler::CodeGeneratorResponse;
use tracing::{debug, error, info, instrument};

/// Runs the pipeline with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build the schema graph of every requested file.
    #[instrument(skip_all, fields(requested = request.file_to_generate.len()))]
    pub fn build(&self, request: &CodeGeneratorRequest) -> Result<Vec<RootPackage>> {
        let files = request
            .proto_file
            .iter()
            .map(load_file)
            .collect::<Result<Vec<File>>>()?;
        debug!(files = files.len(), "descriptors loaded");

        let symbols = SymbolTable::build(&files)?;
        let builder = SchemaBuilder::new(&symbols).oneof_policy(self.config.oneof);

        request
            .file_to_generate
            .iter()
            .map(|name| {
                let file = symbols.file(name).ok_or_else(|| {
                    Error::invalid_descriptor(
                        name,
                        "requested file is missing from the descriptor set",
                    )
                })?;
                builder.build(file)
            })
            .collect()
    }

    /// Build and emit every requested file.
    pub fn generate(
        &self,
        request: &CodeGeneratorRequest,
    ) -> Result<Vec<code_generator_response::File>> {
        let emitter = self.config.target.emitter();
        let roots = self.build(request)?;
        roots
            .iter()
            .map(|root| {
                let name = emitter.file_name(root);
                let content = emitter.emit(root)?;
                info!(
                    file = %name,
                    queries = root.queries.len(),
                    mutations = root.mutations.len(),
                    "generated"
                );
                Ok(code_generator_response::File {
                    name: Some(name),
                    content: Some(content),
                    ..Default::default()
                })
            })
            .collect()
    }

    /// Answer a decoded request. Errors become the response's error string.
    pub fn respond(&self, request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
        match self.generate(request) {
            Ok(files) => response(files, None),
            Err(err) => failure(err),
        }
    }
}

/// Answer an encoded request. The generator parameter inside the request
/// selects the configuration.
pub fn respond_to_bytes(input: &[u8]) -> Result<Vec<u8>> {
    let response = match CodeGeneratorRequest::decode(input) {
        Ok(request) => match GeneratorConfig::from_parameter(request.parameter.as_deref()) {
            Ok(config) => Generator::new(config).respond(&request),
            Err(err) => failure(err),
        },
        Err(err) => failure(err.into()),
    };

    let mut output = Vec::new();
    response.encode(&mut output)?;
    Ok(output)
}

fn failure(err: Error) -> CodeGeneratorResponse {
    error!(code = err.code(), error = %err, "generation failed");
    response(Vec::new(), Some(err.to_string()))
}

fn response(
    file: Vec<code_generator_response::File>,
    error: Option<String>,
) -> CodeGeneratorResponse {
    CodeGeneratorResponse {
        error,
        supported_features: Some(Feature::Proto3Optional as u64),
        file,
        ..Default::default()
    }
}
