//! protoc plugin entry point.
//!
//! Reads a `CodeGeneratorRequest` from stdin and writes the
//! `CodeGeneratorResponse` to stdout. Generation errors travel inside the
//! response; the process only fails when stdin or stdout does.
//!
//! ```text
//! protoc -I proto --plugin=protoc-gen-graphql \
//!     --graphql_out=target=sdl:out proto/example/echo.proto
//! ```
//!
//! Logs go to stderr, filtered by `PROTOC_GEN_GRAPHQL_LOG` (default `warn`).

use anyhow::Context;
use std::io::{Read, Write};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROTOC_GEN_GRAPHQL_LOG";

fn main() -> anyhow::Result<()> {
    init_logging();

    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("failed to read CodeGeneratorRequest from stdin")?;
    tracing::debug!(bytes = input.len(), "request received");

    let output = protoc_gen_graphql::respond_to_bytes(&input)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .context("failed to write CodeGeneratorResponse to stdout")?;
    stdout.flush()?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries the response.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
