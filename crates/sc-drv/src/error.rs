//! The top-level error aggregating every pipeline stage's own error enum
//! (spec error kinds 1-5) into one type the CLI can match on.

use std::path::PathBuf;

use sc_gen::EmitError;
use sc_interp::RuntimeError;
use sc_lex::PreprocessError;
use sc_par::error::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("source contains a lexical error: {message}")]
    Lex { message: String },

    #[error("{0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to read configuration {0}: {1}")]
    Config(PathBuf, #[source] toml::de::Error),

    #[error("external tool '{tool}' timed out after {timeout_ms}ms")]
    ToolTimeout { tool: String, timeout_ms: u64 },

    #[error("external tool '{tool}' exited with status {code}:\n{tail}")]
    ToolFailed {
        tool: String,
        code: i32,
        tail: String,
    },

    #[error("failed to spawn external tool '{tool}': {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}
