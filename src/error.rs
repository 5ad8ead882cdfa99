//! Crate-level error type.
//!
//! Only failures that a caller must act on are represented here.  Conditions
//! the agent absorbs locally (no latency samples yet, an unreachable health
//! endpoint, a record that fails schema validation, a corrupt justification
//! file during summarization) are modelled as values in their own modules and
//! never surface as an [`AgentError`].

use std::path::PathBuf;

/// Errors that can abort a control-loop cycle or a summarize run.
///
/// Each variant carries enough context to diagnose the failure without
/// needing to inspect the originating error directly.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A TCP-level connection could not be established or timed out.
    #[error("connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// The remote server replied with a non-2xx HTTP status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Response body could not be parsed as the expected JSON structure.
    #[error("JSON parse error on field '{field}': {detail}")]
    Json { field: String, detail: String },

    /// An artifact could not be written or a directory could not be read.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be serialized.
    #[error("failed to encode {what}: {detail}")]
    Encode { what: String, detail: String },

    /// A configuration variable was present but unusable.
    #[error("invalid configuration {var}: {detail}")]
    Config { var: String, detail: String },
}

impl AgentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AgentError::Io { path: path.into(), source }
    }

    /// `true` for failures talking to a remote backend (metrics or policy).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AgentError::Connect { .. } | AgentError::Http { .. } | AgentError::Json { .. }
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AgentError>;
