//! Tool-level failures.
//!
//! Every tool returns `Result<String, ToolError>`; the registry renders the error
//! with `Display` before handing it to an agent, so each message must read well on
//! its own.

use std::fmt;

use thiserror::Error;

/// What kind of filesystem entry a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("file"),
            EntryKind::Directory => f.write_str("directory"),
        }
    }
}

/// Why an outbound request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    Timeout,
    Request,
    Status(u16),
    /// The response arrived but could not be converted.
    Parse,
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamKind::Timeout => f.write_str("timed out"),
            UpstreamKind::Request => f.write_str("request failed"),
            UpstreamKind::Status(code) => write!(f, "HTTP status {code}"),
            UpstreamKind::Parse => f.write_str("unexpected content"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Error: Cannot access paths outside the current working directory. Path: {path}")]
    PathViolation { path: String },

    #[error("Error: {what} does not exist: {path}")]
    NotFound { what: EntryKind, path: String },

    #[error("Error: {path} is a {found}, not a {expected}")]
    WrongType {
        path: String,
        expected: EntryKind,
        found: EntryKind,
    },

    #[error("Error: Could not decode {path} as {encoding}")]
    DecodeError { path: String, encoding: String },

    #[error("Error: The following section files do not exist: {}", paths.join(", "))]
    MissingSections { paths: Vec<String> },

    #[error("Error: {dependency} is not available: {detail}")]
    MissingDependency { dependency: String, detail: String },

    #[error("Error: Request to {target} {kind}: {detail}")]
    UpstreamFailure {
        target: String,
        kind: UpstreamKind,
        detail: String,
    },

    #[error("Error: Compilation of {path} failed:\n{}", errors.join("\n"))]
    CompileFailed { path: String, errors: Vec<String> },

    #[error("Error rendering document: {0}")]
    RenderError(String),

    #[error("Error: {0}")]
    InvalidArgument(String),

    #[error("Error: Agent {agent} failed: {detail}")]
    AgentFailed { agent: String, detail: String },

    #[error("Error: Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn io(action: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn upstream(target: impl Into<String>, kind: UpstreamKind, detail: impl fmt::Display) -> Self {
        ToolError::UpstreamFailure {
            target: target.into(),
            kind,
            detail: detail.to_string(),
        }
    }
}
