//! Error taxonomy for a release run.
//!
//! Every failure is terminal. Library code returns [`Error`]; the binary
//! turns it into a process exit code through [`Error::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can end a release run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("required tool '{tool}' is not installed or not on PATH")]
    ToolMissing {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("usage: {0}")]
    Usage(String),

    #[error("invalid release tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: &'static str },

    #[error("release '{tag}' is already published (published at {published_at})")]
    DuplicateRelease { tag: String, published_at: String },

    #[error("failed to fetch history of '{repository}': {message}")]
    HistoryFetch {
        repository: String,
        message: String,
        code: Option<i32>,
    },

    #[error("failed to publish release '{tag}': {message}")]
    Publish {
        tag: String,
        message: String,
        code: Option<i32>,
    },

    #[error("query failed: {message}")]
    Query { message: String, code: Option<i32> },

    #[error("failed to read config file '{path}'")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Process exit code for this error category.
    ///
    /// Subprocess failures pass the child's own exit code through when
    /// it is known.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolMissing { .. } => 1,
            Error::Usage(_) => 2,
            Error::InvalidTag { .. } | Error::DuplicateRelease { .. } | Error::Interrupted => 3,
            Error::HistoryFetch { code, .. }
            | Error::Publish { code, .. }
            | Error::Query { code, .. } => code.filter(|c| *c != 0).unwrap_or(1),
            Error::ReadConfig { .. }
            | Error::ParseConfig { .. }
            | Error::Config(_)
            | Error::Io { .. } => 1,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}
