// Centralized error handling module
// Fatal errors abort a run; per-item errors are collected into reports

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deployments
#[derive(Debug, Error)]
pub enum DeployError {
    /// Settings are missing or invalid (credentials, bucket, region, patterns)
    #[error("{message}")]
    Config { message: String },

    /// The configured root cannot be synced from
    #[error("{} is not a path.", path.display())]
    Path { path: PathBuf },

    /// A local file could not be read
    #[error("I/O error while {operation} {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The object store rejected a list/put/delete call
    #[error("Remote {operation} failed for {key}: {message}")]
    Remote {
        operation: RemoteOperation,
        key: String,
        message: String,
    },

    /// The pass was interrupted between candidates
    #[error("Deployment cancelled")]
    Cancelled,
}

/// Remote call that produced a `DeployError::Remote`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteOperation {
    List,
    Put,
    Delete,
}

impl std::fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RemoteOperation::List => "list",
            RemoteOperation::Put => "put",
            RemoteOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

impl DeployError {
    pub fn config(message: impl Into<String>) -> Self {
        DeployError::Config {
            message: message.into(),
        }
    }

    /// Create an Io error with context about the operation and path
    pub fn from_io_error(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        DeployError::Io {
            path: path.into(),
            operation: operation.to_string(),
            source: err,
        }
    }

    /// Wrap a store failure; `{:#}` keeps the anyhow context chain on one line
    pub fn remote(operation: RemoteOperation, key: &str, err: &anyhow::Error) -> Self {
        DeployError::Remote {
            operation,
            key: key.to_string(),
            message: format!("{:#}", err),
        }
    }

    /// Fatal errors terminate the run before or instead of a pass
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DeployError::Config { .. } | DeployError::Path { .. } | DeployError::Cancelled
        )
    }
}
