//! Error types for the netmap-discover crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Failed to launch {command}: {source}")]
    CommandLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, DiscoverError>;

/// Terminal outcomes of a port scan other than a report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Enhanced scanning requires elevated privileges")]
    PrivilegesRequired,

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Invalid scanner configuration: {0}")]
    InvalidConfiguration(String),
}
