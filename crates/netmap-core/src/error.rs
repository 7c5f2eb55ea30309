use thiserror::Error;

/// Errors shared by the netmap crates.
#[derive(Error, Debug)]
pub enum NetmapError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for NetmapError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NetmapError>;
