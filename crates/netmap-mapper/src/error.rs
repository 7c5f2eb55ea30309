//! Error types for the netmap-mapper crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Coordinator is not running")]
    Stopped,

    #[error("Configuration error: {0}")]
    Config(#[from] netmap_core::NetmapError),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
