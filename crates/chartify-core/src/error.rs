//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Values conflict at '{path}': a {existing} is already set, cannot place a {incoming}")]
    ValuesConflict {
        path: String,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("Values path must contain at least one segment")]
    EmptyPath,

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
