//! CLI error types with exit code handling
//!
//! Engine errors are flattened into a cloneable CLI error that knows its
//! exit code.

use chartify_convert::ConvertError;
use chartify_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Input is not a stream of Kubernetes objects
    #[error("Decode error: {message}")]
    #[diagnostic(code(chartify::cli::decode))]
    Decode {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// An object could not be templated
    #[error("Transform error: {message}")]
    #[diagnostic(code(chartify::cli::transform))]
    Transform {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid arguments or configuration
    #[error("Invalid usage: {message}")]
    #[diagnostic(code(chartify::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartify::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(chartify::cli::error))]
    Other { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(chartify::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Decode { .. } => exit_codes::DECODE_ERROR,
            CliError::Transform { .. } => exit_codes::TRANSFORM_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }
}

impl From<ConvertError> for CliError {
    fn from(err: ConvertError) -> Self {
        let message = describe(&err);
        match err.root() {
            ConvertError::Decode { .. } => CliError::Decode {
                message,
                help: Some("every document must be a mapping with apiVersion and kind".to_string()),
            },
            ConvertError::InvalidImageFormat { .. } => CliError::Transform {
                message,
                help: Some("images must carry an explicit tag, e.g. nginx:1.25".to_string()),
            },
            ConvertError::Values(CoreError::InvalidConfig { .. }) => CliError::Usage {
                message,
                help: None,
            },
            ConvertError::FieldShape { .. } | ConvertError::Values(_) => CliError::Transform {
                message,
                help: None,
            },
            ConvertError::OverlappingTransformers { .. } => CliError::internal(message),
            ConvertError::Io(_) | ConvertError::OutputExists(_) => CliError::Io { message },
            ConvertError::Transform { .. } | ConvertError::Yaml(_) | ConvertError::Internal(_) => {
                CliError::Other { message }
            }
        }
    }
}

/// Error message followed by its causes, `outer: inner`
fn describe(err: &ConvertError) -> String {
    match err {
        ConvertError::Transform { source, .. } => format!("{}: {}", err, describe(source)),
        other => other.to_string(),
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<miette::Report> for CliError {
    fn from(err: miette::Report) -> Self {
        CliError::Other {
            message: format!("{:?}", err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_keeps_object_context() {
        let err = ConvertError::Transform {
            kind: "Deployment".to_string(),
            name: "my-app-web".to_string(),
            source: Box::new(ConvertError::InvalidImageFormat {
                container: "web".to_string(),
                image: "nginx".to_string(),
            }),
        };

        let cli: CliError = err.into();
        assert_eq!(cli.exit_code(), exit_codes::TRANSFORM_ERROR);
        let message = cli.to_string();
        assert!(message.contains("Deployment 'my-app-web'"));
        assert!(message.contains("Invalid image format 'nginx'"));
    }

    #[test]
    fn test_decode_exit_code() {
        let err = ConvertError::Decode {
            document: 3,
            message: "missing kind".to_string(),
        };
        assert_eq!(CliError::from(err).exit_code(), exit_codes::DECODE_ERROR);
    }
}
