//! Error types for the transformation engine
//!
//! Every error is fatal for the run: there is no partial chart.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use chartify_core::CoreError;

/// Converter error
#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error("Failed to decode document {document}: {message}")]
    #[diagnostic(
        code(chartify::decode),
        help("every document must be a mapping with apiVersion and kind")
    )]
    Decode { document: usize, message: String },

    #[error("Unexpected shape for field '{field}': {message}")]
    #[diagnostic(code(chartify::field_shape))]
    FieldShape { field: String, message: String },

    #[error("Invalid image format '{image}' in container '{container}'")]
    #[diagnostic(
        code(chartify::image_format),
        help("images must carry an explicit tag, e.g. nginx:1.25")
    )]
    InvalidImageFormat { container: String, image: String },

    #[error(transparent)]
    #[diagnostic(code(chartify::values))]
    Values(#[from] CoreError),

    #[error("Failed to transform {kind} '{name}'")]
    #[diagnostic(code(chartify::transform))]
    Transform {
        kind: String,
        name: String,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("Kind {kind} is claimed by more than one transformer")]
    #[diagnostic(code(chartify::overlap))]
    OverlappingTransformers { kind: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(chartify::io))]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    #[diagnostic(code(chartify::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Output path exists and is not a directory: {0}")]
    #[diagnostic(code(chartify::output_exists))]
    OutputExists(PathBuf),

    #[error("Decoder task failed: {0}")]
    #[diagnostic(code(chartify::internal))]
    Internal(String),
}

impl ConvertError {
    pub(crate) fn field_shape(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldShape {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Innermost error, skipping object context wrappers
    pub fn root(&self) -> &ConvertError {
        match self {
            Self::Transform { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
