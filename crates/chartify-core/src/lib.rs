//! Chartify Core - shared types for turning Kubernetes manifests into Helm charts
//!
//! This crate provides the foundational types used by the conversion engine:
//! - `Values`: the nested values tree with typed path insertion and merge
//! - `AppMetadata`: the naming service shared by every transformer
//! - `ChartInfo`: read-only chart identity handed to each transformer call
//! - `Config`: process-wide configuration for a single run

pub mod case;
pub mod config;
pub mod error;
pub mod metadata;
pub mod values;

pub use case::to_lower_camel;
pub use config::{Config, DEFAULT_DOMAIN, DOMAIN_ENV, DOMAIN_KEY};
pub use error::{CoreError, Result};
pub use metadata::{AppMetadata, ChartInfo, RELEASE_NAMESPACE};
pub use values::{Value, Values};
