//! Chartify Convert - Kubernetes manifests to Helm chart transformation
//!
//! Decoded objects are submitted to a [`Context`], which offers each one to
//! an ordered chain of [`Transformer`]s. The first transformer whose kinds
//! match claims the object and produces a [`Fragment`]: templated YAML plus
//! the concrete values it extracted. Objects no transformer claims are kept
//! verbatim as pass-through fragments.
//!
//! Name templating does not depend on dispatch order: objects are recorded
//! on submit, the application name is detected from all of them, and the
//! chain only runs on [`Context::finalize`].
//!
//! # Example
//!
//! ```no_run
//! use chartify_convert::{Context, decoder};
//! use chartify_core::Config;
//!
//! let input = std::fs::File::open("manifests.yaml").unwrap();
//! let mut context = Context::new(Config::default(), tracing::Span::none()).unwrap();
//! for object in decoder::decode(input) {
//!     context.submit(object.unwrap());
//! }
//! let chart = context.finalize().unwrap();
//! println!("{} templates", chart.fragments.len());
//! ```

pub mod chart;
pub mod context;
pub mod decoder;
pub mod error;
pub mod object;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod unstructured;
pub mod yaml;

// Re-exports
pub use chart::ChartFile;
pub use context::{ChartOutput, Context};
pub use error::{ConvertError, Result};
pub use object::{GroupVersionKind, Object, ResourceKind};
pub use output::{WriteResult, render_chart, write_chart};
pub use pipeline::{RunOutcome, run};
pub use processor::{Fragment, Transformer};
