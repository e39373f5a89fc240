//! Dispatcher
//!
//! The context records submitted objects and feeds them to application
//! name detection. Nothing is templated until [`Context::finalize`], so the
//! templated name of an object never depends on what came after it.

use chartify_core::{AppMetadata, Config, Values};
use tracing::Span;

use crate::error::{ConvertError, Result};
use crate::object::Object;
use crate::processor::{Fragment, Transformer, check_overlap};

/// Everything a run produced, ready for the output sink
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOutput {
    /// Name of the chart (and of its helper templates)
    pub chart_name: String,
    /// Templated fragments in submission order
    pub fragments: Vec<Fragment>,
    /// Merged values of all fragments
    pub values: Values,
}

/// Ordered transformer chain plus the objects submitted to it
#[derive(Debug)]
pub struct Context {
    transformers: Vec<Transformer>,
    app_meta: AppMetadata,
    objects: Vec<Object>,
    span: Span,
}

impl Context {
    /// Create a context with the default transformer order
    pub fn new(config: Config, span: Span) -> Result<Self> {
        Self::with_transformers(config, Transformer::DEFAULT_ORDER.to_vec(), span)
    }

    /// Create a context with a custom transformer order
    ///
    /// Fails when two transformers claim the same kind.
    pub fn with_transformers(
        config: Config,
        transformers: Vec<Transformer>,
        span: Span,
    ) -> Result<Self> {
        config.validate()?;
        check_overlap(&transformers)?;
        Ok(Self {
            transformers,
            app_meta: AppMetadata::new(config),
            objects: Vec::new(),
            span,
        })
    }

    /// Accept a decoded object
    pub fn submit(&mut self, obj: Object) {
        let _enter = self.span.enter();

        if let Some(namespace) = obj.namespace() {
            self.app_meta.observe_namespace(namespace);
        }
        let transformer = self.claim(&obj);
        if transformer.is_none_or(|t| t.names_application()) {
            self.app_meta.observe_name(obj.name());
        }

        tracing::debug!(
            kind = %obj.gvk(),
            name = obj.name(),
            document = obj.document(),
            transformer = transformer.map_or("none", |t| t.name()),
            "submitted object"
        );
        self.objects.push(obj);
    }

    /// Transform every submitted object and merge their values
    ///
    /// The first error aborts the run.
    pub fn finalize(self) -> Result<ChartOutput> {
        let _enter = self.span.enter();
        let info = self.app_meta.chart_info();
        tracing::info!(
            application = self.app_meta.application_name(),
            objects = self.objects.len(),
            "transforming objects"
        );

        let mut fragments = Vec::with_capacity(self.objects.len());
        let mut values = Values::new();
        let mut passed_through = 0usize;

        for obj in &self.objects {
            let wrap = |e: ConvertError| ConvertError::Transform {
                kind: obj.kind().to_string(),
                name: obj.name().to_string(),
                source: Box::new(e),
            };
            let fragment = match self.claim(obj) {
                Some(transformer) => transformer
                    .transform(&info, &self.app_meta, obj)
                    .map_err(wrap)?,
                None => {
                    tracing::warn!(
                        kind = %obj.gvk(),
                        name = obj.name(),
                        "no transformer for kind, copying object verbatim"
                    );
                    passed_through += 1;
                    Fragment::pass_through(&self.app_meta, obj).map_err(wrap)?
                }
            };
            values
                .merge(fragment.values.clone())
                .map_err(|e| wrap(e.into()))?;
            fragments.push(fragment);
        }

        tracing::info!(
            fragments = fragments.len(),
            passed_through,
            values = values.len(),
            "chart assembled"
        );

        Ok(ChartOutput {
            chart_name: self.app_meta.chart_name().to_string(),
            fragments,
            values,
        })
    }

    pub fn app_metadata(&self) -> &AppMetadata {
        &self.app_meta
    }

    pub fn transformers(&self) -> &[Transformer] {
        &self.transformers
    }

    /// Number of submitted objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn claim(&self, obj: &Object) -> Option<Transformer> {
        self.transformers
            .iter()
            .copied()
            .find(|t| t.matches(obj.gvk()))
    }
}
