//! Application metadata and the naming service
//!
//! `AppMetadata` is filled while objects are submitted (application name
//! detection, namespace tracking) and is read-only once transformation
//! starts. Every transformer asks it for templated names, so that objects
//! referencing each other by name keep resolving after a release rename.

use crate::case::to_lower_camel;
use crate::config::Config;

/// Template expression for the release namespace
pub const RELEASE_NAMESPACE: &str = "{{ .Release.Namespace }}";

/// Characters trimmed around the application name
const NAME_SEPARATORS: [char; 5] = ['-', '.', '/', '_', ' '];

/// Read-only chart identity handed to every transformer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartInfo {
    pub chart_name: String,
    pub application_name: String,
}

impl ChartInfo {
    /// Template expression for the release namespace
    pub fn release_namespace(&self) -> &'static str {
        RELEASE_NAMESPACE
    }

    /// Template expression resolving to the release-scoped chart name
    pub fn fullname(&self) -> String {
        format!("{{{{ include \"{}.fullname\" . }}}}", self.chart_name)
    }

    /// Block include of the chart's common labels
    pub fn labels_include(&self, indent: usize) -> String {
        format!(
            "{{{{- include \"{}.labels\" . | nindent {} }}}}",
            self.chart_name, indent
        )
    }

    /// Block include of the chart's selector labels
    pub fn selector_labels_include(&self, indent: usize) -> String {
        format!(
            "{{{{- include \"{}.selectorLabels\" . | nindent {} }}}}",
            self.chart_name, indent
        )
    }
}

/// Naming service and global options for one run
#[derive(Debug, Clone)]
pub struct AppMetadata {
    config: Config,
    detected_prefix: Option<String>,
    namespace: Option<String>,
}

impl AppMetadata {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            detected_prefix: None,
            namespace: None,
        }
    }

    /// Feed an owned object's name into application name detection
    ///
    /// The detected name is the longest run of leading `-`-separated
    /// segments shared by every observed name.
    pub fn observe_name(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        let prefix = match self.detected_prefix.take() {
            None => name.to_string(),
            Some(prev) => common_segment_prefix(&prev, name),
        };
        self.detected_prefix = Some(prefix);
    }

    /// Record the namespace objects were exported from
    pub fn observe_namespace(&mut self, namespace: &str) {
        if namespace.is_empty() {
            return;
        }
        match self.namespace.as_deref() {
            Some(known) if known != namespace => {
                tracing::warn!(
                    first = known,
                    second = namespace,
                    "objects from two different namespaces, both are mapped to the release namespace"
                );
            }
            Some(_) => {}
            None => self.namespace = Some(namespace.to_string()),
        }
    }

    /// Application name, configured or detected; empty when unknown
    pub fn application_name(&self) -> &str {
        if let Some(name) = self.config.app_name.as_deref() {
            return name;
        }
        self.detected_prefix
            .as_deref()
            .map(|p| p.trim_end_matches(NAME_SEPARATORS))
            .unwrap_or("")
    }

    pub fn chart_name(&self) -> &str {
        &self.config.chart_name
    }

    /// Namespace the input objects were exported from, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn chart_info(&self) -> ChartInfo {
        ChartInfo {
            chart_name: self.config.chart_name.clone(),
            application_name: self.application_name().to_string(),
        }
    }

    /// Template expression resolving to the release-scoped chart name
    pub fn fullname(&self) -> String {
        format!("{{{{ include \"{}.fullname\" . }}}}", self.config.chart_name)
    }

    /// Replace the application name inside `name` with the fullname expression
    ///
    /// Names that do not contain the application name are treated as
    /// references to objects this chart does not own and pass through.
    pub fn templated_name(&self, name: &str) -> String {
        let app = self.application_name();
        if app.is_empty() || name.is_empty() || !name.contains(app) {
            return name.to_string();
        }
        name.replace(app, &self.fullname())
    }

    /// Strip the application name prefix from an object name
    ///
    /// Returns the original name when nothing would be left.
    pub fn trim_name(&self, name: &str) -> String {
        let app = self.application_name();
        if app.is_empty() {
            return name.to_string();
        }
        match name.strip_prefix(app) {
            Some(rest) => {
                let rest = rest.trim_start_matches(NAME_SEPARATORS);
                if rest.is_empty() {
                    name.to_string()
                } else {
                    rest.to_string()
                }
            }
            None => name.to_string(),
        }
    }

    /// Top-level values key owned by the object called `name`
    pub fn values_key(&self, name: &str) -> String {
        to_lower_camel(&self.trim_name(name))
    }
}

fn common_segment_prefix(a: &str, b: &str) -> String {
    a.split('-')
        .zip(b.split('-'))
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect::<Vec<_>>()
        .join("-")
}
