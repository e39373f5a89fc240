//! Run configuration
//!
//! A `Config` is built once per run, from an optional YAML file overlaid
//! with command-line flags, and is read-only afterwards.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Name of the environment variable injected into every container
pub const DOMAIN_ENV: &str = "KUBERNETES_CLUSTER_DOMAIN";

/// Values key holding the cluster domain
pub const DOMAIN_KEY: &str = "kubernetesClusterDomain";

/// Cluster domain used when none is configured
pub const DEFAULT_DOMAIN: &str = "cluster.local";

/// Chart name used when none is configured
pub const DEFAULT_CHART_NAME: &str = "chart";

static CHART_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

/// Process-wide options for a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Name of the generated chart
    pub chart_name: String,

    /// Application name override; detected from object names when unset
    pub app_name: Option<String>,

    /// Add a top-level `imagePullSecrets` toggle to pod specs
    pub image_pull_secrets: bool,

    /// Cluster domain written to values and injected into containers
    pub cluster_domain: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chart_name: DEFAULT_CHART_NAME.to_string(),
            app_name: None,
            image_pull_secrets: false,
            cluster_domain: DEFAULT_DOMAIN.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Check that the configuration can produce a valid chart
    pub fn validate(&self) -> Result<()> {
        if !CHART_NAME_RE.is_match(&self.chart_name) {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "chart name '{}' must be lowercase alphanumeric characters or '-'",
                    self.chart_name
                ),
            });
        }
        if self.cluster_domain.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "cluster domain must not be empty".to_string(),
            });
        }
        if matches!(self.app_name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(CoreError::InvalidConfig {
                message: "application name must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chart_name, "chart");
        assert_eq!(config.cluster_domain, "cluster.local");
        assert!(!config.image_pull_secrets);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = Config::from_yaml("chartName: my-chart\nimagePullSecrets: true\n").unwrap();
        assert_eq!(config.chart_name, "my-chart");
        assert!(config.image_pull_secrets);
        assert_eq!(config.cluster_domain, DEFAULT_DOMAIN);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "appName: my-app\nclusterDomain: corp.internal").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.app_name.as_deref(), Some("my-app"));
        assert_eq!(config.cluster_domain, "corp.internal");
    }

    #[test]
    fn test_validate_rejects_bad_chart_name() {
        let config = Config {
            chart_name: "My_Chart".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            app_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
