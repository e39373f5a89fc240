//! Chart.yaml model and the static chart scaffolding
//!
//! `Chart.yaml`, `.helmignore` and `templates/_helpers.tpl` are written
//! once and then left to the chart's maintainers.

use serde::Serialize;

/// Version given to freshly created charts
pub const INITIAL_VERSION: &str = "0.1.0";

/// Helm Chart.yaml structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFile {
    /// API version (v2 for Helm 3)
    pub api_version: String,

    /// Chart name
    pub name: String,

    /// Chart description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Chart type (application or library)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,

    /// Chart version (SemVer)
    pub version: String,

    /// Version of the packaged application, default image tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

impl ChartFile {
    /// Chart.yaml for a newly generated chart
    pub fn new(name: &str) -> Self {
        Self {
            api_version: "v2".to_string(),
            name: name.to_string(),
            description: Some("A Helm chart for Kubernetes".to_string()),
            chart_type: Some("application".to_string()),
            version: INITIAL_VERSION.to_string(),
            app_version: Some(INITIAL_VERSION.to_string()),
        }
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Patterns ignored when packaging the chart
pub const HELMIGNORE: &str = "\
# Patterns to ignore when building packages.
.DS_Store
.git/
.gitignore
.bzr/
.bzrignore
.hg/
.hgignore
.svn/
*.swp
*.bak
*.tmp
*.orig
*~
.project
.idea/
*.tmproj
.vscode/
";

const HELPERS_TEMPLATE: &str = r#"{{/*
Expand the name of the chart.
*/}}
{{- define "<CHARTNAME>.name" -}}
{{- default .Chart.Name .Values.nameOverride | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Create a default fully qualified app name.
Truncated at 63 chars because some Kubernetes name fields are limited to this.
If release name contains chart name it will be used as a full name.
*/}}
{{- define "<CHARTNAME>.fullname" -}}
{{- if .Values.fullnameOverride }}
{{- .Values.fullnameOverride | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- $name := default .Chart.Name .Values.nameOverride }}
{{- if contains $name .Release.Name }}
{{- .Release.Name | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- printf "%s-%s" .Release.Name $name | trunc 63 | trimSuffix "-" }}
{{- end }}
{{- end }}
{{- end }}

{{/*
Create chart name and version as used by the chart label.
*/}}
{{- define "<CHARTNAME>.chart" -}}
{{- printf "%s-%s" .Chart.Name .Chart.Version | replace "+" "_" | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Common labels
*/}}
{{- define "<CHARTNAME>.labels" -}}
helm.sh/chart: {{ include "<CHARTNAME>.chart" . }}
{{ include "<CHARTNAME>.selectorLabels" . }}
{{- if .Chart.AppVersion }}
app.kubernetes.io/version: {{ .Chart.AppVersion | quote }}
{{- end }}
app.kubernetes.io/managed-by: {{ .Release.Service }}
{{- end }}

{{/*
Selector labels
*/}}
{{- define "<CHARTNAME>.selectorLabels" -}}
app.kubernetes.io/name: {{ include "<CHARTNAME>.name" . }}
app.kubernetes.io/instance: {{ .Release.Name }}
{{- end }}
"#;

/// `templates/_helpers.tpl` defining the named templates every fragment includes
pub fn helpers_template(chart_name: &str) -> String {
    HELPERS_TEMPLATE.replace("<CHARTNAME>", chart_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chart_yaml() {
        let yaml = ChartFile::new("my-chart").to_yaml().unwrap();
        assert!(yaml.starts_with("apiVersion: v2\nname: my-chart\n"));
        assert!(yaml.contains("type: application"));
        assert!(yaml.contains("version: 0.1.0"));
        assert!(yaml.contains("appVersion: 0.1.0"));
    }

    #[test]
    fn test_helpers_define_every_include() {
        let helpers = helpers_template("my-chart");
        for name in ["name", "fullname", "chart", "labels", "selectorLabels"] {
            assert!(helpers.contains(&format!("define \"my-chart.{}\"", name)));
        }
        assert!(!helpers.contains("<CHARTNAME>"));
    }
}
