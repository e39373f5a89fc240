//! Output sink
//!
//! Lays a [`ChartOutput`] out as chart files. `values.yaml` and the
//! templates are regenerated on every run; `Chart.yaml`, `.helmignore` and
//! `templates/_helpers.tpl` are only created when missing, so edits made to
//! them by hand survive a re-run.

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chart::{ChartFile, HELMIGNORE, helpers_template};
use crate::context::ChartOutput;
use crate::error::{ConvertError, Result};

const TEMPLATES_DIR: &str = "templates";
const HELPERS_FILE: &str = "_helpers.tpl";
const DOCUMENT_SEPARATOR: &str = "---\n";

/// Files touched by [`write_chart`], relative to the chart directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Files created or overwritten
    pub written: Vec<PathBuf>,
    /// Scaffold files that already existed and were left alone
    pub kept: Vec<PathBuf>,
}

/// A chart file and whether an existing copy takes precedence
struct ChartEntry {
    path: PathBuf,
    content: String,
    scaffold: bool,
}

/// Render every chart file as `(relative path, content)`
///
/// Fragments sharing an output name are joined into one multi-document
/// file, in submission order.
pub fn render_chart(chart: &ChartOutput) -> Result<Vec<(PathBuf, String)>> {
    Ok(entries(chart)?
        .into_iter()
        .map(|entry| (entry.path, entry.content))
        .collect())
}

/// Write the chart under `dir`, creating it if needed
pub fn write_chart(dir: &Path, chart: &ChartOutput) -> Result<WriteResult> {
    if dir.exists() && !dir.is_dir() {
        return Err(ConvertError::OutputExists(dir.to_path_buf()));
    }
    fs::create_dir_all(dir.join(TEMPLATES_DIR))?;

    let mut result = WriteResult::default();
    for entry in entries(chart)? {
        let target = dir.join(&entry.path);
        if entry.scaffold && target.exists() {
            tracing::debug!(path = %target.display(), "keeping existing file");
            result.kept.push(entry.path);
            continue;
        }
        fs::write(&target, entry.content)?;
        tracing::debug!(path = %target.display(), "wrote file");
        result.written.push(entry.path);
    }

    tracing::info!(
        dir = %dir.display(),
        written = result.written.len(),
        kept = result.kept.len(),
        "chart written"
    );
    Ok(result)
}

fn entries(chart: &ChartOutput) -> Result<Vec<ChartEntry>> {
    let templates = Path::new(TEMPLATES_DIR);
    let mut entries = vec![
        ChartEntry {
            path: PathBuf::from("Chart.yaml"),
            content: ChartFile::new(&chart.chart_name).to_yaml()?,
            scaffold: true,
        },
        ChartEntry {
            path: PathBuf::from(".helmignore"),
            content: HELMIGNORE.to_string(),
            scaffold: true,
        },
        ChartEntry {
            path: templates.join(HELPERS_FILE),
            content: helpers_template(&chart.chart_name),
            scaffold: true,
        },
        ChartEntry {
            path: PathBuf::from("values.yaml"),
            content: chart.values.to_yaml()?,
            scaffold: false,
        },
    ];

    let mut files: IndexMap<&str, String> = IndexMap::new();
    for fragment in &chart.fragments {
        let content = files.entry(fragment.output_name.as_str()).or_default();
        if !content.is_empty() {
            content.push_str(DOCUMENT_SEPARATOR);
        }
        content.push_str(&fragment.text);
    }
    entries.extend(files.into_iter().map(|(name, content)| ChartEntry {
        path: templates.join(name),
        content,
        scaffold: false,
    }));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Fragment;
    use chartify_core::Values;
    use tempfile::TempDir;

    fn chart() -> ChartOutput {
        let mut values = Values::new();
        values.set_at_path("nginx", &["web", "app", "image", "repository"]).unwrap();
        ChartOutput {
            chart_name: "my-chart".to_string(),
            fragments: vec![
                Fragment::new("manager-rbac.yaml", "kind: ClusterRole\n".to_string(), Values::new()),
                Fragment::new("web-deployment.yaml", "kind: Deployment\n".to_string(), Values::new()),
                Fragment::new(
                    "manager-rbac.yaml",
                    "kind: ClusterRoleBinding\n".to_string(),
                    Values::new(),
                ),
            ],
            values,
        }
    }

    #[test]
    fn test_render_groups_fragments() {
        let files = render_chart(&chart()).unwrap();
        let names: Vec<_> = files.iter().map(|(p, _)| p.to_string_lossy().into_owned()).collect();
        assert_eq!(
            names,
            vec![
                "Chart.yaml",
                ".helmignore",
                "templates/_helpers.tpl",
                "values.yaml",
                "templates/manager-rbac.yaml",
                "templates/web-deployment.yaml",
            ]
        );
        assert_eq!(files[4].1, "kind: ClusterRole\n---\nkind: ClusterRoleBinding\n");
        assert!(files[2].1.contains("define \"my-chart.fullname\""));
        assert!(files[3].1.contains("repository: nginx"));
    }

    #[test]
    fn test_write_creates_chart() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("my-chart");

        let result = write_chart(&dir, &chart()).unwrap();
        assert_eq!(result.written.len(), 6);
        assert!(result.kept.is_empty());

        let chart_yaml = fs::read_to_string(dir.join("Chart.yaml")).unwrap();
        assert_eq!(chart_yaml, ChartFile::new("my-chart").to_yaml().unwrap());
        assert!(dir.join("templates/web-deployment.yaml").exists());
    }

    #[test]
    fn test_rewrite_keeps_scaffold() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write_chart(dir, &chart()).unwrap();

        fs::write(dir.join("Chart.yaml"), "apiVersion: v2\nname: my-chart\nversion: 2.0.0\n").unwrap();
        fs::write(dir.join("values.yaml"), "stale: true\n").unwrap();

        let result = write_chart(dir, &chart()).unwrap();
        assert_eq!(
            result.kept,
            vec![
                PathBuf::from("Chart.yaml"),
                PathBuf::from(".helmignore"),
                Path::new(TEMPLATES_DIR).join(HELPERS_FILE),
            ]
        );
        assert!(fs::read_to_string(dir.join("Chart.yaml")).unwrap().contains("2.0.0"));
        assert!(!fs::read_to_string(dir.join("values.yaml")).unwrap().contains("stale"));
    }

    #[test]
    fn test_output_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("chart");
        fs::write(&file, "").unwrap();

        let err = write_chart(&file, &chart()).unwrap_err();
        assert!(matches!(err, ConvertError::OutputExists(_)));
    }
}
