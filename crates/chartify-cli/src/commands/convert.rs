//! Convert command - turn a manifest stream into a Helm chart

use chartify_convert::{
    ChartOutput, RunOutcome, WriteResult, render_chart, run as run_pipeline, write_chart,
};
use chartify_core::Config;
use console::style;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::error::{CliError, Result};
use crate::exit_codes;

/// Arguments of `chartify convert`
#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub chart_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub app_name: Option<String>,
    pub image_pull_secrets: bool,
    pub cluster_domain: Option<String>,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
}

pub async fn run(args: ConvertArgs) -> Result<()> {
    let config = build_config(&args)?;
    let sources = collect_sources(&args.files)?;
    let input = open_input(&sources)?;

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received");
            interrupt.cancel();
        }
    });

    let chart = match run_pipeline(input, config, token).await? {
        RunOutcome::Completed(chart) => chart,
        RunOutcome::Cancelled => {
            eprintln!(
                "  {} {}",
                style("✗").red().bold(),
                style("Interrupted, no files were written").dim()
            );
            std::process::exit(exit_codes::INTERRUPTED);
        }
    };

    if args.dry_run {
        print_chart(&chart)?;
        return Ok(());
    }

    print_header(&sources, &args.chart_dir);
    let result = write_chart(&args.chart_dir, &chart)?;
    print_files(&result);
    print_summary(&chart);
    print_next_steps(&args.chart_dir);

    Ok(())
}

/// Options file, then flags; the chart is named after its directory
fn build_config(args: &ConvertArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).map_err(|e| {
            CliError::usage_with_help(
                format!("cannot load options from {}: {}", path.display(), e),
                "expected YAML with chartName, appName, imagePullSecrets or clusterDomain",
            )
        })?,
        None => Config::default(),
    };

    let chart_name = args
        .chart_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            CliError::usage(format!("'{}' does not name a directory", args.chart_dir.display()))
        })?;
    config.chart_name = chart_name.to_string();

    if args.app_name.is_some() {
        config.app_name = args.app_name.clone();
    }
    if args.image_pull_secrets {
        config.image_pull_secrets = true;
    }
    if let Some(domain) = &args.cluster_domain {
        config.cluster_domain = domain.clone();
    }

    Ok(config)
}

/// Manifest files in the order given; directories contribute their
/// `*.yaml`/`*.yml` files sorted by path
fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(CliError::usage(format!("{} does not exist", path.display())));
        }
        if !path.is_dir() {
            sources.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_manifest(p))
            .collect();
        found.sort();
        tracing::debug!(dir = %path.display(), files = found.len(), "collected manifests");
        sources.extend(found);
    }
    Ok(sources)
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// One YAML stream over every source, or stdin
fn open_input(sources: &[PathBuf]) -> Result<Box<dyn Read + Send>> {
    if sources.is_empty() {
        return Ok(Box::new(std::io::stdin()));
    }

    let mut stream = String::new();
    for source in sources {
        let content = fs::read_to_string(source).map_err(|e| CliError::Io {
            message: format!("{}: {}", source.display(), e),
        })?;
        if !stream.is_empty() {
            stream.push_str("\n---\n");
        }
        stream.push_str(&content);
    }
    Ok(Box::new(Cursor::new(stream.into_bytes())))
}

/// Dry run: every chart file to stdout, `# Source:` headed like `helm template`
fn print_chart(chart: &ChartOutput) -> Result<()> {
    let chart_dir = Path::new(&chart.chart_name);
    for (i, (path, content)) in render_chart(chart)?.into_iter().enumerate() {
        if i > 0 {
            println!("---");
        }
        println!("# Source: {}", chart_dir.join(path).display());
        print!("{}", content);
    }
    Ok(())
}

fn print_header(sources: &[PathBuf], chart_dir: &Path) {
    println!();
    println!(
        "  {} {} {}",
        style("Chartify").bold().cyan(),
        style("─").dim(),
        style("manifests → Helm chart").dim()
    );
    println!();
    let source = if sources.is_empty() {
        "stdin".to_string()
    } else if sources.len() == 1 {
        sources[0].display().to_string()
    } else {
        format!("{} files", sources.len())
    };
    println!("  {} {}", style("Source:").dim(), style(source).cyan());
    println!(
        "  {} {} {}",
        style("Target:").dim(),
        style(chart_dir.display()).green(),
        style("(Helm chart)").dim()
    );
    println!();
}

fn print_files(result: &WriteResult) {
    println!("  {}", style("Chart Files").bold());
    println!("  {}", style("───────────").dim());

    for file in &result.written {
        println!("  {} {}", style("✓").green().bold(), file.display());
    }
    for file in &result.kept {
        println!(
            "  {} {} {}",
            style("○").yellow(),
            file.display(),
            style("(kept)").dim()
        );
    }
    println!();
}

fn print_summary(chart: &ChartOutput) {
    let templates = chart.fragments.len();
    let keys = chart.values.len();

    println!("  {}", style("Summary").bold());
    println!("  {}", style("───────").dim());
    println!(
        "  {} {} templated",
        style(format!("{:>3}", templates)).green().bold(),
        if templates == 1 { "object" } else { "objects" }
    );
    println!(
        "  {} top-level value{}",
        style(format!("{:>3}", keys)).blue().bold(),
        if keys == 1 { "" } else { "s" }
    );
    println!();
}

fn print_next_steps(chart_dir: &Path) {
    println!("  {}", style("Next Steps").bold());
    println!("  {}", style("──────────").dim());
    println!(
        "  {} {}",
        style("1.").dim(),
        style(format!("helm lint {}", chart_dir.display())).cyan()
    );
    println!(
        "  {} {}",
        style("2.").dim(),
        style(format!("helm template test-release {}", chart_dir.display())).cyan()
    );
    println!();
}
