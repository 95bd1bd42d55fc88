//! `pybom generate` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use pybom_core::config::PybomConfig;
use pybom_sbom::{
    GenerationReport, SbomGeneratorBuilder, SbomGeneratorConfig, discover_site_packages,
};

use crate::cli::GenerateArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `generate` command.
///
/// The SBOM goes to `--output-file` when given, otherwise to stdout. A summary
/// is printed to stderr only when the SBOM went to a file.
pub fn execute(
    args: GenerateArgs,
    config: &PybomConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let output_file = args.output_file.clone();
    let generator_config = build_generator_config(args, config);

    info!(
        project_dir = %generator_config.project_dir,
        resolve_mode = %generator_config.resolve_mode,
        site_dirs = generator_config.site_packages.len(),
        "starting SBOM generation"
    );

    let generator = SbomGeneratorBuilder::new()
        .config(generator_config)
        .build()?;
    let report = generator.generate()?;
    let json = report.document.to_json_pretty()?;

    match output_file {
        Some(path) => {
            write_sbom(&path, &json)?;
            let summary = GenerateSummary::from_report(&report, Some(&path));
            writer.render_stderr(&summary)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{json}")?;
        }
    }

    Ok(())
}

/// Combine the file configuration with command-line overrides.
///
/// When introspection is enabled and no site-packages directory is known,
/// the configured interpreter is asked for its search path. A failed
/// lookup is logged and generation continues with no site directories.
pub fn build_generator_config(args: GenerateArgs, config: &PybomConfig) -> SbomGeneratorConfig {
    let mut generator_config = SbomGeneratorConfig::from_core(&config.sbom);

    if let Some(dir) = args.project_dir {
        generator_config.project_dir = dir.display().to_string();
    }
    if let Some(mode) = args.resolve_mode {
        generator_config.resolve_mode = mode.into();
    }
    if !args.site_packages.is_empty() {
        generator_config.site_packages = args
            .site_packages
            .iter()
            .map(|p| p.display().to_string())
            .collect();
    }
    if let Some(python) = args.python {
        generator_config.python = python;
    }
    if args.no_freeze {
        generator_config.enable_freeze = false;
    }
    if args.no_introspection {
        generator_config.enable_introspection = false;
    }

    if generator_config.enable_introspection && generator_config.site_packages.is_empty() {
        match discover_site_packages(&generator_config.python) {
            Ok(dirs) => generator_config.site_packages = dirs,
            Err(e) => {
                warn!(
                    python = %generator_config.python,
                    error = %e,
                    "site-packages discovery failed, continuing without installed metadata"
                );
            }
        }
    }

    generator_config
}

fn write_sbom(path: &Path, json: &str) -> Result<(), CliError> {
    let mut content = String::with_capacity(json.len() + 1);
    content.push_str(json);
    content.push('\n');
    std::fs::write(path, content)?;
    info!(path = %path.display(), bytes = json.len(), "SBOM written");
    Ok(())
}

/// Generation summary shown after writing the SBOM to a file.
#[derive(Debug, Serialize)]
pub struct GenerateSummary {
    /// Output file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Root project name
    pub project: String,
    /// Root project version
    pub version: String,
    /// Document serial number
    pub serial_number: String,
    /// Number of packages in the merged catalog
    pub catalog_size: usize,
    /// Entries in `components` (the `metadata.component` root is not counted)
    pub components: usize,
    /// Dependency edges in the document
    pub dependency_edges: usize,
    /// Packages contributed by each source
    pub sources: Vec<SourceCount>,
    /// Sources that failed and were treated as empty
    pub failed_sources: Vec<String>,
}

/// Per-source package count.
#[derive(Debug, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub packages: usize,
}

impl GenerateSummary {
    pub fn from_report(report: &GenerationReport, output: Option<&Path>) -> Self {
        Self {
            output: output.map(Path::to_path_buf),
            project: report.root.name.clone(),
            version: report.root.version.clone(),
            serial_number: report.document.serial_number.clone(),
            catalog_size: report.catalog_size,
            components: report.document.component_count(),
            dependency_edges: report.document.edge_count(),
            sources: report
                .source_counts
                .iter()
                .map(|(source, packages)| SourceCount {
                    source: source.clone(),
                    packages: *packages,
                })
                .collect(),
            failed_sources: report.failed_sources.clone(),
        }
    }
}

impl Render for GenerateSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "SBOM generated for {} {}",
            self.project.bold(),
            self.version
        )?;
        if let Some(ref output) = self.output {
            writeln!(w, "  Output:       {}", output.display())?;
        }
        writeln!(w, "  Serial:       {}", self.serial_number)?;
        writeln!(w, "  Catalog:      {} packages", self.catalog_size)?;
        writeln!(
            w,
            "  Components:   {}",
            self.components.to_string().green()
        )?;
        writeln!(w, "  Dependencies: {} edges", self.dependency_edges)?;

        if !self.sources.is_empty() {
            writeln!(w, "  Sources:")?;
            for s in &self.sources {
                writeln!(w, "    {:<14} {}", s.source, s.packages)?;
            }
        }

        for failed in &self.failed_sources {
            writeln!(w, "  {} {} (treated as empty)", "Failed:".yellow(), failed)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> GenerateSummary {
        GenerateSummary {
            output: Some(PathBuf::from("bom.json")),
            project: "demo".to_owned(),
            version: "1.0.0".to_owned(),
            serial_number: "urn:uuid:00000000-0000-0000-0000-000000000000".to_owned(),
            catalog_size: 3,
            components: 3,
            dependency_edges: 2,
            sources: vec![
                SourceCount {
                    source: "introspection".to_owned(),
                    packages: 2,
                },
                SourceCount {
                    source: "manifest".to_owned(),
                    packages: 1,
                },
            ],
            failed_sources: vec!["freeze".to_owned()],
        }
    }

    #[test]
    fn test_summary_render_text() {
        let mut buffer = Vec::new();
        summary()
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("demo"));
        assert!(output.contains("bom.json"));
        assert!(output.contains("introspection"));
        assert!(output.contains("freeze"));
        assert!(output.contains("2 edges"));
    }

    #[test]
    fn test_summary_json_fields() {
        let json = serde_json::to_string(&summary()).expect("serialize");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["project"], "demo");
        assert_eq!(parsed["components"], 3);
        assert_eq!(parsed["sources"][1]["source"], "manifest");
        assert_eq!(parsed["failed_sources"][0], "freeze");
    }

    #[test]
    fn test_cli_overrides_replace_config_values() {
        let args = GenerateArgs {
            project_dir: Some(PathBuf::from("/tmp/project")),
            output_file: None,
            resolve_mode: Some(crate::cli::ResolveModeArg::Transitive),
            site_packages: vec![PathBuf::from("/tmp/site")],
            python: Some("python3.11".to_owned()),
            no_freeze: true,
            no_introspection: false,
        };

        let config = build_generator_config(args, &PybomConfig::default());

        assert_eq!(config.project_dir, "/tmp/project");
        assert_eq!(config.resolve_mode, pybom_sbom::ResolveMode::Transitive);
        assert_eq!(config.site_packages, vec!["/tmp/site".to_owned()]);
        assert_eq!(config.python, "python3.11");
        assert!(!config.enable_freeze);
        assert!(config.enable_introspection);
    }

    #[test]
    fn test_no_introspection_skips_discovery() {
        let args = GenerateArgs {
            project_dir: None,
            output_file: None,
            resolve_mode: None,
            site_packages: Vec::new(),
            python: Some("/nonexistent/python-for-test".to_owned()),
            no_freeze: false,
            no_introspection: true,
        };

        let config = build_generator_config(args, &PybomConfig::default());

        assert!(!config.enable_introspection);
        assert!(config.site_packages.is_empty());
        assert_eq!(config.resolve_mode, pybom_sbom::ResolveMode::Direct);
    }

    #[test]
    fn test_failed_discovery_leaves_site_packages_empty() {
        let args = GenerateArgs {
            project_dir: None,
            output_file: None,
            resolve_mode: None,
            site_packages: Vec::new(),
            python: Some("/nonexistent/python-for-test".to_owned()),
            no_freeze: true,
            no_introspection: false,
        };

        let config = build_generator_config(args, &PybomConfig::default());

        assert!(config.enable_introspection);
        assert!(config.site_packages.is_empty());
    }
}
