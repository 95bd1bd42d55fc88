//! Integration tests for `pybom generate` command.
//!
//! Builds a project directory and a site-packages directory on disk,
//! runs the command handler and inspects the written CycloneDX file.

use std::fs;
use std::path::{Path, PathBuf};

use pybom_cli::cli::{GenerateArgs, OutputFormat, ResolveModeArg};
use pybom_cli::commands::generate;
use pybom_cli::output::OutputWriter;
use pybom_core::config::PybomConfig;
use tempfile::TempDir;

fn write_dist_info(site: &Path, name: &str, version: &str, requires: &[&str]) {
    let dir = site.join(format!("{}-{}.dist-info", name.replace('-', "_"), version));
    fs::create_dir_all(&dir).expect("create dist-info");
    let mut metadata = format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n");
    for req in requires {
        metadata.push_str(&format!("Requires-Dist: {req}\n"));
    }
    fs::write(dir.join("METADATA"), metadata).expect("write METADATA");
}

struct Fixture {
    project: TempDir,
    site: TempDir,
    out: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let project = TempDir::new().expect("project dir");
        let site = TempDir::new().expect("site dir");
        let out = TempDir::new().expect("output dir");

        fs::write(
            project.path().join("pyproject.toml"),
            r#"
[project]
name = "cli-demo"
version = "0.3.0"
dependencies = ["requests>=2.31.0", "python>=3.10"]
"#,
        )
        .expect("write pyproject");

        write_dist_info(site.path(), "requests", "2.31.0", &["idna<4,>=2.5"]);
        write_dist_info(site.path(), "idna", "3.6", &["six>=1.16"]);
        write_dist_info(site.path(), "six", "1.16.0", &[]);

        Self { project, site, out }
    }

    fn args(&self, mode: Option<ResolveModeArg>) -> GenerateArgs {
        GenerateArgs {
            project_dir: Some(self.project.path().to_path_buf()),
            output_file: Some(self.output_path()),
            resolve_mode: mode,
            site_packages: vec![self.site.path().to_path_buf()],
            python: None,
            no_freeze: true,
            no_introspection: false,
        }
    }

    fn output_path(&self) -> PathBuf {
        self.out.path().join("bom.json")
    }

    fn read_output(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.output_path()).expect("SBOM file written");
        serde_json::from_str(&content).expect("SBOM is valid JSON")
    }
}

fn depends_on(doc: &serde_json::Value, reference: &str) -> Vec<String> {
    doc["dependencies"]
        .as_array()
        .expect("dependencies array")
        .iter()
        .find(|d| d["ref"] == reference)
        .map(|d| {
            d["dependsOn"]
                .as_array()
                .expect("dependsOn array")
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_generate_writes_cyclonedx_file() {
    let fixture = Fixture::new();
    let writer = OutputWriter::new(OutputFormat::Json);

    generate::execute(fixture.args(None), &PybomConfig::default(), &writer)
        .expect("generation should succeed");

    let doc = fixture.read_output();
    assert_eq!(doc["bomFormat"], "CycloneDX");
    assert_eq!(doc["specVersion"], "1.5");
    assert_eq!(doc["metadata"]["component"]["name"], "cli-demo");
    assert_eq!(doc["metadata"]["component"]["purl"], "pkg:pypi/cli-demo@0.3.0");

    let purls: Vec<&str> = doc["components"]
        .as_array()
        .expect("components array")
        .iter()
        .filter_map(|c| c["purl"].as_str())
        .collect();
    assert!(purls.contains(&"pkg:pypi/requests@2.31.0"));
    assert!(purls.contains(&"pkg:pypi/idna@3.6"));
    assert!(!purls.iter().any(|p| p.starts_with("pkg:pypi/python@")));
}

#[test]
fn test_generate_direct_mode_root_edges() {
    let fixture = Fixture::new();
    let writer = OutputWriter::new(OutputFormat::Text);

    generate::execute(
        fixture.args(Some(ResolveModeArg::Direct)),
        &PybomConfig::default(),
        &writer,
    )
    .expect("generation should succeed");

    let doc = fixture.read_output();
    assert_eq!(
        depends_on(&doc, "pkg:pypi/cli-demo@0.3.0"),
        vec!["pkg:pypi/requests@2.31.0".to_owned()]
    );
    assert_eq!(
        depends_on(&doc, "pkg:pypi/requests@2.31.0"),
        vec!["pkg:pypi/idna@3.6".to_owned()]
    );
}

#[test]
fn test_generate_transitive_mode_expands_chains() {
    let fixture = Fixture::new();
    let writer = OutputWriter::new(OutputFormat::Text);

    generate::execute(
        fixture.args(Some(ResolveModeArg::Transitive)),
        &PybomConfig::default(),
        &writer,
    )
    .expect("generation should succeed");

    let doc = fixture.read_output();
    let requests_edges = depends_on(&doc, "pkg:pypi/requests@2.31.0");
    assert!(requests_edges.contains(&"pkg:pypi/idna@3.6".to_owned()));
    assert!(requests_edges.contains(&"pkg:pypi/six@1.16.0".to_owned()));

    // root statement lists only the declared dependencies
    assert_eq!(
        depends_on(&doc, "pkg:pypi/cli-demo@0.3.0"),
        vec!["pkg:pypi/requests@2.31.0".to_owned()]
    );
}

#[test]
fn test_generate_missing_manifest_exits_with_root_manifest_code() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.project.path().join("pyproject.toml")).expect("remove manifest");
    let writer = OutputWriter::new(OutputFormat::Text);

    let err = generate::execute(fixture.args(None), &PybomConfig::default(), &writer)
        .expect_err("missing root manifest is fatal");
    assert_eq!(err.exit_code(), 3);
    assert!(!fixture.output_path().exists(), "no SBOM should be written");
}

#[test]
fn test_generate_unwritable_output_is_io_error() {
    let fixture = Fixture::new();
    let writer = OutputWriter::new(OutputFormat::Text);
    let mut args = fixture.args(None);
    args.output_file = Some(fixture.out.path().join("no-such-dir").join("bom.json"));

    let err = generate::execute(args, &PybomConfig::default(), &writer)
        .expect_err("writing into a missing directory should fail");
    assert_eq!(err.exit_code(), 10);
}

#[test]
fn test_summary_counts_components_without_metadata_root() {
    let fixture = Fixture::new();
    let config = generate::build_generator_config(fixture.args(None), &PybomConfig::default());
    let report = pybom_sbom::SbomGeneratorBuilder::new()
        .config(config)
        .build()
        .expect("generator should build")
        .generate()
        .expect("generation should succeed");

    let summary = generate::GenerateSummary::from_report(&report, None);

    // requests, idna, six; the root lives only in metadata.component
    assert_eq!(summary.components, 3);
    assert_eq!(summary.components, report.document.components.len());
    assert_eq!(summary.project, "cli-demo");
}
