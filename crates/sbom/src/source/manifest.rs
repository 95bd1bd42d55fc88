//! 프로젝트 매니페스트 리더 -- pyproject.toml, poetry.lock
//!
//! [`ManifestReader`]는 프로젝트 매니페스트에 선언된 의존성과 lock 파일에
//! 고정된 패키지를 읽습니다.
//!
//! # 지원 형식
//!
//! ```toml
//! # Poetry
//! [tool.poetry.dependencies]
//! python = "^3.10"
//! requests = "^2.31"
//! rich = { version = "^13.7", optional = true }
//!
//! [tool.poetry.group.test.dependencies]
//! pytest = "^8.0"
//!
//! # PEP 621
//! [project]
//! dependencies = ["beautifulsoup4>=4.12.0", "httpx==0.27.0"]
//! ```
//!
//! 두 형식이 모두 있으면 Poetry 의존성이 우선합니다.
//! lock 파일의 `[[package]]` 항목은 같은 키의 매니페스트 버전을 덮어씁니다.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::MetadataSource;
use crate::error::SbomGeneratorError;
use crate::types::{Origin, PackageKey, PackageRecord, PartialCatalog, RequirementRef, RootProject};

/// 루트 프로젝트 버전이 없을 때 사용하는 값
pub const DEFAULT_PROJECT_VERSION: &str = "0.1.0";

/// pyproject.toml 구조 (파싱용)
#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    project: Option<ProjectTable>,
    #[serde(default)]
    tool: Option<ToolTable>,
}

/// PEP 621 `[project]` 테이블
#[derive(Debug, Default, Deserialize)]
struct ProjectTable {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    #[serde(default)]
    poetry: Option<PoetryTable>,
}

/// `[tool.poetry]` 테이블
#[derive(Debug, Default, Deserialize)]
struct PoetryTable {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: toml::Table,
    #[serde(default, rename = "dev-dependencies")]
    dev_dependencies: toml::Table,
    #[serde(default)]
    group: toml::Table,
}

/// poetry.lock 구조 (파싱용)
#[derive(Debug, Deserialize)]
struct PoetryLock {
    #[serde(default)]
    package: Vec<LockPackage>,
}

/// poetry.lock 내 개별 패키지 (파싱용)
#[derive(Debug, Deserialize)]
struct LockPackage {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: toml::Table,
}

impl PoetryTable {
    /// 의존성 테이블을 선언 순서대로 반환합니다 (dependencies, dev-dependencies, group).
    fn dependency_tables(&self) -> Vec<&toml::Table> {
        let mut tables = vec![&self.dependencies, &self.dev_dependencies];
        for group in self.group.values() {
            if let Some(deps) = group.get("dependencies").and_then(toml::Value::as_table) {
                tables.push(deps);
            }
        }
        tables
    }

    fn declares_dependencies(&self) -> bool {
        self.dependency_tables().iter().any(|t| !t.is_empty())
    }
}

impl PyProject {
    fn parse(content: &str, source_path: &str) -> Result<Self, SbomGeneratorError> {
        toml::from_str(content).map_err(|e| SbomGeneratorError::Manifest {
            path: source_path.to_owned(),
            reason: e.to_string(),
        })
    }

    fn poetry(&self) -> Option<&PoetryTable> {
        self.tool.as_ref().and_then(|t| t.poetry.as_ref())
    }

    /// 선언된 의존성을 `(원본 이름, 버전)` 목록으로 반환합니다.
    ///
    /// Poetry 의존성이 있으면 Poetry를, 없으면 PEP 621 목록을 사용합니다.
    fn declared_dependencies(&self) -> Vec<(String, Option<String>)> {
        if let Some(poetry) = self.poetry().filter(|p| p.declares_dependencies()) {
            return poetry
                .dependency_tables()
                .into_iter()
                .flat_map(|table| table.iter())
                .map(|(name, spec)| (name.clone(), poetry_version(spec)))
                .collect();
        }

        self.project
            .as_ref()
            .map(|p| {
                p.dependencies
                    .iter()
                    .map(|d| parse_pep621_dependency(d))
                    .filter(|(name, _)| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 루트 프로젝트의 런타임 의존성 이름을 선언 순서대로 반환합니다.
    ///
    /// `[tool.poetry.dependencies]`만 사용하며 dev/group 테이블은 제외합니다.
    /// 비어 있으면 PEP 621 `[project].dependencies`를 사용합니다.
    fn runtime_dependency_names(&self) -> Vec<String> {
        if let Some(poetry) = self.poetry().filter(|p| !p.dependencies.is_empty()) {
            return poetry.dependencies.keys().cloned().collect();
        }

        self.project
            .as_ref()
            .map(|p| {
                p.dependencies
                    .iter()
                    .map(|d| parse_pep621_dependency(d).0)
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn project_name(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .or_else(|| self.poetry().and_then(|p| p.name.as_deref()))
            .filter(|n| !n.trim().is_empty())
    }

    fn project_version(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|p| p.version.as_deref())
            .or_else(|| self.poetry().and_then(|p| p.version.as_deref()))
            .filter(|v| !v.trim().is_empty())
    }
}

/// Poetry 의존성 값에서 버전 문자열을 추출합니다.
///
/// 문자열이면 그대로, 인라인 테이블이면 `version` 키를 사용합니다. `*`는 버전 없음으로 취급합니다.
fn poetry_version(spec: &toml::Value) -> Option<String> {
    let version = match spec {
        toml::Value::String(s) => Some(s.as_str()),
        toml::Value::Table(t) => t.get("version").and_then(toml::Value::as_str),
        _ => None,
    }?;
    let version = version.trim();
    if version.is_empty() || version == "*" {
        None
    } else {
        Some(version.to_owned())
    }
}

/// PEP 621 의존성 문자열에서 이름과 버전을 추출합니다.
///
/// 마커(`;` 이후)와 extras(`[...]`)를 제거한 뒤, 이름 다음의 첫 연산자가
/// `>=` 또는 `==`이면 첫 번째 쉼표 구간을 버전으로 사용합니다.
///
/// ```
/// use pybom_sbom::source::manifest::parse_pep621_dependency;
///
/// let (name, version) = parse_pep621_dependency("beautifulsoup4>=4.12.0");
/// assert_eq!(name, "beautifulsoup4");
/// assert_eq!(version.as_deref(), Some("4.12.0"));
/// ```
pub fn parse_pep621_dependency(raw: &str) -> (String, Option<String>) {
    let head = raw.split(';').next().unwrap_or_default().trim();

    let name_len = head
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        .unwrap_or(head.len());
    let name = head[..name_len].trim_end_matches(['.', '_', '-']);
    let mut rest = head[name.len()..].trim_start();

    // extras
    if rest.starts_with('[') {
        rest = match rest.find(']') {
            Some(end) => rest[end + 1..].trim_start(),
            None => "",
        };
    }
    let rest = rest.trim_start_matches('(').trim_end_matches(')').trim();

    let version = [">=", "=="]
        .iter()
        .find_map(|op| rest.strip_prefix(op))
        .and_then(|bound| bound.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    (name.to_owned(), version)
}

/// lock 파일 `[package.dependencies]` 값을 요구사항으로 변환합니다.
fn lock_requirements(name: &str, spec: &toml::Value) -> Vec<RequirementRef> {
    let from_table = |t: &toml::Table| RequirementRef {
        name: name.to_owned(),
        version_constraint: t
            .get("version")
            .and_then(toml::Value::as_str)
            .map(str::to_owned),
        environment_marker: t
            .get("markers")
            .and_then(toml::Value::as_str)
            .map(str::to_owned),
    };

    match spec {
        toml::Value::String(s) => vec![RequirementRef {
            name: name.to_owned(),
            version_constraint: Some(s.clone()).filter(|s| s.as_str() != "*"),
            environment_marker: None,
        }],
        toml::Value::Table(t) => vec![from_table(t)],
        toml::Value::Array(items) => items
            .iter()
            .filter_map(toml::Value::as_table)
            .map(from_table)
            .collect(),
        _ => vec![RequirementRef::bare(name)],
    }
}

/// pyproject.toml 내용을 부분 카탈로그로 변환합니다.
///
/// 매니페스트 항목은 요구사항이 없으며, 같은 키가 반복되면 첫 항목을 유지합니다.
pub fn parse_manifest(
    content: &str,
    source_path: &str,
) -> Result<PartialCatalog, SbomGeneratorError> {
    let pyproject = PyProject::parse(content, source_path)?;
    let mut packages = PartialCatalog::new();

    for (name, version) in pyproject.declared_dependencies() {
        let key = PackageKey::new(&name);
        packages
            .entry(key.clone())
            .or_insert_with(|| PackageRecord::new(key, version, Origin::Manifest));
    }

    Ok(packages)
}

/// poetry.lock 내용을 부분 카탈로그로 변환합니다.
pub fn parse_lock(content: &str, source_path: &str) -> Result<PartialCatalog, SbomGeneratorError> {
    let lock: PoetryLock = toml::from_str(content).map_err(|e| SbomGeneratorError::Manifest {
        path: source_path.to_owned(),
        reason: e.to_string(),
    })?;

    let mut packages = PartialCatalog::new();
    for pkg in lock.package {
        let key = PackageKey::new(&pkg.name);
        if packages.contains_key(&key) {
            debug!(package = %key, path = source_path, "duplicate lock entry, keeping first");
            continue;
        }
        let mut record = PackageRecord::new(key.clone(), Some(pkg.version), Origin::Manifest);
        record.requirements = pkg
            .dependencies
            .iter()
            .flat_map(|(name, spec)| lock_requirements(name, spec))
            .collect();
        packages.insert(key, record);
    }

    Ok(packages)
}

/// pyproject.toml / poetry.lock 리더
pub struct ManifestReader {
    /// 매니페스트 경로
    manifest_path: PathBuf,
    /// lock 파일 경로 (없으면 lock 미사용)
    lock_path: Option<PathBuf>,
}

impl ManifestReader {
    /// 매니페스트와 선택적 lock 파일 경로로 리더를 생성합니다.
    pub fn new(manifest_path: impl Into<PathBuf>, lock_path: Option<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            lock_path,
        }
    }

    /// 매니페스트 경로를 반환합니다.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    fn read_root_manifest(&self) -> Result<PyProject, SbomGeneratorError> {
        let path = self.manifest_path.display().to_string();
        let content =
            fs::read_to_string(&self.manifest_path).map_err(|e| SbomGeneratorError::RootManifest {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        PyProject::parse(&content, &path).map_err(|e| SbomGeneratorError::RootManifest {
            path,
            reason: e.to_string(),
        })
    }

    /// 루트 프로젝트의 직접 의존성 이름을 선언 순서대로 반환합니다.
    ///
    /// dev/group 의존성은 카탈로그에만 포함되고 여기서는 제외됩니다.
    ///
    /// # Errors
    ///
    /// 매니페스트를 읽거나 파싱할 수 없으면 `SbomGeneratorError::RootManifest` 반환
    pub fn declared_dependency_names(&self) -> Result<Vec<String>, SbomGeneratorError> {
        let pyproject = self.read_root_manifest()?;
        Ok(pyproject.runtime_dependency_names())
    }

    /// 루트 프로젝트 정보를 읽습니다.
    ///
    /// 이름은 `[project].name`, `[tool.poetry].name`, 프로젝트 디렉토리 이름 순으로,
    /// 버전은 없으면 [`DEFAULT_PROJECT_VERSION`]을 사용합니다.
    ///
    /// # Errors
    ///
    /// 매니페스트를 읽거나 파싱할 수 없으면 `SbomGeneratorError::RootManifest` 반환
    pub fn read_root_project(&self) -> Result<RootProject, SbomGeneratorError> {
        let pyproject = self.read_root_manifest()?;

        let name = match pyproject.project_name() {
            Some(name) => name.to_owned(),
            None => {
                let fallback = self.project_dir_name();
                debug!(name = %fallback, "project name missing from manifest, using directory name");
                fallback
            }
        };
        let version = pyproject
            .project_version()
            .unwrap_or(DEFAULT_PROJECT_VERSION)
            .to_owned();
        let direct_dependencies = pyproject.runtime_dependency_names();

        Ok(RootProject {
            name,
            version,
            direct_dependencies,
        })
    }

    fn project_dir_name(&self) -> String {
        let dir = self
            .manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::canonicalize(dir)
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .unwrap_or_else(|| "project".to_owned())
    }
}

impl MetadataSource for ManifestReader {
    fn origin(&self) -> Origin {
        Origin::Manifest
    }

    fn read(&self) -> Result<PartialCatalog, SbomGeneratorError> {
        let mut packages = match fs::read_to_string(&self.manifest_path) {
            Ok(content) => {
                let path = self.manifest_path.display().to_string();
                parse_manifest(&content, &path).unwrap_or_else(|e| {
                    warn!(error = %e, "malformed manifest, ignoring declared dependencies");
                    PartialCatalog::new()
                })
            }
            Err(e) => {
                debug!(path = %self.manifest_path.display(), error = %e, "manifest not readable, skipping");
                PartialCatalog::new()
            }
        };

        let Some(lock_path) = &self.lock_path else {
            return Ok(packages);
        };
        let content = match fs::read_to_string(lock_path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %lock_path.display(), error = %e, "lock file not readable, skipping");
                return Ok(packages);
            }
        };

        match parse_lock(&content, &lock_path.display().to_string()) {
            Ok(locked) => {
                debug!(path = %lock_path.display(), packages = locked.len(), "lock file read");
                // lock 항목이 매니페스트 항목을 덮어씀
                packages.extend(locked);
            }
            Err(e) => warn!(error = %e, "unparseable lock file, ignoring"),
        }

        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POETRY_MANIFEST: &str = r#"
[tool.poetry]
name = "demo-app"
version = "1.4.0"

[tool.poetry.dependencies]
python = "^3.10"
requests = "^2.31"
Rich = { version = "^13.7", optional = true }
anything = "*"

[tool.poetry.dev-dependencies]
pytest = "^8.0"

[tool.poetry.group.lint.dependencies]
ruff = "0.4.1"
"#;

    const PEP621_MANIFEST: &str = r#"
[project]
name = "scraper"
version = "0.2.0"
dependencies = [
    "beautifulsoup4>=4.12.0",
    "httpx[http2]==0.27.0 ; python_version >= '3.8'",
    "lxml",
    "urllib3>=1.26,<3",
    "zope.interface~=6.0",
]
"#;

    const LOCK: &str = r#"
[[package]]
name = "requests"
version = "2.31.0"

[package.dependencies]
certifi = ">=2017.4.17"
idna = ">=2.5,<4"
PySocks = { version = ">=1.5.6,!=1.5.7", optional = true, markers = "extra == \"socks\"" }

[[package]]
name = "certifi"
version = "2024.2.2"
"#;

    #[test]
    fn poetry_dependencies_in_declaration_order() {
        let pyproject = PyProject::parse(POETRY_MANIFEST, "pyproject.toml").unwrap();
        let deps = pyproject.declared_dependencies();
        let names: Vec<&str> = deps.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["python", "requests", "Rich", "anything", "pytest", "ruff"]
        );
        assert_eq!(deps[2].1.as_deref(), Some("^13.7"));
        assert_eq!(deps[3].1, None);
    }

    #[test]
    fn pep621_dependencies_extract_bounds() {
        let packages = parse_manifest(PEP621_MANIFEST, "pyproject.toml").unwrap();
        let version = |name: &str| packages[&PackageKey::new(name)].version.clone();

        assert_eq!(version("beautifulsoup4").as_deref(), Some("4.12.0"));
        assert_eq!(version("httpx").as_deref(), Some("0.27.0"));
        assert_eq!(version("lxml"), None);
        assert_eq!(version("urllib3").as_deref(), Some("1.26"));
        assert_eq!(version("zope-interface"), None);
        assert!(packages.values().all(|r| r.origin == Origin::Manifest));
    }

    #[test]
    fn parse_pep621_dependency_cases() {
        assert_eq!(
            parse_pep621_dependency("beautifulsoup4>=4.12.0"),
            ("beautifulsoup4".to_owned(), Some("4.12.0".to_owned()))
        );
        assert_eq!(
            parse_pep621_dependency("numpy == 1.26.4"),
            ("numpy".to_owned(), Some("1.26.4".to_owned()))
        );
        assert_eq!(
            parse_pep621_dependency("six (>=1.5)"),
            ("six".to_owned(), Some("1.5".to_owned()))
        );
        assert_eq!(parse_pep621_dependency("rich<14"), ("rich".to_owned(), None));
        assert_eq!(parse_pep621_dependency(""), (String::new(), None));
    }

    #[test]
    fn poetry_wins_over_pep621() {
        let content = r#"
[project]
name = "both"
dependencies = ["flask>=3.0"]

[tool.poetry.dependencies]
django = "5.0.3"
"#;
        let packages = parse_manifest(content, "pyproject.toml").unwrap();
        assert!(packages.contains_key(&PackageKey::new("django")));
        assert!(!packages.contains_key(&PackageKey::new("flask")));
    }

    #[test]
    fn poetry_without_dependencies_defers_to_pep621() {
        let content = r#"
[project]
name = "poetry2"
dependencies = ["flask>=3.0"]

[tool.poetry]
packages = [{ include = "poetry2" }]
"#;
        let packages = parse_manifest(content, "pyproject.toml").unwrap();
        assert!(packages.contains_key(&PackageKey::new("flask")));
    }

    #[test]
    fn lock_entries_carry_requirements() {
        let packages = parse_lock(LOCK, "poetry.lock").unwrap();
        let requests = &packages[&PackageKey::new("requests")];
        assert_eq!(requests.version.as_deref(), Some("2.31.0"));
        assert_eq!(requests.requirements.len(), 3);

        let socks = &requests.requirements[2];
        assert_eq!(socks.name, "PySocks");
        assert_eq!(socks.version_constraint.as_deref(), Some(">=1.5.6,!=1.5.7"));
        assert_eq!(socks.environment_marker.as_deref(), Some("extra == \"socks\""));
    }

    #[test]
    fn malformed_lock_is_error() {
        let err = parse_lock("[[package]\nname=", "poetry.lock").unwrap_err();
        assert!(matches!(err, SbomGeneratorError::Manifest { .. }));
    }

    #[test]
    fn reader_lock_overrides_manifest_versions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), POETRY_MANIFEST).unwrap();
        fs::write(dir.path().join("poetry.lock"), LOCK).unwrap();

        let reader = ManifestReader::new(
            dir.path().join("pyproject.toml"),
            Some(dir.path().join("poetry.lock")),
        );
        let packages = reader.read().unwrap();

        let requests = &packages[&PackageKey::new("requests")];
        assert_eq!(requests.version.as_deref(), Some("2.31.0"));
        assert!(packages.contains_key(&PackageKey::new("certifi")));
        assert!(packages.contains_key(&PackageKey::new("ruff")));
    }

    #[test]
    fn reader_missing_files_yield_empty_result() {
        let dir = TempDir::new().unwrap();
        let reader = ManifestReader::new(
            dir.path().join("pyproject.toml"),
            Some(dir.path().join("poetry.lock")),
        );
        assert!(reader.read().unwrap().is_empty());
    }

    #[test]
    fn reader_ignores_unparseable_lock() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), PEP621_MANIFEST).unwrap();
        fs::write(dir.path().join("poetry.lock"), "not [valid toml").unwrap();

        let reader = ManifestReader::new(
            dir.path().join("pyproject.toml"),
            Some(dir.path().join("poetry.lock")),
        );
        let packages = reader.read().unwrap();
        assert_eq!(packages.len(), 5);
    }

    #[test]
    fn root_project_from_poetry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), POETRY_MANIFEST).unwrap();

        let reader = ManifestReader::new(dir.path().join("pyproject.toml"), None);
        let root = reader.read_root_project().unwrap();
        assert_eq!(root.name, "demo-app");
        assert_eq!(root.version, "1.4.0");
        assert_eq!(
            root.direct_dependencies,
            vec!["python", "requests", "Rich", "anything"]
        );
    }

    #[test]
    fn root_dependencies_exclude_dev_and_group_tables() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), POETRY_MANIFEST).unwrap();

        let reader = ManifestReader::new(dir.path().join("pyproject.toml"), None);
        let names = reader.declared_dependency_names().unwrap();
        assert!(!names.iter().any(|n| n == "pytest"));
        assert!(!names.iter().any(|n| n == "ruff"));

        // 카탈로그에는 dev/group 항목이 남아 있음
        let packages = reader.read().unwrap();
        assert!(packages.contains_key(&PackageKey::new("pytest")));
        assert!(packages.contains_key(&PackageKey::new("ruff")));
    }

    #[test]
    fn root_dependencies_fall_back_to_pep621_when_poetry_main_table_empty() {
        let dir = TempDir::new().unwrap();
        let content = r#"
[project]
name = "poetry2"
dependencies = ["flask>=3.0", "click"]

[tool.poetry.group.dev.dependencies]
pytest = "^8.0"
"#;
        fs::write(dir.path().join("pyproject.toml"), content).unwrap();

        let reader = ManifestReader::new(dir.path().join("pyproject.toml"), None);
        let root = reader.read_root_project().unwrap();
        assert_eq!(root.direct_dependencies, vec!["flask", "click"]);
    }

    #[test]
    fn root_project_defaults_name_and_version() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("unnamed-project");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("pyproject.toml"), "[project]\ndependencies = []\n").unwrap();

        let reader = ManifestReader::new(project.join("pyproject.toml"), None);
        let root = reader.read_root_project().unwrap();
        assert_eq!(root.name, "unnamed-project");
        assert_eq!(root.version, DEFAULT_PROJECT_VERSION);
        assert!(root.direct_dependencies.is_empty());
    }

    #[test]
    fn root_manifest_missing_is_fatal() {
        let dir = TempDir::new().unwrap();
        let reader = ManifestReader::new(dir.path().join("pyproject.toml"), None);
        let err = reader.declared_dependency_names().unwrap_err();
        assert!(matches!(err, SbomGeneratorError::RootManifest { .. }));
    }

    #[test]
    fn root_manifest_malformed_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project\n").unwrap();
        let reader = ManifestReader::new(dir.path().join("pyproject.toml"), None);
        let err = reader.read_root_project().unwrap_err();
        assert!(matches!(err, SbomGeneratorError::RootManifest { .. }));
    }
}
