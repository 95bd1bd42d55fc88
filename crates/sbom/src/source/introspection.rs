//! 설치 메타데이터 리더 -- site-packages 디렉토리
//!
//! [`IntrospectionReader`]는 site-packages 디렉토리의 배포판 메타데이터를 읽습니다.
//!
//! # 지원 형식
//!
//! - `<name>-<version>.dist-info/METADATA` (wheel 설치)
//! - `<name>-<version>.egg-info/PKG-INFO` + `requires.txt` (setuptools 설치)
//! - `<name>-<version>.egg-info` 단일 파일
//!
//! 헤더 중 `Name`, `Version`, `Requires-Dist`만 사용합니다.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::MetadataSource;
use super::requirement::parse_requirement;
use crate::error::SbomGeneratorError;
use crate::types::{Origin, PackageKey, PackageRecord, PartialCatalog, RequirementRef};

/// 인터프리터에 site-packages 경로를 질의하는 스크립트
const SITE_DISCOVERY_SCRIPT: &str = "\
import site
for p in getattr(site, 'getsitepackages', lambda: [])():
    print(p)
if hasattr(site, 'getusersitepackages'):
    print(site.getusersitepackages())
";

/// site-packages 메타데이터 리더
pub struct IntrospectionReader {
    /// 탐색할 디렉토리 (앞쪽 디렉토리가 우선)
    site_dirs: Vec<PathBuf>,
}

/// 메타데이터 파일에서 추출한 헤더
#[derive(Debug, Default)]
struct DistMetadata {
    name: Option<String>,
    version: Option<String>,
    requires_dist: Vec<String>,
}

impl IntrospectionReader {
    /// 주어진 디렉토리 목록으로 리더를 생성합니다.
    pub fn new(site_dirs: Vec<PathBuf>) -> Self {
        Self { site_dirs }
    }

    /// 탐색 대상 디렉토리를 반환합니다.
    pub fn site_dirs(&self) -> &[PathBuf] {
        &self.site_dirs
    }

    fn read_dir_into(
        &self,
        dir: &Path,
        packages: &mut PartialCatalog,
    ) -> Result<(), SbomGeneratorError> {
        let entries = fs::read_dir(dir).map_err(|e| SbomGeneratorError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(e) => Some(e.path()),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                    None
                }
            })
            .collect();
        paths.sort();

        for path in paths {
            let Some(record) = read_distribution(&path) else {
                continue;
            };
            if packages.contains_key(&record.key) {
                debug!(package = %record.key, path = %path.display(), "duplicate distribution, keeping first");
                continue;
            }
            packages.insert(record.key.clone(), record);
        }

        Ok(())
    }
}

impl MetadataSource for IntrospectionReader {
    fn origin(&self) -> Origin {
        Origin::Introspection
    }

    fn read(&self) -> Result<PartialCatalog, SbomGeneratorError> {
        let mut packages = PartialCatalog::new();

        for dir in &self.site_dirs {
            match self.read_dir_into(dir, &mut packages) {
                Ok(()) => {}
                Err(SbomGeneratorError::Io { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    debug!(dir = %dir.display(), "site-packages directory does not exist, skipping");
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "site-packages directory unreadable, skipping");
                }
            }
        }

        debug!(packages = packages.len(), "introspection read completed");
        Ok(packages)
    }
}

/// 배포판 메타데이터 경로 하나를 레코드로 변환합니다.
///
/// 메타데이터 디렉토리가 아니거나 읽을 수 없으면 `None`을 반환합니다.
fn read_distribution(path: &Path) -> Option<PackageRecord> {
    let file_name = path.file_name()?.to_str()?;

    let (stem, metadata_file, requires_txt) = if let Some(stem) = file_name.strip_suffix(".dist-info")
    {
        (stem, path.join("METADATA"), None)
    } else if let Some(stem) = file_name.strip_suffix(".egg-info") {
        if path.is_dir() {
            (stem, path.join("PKG-INFO"), Some(path.join("requires.txt")))
        } else {
            (stem, path.to_path_buf(), None)
        }
    } else {
        return None;
    };

    let content = match fs::read_to_string(&metadata_file) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %metadata_file.display(), error = %e, "unreadable distribution metadata, skipping");
            return None;
        }
    };

    let metadata = parse_metadata(&content);
    let (stem_name, stem_version) = match stem.split_once('-') {
        Some((n, v)) => (n, Some(v)),
        None => (stem, None),
    };

    let name = metadata.name.as_deref().unwrap_or(stem_name);
    if name.trim().is_empty() {
        return None;
    }
    let version = metadata
        .version
        .clone()
        .or_else(|| stem_version.map(str::to_owned));

    let mut requirements: Vec<RequirementRef> = metadata
        .requires_dist
        .iter()
        .map(|r| parse_requirement(r))
        .collect();

    if let Some(requires_txt) = requires_txt {
        if let Ok(content) = fs::read_to_string(&requires_txt) {
            requirements.extend(parse_requires_txt(&content));
        }
    }

    let mut record = PackageRecord::new(PackageKey::new(name), version, Origin::Introspection);
    record.requirements = requirements;
    Some(record)
}

/// RFC 822 스타일 메타데이터 헤더를 파싱합니다.
///
/// 첫 빈 줄 이후(본문)는 무시합니다.
fn parse_metadata(content: &str) -> DistMetadata {
    let mut metadata = DistMetadata::default();
    let mut current: Option<(String, String)> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = current.as_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        commit_header(&mut metadata, current.take());
        current = line
            .split_once(':')
            .map(|(k, v)| (k.trim().to_owned(), v.to_owned()));
    }
    commit_header(&mut metadata, current);

    metadata
}

fn commit_header(metadata: &mut DistMetadata, header: Option<(String, String)>) {
    let Some((key, value)) = header else {
        return;
    };
    let value = value.trim().to_owned();
    match key.to_ascii_lowercase().as_str() {
        "name" if metadata.name.is_none() => metadata.name = Some(value),
        "version" if metadata.version.is_none() => metadata.version = Some(value),
        "requires-dist" if !value.is_empty() => metadata.requires_dist.push(value),
        _ => {}
    }
}

/// egg-info `requires.txt`를 파싱합니다.
///
/// `[extra]` 섹션은 `extra == "..."` 마커로, `[:marker]` 섹션은 해당 마커로 기록합니다.
fn parse_requires_txt(content: &str) -> Vec<RequirementRef> {
    let mut requirements = Vec::new();
    let mut section_marker: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            section_marker = section_to_marker(section);
            continue;
        }

        let mut req = parse_requirement(line);
        if let Some(marker) = &section_marker {
            req.environment_marker = Some(match req.environment_marker.take() {
                Some(own) => format!("({own}) and ({marker})"),
                None => marker.clone(),
            });
        }
        requirements.push(req);
    }

    requirements
}

fn section_to_marker(section: &str) -> Option<String> {
    let (extra, marker) = match section.split_once(':') {
        Some((extra, marker)) => (extra.trim(), marker.trim()),
        None => (section.trim(), ""),
    };
    match (extra.is_empty(), marker.is_empty()) {
        (true, true) => None,
        (true, false) => Some(marker.to_owned()),
        (false, true) => Some(format!("extra == \"{extra}\"")),
        (false, false) => Some(format!("extra == \"{extra}\" and ({marker})")),
    }
}

/// 인터프리터에 site-packages 경로를 질의합니다.
///
/// `site.getsitepackages()`와 사용자 site 디렉토리를 중복 없이 반환합니다.
pub fn discover_site_packages(python: &str) -> Result<Vec<String>, SbomGeneratorError> {
    let output = Command::new(python)
        .args(["-c", SITE_DISCOVERY_SCRIPT])
        .output()
        .map_err(|e| SbomGeneratorError::SiteDiscovery {
            python: python.to_owned(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(SbomGeneratorError::SiteDiscovery {
            python: python.to_owned(),
            reason: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let mut dirs: Vec<String> = Vec::new();
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        let line = line.trim();
        if !line.is_empty() && !dirs.iter().any(|d| d == line) {
            dirs.push(line.to_owned());
        }
    }

    debug!(python, dirs = dirs.len(), "discovered site-packages directories");
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_dist_info(site: &Path, dir_name: &str, metadata: &str) {
        let dist = site.join(dir_name);
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("METADATA"), metadata).unwrap();
    }

    #[test]
    fn parse_metadata_reads_headers_until_body() {
        let content = "\
Metadata-Version: 2.1
Name: requests
Version: 2.31.0
Requires-Dist: charset-normalizer (<4,>=2)
Requires-Dist: idna<4,>=2.5
Requires-Dist: PySocks!=1.5.7,>=1.5.6; extra == \"socks\"

Requires-Dist: this-is-body-text
";
        let metadata = parse_metadata(content);
        assert_eq!(metadata.name.as_deref(), Some("requests"));
        assert_eq!(metadata.version.as_deref(), Some("2.31.0"));
        assert_eq!(metadata.requires_dist.len(), 3);
    }

    #[test]
    fn parse_metadata_joins_continuation_lines() {
        let content = "Name: foo\nSummary: a\n  long summary\nVersion: 1.0\n";
        let metadata = parse_metadata(content);
        assert_eq!(metadata.name.as_deref(), Some("foo"));
        assert_eq!(metadata.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn reads_dist_info_directories() {
        let site = TempDir::new().unwrap();
        write_dist_info(
            site.path(),
            "requests-2.31.0.dist-info",
            "Name: requests\nVersion: 2.31.0\nRequires-Dist: idna<4,>=2.5\n",
        );
        write_dist_info(site.path(), "Zope.Interface-6.2.dist-info", "Name: zope.interface\nVersion: 6.2\n");
        fs::create_dir_all(site.path().join("requests")).unwrap();

        let reader = IntrospectionReader::new(vec![site.path().to_path_buf()]);
        let packages = reader.read().unwrap();

        assert_eq!(packages.len(), 2);
        let requests = &packages[&PackageKey::new("requests")];
        assert_eq!(requests.origin, Origin::Introspection);
        assert_eq!(requests.requirements.len(), 1);
        assert_eq!(requests.requirements[0].name, "idna");
        assert!(packages.contains_key(&PackageKey::new("zope-interface")));
    }

    #[test]
    fn reads_egg_info_with_requires_txt() {
        let site = TempDir::new().unwrap();
        let egg = site.path().join("legacy-1.0.egg-info");
        fs::create_dir_all(&egg).unwrap();
        fs::write(egg.join("PKG-INFO"), "Name: legacy\nVersion: 1.0\n").unwrap();
        fs::write(egg.join("requires.txt"), "six>=1.10\n\n[test]\npytest\n").unwrap();

        let reader = IntrospectionReader::new(vec![site.path().to_path_buf()]);
        let packages = reader.read().unwrap();
        let legacy = &packages[&PackageKey::new("legacy")];
        assert_eq!(legacy.requirements.len(), 2);
        assert_eq!(legacy.requirements[0].environment_marker, None);
        assert_eq!(
            legacy.requirements[1].environment_marker.as_deref(),
            Some("extra == \"test\"")
        );
    }

    #[test]
    fn reads_single_file_egg_info() {
        let site = TempDir::new().unwrap();
        fs::write(
            site.path().join("oldpkg-0.9.egg-info"),
            "Metadata-Version: 1.0\nName: oldpkg\nVersion: 0.9\n",
        )
        .unwrap();

        let reader = IntrospectionReader::new(vec![site.path().to_path_buf()]);
        let packages = reader.read().unwrap();
        assert_eq!(
            packages[&PackageKey::new("oldpkg")].version.as_deref(),
            Some("0.9")
        );
    }

    #[test]
    fn missing_name_header_falls_back_to_directory_name() {
        let site = TempDir::new().unwrap();
        write_dist_info(site.path(), "nameless-3.1.dist-info", "Metadata-Version: 2.1\n");

        let reader = IntrospectionReader::new(vec![site.path().to_path_buf()]);
        let packages = reader.read().unwrap();
        let record = &packages[&PackageKey::new("nameless")];
        assert_eq!(record.version.as_deref(), Some("3.1"));
    }

    #[test]
    fn first_site_dir_wins_on_duplicates() {
        let venv = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        write_dist_info(venv.path(), "six-1.16.0.dist-info", "Name: six\nVersion: 1.16.0\n");
        write_dist_info(system.path(), "six-1.12.0.dist-info", "Name: six\nVersion: 1.12.0\n");

        let reader = IntrospectionReader::new(vec![
            venv.path().to_path_buf(),
            system.path().to_path_buf(),
        ]);
        let packages = reader.read().unwrap();
        assert_eq!(
            packages[&PackageKey::new("six")].version.as_deref(),
            Some("1.16.0")
        );
    }

    #[test]
    fn missing_directory_yields_empty_result() {
        let reader = IntrospectionReader::new(vec![PathBuf::from("/nonexistent/site-packages")]);
        assert!(reader.read().unwrap().is_empty());
    }

    #[test]
    fn unreadable_site_dir_is_skipped() {
        let scratch = TempDir::new().unwrap();
        let not_a_dir = scratch.path().join("site-packages");
        fs::write(&not_a_dir, "").unwrap();

        let site = TempDir::new().unwrap();
        write_dist_info(site.path(), "six-1.16.0.dist-info", "Name: six\nVersion: 1.16.0\n");

        let reader = IntrospectionReader::new(vec![not_a_dir, site.path().to_path_buf()]);
        let packages = reader.read().unwrap();
        assert_eq!(packages.len(), 1);
        assert!(packages.contains_key(&PackageKey::new("six")));
    }

    #[test]
    fn section_markers() {
        assert_eq!(section_to_marker(""), None);
        assert_eq!(
            section_to_marker(":python_version < \"3.8\"").as_deref(),
            Some("python_version < \"3.8\"")
        );
        assert_eq!(
            section_to_marker("socks:sys_platform == \"win32\"").as_deref(),
            Some("extra == \"socks\" and (sys_platform == \"win32\")")
        );
    }

    #[test]
    fn discover_with_missing_interpreter_fails() {
        let err = discover_site_packages("pybom-definitely-missing-python").unwrap_err();
        assert!(matches!(err, SbomGeneratorError::SiteDiscovery { .. }));
    }
}
