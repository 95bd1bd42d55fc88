//! 도메인 타입 -- SBOM 생성기 전용 데이터 구조
//!
//! 패키지 키, 패키지 레코드, 카탈로그, 해석 모드 등 핵심 타입을 정의합니다.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// 패키지 이름을 정규화합니다.
///
/// 소문자로 바꾸고 모든 `.`를 `-`로 치환합니다. 결정적이며 모든 입력에 대해 정의됩니다.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace('.', "-")
}

/// 정규화된 패키지 식별자
///
/// [`PackageKey::new`]를 통해서만 생성되므로 항상 정규화된 상태입니다.
/// 직렬화 시 일반 문자열로 기록됩니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PackageKey(String);

impl PackageKey {
    /// 원본 이름을 정규화하여 키를 생성합니다.
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    /// 정규화된 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// 패키지 정보를 처음 제공한 메타데이터 소스
///
/// 진단용이며 병합 우선순위에는 영향을 주지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Origin {
    /// 설치된 배포판 메타데이터 (site-packages)
    Introspection,
    /// freeze 명령 출력
    FrozenListing,
    /// pyproject.toml / poetry.lock
    Manifest,
}

impl Origin {
    /// SBOM `properties`에 기록되는 source 태그를 반환합니다.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Introspection => "importlib.metadata",
            Self::FrozenListing => "pip_freeze",
            Self::Manifest => "poetry",
        }
    }

    /// 메트릭 레이블 및 설정에서 사용하는 소스 이름을 반환합니다.
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Introspection => "introspection",
            Self::FrozenListing => "freeze",
            Self::Manifest => "manifest",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 선언된 요구사항 한 건
///
/// 원본 문자열에서 추출만 하며, 버전 제약이나 환경 마커는 평가하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementRef {
    /// 정규화 전 이름
    pub name: String,
    /// 버전 제약 (예: `>=2.0,<3`)
    pub version_constraint: Option<String>,
    /// 환경 마커 (예: `python_version < "3.11"`)
    pub environment_marker: Option<String>,
}

impl RequirementRef {
    /// 제약과 마커가 없는 요구사항을 생성합니다.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_constraint: None,
            environment_marker: None,
        }
    }

    /// 요구사항 대상의 정규화된 키를 반환합니다.
    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.name)
    }
}

/// 카탈로그 내 단일 패키지
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    /// 정규화된 키 (카탈로그 내 유일)
    pub key: PackageKey,
    /// 설치/고정 버전 (버전 없는 매니페스트 항목은 None)
    pub version: Option<String>,
    /// 선언된 요구사항 (순서 유지)
    pub requirements: Vec<RequirementRef>,
    /// 처음 제공한 소스
    pub origin: Origin,
}

impl PackageRecord {
    /// 요구사항 없는 레코드를 생성합니다.
    pub fn new(key: PackageKey, version: Option<String>, origin: Origin) -> Self {
        Self {
            key,
            version,
            requirements: Vec::new(),
            origin,
        }
    }

    /// 이 패키지의 Package URL을 반환합니다.
    pub fn purl(&self) -> String {
        make_purl(self.key.as_str(), self.version.as_deref())
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{} ({})", self.key, v, self.origin),
            None => write!(f, "{} ({})", self.key, self.origin),
        }
    }
}

/// PyPI Package URL을 생성합니다.
///
/// 버전이 없으면 `pkg:pypi/<name>` 형식을 사용합니다.
pub fn make_purl(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("pkg:pypi/{name}@{v}"),
        None => format!("pkg:pypi/{name}"),
    }
}

/// 단일 소스가 반환하는 부분 패키지 맵
pub type PartialCatalog = BTreeMap<PackageKey, PackageRecord>;

/// 병합된 패키지 카탈로그 (키 순서로 순회)
pub type Catalog = BTreeMap<PackageKey, PackageRecord>;

/// 패키지별 해석된 의존성 키 집합
pub type DependencyMap = BTreeMap<PackageKey, BTreeSet<PackageKey>>;

/// 의존성 해석 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// 패키지가 직접 선언한 요구사항만
    #[default]
    Direct,
    /// 요구사항을 따라 도달 가능한 모든 패키지
    Transitive,
}

impl ResolveMode {
    /// 문자열에서 해석 모드를 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "transitive" | "closure" => Some(Self::Transitive),
            _ => None,
        }
    }
}

impl fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Transitive => write!(f, "transitive"),
        }
    }
}

/// SBOM 대상 루트 프로젝트
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootProject {
    /// 프로젝트 이름 (매니페스트 원본, 문서에는 정규화된 키로 기록)
    pub name: String,
    /// 프로젝트 버전
    pub version: String,
    /// 매니페스트에 선언된 직접 의존성 이름 (원본, 선언 순서)
    pub direct_dependencies: Vec<String>,
}

impl RootProject {
    /// 루트 프로젝트의 정규화된 키를 반환합니다.
    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.name)
    }

    /// 루트 프로젝트의 Package URL을 반환합니다 (정규화된 이름 사용).
    pub fn purl(&self) -> String {
        make_purl(self.key().as_str(), Some(&self.version))
    }
}
