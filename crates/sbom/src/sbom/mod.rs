//! SBOM 문서 조립
//!
//! [`SbomAssembler`]는 병합된 카탈로그와 해석된 의존성 맵을 CycloneDX 1.5
//! [`SbomDocument`]로 변환합니다.
//!
//! 문서 식별자와 생성 시각은 [`IdGenerator`], [`Clock`] trait으로 주입되므로
//! 테스트에서는 고정 구현을 사용할 수 있습니다.

pub mod cyclonedx;

pub use cyclonedx::{Component, Dependency, Metadata, Property, SbomDocument, ToolComponent, Tools};

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::types::{Catalog, DependencyMap, PackageKey, RootProject};
use cyclonedx::{BOM_FORMAT, SOURCE_PROPERTY, SPEC_VERSION};

/// 타임스탬프 형식 (UTC, 초 단위)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 현재 시각 공급자
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 문서 serial number 공급자
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Uuid;
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn generate(&self) -> Uuid {
        (**self).generate()
    }
}

/// 시스템 시계
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 고정 시각 (재현 가능한 출력용)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 무작위 UUID v4 생성기
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// 고정 UUID (재현 가능한 출력용)
#[derive(Debug, Clone, Copy)]
pub struct FixedIdGenerator(pub Uuid);

impl IdGenerator for FixedIdGenerator {
    fn generate(&self) -> Uuid {
        self.0
    }
}

/// SBOM 문서 조립기
pub struct SbomAssembler {
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    /// 출력에서 제외할 런타임 의사 패키지
    runtime_package: PackageKey,
    tool_name: String,
    tool_version: String,
}

impl Default for SbomAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomAssembler {
    /// 시스템 시계와 UUID v4 생성기를 사용하는 조립기를 생성합니다.
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
            ids: Box::new(UuidV4Generator),
            runtime_package: PackageKey::new("python"),
            tool_name: "pybom".to_owned(),
            tool_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    /// 시계를 교체합니다.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// serial number 생성기를 교체합니다.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// 런타임 의사 패키지 이름을 설정합니다.
    pub fn with_runtime_package(mut self, name: &str) -> Self {
        self.runtime_package = PackageKey::new(name);
        self
    }

    /// 도구 정보(`metadata.tools`)를 설정합니다.
    pub fn with_tool(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self.tool_version = version.into();
        self
    }

    /// 런타임 의사 패키지 키를 반환합니다.
    pub fn runtime_package(&self) -> &PackageKey {
        &self.runtime_package
    }

    /// 카탈로그와 의존성 맵으로 문서를 조립합니다.
    ///
    /// - 컴포넌트: 카탈로그 키 순서, 런타임 패키지 제외
    /// - 루트 의존성: 매니페스트 선언 순서, 카탈로그에 있는 것만
    /// - 나머지 의존성: 필터 후 비어 있지 않은 패키지만
    pub fn assemble(
        &self,
        catalog: &Catalog,
        dependencies: &DependencyMap,
        root: &RootProject,
    ) -> SbomDocument {
        let root_key = root.key();
        let root_purl = root.purl();

        // --- 컴포넌트 ---
        let mut components = Vec::with_capacity(catalog.len());
        let mut purls: BTreeMap<PackageKey, String> = BTreeMap::new();

        for (key, record) in catalog {
            let key = PackageKey::new(key.as_str());
            if key == self.runtime_package || purls.contains_key(&key) {
                continue;
            }

            let component = if key == root_key {
                Component {
                    component_type: "library".to_owned(),
                    bom_ref: root_purl.clone(),
                    name: root_key.as_str().to_owned(),
                    version: Some(root.version.clone()),
                    purl: root_purl.clone(),
                    properties: vec![source_property(record.origin.tag())],
                }
            } else {
                let purl = record.purl();
                Component {
                    component_type: "library".to_owned(),
                    bom_ref: purl.clone(),
                    name: key.as_str().to_owned(),
                    version: record.version.clone(),
                    purl,
                    properties: vec![source_property(record.origin.tag())],
                }
            };

            purls.insert(key, component.purl.clone());
            components.push(component);
        }

        // --- 루트 의존성 ---
        let mut seen: BTreeSet<PackageKey> = BTreeSet::new();
        let root_depends_on: Vec<String> = root
            .direct_dependencies
            .iter()
            .map(|name| PackageKey::new(name))
            .filter(|key| *key != self.runtime_package && *key != root_key)
            .filter(|key| seen.insert(key.clone()))
            .filter_map(|key| purls.get(&key).cloned())
            .collect();

        let mut statements = vec![Dependency {
            reference: root_purl.clone(),
            depends_on: root_depends_on,
        }];

        // --- 나머지 의존성 ---
        for (key, targets) in dependencies {
            if *key == root_key || *key == self.runtime_package {
                continue;
            }
            let Some(reference) = purls.get(key) else {
                continue;
            };

            let depends_on: Vec<String> = targets
                .iter()
                .filter(|t| *t != key && **t != self.runtime_package)
                .filter_map(|t| purls.get(t).cloned())
                .collect();

            if depends_on.is_empty() {
                continue;
            }
            statements.push(Dependency {
                reference: reference.clone(),
                depends_on,
            });
        }

        debug!(
            components = components.len(),
            dependency_statements = statements.len(),
            "sbom document assembled"
        );

        SbomDocument {
            bom_format: BOM_FORMAT.to_owned(),
            spec_version: SPEC_VERSION.to_owned(),
            serial_number: format!("urn:uuid:{}", self.ids.generate()),
            version: 1,
            metadata: Metadata {
                timestamp: self.clock.now().format(TIMESTAMP_FORMAT).to_string(),
                tools: Tools {
                    components: vec![ToolComponent {
                        component_type: "application".to_owned(),
                        name: self.tool_name.clone(),
                        version: self.tool_version.clone(),
                    }],
                },
                component: Component {
                    component_type: "application".to_owned(),
                    bom_ref: root_purl.clone(),
                    name: root_key.as_str().to_owned(),
                    version: Some(root.version.clone()),
                    purl: root_purl,
                    properties: Vec::new(),
                },
            },
            components,
            dependencies: statements,
        }
    }
}

fn source_property(tag: &str) -> Property {
    Property {
        name: SOURCE_PROPERTY.to_owned(),
        value: tag.to_owned(),
    }
}
