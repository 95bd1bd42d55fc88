//! SBOM 생성 오케스트레이터 -- 전체 생성 흐름 관리
//!
//! [`SbomGenerator`]는 소스 읽기부터 문서 조립까지 한 번의 생성을 수행합니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! IntrospectionReader --+
//! FreezeReader ---------+--> merge --> Catalog --+--> resolve --> DependencyMap --+
//! ManifestReader -------+                        |                                |
//!                                                +---------> SbomAssembler <------+
//! ManifestReader::read_root_project ----------------------------> |
//!                                                                  v
//!                                                            SbomDocument
//! ```
//!
//! 각 단계는 순차적으로 실행되며, 실행 사이에 공유되는 상태는 없습니다.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use pybom_core::metrics as m;

use crate::catalog::merge_all;
use crate::config::SbomGeneratorConfig;
use crate::error::SbomGeneratorError;
use crate::resolver::resolve;
use crate::sbom::{Clock, IdGenerator, SbomAssembler, SbomDocument};
use crate::source::{FreezeReader, IntrospectionReader, ManifestReader, MetadataSource};
use crate::types::{Origin, PartialCatalog, RootProject};

/// 한 번의 생성 결과
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// 생성된 문서
    pub document: SbomDocument,
    /// 병합 후 카탈로그 크기
    pub catalog_size: usize,
    /// 소스별 읽은 패키지 수 (introspection, freeze, manifest)
    pub source_counts: BTreeMap<String, usize>,
    /// 실패 후 빈 결과로 대체된 소스
    pub failed_sources: Vec<String>,
    /// 루트 프로젝트
    pub root: RootProject,
}

/// SBOM 생성기
///
/// 설정, 메타데이터 소스, 문서 조립기를 소유합니다.
/// 소스는 우선순위 순서(introspection, freeze, manifest)로 보관됩니다.
pub struct SbomGenerator {
    config: SbomGeneratorConfig,
    sources: Vec<Box<dyn MetadataSource>>,
    manifest: ManifestReader,
    assembler: SbomAssembler,
}

impl SbomGenerator {
    /// 현재 설정을 반환합니다.
    pub fn config(&self) -> &SbomGeneratorConfig {
        &self.config
    }

    /// 등록된 소스 수를 반환합니다.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// SBOM 문서를 생성합니다.
    ///
    /// # Errors
    ///
    /// - 루트 매니페스트를 읽을 수 없으면 `RootManifest`
    /// - freeze 실패를 허용하지 않는 설정에서 freeze가 실패하면 `FreezeCommand`
    /// - 그 외 소스 읽기 실패
    pub fn generate(&self) -> Result<GenerationReport, SbomGeneratorError> {
        let started = Instant::now();
        let result = self.run();

        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!(m::SBOM_GENERATIONS_TOTAL, m::LABEL_RESULT => outcome).increment(1);
        histogram!(m::SBOM_GENERATION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        result
    }

    fn run(&self) -> Result<GenerationReport, SbomGeneratorError> {
        let mut partials: Vec<PartialCatalog> = Vec::with_capacity(self.sources.len());
        let mut source_counts = BTreeMap::new();
        let mut failed_sources = Vec::new();

        for source in &self.sources {
            let origin = source.origin();
            let partial = match source.read() {
                Ok(partial) => partial,
                Err(e) if self.tolerates(origin) => {
                    warn!(source = origin.source_name(), error = %e, "metadata source failed, treating as empty");
                    counter!(m::SBOM_SOURCE_FAILURES_TOTAL, m::LABEL_SOURCE => origin.source_name())
                        .increment(1);
                    failed_sources.push(origin.source_name().to_owned());
                    PartialCatalog::new()
                }
                Err(e) => return Err(e),
            };

            debug!(source = origin.source_name(), packages = partial.len(), "metadata source read");
            counter!(m::SBOM_PACKAGES_READ_TOTAL, m::LABEL_SOURCE => origin.source_name())
                .increment(partial.len() as u64);
            source_counts.insert(origin.source_name().to_owned(), partial.len());
            partials.push(partial);
        }

        let catalog = merge_all(partials);
        counter!(m::SBOM_PACKAGES_CATALOGED_TOTAL).increment(catalog.len() as u64);

        let root = self.manifest.read_root_project()?;
        let dependencies = resolve(&catalog, self.config.resolve_mode);
        let document = self.assembler.assemble(&catalog, &dependencies, &root);

        counter!(m::SBOM_COMPONENTS_EMITTED_TOTAL).increment(document.component_count() as u64);
        counter!(m::SBOM_DEPENDENCY_EDGES_TOTAL).increment(document.edge_count() as u64);

        info!(
            project = %root.name,
            version = %root.version,
            packages = catalog.len(),
            components = document.component_count(),
            edges = document.edge_count(),
            resolve_mode = %self.config.resolve_mode,
            "sbom generated"
        );

        Ok(GenerationReport {
            catalog_size: catalog.len(),
            document,
            source_counts,
            failed_sources,
            root,
        })
    }

    fn tolerates(&self, origin: Origin) -> bool {
        origin == Origin::FrozenListing && self.config.tolerate_freeze_failure
    }
}

/// [`SbomGenerator`] 빌더
pub struct SbomGeneratorBuilder {
    config: SbomGeneratorConfig,
    clock: Option<Box<dyn Clock>>,
    ids: Option<Box<dyn IdGenerator>>,
    sources: Option<Vec<Box<dyn MetadataSource>>>,
}

impl SbomGeneratorBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: SbomGeneratorConfig::default(),
            clock: None,
            ids: None,
            sources: None,
        }
    }

    /// 생성기 설정을 지정합니다.
    pub fn config(mut self, config: SbomGeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// 문서 타임스탬프용 시계를 지정합니다.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// serial number 생성기를 지정합니다.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// 메타데이터 소스를 직접 지정합니다 (우선순위 순서).
    ///
    /// 지정하지 않으면 설정의 `enable_*` 플래그에 따라 기본 소스를 등록합니다.
    pub fn sources(mut self, sources: Vec<Box<dyn MetadataSource>>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// 생성기를 빌드합니다.
    ///
    /// # Errors
    ///
    /// 설정 유효성 검증 실패 시 `SbomGeneratorError::Config` 반환
    pub fn build(self) -> Result<SbomGenerator, SbomGeneratorError> {
        self.config.validate()?;

        let sources = match self.sources {
            Some(sources) => sources,
            None => default_sources(&self.config),
        };

        let mut assembler = SbomAssembler::new().with_runtime_package(&self.config.runtime_package);
        if let Some(clock) = self.clock {
            assembler = assembler.with_clock(clock);
        }
        if let Some(ids) = self.ids {
            assembler = assembler.with_id_generator(ids);
        }

        let manifest = ManifestReader::new(self.config.manifest_path(), None);

        debug!(
            sources = sources.len(),
            project_dir = %self.config.project_dir,
            "sbom generator built"
        );

        Ok(SbomGenerator {
            config: self.config,
            sources,
            manifest,
            assembler,
        })
    }
}

impl Default for SbomGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 설정에 따라 기본 소스를 우선순위 순서로 생성합니다.
fn default_sources(config: &SbomGeneratorConfig) -> Vec<Box<dyn MetadataSource>> {
    let mut sources: Vec<Box<dyn MetadataSource>> = Vec::new();

    if config.enable_introspection {
        let dirs = config.site_packages.iter().map(PathBuf::from).collect();
        sources.push(Box::new(IntrospectionReader::new(dirs)));
    }
    if config.enable_freeze {
        sources.push(Box::new(FreezeReader::new(config.freeze_command.clone())));
    }
    if config.enable_manifest {
        let lock = (!config.lock_file.is_empty()).then(|| config.lock_path());
        sources.push(Box::new(ManifestReader::new(config.manifest_path(), lock)));
    }

    sources
}
