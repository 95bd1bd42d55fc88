//! SBOM 생성기 설정
//!
//! [`SbomGeneratorConfig`]는 core의 [`SbomConfig`](pybom_core::config::SbomConfig)를
//! 타입이 있는 형태로 변환하고, 소스별 활성화 플래그를 제공합니다.
//!
//! # 사용 예시
//!
//! ```
//! use pybom_sbom::{ResolveMode, SbomGeneratorConfig, SbomGeneratorConfigBuilder};
//!
//! // 기본값으로 생성
//! let config = SbomGeneratorConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! let config = SbomGeneratorConfigBuilder::new()
//!     .project_dir("/srv/app")
//!     .resolve_mode(ResolveMode::Transitive)
//!     .enable_freeze(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.resolve_mode, ResolveMode::Transitive);
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SbomGeneratorError;
use crate::types::ResolveMode;

/// SBOM 생성기 설정
///
/// # 필드
///
/// - **project_dir**: 매니페스트가 있는 프로젝트 디렉토리
/// - **manifest_file** / **lock_file**: project_dir 기준 파일명
/// - **site_packages**: 설치 메타데이터 디렉토리 (비어 있으면 인터프리터에 질의)
/// - **freeze_command**: freeze 명령 argv
/// - **resolve_mode**: 의존성 해석 모드
/// - **runtime_package**: 출력에서 제외할 런타임 의사 패키지
/// - **enable_***: 소스별 활성화 여부
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomGeneratorConfig {
    /// 프로젝트 디렉토리
    pub project_dir: String,
    /// 매니페스트 파일명
    pub manifest_file: String,
    /// lock 파일명
    pub lock_file: String,
    /// site-packages 디렉토리 목록
    pub site_packages: Vec<String>,
    /// site-packages 탐색용 파이썬 인터프리터
    pub python: String,
    /// freeze 명령 (argv)
    pub freeze_command: Vec<String>,
    /// 의존성 해석 모드
    pub resolve_mode: ResolveMode,
    /// 런타임 의사 패키지 이름
    pub runtime_package: String,
    /// freeze 실패를 빈 결과로 취급할지 여부
    pub tolerate_freeze_failure: bool,
    /// 설치 메타데이터 소스 활성화
    pub enable_introspection: bool,
    /// freeze 소스 활성화
    pub enable_freeze: bool,
    /// 매니페스트 소스 활성화
    pub enable_manifest: bool,
}

impl Default for SbomGeneratorConfig {
    fn default() -> Self {
        Self {
            project_dir: ".".to_owned(),
            manifest_file: "pyproject.toml".to_owned(),
            lock_file: "poetry.lock".to_owned(),
            site_packages: Vec::new(),
            python: "python3".to_owned(),
            freeze_command: vec!["pip".to_owned(), "freeze".to_owned()],
            resolve_mode: ResolveMode::Direct,
            runtime_package: "python".to_owned(),
            tolerate_freeze_failure: true,
            enable_introspection: true,
            enable_freeze: true,
            enable_manifest: true,
        }
    }
}

/// 경로 길이 상한
const MAX_PATH_LEN: usize = 4096;

impl SbomGeneratorConfig {
    /// core의 `SbomConfig`에서 생성기 설정을 생성합니다.
    ///
    /// 알 수 없는 해석 모드는 `Direct`로 대체됩니다.
    pub fn from_core(core: &pybom_core::config::SbomConfig) -> Self {
        let resolve_mode = ResolveMode::from_str_loose(&core.resolve_mode).unwrap_or_default();
        let enabled = |name: &str| core.sources.iter().any(|s| s == name);

        Self {
            project_dir: core.project_dir.clone(),
            manifest_file: core.manifest_file.clone(),
            lock_file: core.lock_file.clone(),
            site_packages: core.site_packages.clone(),
            python: core.python.clone(),
            freeze_command: core.freeze_command.clone(),
            resolve_mode,
            runtime_package: core.runtime_package.clone(),
            tolerate_freeze_failure: core.tolerate_freeze_failure,
            enable_introspection: enabled("introspection"),
            enable_freeze: enabled("freeze"),
            enable_manifest: enabled("manifest"),
        }
    }

    /// 매니페스트 파일의 전체 경로를 반환합니다.
    pub fn manifest_path(&self) -> PathBuf {
        Path::new(&self.project_dir).join(&self.manifest_file)
    }

    /// lock 파일의 전체 경로를 반환합니다.
    pub fn lock_path(&self) -> PathBuf {
        Path::new(&self.project_dir).join(&self.lock_file)
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `project_dir`, `manifest_file`: 비어 있으면 안 됨
    /// - `manifest_file`, `lock_file`: `..` 컴포넌트 금지
    /// - `runtime_package`: 공백만으로 구성되면 안 됨
    /// - `freeze_command`: freeze 소스 활성화 시 비어 있으면 안 됨
    /// - 최소 하나의 소스가 활성화되어야 함
    pub fn validate(&self) -> Result<(), SbomGeneratorError> {
        if self.project_dir.is_empty() {
            return Err(SbomGeneratorError::Config {
                field: "project_dir".to_owned(),
                reason: "project directory must not be empty".to_owned(),
            });
        }

        if self.project_dir.len() > MAX_PATH_LEN {
            return Err(SbomGeneratorError::Config {
                field: "project_dir".to_owned(),
                reason: format!("project_dir exceeds maximum length {MAX_PATH_LEN}"),
            });
        }

        if self.manifest_file.is_empty() {
            return Err(SbomGeneratorError::Config {
                field: "manifest_file".to_owned(),
                reason: "manifest file name must not be empty".to_owned(),
            });
        }

        for (field, value) in [
            ("manifest_file", &self.manifest_file),
            ("lock_file", &self.lock_file),
        ] {
            if Path::new(value)
                .components()
                .any(|c| c == Component::ParentDir)
            {
                return Err(SbomGeneratorError::Config {
                    field: field.to_owned(),
                    reason: format!("'{value}' must stay inside project_dir"),
                });
            }
        }

        if self.runtime_package.trim().is_empty() {
            return Err(SbomGeneratorError::Config {
                field: "runtime_package".to_owned(),
                reason: "runtime package name must not be empty".to_owned(),
            });
        }

        if self.enable_freeze && self.freeze_command.is_empty() {
            return Err(SbomGeneratorError::Config {
                field: "freeze_command".to_owned(),
                reason: "freeze command must not be empty when the freeze source is enabled"
                    .to_owned(),
            });
        }

        if !(self.enable_introspection || self.enable_freeze || self.enable_manifest) {
            return Err(SbomGeneratorError::Config {
                field: "sources".to_owned(),
                reason: "at least one metadata source must be enabled".to_owned(),
            });
        }

        Ok(())
    }
}

/// [`SbomGeneratorConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct SbomGeneratorConfigBuilder {
    config: SbomGeneratorConfig,
}

impl SbomGeneratorConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로젝트 디렉토리를 설정합니다.
    pub fn project_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.project_dir = dir.into();
        self
    }

    /// 매니페스트 파일명을 설정합니다.
    pub fn manifest_file(mut self, name: impl Into<String>) -> Self {
        self.config.manifest_file = name.into();
        self
    }

    /// lock 파일명을 설정합니다.
    pub fn lock_file(mut self, name: impl Into<String>) -> Self {
        self.config.lock_file = name.into();
        self
    }

    /// site-packages 디렉토리 목록을 설정합니다.
    pub fn site_packages(mut self, dirs: Vec<String>) -> Self {
        self.config.site_packages = dirs;
        self
    }

    /// 파이썬 인터프리터를 설정합니다.
    pub fn python(mut self, python: impl Into<String>) -> Self {
        self.config.python = python.into();
        self
    }

    /// freeze 명령 argv를 설정합니다.
    pub fn freeze_command(mut self, argv: Vec<String>) -> Self {
        self.config.freeze_command = argv;
        self
    }

    /// 의존성 해석 모드를 설정합니다.
    pub fn resolve_mode(mut self, mode: ResolveMode) -> Self {
        self.config.resolve_mode = mode;
        self
    }

    /// 런타임 의사 패키지 이름을 설정합니다.
    pub fn runtime_package(mut self, name: impl Into<String>) -> Self {
        self.config.runtime_package = name.into();
        self
    }

    /// freeze 실패 허용 여부를 설정합니다.
    pub fn tolerate_freeze_failure(mut self, tolerate: bool) -> Self {
        self.config.tolerate_freeze_failure = tolerate;
        self
    }

    /// 설치 메타데이터 소스 활성화 여부를 설정합니다.
    pub fn enable_introspection(mut self, enabled: bool) -> Self {
        self.config.enable_introspection = enabled;
        self
    }

    /// freeze 소스 활성화 여부를 설정합니다.
    pub fn enable_freeze(mut self, enabled: bool) -> Self {
        self.config.enable_freeze = enabled;
        self
    }

    /// 매니페스트 소스 활성화 여부를 설정합니다.
    pub fn enable_manifest(mut self, enabled: bool) -> Self {
        self.config.enable_manifest = enabled;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `SbomGeneratorError::Config` 반환
    pub fn build(self) -> Result<SbomGeneratorConfig, SbomGeneratorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
