//! 설정 관리: pybom.toml 파싱 및 런타임 설정
//!
//! [`PybomConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`PYBOM_SBOM_RESOLVE_MODE=transitive` 형식)
//! 3. 설정 파일 (`pybom.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), pybom_core::error::PybomError> {
//! use pybom_core::config::PybomConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = PybomConfig::load("pybom.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = PybomConfig::parse("[sbom]\nresolve_mode = \"transitive\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, PybomError};

/// 지원되는 의존성 해석 모드
pub const VALID_RESOLVE_MODES: [&str; 2] = ["direct", "transitive"];

/// 지원되는 메타데이터 소스 이름
pub const VALID_SOURCES: [&str; 3] = ["introspection", "freeze", "manifest"];

/// pybom 통합 설정
///
/// `pybom.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PybomConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// SBOM 생성 설정
    #[serde(default)]
    pub sbom: SbomConfig,
}

impl PybomConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PybomError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작하고, 환경변수 오버라이드를 적용합니다.
    ///
    /// CLI에서 설정 파일 경로가 명시되지 않은 경우에 사용합니다.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, PybomError> {
        let mut config = match Self::from_file(path.as_ref()) {
            Ok(config) => config,
            Err(PybomError::Config(ConfigError::FileNotFound { path })) => {
                tracing::debug!(path = %path, "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PybomError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PybomError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PybomError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PybomError> {
        toml::from_str(toml_str).map_err(|e| {
            PybomError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `PYBOM_{SECTION}_{FIELD}`
    /// 예: `PYBOM_SBOM_RESOLVE_MODE=transitive`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "PYBOM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "PYBOM_GENERAL_LOG_FORMAT");

        // SBOM
        override_string(&mut self.sbom.project_dir, "PYBOM_SBOM_PROJECT_DIR");
        override_string(&mut self.sbom.manifest_file, "PYBOM_SBOM_MANIFEST_FILE");
        override_string(&mut self.sbom.lock_file, "PYBOM_SBOM_LOCK_FILE");
        override_csv(&mut self.sbom.site_packages, "PYBOM_SBOM_SITE_PACKAGES");
        override_string(&mut self.sbom.python, "PYBOM_SBOM_PYTHON");
        override_args(&mut self.sbom.freeze_command, "PYBOM_SBOM_FREEZE_COMMAND");
        override_string(&mut self.sbom.resolve_mode, "PYBOM_SBOM_RESOLVE_MODE");
        override_string(&mut self.sbom.runtime_package, "PYBOM_SBOM_RUNTIME_PACKAGE");
        override_bool(
            &mut self.sbom.tolerate_freeze_failure,
            "PYBOM_SBOM_TOLERATE_FREEZE_FAILURE",
        );
        override_csv(&mut self.sbom.sources, "PYBOM_SBOM_SOURCES");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PybomError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if !VALID_RESOLVE_MODES.contains(&self.sbom.resolve_mode.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "sbom.resolve_mode".to_owned(),
                reason: format!("must be one of: {}", VALID_RESOLVE_MODES.join(", ")),
            }
            .into());
        }

        if self.sbom.manifest_file.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sbom.manifest_file".to_owned(),
                reason: "manifest file name must not be empty".to_owned(),
            }
            .into());
        }

        if self.sbom.runtime_package.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sbom.runtime_package".to_owned(),
                reason: "runtime package name must not be empty".to_owned(),
            }
            .into());
        }

        // freeze 소스를 쓰는 경우에만 명령이 필요
        if self.sbom.sources.iter().any(|s| s == "freeze") && self.sbom.freeze_command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sbom.freeze_command".to_owned(),
                reason: "freeze command must not be empty when the freeze source is enabled"
                    .to_owned(),
            }
            .into());
        }

        for source in &self.sbom.sources {
            if !VALID_SOURCES.contains(&source.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "sbom.sources".to_owned(),
                    reason: format!(
                        "unknown source '{}', must be one of: {}",
                        source,
                        VALID_SOURCES.join(", ")
                    ),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// SBOM 생성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SbomConfig {
    /// 대상 프로젝트 디렉토리
    pub project_dir: String,
    /// 프로젝트 매니페스트 파일명 (project_dir 기준)
    pub manifest_file: String,
    /// lock 파일명 (project_dir 기준)
    pub lock_file: String,
    /// 설치 패키지 메타데이터 디렉토리 (비어 있으면 인터프리터에 질의)
    pub site_packages: Vec<String>,
    /// site-packages 탐색에 사용할 파이썬 인터프리터
    pub python: String,
    /// `name==version` 목록을 출력하는 freeze 명령 (argv)
    pub freeze_command: Vec<String>,
    /// 의존성 해석 모드 (direct, transitive)
    pub resolve_mode: String,
    /// 컴포넌트와 의존성에서 제외할 런타임 의사 패키지
    pub runtime_package: String,
    /// freeze 명령 실패를 빈 결과로 취급할지 여부
    pub tolerate_freeze_failure: bool,
    /// 활성화할 메타데이터 소스 (introspection, freeze, manifest)
    pub sources: Vec<String>,
}

impl Default for SbomConfig {
    fn default() -> Self {
        Self {
            project_dir: ".".to_owned(),
            manifest_file: "pyproject.toml".to_owned(),
            lock_file: "poetry.lock".to_owned(),
            site_packages: Vec::new(),
            python: "python3".to_owned(),
            freeze_command: vec!["pip".to_owned(), "freeze".to_owned()],
            resolve_mode: "direct".to_owned(),
            runtime_package: "python".to_owned(),
            tolerate_freeze_failure: true,
            sources: VALID_SOURCES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

/// 공백으로 구분된 명령줄을 argv로 분리합니다 (따옴표 처리 없음).
fn override_args(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split_whitespace().map(str::to_owned).collect();
    }
}
