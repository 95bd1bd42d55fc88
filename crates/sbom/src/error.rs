//! SBOM 생성기 에러 타입
//!
//! [`SbomGeneratorError`]는 SBOM 생성 과정에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<SbomGeneratorError> for PybomError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **매니페스트**: `Manifest`, `RootManifest`
//! - **외부 명령**: `FreezeCommand`, `SiteDiscovery`
//! - **직렬화**: `Serialization`
//! - **설정**: `Config`
//! - **파일 I/O**: `Io`

use pybom_core::error::{ConfigError, PybomError, SbomError};

/// SBOM 생성기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SbomGeneratorError {
    /// 매니페스트 또는 lock 파일 파싱 실패
    #[error("manifest parse error: {path}: {reason}")]
    Manifest {
        /// 파싱 대상 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 루트 프로젝트 매니페스트를 읽을 수 없음 (치명적)
    #[error("root manifest unreadable: {path}: {reason}")]
    RootManifest {
        /// 매니페스트 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// freeze 명령 실행 실패 또는 비정상 종료
    #[error("freeze command failed: `{command}`: {reason}")]
    FreezeCommand {
        /// 실행한 명령줄
        command: String,
        /// 실패 사유
        reason: String,
    },

    /// 인터프리터를 통한 site-packages 탐색 실패
    #[error("site-packages discovery failed: {python}: {reason}")]
    SiteDiscovery {
        /// 사용한 인터프리터
        python: String,
        /// 실패 사유
        reason: String,
    },

    /// SBOM 문서 직렬화 실패
    #[error("serialization error: {0}")]
    Serialization(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<SbomGeneratorError> for PybomError {
    fn from(err: SbomGeneratorError) -> Self {
        match err {
            SbomGeneratorError::Manifest { path, reason } => PybomError::Sbom(
                SbomError::SourceFailed(format!("manifest parse error: {path}: {reason}")),
            ),
            SbomGeneratorError::RootManifest { path, reason } => {
                PybomError::Sbom(SbomError::ManifestUnreadable(format!("{path}: {reason}")))
            }
            SbomGeneratorError::FreezeCommand { command, reason } => PybomError::Sbom(
                SbomError::SourceFailed(format!("freeze command `{command}`: {reason}")),
            ),
            SbomGeneratorError::SiteDiscovery { python, reason } => PybomError::Sbom(
                SbomError::SourceFailed(format!("site-packages discovery via {python}: {reason}")),
            ),
            SbomGeneratorError::Serialization(msg) => {
                PybomError::Sbom(SbomError::GenerationFailed(msg))
            }
            SbomGeneratorError::Config { field, reason } => {
                PybomError::Config(ConfigError::InvalidValue { field, reason })
            }
            SbomGeneratorError::Io { source, .. } => PybomError::Io(source),
        }
    }
}
