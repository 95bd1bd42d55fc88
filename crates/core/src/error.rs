//! 에러 타입: 도메인별 에러 정의

/// pybom 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PybomError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// SBOM 생성 에러
    #[error("sbom error: {0}")]
    Sbom(#[from] SbomError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// SBOM 생성 에러
#[derive(Debug, thiserror::Error)]
pub enum SbomError {
    /// 메타데이터 소스 읽기 실패
    #[error("metadata source failed: {0}")]
    SourceFailed(String),

    /// 루트 프로젝트 매니페스트를 읽을 수 없음
    #[error("root manifest unreadable: {0}")]
    ManifestUnreadable(String),

    /// 문서 생성 실패
    #[error("generation failed: {0}")]
    GenerationFailed(String),
}
