//! 메타데이터 소스 어댑터 -- site-packages, freeze 출력, pyproject.toml
//!
//! [`MetadataSource`] trait은 각 소스가 구현해야 하는 인터페이스입니다.
//! 모든 소스는 서로 독립적이며 [`PartialCatalog`]를 반환합니다.
//!
//! # 지원 소스
//!
//! - 설치 메타데이터 (`*.dist-info`, `*.egg-info`) -- [`IntrospectionReader`]
//! - freeze 명령 출력 -- [`FreezeReader`]
//! - `pyproject.toml` + `poetry.lock` -- [`ManifestReader`]
//!
//! 선택적 입력(디렉토리, 파일)이 없으면 에러 대신 빈 결과를 반환합니다.

pub mod freeze;
pub mod introspection;
pub mod manifest;
pub mod requirement;

pub use freeze::{FreezeReader, parse_freeze_output};
pub use introspection::{IntrospectionReader, discover_site_packages};
pub use manifest::ManifestReader;
pub use requirement::parse_requirement;

use crate::error::SbomGeneratorError;
use crate::types::{Origin, PartialCatalog};

/// 메타데이터 소스 trait
///
/// 하나의 입력에서 패키지 맵을 읽어 [`PartialCatalog`]로 반환합니다.
pub trait MetadataSource: Send + Sync {
    /// 이 소스가 생성하는 레코드의 origin을 반환합니다.
    fn origin(&self) -> Origin;

    /// 패키지 맵을 읽습니다.
    ///
    /// 같은 키가 여러 번 나오면 먼저 읽은 항목을 유지합니다.
    fn read(&self) -> Result<PartialCatalog, SbomGeneratorError>;
}
