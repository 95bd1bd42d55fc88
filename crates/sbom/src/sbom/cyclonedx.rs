//! CycloneDX 1.5 JSON 문서 구조
//!
//! [CycloneDX](https://cyclonedx.org/) 1.5 사양 중 이 생성기가 사용하는 부분만 정의합니다.

use serde::{Deserialize, Serialize};

use crate::error::SbomGeneratorError;

/// BOM 형식 식별자
pub const BOM_FORMAT: &str = "CycloneDX";

/// CycloneDX 사양 버전
pub const SPEC_VERSION: &str = "1.5";

/// 컴포넌트 source 속성 이름
pub const SOURCE_PROPERTY: &str = "source";

/// CycloneDX 1.5 BOM 루트 구조
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SbomDocument {
    /// 항상 `CycloneDX`
    pub bom_format: String,
    /// 항상 `1.5`
    pub spec_version: String,
    /// `urn:uuid:<v4>`
    pub serial_number: String,
    /// BOM 버전 (항상 1)
    pub version: u32,
    /// 메타데이터
    pub metadata: Metadata,
    /// 컴포넌트 목록 (카탈로그 키 순서)
    pub components: Vec<Component>,
    /// 의존성 선언 목록 (루트가 첫 항목)
    pub dependencies: Vec<Dependency>,
}

/// 문서 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// 생성 시각 (`%Y-%m-%dT%H:%M:%SZ`)
    pub timestamp: String,
    /// 문서를 생성한 도구
    pub tools: Tools,
    /// 루트 프로젝트
    pub component: Component,
}

/// 도구 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tools {
    pub components: Vec<ToolComponent>,
}

/// 도구 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: String,
    pub version: String,
}

/// 컴포넌트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// `library` 또는 `application`
    #[serde(rename = "type")]
    pub component_type: String,
    /// 문서 내 참조 식별자 (purl과 동일)
    #[serde(rename = "bom-ref")]
    pub bom_ref: String,
    pub name: String,
    /// 버전을 알 수 없으면 null
    pub version: Option<String>,
    pub purl: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

impl Component {
    /// 이 컴포넌트의 source 속성 값을 반환합니다.
    pub fn source(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == SOURCE_PROPERTY)
            .map(|p| p.value.as_str())
    }
}

/// 이름-값 속성
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// 의존성 선언
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// 의존하는 컴포넌트의 bom-ref
    #[serde(rename = "ref")]
    pub reference: String,
    /// 의존 대상 bom-ref 목록
    #[serde(rename = "dependsOn")]
    pub depends_on: Vec<String>,
}

impl SbomDocument {
    /// 사람이 읽기 쉬운 JSON으로 직렬화합니다.
    pub fn to_json_pretty(&self) -> Result<String, SbomGeneratorError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SbomGeneratorError::Serialization(format!("CycloneDX serialization failed: {e}"))
        })
    }

    /// 컴포넌트 수를 반환합니다 (루트 메타데이터 컴포넌트 제외).
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// 모든 의존성 선언의 간선 수를 반환합니다.
    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(|d| d.depends_on.len()).sum()
    }

    /// bom-ref로 의존성 선언을 찾습니다.
    pub fn dependency_of(&self, reference: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.reference == reference)
    }
}
