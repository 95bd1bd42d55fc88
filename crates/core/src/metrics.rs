//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않은 경우 기록은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `pybom_`
//! - 모듈명: `sbom_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(pybom_core::metrics::SBOM_COMPONENTS_EMITTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 메타데이터 소스 레이블 키 (introspection, freeze, manifest)
pub const LABEL_SOURCE: &str = "source";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── SBOM 메트릭 ────────────────────────────────────────────────────

/// SBOM: 완료된 생성 실행 수 (counter, label: result)
pub const SBOM_GENERATIONS_TOTAL: &str = "pybom_sbom_generations_total";

/// SBOM: 소스별로 읽힌 패키지 수 (counter, label: source)
pub const SBOM_PACKAGES_READ_TOTAL: &str = "pybom_sbom_packages_read_total";

/// SBOM: 병합 후 카탈로그에 등록된 패키지 수 (counter)
pub const SBOM_PACKAGES_CATALOGED_TOTAL: &str = "pybom_sbom_packages_cataloged_total";

/// SBOM: 문서에 기록된 컴포넌트 수 (counter)
pub const SBOM_COMPONENTS_EMITTED_TOTAL: &str = "pybom_sbom_components_emitted_total";

/// SBOM: 문서에 기록된 의존성 간선 수 (counter)
pub const SBOM_DEPENDENCY_EDGES_TOTAL: &str = "pybom_sbom_dependency_edges_total";

/// SBOM: 실패 후 빈 결과로 대체된 소스 수 (counter, label: source)
pub const SBOM_SOURCE_FAILURES_TOTAL: &str = "pybom_sbom_source_failures_total";

/// SBOM: 생성 소요 시간 (histogram, 초)
pub const SBOM_GENERATION_DURATION_SECONDS: &str = "pybom_sbom_generation_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 생성 소요 시간 히스토그램 버킷 (초)
///
/// 10ms ~ 120s 범위 (freeze 서브프로세스 포함)
pub const GENERATION_DURATION_BUCKETS: [f64; 9] = [0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 120.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        SBOM_GENERATIONS_TOTAL,
        "Total number of SBOM generation runs by result"
    );
    describe_counter!(
        SBOM_PACKAGES_READ_TOTAL,
        "Packages reported by each metadata source before merging"
    );
    describe_counter!(
        SBOM_PACKAGES_CATALOGED_TOTAL,
        "Packages present in the merged catalog"
    );
    describe_counter!(
        SBOM_COMPONENTS_EMITTED_TOTAL,
        "Components written to generated SBOM documents"
    );
    describe_counter!(
        SBOM_DEPENDENCY_EDGES_TOTAL,
        "Dependency edges written to generated SBOM documents"
    );
    describe_counter!(
        SBOM_SOURCE_FAILURES_TOTAL,
        "Metadata sources that failed and were treated as empty"
    );
    describe_histogram!(
        SBOM_GENERATION_DURATION_SECONDS,
        "Time to generate a single SBOM document in seconds"
    );
}
