//! 요구사항 문자열 파서 (PEP 508 부분집합)
//!
//! `Requires-Dist` 값과 lock 파일 의존성을 [`RequirementRef`]로 변환합니다.
//!
//! 지원 형식:
//!
//! ```text
//! name
//! name>=1.0,<2
//! name (>=1.0)
//! name[extra1,extra2]>=1.0 ; python_version < "3.11"
//! name @ https://example.com/name.whl
//! ```
//!
//! 구조 파싱에 실패해도 원문 전체를 이름으로 기록하며 에러를 반환하지 않습니다.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::RequirementRef;

static REQUIREMENT_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[(?P<extras>[^\]]*)\])?\s*(?P<rest>.*?)\s*$",
    )
    .expect("static regex")
});

/// 요구사항 문자열을 파싱합니다.
///
/// 모든 입력에 대해 결과를 반환합니다. 이름을 추출할 수 없거나 제약 부분이
/// 연산자로 시작하지 않으면 원문(앞뒤 공백 제거)을 이름으로 사용하고
/// 제약과 마커는 `None`으로 둡니다.
pub fn parse_requirement(raw: &str) -> RequirementRef {
    match try_parse(raw) {
        Some(req) => req,
        None => {
            tracing::debug!(requirement = raw, "unstructured requirement, keeping raw text");
            RequirementRef::bare(raw.trim())
        }
    }
}

fn try_parse(raw: &str) -> Option<RequirementRef> {
    let (head, marker) = match raw.split_once(';') {
        Some((head, marker)) => (head, non_empty(marker)),
        None => (raw, None),
    };

    let caps = REQUIREMENT_HEAD.captures(head)?;
    let name = caps.name("name")?.as_str();
    let rest = caps.name("rest").map_or("", |m| m.as_str());

    let version_constraint = if rest.is_empty() {
        None
    } else if let Some(url) = rest.strip_prefix('@') {
        // 직접 참조 요구사항
        Some(format!("@ {}", url.trim()))
    } else {
        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest);
        if !inner.trim_start().starts_with(['<', '>', '=', '!', '~']) {
            return None;
        }
        non_empty(inner)
    };

    Some(RequirementRef {
        name: name.to_owned(),
        version_constraint,
        environment_marker: marker,
    })
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
