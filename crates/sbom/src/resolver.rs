//! 의존성 그래프 해석
//!
//! 카탈로그의 각 패키지에 대해 직접 또는 전이 의존성 키 집합을 계산합니다.
//! 카탈로그에 없는 이름도 결과에 남으며, 걸러내는 것은 문서 조립 단계의 몫입니다.

use std::collections::BTreeSet;

use crate::types::{Catalog, DependencyMap, PackageKey, ResolveMode};

/// 카탈로그 전체의 의존성을 해석합니다.
///
/// 모든 카탈로그 키가 결과에 포함되며, 의존성이 없으면 빈 집합을 가집니다.
pub fn resolve(catalog: &Catalog, mode: ResolveMode) -> DependencyMap {
    catalog
        .keys()
        .map(|key| {
            let deps = match mode {
                ResolveMode::Direct => direct_dependencies(catalog, key),
                ResolveMode::Transitive => transitive_dependencies(catalog, key),
            };
            (key.clone(), deps)
        })
        .collect()
}

/// 패키지가 직접 선언한 요구사항의 키 집합 (자기 자신 제외)
pub fn direct_dependencies(catalog: &Catalog, key: &PackageKey) -> BTreeSet<PackageKey> {
    let Some(record) = catalog.get(key) else {
        return BTreeSet::new();
    };
    record
        .requirements
        .iter()
        .map(|r| r.key())
        .filter(|dep| dep != key)
        .collect()
}

/// 요구사항을 따라 도달 가능한 모든 키 집합 (루트 제외)
///
/// 각 키는 한 번만 확장되므로 순환이 있어도 종료합니다.
pub fn transitive_dependencies(catalog: &Catalog, root: &PackageKey) -> BTreeSet<PackageKey> {
    let mut visited: BTreeSet<PackageKey> = BTreeSet::new();
    let mut stack: Vec<PackageKey> = direct_dependencies(catalog, root).into_iter().collect();

    while let Some(key) = stack.pop() {
        if !visited.insert(key.clone()) {
            continue;
        }
        if let Some(record) = catalog.get(&key) {
            stack.extend(
                record
                    .requirements
                    .iter()
                    .map(|r| r.key())
                    .filter(|dep| !visited.contains(dep)),
            );
        }
    }

    visited.remove(root);
    visited
}
