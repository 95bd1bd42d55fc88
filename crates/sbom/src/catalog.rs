//! 패키지 카탈로그 병합
//!
//! 여러 소스의 [`PartialCatalog`]를 하나의 [`Catalog`]로 합칩니다.
//! 앞선 소스의 항목이 항상 우선하며, 이미 있는 키는 덮어쓰지 않습니다.

use tracing::debug;

use crate::types::{Catalog, PartialCatalog};

/// 세 소스의 결과를 병합합니다.
///
/// introspection → freeze → manifest 순서로 우선합니다.
pub fn merge(introspection: PartialCatalog, frozen: PartialCatalog, manifest: PartialCatalog) -> Catalog {
    merge_all([introspection, frozen, manifest])
}

/// 우선순위 순서로 주어진 부분 카탈로그를 병합합니다.
pub fn merge_all(sources: impl IntoIterator<Item = PartialCatalog>) -> Catalog {
    let mut catalog = Catalog::new();

    for partial in sources {
        for (key, record) in partial {
            if let Some(existing) = catalog.get(&key) {
                debug!(
                    package = %key,
                    kept = %existing.origin,
                    skipped = %record.origin,
                    "package already cataloged, keeping earlier source"
                );
                continue;
            }
            catalog.insert(key, record);
        }
    }

    catalog
}
