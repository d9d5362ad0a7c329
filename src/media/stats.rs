//! Storage statistics
//!
//! Sizes come from the blob store at request time; catalog entries whose file
//! is gone are counted as missing instead of failing the whole report.

use serde::Serialize;
use std::collections::BTreeMap;

use super::catalog::Catalog;
use super::store;
use crate::error::{MediaError, Result};
use crate::http::mime::MediaKind;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub storage: StorageUsage,
    pub files: FileCounts,
    pub breakdown: Breakdown,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    /// Bytes used by every present file
    pub used: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FileCounts {
    pub total: usize,
    /// Catalogued entries whose file is not in the store
    pub missing: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub by_type: Vec<TypeUsage>,
    pub by_category: Vec<CategoryUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeUsage {
    pub file_type: MediaKind,
    pub count: usize,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    /// `null` groups uncategorised entries
    pub category: Option<String>,
    pub count: usize,
    pub size_bytes: u64,
}

const KINDS: [MediaKind; 4] = [
    MediaKind::Image,
    MediaKind::Video,
    MediaKind::Audio,
    MediaKind::Other,
];

/// Sum file sizes over the catalog, grouped by media kind and by category
///
/// Groups are ordered by size, largest first.
pub async fn collect(catalog: &Catalog) -> Result<StorageStats> {
    let mut stats = StorageStats::default();
    let mut by_kind = KINDS.map(|kind| TypeUsage {
        file_type: kind,
        count: 0,
        size_bytes: 0,
    });
    let mut by_category: BTreeMap<Option<String>, (usize, u64)> = BTreeMap::new();

    for entry in catalog.entries() {
        let size = match store::stat(catalog.root(), entry).await {
            Ok(object) => object.total_length,
            Err(MediaError::FileMissing { .. }) => {
                stats.files.missing += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        stats.files.total += 1;
        stats.storage.used += size;

        if let Some(usage) = by_kind.iter_mut().find(|u| u.file_type == entry.media_kind) {
            usage.count += 1;
            usage.size_bytes += size;
        }
        let group = by_category.entry(entry.category.clone()).or_default();
        group.0 += 1;
        group.1 += size;
    }

    stats.breakdown.by_type = by_kind.into_iter().filter(|u| u.count > 0).collect();
    stats
        .breakdown
        .by_type
        .sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

    stats.breakdown.by_category = by_category
        .into_iter()
        .map(|(category, (count, size_bytes))| CategoryUsage {
            category,
            count,
            size_bytes,
        })
        .collect();
    stats
        .breakdown
        .by_category
        .sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use std::fs;

    #[tokio::test]
    async fn test_collect_groups_by_kind_and_category() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), [0u8; 300]).unwrap();
        fs::write(dir.path().join("b.mp4"), [0u8; 200]).unwrap();
        fs::write(dir.path().join("c.jpg"), [0u8; 50]).unwrap();
        fs::write(dir.path().join("gone.mp3"), [0u8; 10]).unwrap();
        let manifest = dir.path().join("catalog.toml");
        fs::write(
            &manifest,
            r#"
[[media]]
id = "a.mp4"
file = "a.mp4"
category = "Trips"
"#,
        )
        .unwrap();

        let catalog = Catalog::load(&StorageConfig {
            media_dir: dir.path().to_string_lossy().into_owned(),
            manifest_file: Some(manifest.to_string_lossy().into_owned()),
            auto_index: true,
        })
        .unwrap();
        fs::remove_file(dir.path().join("gone.mp3")).unwrap();

        let stats = collect(&catalog).await.unwrap();
        assert_eq!(stats.storage.used, 550);
        assert_eq!(stats.files.total, 3);
        assert_eq!(stats.files.missing, 1);

        assert_eq!(
            stats.breakdown.by_type,
            vec![
                TypeUsage {
                    file_type: MediaKind::Video,
                    count: 2,
                    size_bytes: 500
                },
                TypeUsage {
                    file_type: MediaKind::Image,
                    count: 1,
                    size_bytes: 50
                },
            ]
        );
        assert_eq!(stats.breakdown.by_category[0].category.as_deref(), Some("Trips"));
        assert_eq!(stats.breakdown.by_category[0].size_bytes, 300);
        assert_eq!(stats.breakdown.by_category[1].category, None);
        assert_eq!(stats.breakdown.by_category[1].count, 2);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["breakdown"]["byType"][0]["file_type"], "video");
        assert!(json["breakdown"]["byCategory"].is_array());
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let stats = collect(&Catalog::default()).await.unwrap();
        assert_eq!(stats, StorageStats::default());
    }
}
