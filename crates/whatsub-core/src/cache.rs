use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Stable directory name for a base/table pair.
pub fn get_snapshot_id(base_id: &str, table: &str) -> String {
    let mut hasher = DefaultHasher::new();
    base_id.hash(&mut hasher);
    table.hash(&mut hasher);
    hasher.finish().to_string()
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("whatsub")
}

pub fn get_snapshot_dir(base_id: &str, table: &str) -> PathBuf {
    get_root_cache_dir().join(get_snapshot_id(base_id, table))
}

pub fn get_records_path(snapshot_dir: &Path) -> PathBuf {
    snapshot_dir.join("records.json")
}

/// Writes a raw listing body to disk, creating the snapshot directory if
/// needed.
pub async fn save_raw_listing(body: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_id_is_stable() {
        assert_eq!(
            get_snapshot_id("appBase", "tblUsers"),
            get_snapshot_id("appBase", "tblUsers")
        );
    }

    #[test]
    fn snapshot_id_differs_per_table() {
        assert_ne!(
            get_snapshot_id("appBase", "tblUsers"),
            get_snapshot_id("appBase", "Table 1")
        );
    }

    #[test]
    fn snapshot_paths_live_under_the_whatsub_root() {
        let dir = get_snapshot_dir("appBase", "tblUsers");
        assert!(dir.starts_with(get_root_cache_dir()));
        assert!(get_root_cache_dir().ends_with("whatsub"));
        assert!(get_records_path(&dir).ends_with("records.json"));
    }

    #[tokio::test]
    async fn save_creates_directories_and_writes() {
        let dir = std::env::temp_dir().join(format!("whatsub-cache-test-{}", std::process::id()));
        let path = dir.join("nested").join("records.json");
        save_raw_listing("{\"records\":[]}", &path).await.unwrap();
        let read_back = std::fs::read_to_string(&path).unwrap();
        assert_eq!(read_back, "{\"records\":[]}");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
