use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;

use crate::models::SurveyRecord;

const RECORDS_FILE: &str = "records.json";
const STAMP_FILE: &str = "last_fetch";

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Disk snapshot of the last fetched record set: the serialized array plus a
/// millisecond fetch timestamp, reused while younger than the TTL. File access
/// goes through one mutex so concurrent callers in the same process cannot
/// interleave a store with a load.
pub struct SnapshotCache {
    dir: PathBuf,
    ttl: Duration,
    guard: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, DEFAULT_TTL)
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        SnapshotCache {
            dir: dir.into(),
            ttl,
            guard: Mutex::new(()),
        }
    }

    /// Returns the snapshot while it is still fresh. Any missing file, parse
    /// failure, or stale stamp reads as "no snapshot".
    pub fn load(&self) -> Option<Vec<SurveyRecord>> {
        let _lock = self.guard.lock().ok()?;
        let fetched_at = self.read_stamp()?;
        let age = Utc::now().timestamp_millis().saturating_sub(fetched_at);
        if age < 0 || age as u128 >= self.ttl.as_millis() {
            return None;
        }
        self.read_records()
    }

    /// Returns the snapshot regardless of age. Fallback path for when the
    /// network is down and old data beats no data.
    pub fn load_stale(&self) -> Option<Vec<SurveyRecord>> {
        let _lock = self.guard.lock().ok()?;
        self.read_records()
    }

    pub fn store(&self, records: &[SurveyRecord]) -> anyhow::Result<()> {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot cache lock poisoned"))?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create cache dir {}", self.dir.display()))?;
        let json = serde_json::to_string(records).context("failed to serialize snapshot")?;
        fs::write(self.records_path(), json)
            .with_context(|| format!("failed to write {}", self.records_path().display()))?;
        fs::write(self.stamp_path(), Utc::now().timestamp_millis().to_string())
            .with_context(|| format!("failed to write {}", self.stamp_path().display()))?;
        Ok(())
    }

    /// Removes both snapshot entries; missing files are fine.
    pub fn clear(&self) {
        if let Ok(_lock) = self.guard.lock() {
            let _ = fs::remove_file(self.records_path());
            let _ = fs::remove_file(self.stamp_path());
        }
    }

    fn read_stamp(&self) -> Option<i64> {
        let raw = fs::read_to_string(self.stamp_path()).ok()?;
        raw.trim().parse().ok()
    }

    fn read_records(&self) -> Option<Vec<SurveyRecord>> {
        let raw = fs::read_to_string(self.records_path()).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    fn stamp_path(&self) -> PathBuf {
        self.dir.join(STAMP_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<SurveyRecord> {
        serde_json::from_str(r#"[{"id":"r-1","age":"18-24","q1":"a"}]"#).expect("records parse")
    }

    #[test]
    fn stores_and_loads_a_fresh_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SnapshotCache::new(dir.path());
        cache.store(&sample_records()).expect("store");

        let loaded = cache.load().expect("fresh snapshot");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id.as_deref(), Some("r-1"));
    }

    #[test]
    fn expired_snapshot_only_loads_as_stale() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SnapshotCache::with_ttl(dir.path(), Duration::from_millis(0));
        cache.store(&sample_records()).expect("store");

        assert!(cache.load().is_none());
        assert!(cache.load_stale().is_some());
    }

    #[test]
    fn missing_or_corrupt_entries_read_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SnapshotCache::new(dir.path());
        assert!(cache.load().is_none());
        assert!(cache.load_stale().is_none());

        fs::create_dir_all(dir.path()).expect("dir");
        fs::write(dir.path().join(RECORDS_FILE), "not json").expect("write");
        fs::write(dir.path().join(STAMP_FILE), "soon").expect("write");
        assert!(cache.load().is_none());
        assert!(cache.load_stale().is_none());
    }

    #[test]
    fn clear_removes_the_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SnapshotCache::new(dir.path());
        cache.store(&sample_records()).expect("store");
        cache.clear();
        assert!(cache.load().is_none());
        assert!(cache.load_stale().is_none());
    }
}
