// src/store/cache.rs
use std::{
    any::Any,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
    time::SystemTime,
};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::schema::Record;

struct Entry {
    modified: SystemTime,
    records: Arc<dyn Any + Send + Sync>,
}

/// Loaded datasets keyed by path. An entry is reused only while the file's
/// modification time is unchanged; callers can also drop entries by hand.
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Entry>> {
        // a panic mid-insert leaves at worst a stale entry
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records of `path`, from cache when the file is unchanged.
    pub fn get_or_load<R: Record>(&self, path: &Path) -> Result<Arc<Vec<R>>> {
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.invalidate(path);
                return Err(PipelineError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(entry) = self.lock().get(path) {
            if entry.modified == modified {
                if let Ok(records) = Arc::clone(&entry.records).downcast::<Vec<R>>() {
                    debug!(file = %path.display(), "cache hit");
                    return Ok(records);
                }
            }
        }

        let records = Arc::new(super::load::<R>(path)?);
        self.lock().insert(
            path.to_path_buf(),
            Entry {
                modified,
                records: records.clone(),
            },
        );
        debug!(file = %path.display(), rows = records.len(), "cache fill");
        Ok(records)
    }

    /// Forget `path`. Returns whether it was cached.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.lock().remove(path).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ClassificationRecord;
    use crate::store::save;
    use anyhow::Result;
    use std::time::Duration;
    use tempfile::tempdir;

    fn rows(n: u32) -> Vec<ClassificationRecord> {
        (1..=n)
            .map(|no| ClassificationRecord {
                level1: "감축".into(),
                level2: "재생에너지".into(),
                level3: format!("기술{no}"),
                no,
            })
            .collect()
    }

    fn touch(path: &Path, offset_secs: u64) -> Result<()> {
        let f = fs::File::options().write(true).open(path)?;
        f.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))?;
        Ok(())
    }

    #[test]
    fn reuses_until_modified() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("climate_tech_classification.csv");
        save(&rows(2), &path)?;
        touch(&path, 0)?;

        let cache = DatasetCache::new();
        let first = cache.get_or_load::<ClassificationRecord>(&path)?;
        let second = cache.get_or_load::<ClassificationRecord>(&path)?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        save(&rows(3), &path)?;
        touch(&path, 60)?;
        let third = cache.get_or_load::<ClassificationRecord>(&path)?;
        assert_eq!(third.len(), 3);
        Ok(())
    }

    #[test]
    fn invalidate_and_clear() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("c.csv");
        save(&rows(1), &path)?;

        let cache = DatasetCache::new();
        let first = cache.get_or_load::<ClassificationRecord>(&path)?;
        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
        let again = cache.get_or_load::<ClassificationRecord>(&path)?;
        assert!(!Arc::ptr_eq(&first, &again));

        cache.clear();
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn deleted_file_is_not_found_and_evicted() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("c.csv");
        save(&rows(1), &path)?;
        let cache = DatasetCache::new();
        cache.get_or_load::<ClassificationRecord>(&path)?;

        fs::remove_file(&path)?;
        let err = cache.get_or_load::<ClassificationRecord>(&path).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
        assert!(cache.is_empty());
        Ok(())
    }
}
