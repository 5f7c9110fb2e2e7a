use crate::core::draft::{DraftSnapshot, STORAGE_KEY};
use crate::core::ports::cache::DraftCache;
use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps the draft snapshot as one JSON file named after the storage key, so
/// an interrupted or failed save can be picked up again on the next visit.
pub struct LocalFileCache {
    path: PathBuf,
}

impl LocalFileCache {
    pub fn new(dir: &str) -> Self {
        Self {
            path: Path::new(dir).join(format!("{STORAGE_KEY}.json")),
        }
    }
}

impl DraftCache for LocalFileCache {
    fn store(&self, snapshot: &DraftSnapshot) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(snapshot)?)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<DraftSnapshot>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn clear(&self) -> Result<(), Error> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use uuid::Uuid;

    fn temp_cache() -> LocalFileCache {
        let dir = std::env::temp_dir().join(format!("surveyforge-{}", Uuid::new_v4()));
        LocalFileCache::new(dir.to_str().unwrap())
    }

    #[test]
    fn stores_and_reloads_the_snapshot() {
        let cache = temp_cache();
        assert!(cache.load().unwrap().is_none());

        let snapshot = DraftSnapshot {
            title: "Course feedback".into(),
            ..DraftSnapshot::default()
        };
        cache.store(&snapshot).unwrap();
        assert_eq!(cache.load().unwrap(), Some(snapshot));

        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn clear_of_an_absent_entry_is_fine() {
        let cache = temp_cache();
        cache.clear().unwrap();
    }
}
