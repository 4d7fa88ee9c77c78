use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::domain::{Dataset, MonthKey};
use crate::error::SeriesError;

pub const SUNSPOT_FILE_NAME: &str = "mtkmonthly.txt";

/// Local cache of raw downloads.
///
/// A file being present is the only signal that it has been retrieved; there
/// is no content hash, ETag or modification time check.
#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new(cache_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn dst_path(&self, key: MonthKey) -> Utf8PathBuf {
        self.cache_root.join(format!("{}.html", key.compact()))
    }

    pub fn sunspot_path(&self) -> Utf8PathBuf {
        self.cache_root.join(SUNSPOT_FILE_NAME)
    }

    /// Dst entries are per month and need a key; the sunspot table is one
    /// file and ignores it.
    pub fn path(&self, dataset: Dataset, key: Option<MonthKey>) -> Result<Utf8PathBuf, SeriesError> {
        match (dataset, key) {
            (Dataset::Dst, Some(key)) => Ok(self.dst_path(key)),
            (Dataset::Dst, None) => Err(SeriesError::InvalidMonthKey(
                "dst cache entries need a month".to_string(),
            )),
            (Dataset::Sunspot, _) => Ok(self.sunspot_path()),
        }
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().is_file()
    }

    pub fn ensure_cache_root(&self) -> Result<(), SeriesError> {
        fs::create_dir_all(self.cache_root.as_std_path())
            .map_err(|err| SeriesError::Filesystem(err.to_string()))
    }

    /// Writes `content` to a temp file next to `path` and renames it into
    /// place, so `path` never exists with partial content.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), SeriesError> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| SeriesError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".geospace-download")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| SeriesError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| SeriesError::Filesystem(format!("write {path}: {err}")))?;
        temp.as_file()
            .sync_all()
            .map_err(|err| SeriesError::Filesystem(format!("sync {path}: {err}")))?;
        temp.persist(path.as_std_path())
            .map_err(|err| SeriesError::Filesystem(format!("persist {path}: {}", err.error)))?;
        tracing::debug!(%path, bytes = content.len(), "cache entry written");
        Ok(())
    }

    pub fn read_to_string(path: &Utf8Path) -> Result<String, SeriesError> {
        let bytes = fs::read(path.as_std_path())
            .map_err(|err| SeriesError::Filesystem(format!("read {path}: {err}")))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new("cache");
        let key = MonthKey::new(1957, 3).unwrap();

        assert_eq!(store.dst_path(key), Utf8PathBuf::from("cache/195703.html"));
        assert_eq!(
            store.path(Dataset::Sunspot, None).unwrap(),
            Utf8PathBuf::from("cache/mtkmonthly.txt")
        );
    }
}
