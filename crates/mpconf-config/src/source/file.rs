//! Lazily loaded, modification-time memoized file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::SourceError;

#[derive(Debug)]
struct CacheState<T> {
    loaded: bool,
    modified: Option<SystemTime>,
    data: Arc<T>,
}

/// Parsed contents of a backing file, reloaded when its mtime changes.
#[derive(Debug)]
pub(crate) struct FileCache<T> {
    path: PathBuf,
    state: Mutex<CacheState<T>>,
}

impl<T: Default> FileCache<T> {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(CacheState {
                loaded: false,
                modified: None,
                data: Arc::new(T::default()),
            }),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents, reloading first if the file changed.
    ///
    /// A missing, unreadable or malformed file yields `T::default()`.
    pub(crate) fn get<F>(&self, parse: F) -> Arc<T>
    where
        F: FnOnce(&str) -> Result<T, SourceError>,
    {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        let mut state = self.state.lock();
        if state.loaded && state.modified == modified {
            return Arc::clone(&state.data);
        }

        let data = match modified {
            Some(_) => match self.read().and_then(|content| parse(&content)) {
                Ok(data) => {
                    tracing::debug!(path = %self.path.display(), "Loaded config source");
                    data
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Config source failed to load, treating it as empty"
                    );
                    T::default()
                }
            },
            None => T::default(),
        };

        state.loaded = true;
        state.modified = modified;
        state.data = Arc::new(data);
        Arc::clone(&state.data)
    }

    /// Forgets the loaded contents so the next access reloads.
    pub(crate) fn invalidate(&self) {
        self.state.lock().loaded = false;
    }

    fn read(&self) -> Result<String, SourceError> {
        fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn parse_len(content: &str) -> Result<usize, SourceError> {
        Ok(content.len())
    }

    #[test]
    fn test_missing_file_is_default() {
        let cache: FileCache<usize> = FileCache::new("/nonexistent/application.properties");
        assert_eq!(*cache.get(parse_len), 0);
    }

    #[test]
    fn test_loads_once_until_modified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.properties");
        fs::write(&path, "abc").unwrap();

        let cache: FileCache<usize> = FileCache::new(&path);
        let calls = Cell::new(0);
        let counting = |content: &str| {
            calls.set(calls.get() + 1);
            parse_len(content)
        };
        assert_eq!(*cache.get(counting), 3);
        assert_eq!(*cache.get(counting), 3);
        assert_eq!(calls.get(), 1);

        cache.invalidate();
        assert_eq!(*cache.get(counting), 3);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_parse_failure_resets_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yaml");
        fs::write(&path, "anything").unwrap();

        let cache: FileCache<usize> = FileCache::new(&path);
        let failing = |_: &str| -> Result<usize, SourceError> {
            Err(SourceError::Io {
                path: PathBuf::from("a.yaml"),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "bad"),
            })
        };
        assert_eq!(*cache.get(failing), 0);
    }
}
