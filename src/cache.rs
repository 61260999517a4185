use crate::error::LoadError;
use crate::loader;
use crate::record::Dataset;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Memoized outcome of loading one path
#[derive(Clone, Debug)]
enum CachedLoad {
    Loaded(Arc<Dataset>),
    NotFound,
}

/// Path-keyed cache of loaded datasets
///
/// Entries live for the whole process: there is no eviction and no
/// invalidation when the file changes on disk. A missing file is remembered
/// as missing. Parse and I/O failures are not remembered, so the next call
/// reads the file again.
///
/// A miss parses the file while holding the write lock, so concurrent first
/// callers wait for one read instead of each reading the file. The call
/// blocks; async callers run it on the blocking pool. A malformed file is
/// read again on every call.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<PathBuf, CachedLoad>>,
    reads: AtomicUsize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dataset for `path`, reading the file only on the first call
    ///
    /// # Arguments
    /// * `path` - Path of the CSV file, used verbatim as the cache key
    ///
    /// # Returns
    /// * `Result<Arc<Dataset>, LoadError>` - The shared dataset or the load error
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Dataset>, LoadError> {
        let path = path.as_ref();

        if let Some(hit) = self.lookup(path) {
            debug!("Cache hit for {}", path.display());
            return hit;
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // another request may have filled the entry while we waited for the lock
        if let Some(cached) = entries.get(path) {
            return Self::outcome(cached, path);
        }

        self.reads.fetch_add(1, Ordering::SeqCst);
        match loader::load_dataset(path) {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                entries.insert(path.to_path_buf(), CachedLoad::Loaded(Arc::clone(&dataset)));
                Ok(dataset)
            }
            Err(err) if err.is_not_found() => {
                warn!("Data file {} not found", path.display());
                entries.insert(path.to_path_buf(), CachedLoad::NotFound);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Number of times a file was actually read from disk
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(path.as_ref()))
            .unwrap_or(false)
    }

    fn lookup(&self, path: &Path) -> Option<Result<Arc<Dataset>, LoadError>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(path).map(|cached| Self::outcome(cached, path))
    }

    fn outcome(cached: &CachedLoad, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        match cached {
            CachedLoad::Loaded(dataset) => Ok(Arc::clone(dataset)),
            CachedLoad::NotFound => Err(LoadError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }
}
