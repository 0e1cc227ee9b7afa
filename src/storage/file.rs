//! File-backed durable store.
//!
//! The whole origin lives in one JSON object on disk. Every mutation rewrites
//! the file through a temporary sibling and a rename, so a crash leaves
//! either the old or the new contents.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{entry_size, DurableStore};
use crate::error::{StoreError, StoreResult};

// == File Store ==
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    quota: usize,
    entries: BTreeMap<String, String>,
    used: usize,
}

impl FileStore {
    // == Open ==
    /// Opens (or creates) the store at `path` with a byte capacity.
    ///
    /// A missing file starts empty. A file that is not a JSON string map is
    /// logged and replaced on the next write. Any other I/O failure is
    /// returned so the caller can fall back to memory-only operation.
    pub fn open(path: impl AsRef<Path>, quota: usize) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, String>>(&text) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("Discarding unreadable storage file {}: {}", path.display(), err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        let used: usize = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
        debug!(
            "Opened file store {} ({} entries, {} bytes)",
            path.display(),
            entries.len(),
            used
        );

        Ok(Self {
            path,
            quota,
            entries,
            used,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn used_bytes(&self) -> usize {
        self.used
    }

    // == Persist ==
    fn persist(&self) -> StoreResult<()> {
        let text = serde_json::to_string(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let replaced = self.entries.get(key).map(|old| entry_size(key, old)).unwrap_or(0);
        let needed = entry_size(key, value);
        let base = self.used - replaced;

        if base + needed > self.quota {
            return Err(StoreError::QuotaExceeded {
                needed,
                available: self.quota.saturating_sub(base),
            });
        }

        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(err) = self.persist() {
            // Keep the in-memory view identical to the file
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(err);
        }

        self.used = base + needed;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let Some(old) = self.entries.remove(key) else {
            return Ok(());
        };

        if let Err(err) = self.persist() {
            self.entries.insert(key.to_string(), old);
            return Err(err);
        }

        self.used -= entry_size(key, &old);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
