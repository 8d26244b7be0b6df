//! Durable storage for the pending queue.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use aegis_core::{AegisError, AegisResult, QueueEntry};

/// One durable slot holding the serialized queue.
///
/// `load` on an empty slot returns an empty list, not an error; a slot
/// whose payload does not parse is reported as `CorruptPayload` and the
/// caller starts fresh.
pub trait QueueStore: Send + Sync {
    fn load(&self) -> AegisResult<Vec<QueueEntry>>;
    fn save(&self, entries: &[QueueEntry]) -> AegisResult<()>;
}

impl<S: QueueStore + ?Sized> QueueStore for std::sync::Arc<S> {
    fn load(&self) -> AegisResult<Vec<QueueEntry>> {
        (**self).load()
    }

    fn save(&self, entries: &[QueueEntry]) -> AegisResult<()> {
        (**self).save(entries)
    }
}

/// A single JSON file as the durable slot.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// File name used when anchoring the store in a directory.
    pub const DEFAULT_FILE_NAME: &'static str = "webxr_error_queue.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStore for FileStore {
    fn load(&self) -> AegisResult<Vec<QueueEntry>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AegisError::StorageError(e.to_string())),
        };
        serde_json::from_slice(&bytes).map_err(|e| AegisError::CorruptPayload(e.to_string()))
    }

    fn save(&self, entries: &[QueueEntry]) -> AegisResult<()> {
        let json = serde_json::to_vec(entries)
            .map_err(|e| AegisError::StorageError(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| AegisError::StorageError(e.to_string()))
    }
}

/// In-memory slot with scriptable failures.
///
/// Holds the serialized payload, so round-trips exercise the same
/// serialization path as the file store. Used by tests and by embedders
/// that have no disk.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
    fail_loads: AtomicU32,
    fail_saves: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` loads with a storage error.
    pub fn fail_next_loads(&self, n: u32) {
        self.fail_loads.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` saves with a storage error.
    pub fn fail_next_saves(&self, n: u32) {
        self.fail_saves.store(n, Ordering::SeqCst);
    }

    /// Overwrite the slot with an arbitrary payload, valid or not.
    pub fn set_raw(&self, payload: impl Into<String>) {
        *self.slot.lock() = Some(payload.into());
    }

    /// The raw payload currently stored.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().clone()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl QueueStore for MemoryStore {
    fn load(&self) -> AegisResult<Vec<QueueEntry>> {
        if Self::take_failure(&self.fail_loads) {
            return Err(AegisError::StorageError("scripted load failure".into()));
        }
        match self.slot.lock().as_deref() {
            None => Ok(Vec::new()),
            Some(payload) => serde_json::from_str(payload)
                .map_err(|e| AegisError::CorruptPayload(e.to_string())),
        }
    }

    fn save(&self, entries: &[QueueEntry]) -> AegisResult<()> {
        if Self::take_failure(&self.fail_saves) {
            return Err(AegisError::StorageError("scripted save failure".into()));
        }
        let json = serde_json::to_string(entries)
            .map_err(|e| AegisError::StorageError(e.to_string()))?;
        *self.slot.lock() = Some(json);
        Ok(())
    }
}
