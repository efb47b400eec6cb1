//! # Blob Storage
//!
//! Durable key-value storage for serialized user state, plus a background
//! mirror that writes the latest snapshot without blocking the caller.
//!
//! File writes use atomic rename (write `.tmp`, then `rename()`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::error::StorageError;

pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, `None` if nothing was stored yet.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    /// Keep a copy of the blob under `key` aside, so a later `save` does not
    /// destroy it. Stores it under `<key>.bak` unless overridden.
    fn backup(&self, key: &str) -> Result<(), StorageError> {
        match self.load(key)? {
            Some(blob) => self.save(&format!("{}.bak", key), &blob),
            None => Ok(()),
        }
    }
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn backup_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json.bak", key))
    }
}

impl BlobStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| StorageError::Io {
                operation: "read",
                path,
                source,
            })
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            operation: "create",
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, blob).map_err(|source| StorageError::Io {
            operation: "write",
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| StorageError::Io {
            operation: "rename",
            path,
            source,
        })
    }

    fn backup(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }
        fs::rename(&path, self.backup_path_for(key)).map_err(|source| StorageError::Io {
            operation: "backup",
            path,
            source,
        })
    }
}

/// In-process store; clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.lock().ok().and_then(|blobs| blobs.get(key).cloned())
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.to_string(), blob.to_string());
        }
        Ok(())
    }
}

/// Writes snapshots to a [`BlobStore`] on a worker thread.
///
/// Snapshots queued while a write is in flight are coalesced: only the newest
/// one is written. Failures are logged and dropped. Dropping the mirror
/// flushes whatever is still queued.
pub struct PersistenceMirror {
    sender: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceMirror {
    pub fn spawn(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (sender, receiver) = mpsc::channel();
        let worker = std::thread::spawn(move || write_latest(store.as_ref(), &key, receiver));

        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queue `blob` for writing. Never blocks on I/O.
    pub fn push(&self, blob: String) {
        if let Some(sender) = &self.sender {
            if sender.send(blob).is_err() {
                warn!("Persistence worker is gone, snapshot dropped");
            }
        }
    }
}

fn write_latest(store: &dyn BlobStore, key: &str, receiver: Receiver<String>) {
    while let Ok(mut blob) = receiver.recv() {
        while let Ok(newer) = receiver.try_recv() {
            blob = newer;
        }
        match store.save(key, &blob) {
            Ok(()) => debug!("Persisted {} ({} bytes)", key, blob.len()),
            Err(e) => warn!("Failed to persist {}: {}", key, e),
        }
    }
}

impl Drop for PersistenceMirror {
    fn drop(&mut self) {
        // closing the channel ends the worker loop once the queue is drained
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Persistence worker panicked");
            }
        }
    }
}
