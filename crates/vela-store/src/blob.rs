//! Named blob persistence
//!
//! Each blob is one JSON file holding a self-describing envelope:
//!
//! ```text
//! { "format": "vela/<name>", "version": 1, "checksum": "<sha256 hex>", "payload": { ... } }
//! ```
//!
//! Writes go to a unique temporary file in the same directory and are then
//! renamed over the target, so a concurrent reader sees either the previous
//! blob or the new one, never a partial write.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::watch;

use crate::{StoreConfig, StoreError, StoreResult, FORMAT_VERSION};

/// Distinguishes temporary files of concurrent writers within one process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Revision announced after every successful save
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreRevision {
    /// Saves performed through this handle, starting at 0 before any save
    pub generation: u64,
    /// Blob written by the latest save
    pub blob: Option<String>,
}

/// Where a loaded value came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOrigin {
    Stored,
    Missing,
    /// Unreadable or failed validation; the default was substituted
    Corrupt(String),
}

/// Result of a load that never fails
#[derive(Clone, Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub origin: LoadOrigin,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    checksum: String,
    payload: serde_json::Value,
}

struct Inner {
    config: StoreConfig,
    revision: watch::Sender<StoreRevision>,
}

/// Blob store rooted at one directory; cheap to clone
#[derive(Clone)]
pub struct BlobStore {
    inner: Arc<Inner>,
}

impl BlobStore {
    /// Open (creating if needed) the store directory
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&config.root).map_err(|source| StoreError::Io {
            blob: config.root.display().to_string(),
            source,
        })?;

        let (revision, _) = watch::channel(StoreRevision::default());
        Ok(BlobStore {
            inner: Arc::new(Inner { config, revision }),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Change notifications for saves made through this store
    pub fn subscribe(&self) -> watch::Receiver<StoreRevision> {
        self.inner.revision.subscribe()
    }

    /// Latest revision announced
    pub fn revision(&self) -> StoreRevision {
        self.inner.revision.borrow().clone()
    }

    /// Path of a named blob
    pub fn path_of(&self, name: &str) -> StoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.inner.config.root.join(format!("{name}.json")))
    }

    /// Atomically replace a named blob
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> StoreResult<()> {
        let target = self.path_of(name)?;

        let payload = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            blob: name.to_owned(),
            source,
        })?;
        let envelope = Envelope {
            format: format_tag(name),
            version: FORMAT_VERSION,
            checksum: checksum(&payload),
            payload,
        };
        let bytes = serde_json::to_vec_pretty(&envelope).map_err(|source| StoreError::Encode {
            blob: name.to_owned(),
            source,
        })?;

        let temp = self.inner.config.root.join(format!(
            ".{name}.{}.{}.tmp",
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(source) = self.write_then_rename(&temp, &target, &bytes) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io {
                blob: name.to_owned(),
                source,
            });
        }

        tracing::debug!(blob = name, bytes = bytes.len(), "blob saved");
        self.inner.revision.send_modify(|rev| {
            rev.generation += 1;
            rev.blob = Some(name.to_owned());
        });
        Ok(())
    }

    fn write_then_rename(
        &self,
        temp: &Path,
        target: &Path,
        bytes: &[u8],
    ) -> std::io::Result<()> {
        let mut file = File::create(temp)?;
        file.write_all(bytes)?;
        if self.inner.config.sync_writes {
            file.sync_all()?;
        }
        drop(file);
        fs::rename(temp, target)
    }

    /// Load a named blob, substituting the default when absent or corrupt
    pub fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        self.load_detailed(name).value
    }

    /// Load a named blob and report where the value came from
    pub fn load_detailed<T: DeserializeOwned + Default>(&self, name: &str) -> Loaded<T> {
        match self.try_load(name) {
            Ok(Some(value)) => Loaded {
                value,
                origin: LoadOrigin::Stored,
            },
            Ok(None) => Loaded {
                value: T::default(),
                origin: LoadOrigin::Missing,
            },
            Err(reason) => {
                tracing::warn!(blob = name, %reason, "corrupt blob, falling back to default");
                Loaded {
                    value: T::default(),
                    origin: LoadOrigin::Corrupt(reason),
                }
            }
        }
    }

    fn try_load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, String> {
        let path = self.path_of(name).map_err(|e| e.to_string())?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("read failed: {e}")),
        };

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|e| format!("malformed envelope: {e}"))?;

        if envelope.format != format_tag(name) {
            return Err(format!("unexpected format tag {:?}", envelope.format));
        }
        if envelope.version > FORMAT_VERSION {
            tracing::debug!(
                blob = name,
                version = envelope.version,
                "blob written by a newer version, decoding known fields"
            );
        }
        if checksum(&envelope.payload) != envelope.checksum {
            return Err("checksum mismatch".to_owned());
        }

        serde_json::from_value(envelope.payload)
            .map(Some)
            .map_err(|e| format!("payload decode failed: {e}"))
    }
}

fn format_tag(name: &str) -> String {
    format!("vela/{name}")
}

/// Checksum over the canonical (key-sorted) payload encoding
fn checksum(payload: &serde_json::Value) -> String {
    let canonical = payload.to_string();
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

fn validate_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_owned()))
    }
}
