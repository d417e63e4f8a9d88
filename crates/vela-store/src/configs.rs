//! Typed access to the blobs shared by the editor and renderer hosts
//!
//! The editor writes `display` and `rotation`; renderer hosts only read them
//! and keep their own position in `rotation_cursor`.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use vela_core::{DisplayConfig, RotationContent};

use crate::{BlobStore, Loaded, StoreConfig, StoreResult, StoreRevision};

pub const DISPLAY_BLOB: &str = "display";
pub const ROTATION_BLOB: &str = "rotation";
pub const USAGE_BLOB: &str = "usage";
/// Written only by renderer hosts
pub const CURSOR_BLOB: &str = "rotation_cursor";

/// Free-tier generation counter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationUsage {
    pub used: u32,
}

/// Where the renderer left off in the rotation
///
/// `base_index` is the display config's `rotation_index` the cursor was
/// derived from; an editor that changes that index resets the cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationCursor {
    pub next_index: u64,
    pub base_index: u64,
}

/// Configuration store: display config, rotation content and usage counter
#[derive(Clone)]
pub struct ConfigStore {
    blobs: BlobStore,
}

impl ConfigStore {
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        Ok(ConfigStore {
            blobs: BlobStore::open(config)?,
        })
    }

    pub fn from_blobs(blobs: BlobStore) -> Self {
        ConfigStore { blobs }
    }

    /// Underlying blob store, shared with other persisted state
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreRevision> {
        self.blobs.subscribe()
    }

    pub fn save_display(&self, cfg: &DisplayConfig) -> StoreResult<()> {
        self.blobs.save(DISPLAY_BLOB, cfg)
    }

    pub fn load_display(&self) -> DisplayConfig {
        self.blobs.load(DISPLAY_BLOB)
    }

    pub fn load_display_detailed(&self) -> Loaded<DisplayConfig> {
        self.blobs.load_detailed(DISPLAY_BLOB)
    }

    pub fn save_rotation(&self, content: &RotationContent) -> StoreResult<()> {
        self.blobs.save(ROTATION_BLOB, content)
    }

    pub fn load_rotation(&self) -> RotationContent {
        self.blobs.load(ROTATION_BLOB)
    }

    pub fn save_usage(&self, usage: &GenerationUsage) -> StoreResult<()> {
        self.blobs.save(USAGE_BLOB, usage)
    }

    pub fn load_usage(&self) -> GenerationUsage {
        self.blobs.load(USAGE_BLOB)
    }

    pub fn save_cursor(&self, cursor: &RotationCursor) -> StoreResult<()> {
        self.blobs.save(CURSOR_BLOB, cursor)
    }

    pub fn load_cursor(&self) -> Loaded<RotationCursor> {
        self.blobs.load_detailed(CURSOR_BLOB)
    }
}
