//! Store configuration

use std::path::{Path, PathBuf};

/// Envelope version written by this build
pub const FORMAT_VERSION: u32 = 1;

/// Store configuration
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory shared by the editor and every renderer host
    pub root: PathBuf,
    /// Flush file contents to disk before the rename
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            root: PathBuf::from("vela-data"),
            sync_writes: true,
        }
    }
}

impl StoreConfig {
    /// Store rooted at `root`
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        StoreConfig {
            root: root.as_ref().to_path_buf(),
            ..StoreConfig::default()
        }
    }

    /// Configuration for tests and throwaway stores: no fsync
    pub fn ephemeral(root: impl AsRef<Path>) -> Self {
        StoreConfig {
            root: root.as_ref().to_path_buf(),
            sync_writes: false,
        }
    }
}
