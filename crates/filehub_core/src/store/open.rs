//! Data directory bootstrap.
//!
//! # Responsibility
//! - Create the data root and every partition directory.
//! - Return a store that is ready for reads and writes.
//!
//! # Invariants
//! - Returned stores have one existing directory per `EntityKind`.

use super::{EntityKind, RecordStore, StoreError, StoreResult};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Opens (and if needed initializes) the record store under `data_dir`.
///
/// # Side effects
/// - Creates missing directories.
/// - Emits `store_open` logging events with duration and status.
pub fn open_store(data_dir: impl AsRef<Path>) -> StoreResult<RecordStore> {
    let started_at = Instant::now();
    let root = data_dir.as_ref().to_path_buf();
    info!(
        "event=store_open module=store status=start data_dir={}",
        root.display()
    );

    match bootstrap_layout(&root) {
        Ok(()) => {
            info!(
                "event=store_open module=store status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(RecordStore::new(root))
        }
        Err(err) => {
            error!(
                "event=store_open module=store status=error duration_ms={} error_code=store_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_layout(root: &Path) -> StoreResult<()> {
    create_dir(root.to_path_buf())?;
    for kind in EntityKind::ALL {
        create_dir(root.join(kind.partition()))?;
    }
    Ok(())
}

fn create_dir(path: PathBuf) -> StoreResult<()> {
    std::fs::create_dir_all(&path).map_err(|source| StoreError::Io { path, source })
}
