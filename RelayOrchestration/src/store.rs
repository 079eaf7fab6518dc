use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use metrics::gauge;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::errors::{StoreError, StoreResult};

/// File-backed set of transaction ids that have already been credited.
///
/// Membership is append-only: an id is never removed. Every `record` rewrites
/// the whole backing file before returning, so restart recovery never loses
/// an id the relay already acted on. Internally locked; the per-chain relay
/// tasks share one instance.
pub struct ProcessedTxStore {
    path: PathBuf,
    ids: Mutex<BTreeSet<String>>,
}

impl ProcessedTxStore {
    /// Loads the persisted id set, starting empty when the file is missing.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let ids: BTreeSet<String> = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                return Err(StoreError::Io(format!("read {}: {}", path.display(), e)))
            }
        };
        info!(
            "loaded {} processed transaction ids from {}",
            ids.len(),
            path.display()
        );
        Ok(Self {
            path,
            ids: Mutex::new(ids),
        })
    }

    pub fn contains(&self, tx_id: &str) -> bool {
        self.ids.lock().contains(tx_id)
    }

    /// Adds `tx_id` and synchronously rewrites the backing file. Recording an
    /// id that is already present is a no-op. Safe to call without a prior
    /// `contains` check.
    pub fn record(&self, tx_id: &str) -> StoreResult<()> {
        let snapshot = {
            let mut ids = self.ids.lock();
            if !ids.insert(tx_id.to_string()) {
                return Ok(());
            }
            ids.iter().cloned().collect::<Vec<String>>()
        };
        self.persist(&snapshot)?;
        gauge!("relay_processed_ids").set(snapshot.len() as f64);
        debug!("recorded processed transaction {}", tx_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }

    fn persist(&self, ids: &[String]) -> StoreResult<()> {
        let raw = serde_json::to_string_pretty(ids).map_err(|e| StoreError::Io(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw.as_bytes())
            .map_err(|e| StoreError::Io(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Io(format!("rename {}: {}", tmp.display(), e)))?;
        Ok(())
    }
}
