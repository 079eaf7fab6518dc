use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::errors::{ListenerError, ListenerResult};

/// Sentinel cursor meaning "start from the present position".
pub const CURSOR_NOW: &str = "now";

/// File-backed map of chain name to poll cursor.
///
/// Pollers persist their cursor after every successfully fetched batch so a
/// restart resumes where the previous run stopped instead of skipping ahead
/// to the present.
pub struct CursorStore {
    path: PathBuf,
    cursors: Mutex<HashMap<String, String>>,
}

impl CursorStore {
    /// Loads cursors from `path`, starting empty when the file is missing.
    pub fn load(path: impl AsRef<Path>) -> ListenerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let cursors = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                ListenerError::CursorStore(format!("parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(ListenerError::CursorStore(format!(
                    "read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self {
            path,
            cursors: Mutex::new(cursors),
        })
    }

    pub fn get(&self, chain: &str) -> Option<String> {
        self.cursors.lock().get(chain).cloned()
    }

    /// Records `cursor` for `chain` and rewrites the backing file.
    pub fn set(&self, chain: &str, cursor: &str) -> ListenerResult<()> {
        let snapshot = {
            let mut cursors = self.cursors.lock();
            cursors.insert(chain.to_string(), cursor.to_string());
            cursors.clone()
        };
        self.persist(&snapshot)?;
        debug!("persisted {} cursor {}", chain, cursor);
        Ok(())
    }

    fn persist(&self, snapshot: &HashMap<String, String>) -> ListenerResult<()> {
        let raw = serde_json::to_string_pretty(snapshot)
            .map_err(|e| ListenerError::CursorStore(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw.as_bytes())
            .map_err(|e| ListenerError::CursorStore(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| ListenerError::CursorStore(format!("rename {}: {}", tmp.display(), e)))?;
        Ok(())
    }
}
