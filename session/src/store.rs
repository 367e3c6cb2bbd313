use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::record::CookieRecord;

/// Failure classes for session file access. Callers on the shell path
/// never see these; `load` recovers to an empty snapshot and `save`
/// failures are logged by the writer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("session file decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Owns the on-disk snapshot of session cookies.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the full snapshot atomically: the serialized form goes to
    /// a sibling temp file which is then renamed over the target, so a
    /// crash mid-write never corrupts the previous good file.
    pub fn save(&self, records: &[CookieRecord]) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec(records)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        debug!(count = records.len(), path = %self.path.display(), "session snapshot written");
        Ok(())
    }

    /// Reads the snapshot, recovering to an empty set on any failure.
    /// A missing file is the normal first run; a corrupt file costs the
    /// session but must never crash-loop the shell.
    pub fn load(&self) -> Vec<CookieRecord> {
        match self.read() {
            Ok(records) => records,
            Err(SessionError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no session file, starting empty");
                Vec::new()
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "session file unusable, starting empty");
                Vec::new()
            }
        }
    }

    /// Fallible reader behind `load`. Invalid records (no name or no
    /// domain) are dropped here rather than propagated.
    pub fn read(&self) -> Result<Vec<CookieRecord>, SessionError> {
        let bytes = fs::read(&self.path)?;
        let records: Vec<CookieRecord> = serde_json::from_slice(&bytes)?;

        let total = records.len();
        let records: Vec<CookieRecord> = records.into_iter().filter(CookieRecord::is_valid).collect();
        if records.len() < total {
            warn!(dropped = total - records.len(), "dropped invalid cookie records on load");
        }
        Ok(records)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(name: &str, domain: &str, path: &str) -> CookieRecord {
        CookieRecord {
            name: name.into(),
            value: format!("value-of-{name}"),
            domain: domain.into(),
            path: path.into(),
            expires: Some(1_900_000_000),
            secure: true,
            http_only: name != "theme",
            host_only: !domain.starts_with('.'),
            same_site: None,
        }
    }

    #[test]
    fn save_then_load_preserves_identities_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let records = vec![
            record("sid", ".messenger.com", "/"),
            record("xs", ".facebook.com", "/"),
            record("theme", "www.messenger.com", "/settings"),
        ];

        store.save(&records).unwrap();
        let loaded = store.load();

        let saved: BTreeSet<_> = records
            .iter()
            .map(|r| (r.identity().0.to_string(), r.value.clone()))
            .collect();
        let restored: BTreeSet<_> = loaded
            .iter()
            .map(|r| (r.identity().0.to_string(), r.value.clone()))
            .collect();
        assert_eq!(saved, restored);
        assert_eq!(loaded.len(), records.len());
    }

    #[test]
    fn repeated_save_reparses_to_the_same_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let records = vec![record("sid", ".messenger.com", "/")];

        store.save(&records).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.save(&records).unwrap();
        let second = fs::read(store.path()).unwrap();

        let a: Vec<CookieRecord> = serde_json::from_slice(&first).unwrap();
        let b: Vec<CookieRecord> = serde_json::from_slice(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"[{\"name\": \"trunc").unwrap();

        let store = SessionStore::new(path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn invalid_records_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(
            &path,
            br#"[
                {"name": "sid", "value": "abc", "domain": ".messenger.com"},
                {"name": "", "value": "x", "domain": ".messenger.com"},
                {"name": "orphan", "value": "y", "domain": ""}
            ]"#,
        )
        .unwrap();

        let store = SessionStore::new(path);
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "sid");
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&[record("sid", ".messenger.com", "/")]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["session.json"]);
    }
}
