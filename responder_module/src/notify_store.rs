//! Durable record of which senders were auto-replied to, and when.
//!
//! The on-disk image is a single JSON object mapping sender identifier to
//! the RFC 3339 timestamp of the last auto-reply. Unreadable or malformed
//! content is replaced with an empty image at open time; only write
//! failures surface to callers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum NotifyStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("datetime parse error: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
}

/// Mapping from sender identifier to the timestamp of the last auto-reply
/// sent to that sender, mirrored to a JSON file.
#[derive(Debug)]
pub struct NotificationStore {
    path: PathBuf,
    entries: BTreeMap<String, DateTime<Local>>,
}

impl NotificationStore {
    /// Open the store at `path`, loading any existing image. A missing or
    /// unreadable image yields an empty store and the file is reset to an
    /// empty mapping; read problems never fail the caller.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(err) => {
                if path.exists() {
                    warn!(
                        "notification store at {} unreadable ({}), resetting to empty",
                        path.display(),
                        err
                    );
                }
                BTreeMap::new()
            }
        };
        let store = Self { path, entries };
        if store.entries.is_empty() {
            if let Err(err) = store.save() {
                warn!(
                    "could not initialize notification store at {}: {}",
                    store.path.display(),
                    err
                );
            }
        }
        store
    }

    /// Timestamp of the last auto-reply sent to `sender_id`, if any.
    pub fn last_sent(&self, sender_id: &str) -> Option<DateTime<Local>> {
        self.entries.get(sender_id).copied()
    }

    /// Set the record for `sender_id`. In-memory only; callers persist via
    /// `save`.
    pub fn upsert(&mut self, sender_id: &str, at: DateTime<Local>) {
        self.entries.insert(sender_id.to_string(), at);
    }

    /// Write the full mapping to disk. The payload goes to a temp file in
    /// the same directory and is renamed over the image, so readers never
    /// observe a partial file.
    pub fn save(&self) -> Result<(), NotifyStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let image: BTreeMap<&String, String> = self
            .entries
            .iter()
            .map(|(sender, at)| (sender, format_datetime(*at)))
            .collect();
        let payload = serde_json::to_string_pretty(&image)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &BTreeMap<String, DateTime<Local>> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, DateTime<Local>>, NotifyStoreError> {
    let raw = fs::read_to_string(path)?;
    let parsed: BTreeMap<String, String> = serde_json::from_str(&raw)?;
    let mut entries = BTreeMap::new();
    for (sender, stamp) in parsed {
        entries.insert(sender, parse_datetime(&stamp)?);
    }
    Ok(entries)
}

fn format_datetime(value: DateTime<Local>) -> String {
    value.to_rfc3339()
}

fn parse_datetime(value: &str) -> Result<DateTime<Local>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn stamp(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 12, hour, 0, 0).unwrap()
    }

    #[test]
    fn open_missing_file_creates_empty_image() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("sent_numbers.json");

        let store = NotificationStore::open(&path);
        assert!(store.is_empty());

        let raw = fs::read_to_string(&path).expect("image written");
        assert_eq!(raw.trim(), "{}");
    }

    #[test]
    fn upsert_save_and_reopen() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("sent_numbers.json");

        let mut store = NotificationStore::open(&path);
        store.upsert("6281234567890", stamp(20));
        store.save().expect("save");

        let reopened = NotificationStore::open(&path);
        assert_eq!(
            reopened.last_sent("6281234567890"),
            Some(stamp(20)),
            "timestamp survives a reopen"
        );
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn corrupt_image_self_heals_to_empty() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("sent_numbers.json");
        fs::write(&path, "not json {{{").expect("write garbage");

        let store = NotificationStore::open(&path);
        assert!(store.is_empty());

        let raw = fs::read_to_string(&path).expect("image rewritten");
        assert_eq!(raw.trim(), "{}");
    }

    #[test]
    fn load_is_idempotent() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("sent_numbers.json");

        let mut store = NotificationStore::open(&path);
        store.upsert("111", stamp(8));
        store.upsert("222", stamp(21));
        store.save().expect("save");

        let first = NotificationStore::open(&path);
        let second = NotificationStore::open(&path);
        assert_eq!(first.entries(), second.entries());
    }

    #[test]
    fn save_fails_on_unwritable_path() {
        let temp = TempDir::new().expect("tempdir");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "file, not a directory").expect("write blocker");

        let mut store = NotificationStore::open(blocker.join("sent_numbers.json"));
        store.upsert("111", stamp(20));

        let result = store.save();
        assert!(matches!(result, Err(NotifyStoreError::Io(_))));
        // In-memory state is untouched by the failed write.
        assert_eq!(store.last_sent("111"), Some(stamp(20)));
    }
}
