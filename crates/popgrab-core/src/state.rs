//! Persisted per-account listing snapshots.
//!
//! The snapshot is the delta baseline: the listing observed at the end of
//! the last successful cycle. It is written wholesale after a fully drained
//! cycle and never touched on failure, so an interrupted run re-fetches
//! rather than skips.
//!
//! The format is versioned JSON (a list of `{seq_hint, uid}` records), so
//! snapshots stay readable across rewrites of everything around them.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use popgrab_pop3::MailboxListing;

use crate::error::{Error, Result};
use crate::paths::sanitize_component;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One message of a persisted listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Message number at capture time. A hint only: numbers are
    /// session-scoped and must never drive delta decisions.
    pub seq_hint: u32,
    /// Stable unique id; the delta key.
    pub uid: String,
}

/// A mailbox listing as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    /// Format version; mismatches are rejected, not guessed at.
    pub version: u32,
    /// Records in the server order observed at capture time.
    pub entries: Vec<ListingRecord>,
}

impl ListingSnapshot {
    /// Captures the listing just observed as the next baseline.
    #[must_use]
    pub fn capture(listing: &MailboxListing) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            entries: listing
                .iter()
                .map(|entry| ListingRecord {
                    seq_hint: entry.number.get(),
                    uid: entry.uid.as_str().to_string(),
                })
                .collect(),
        }
    }
}

/// Snapshot storage: one JSON file per account under the state directory.
///
/// A cycle owns its account's file exclusively; nothing here locks, so
/// operators must not run overlapping instances against one state
/// directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Creates a store rooted at the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, account: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_component(account)))
    }

    /// Loads the snapshot for an account.
    ///
    /// Returns `None` when no snapshot exists yet (first run).
    ///
    /// # Errors
    ///
    /// Returns an error on unreadable files, corrupt JSON, or a snapshot
    /// version this build does not understand.
    pub fn load(&self, account: &str) -> Result<Option<ListingSnapshot>> {
        let path = self.path_for(account);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot: ListingSnapshot = serde_json::from_str(&text)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::State(format!(
                "snapshot {} has unsupported version {}",
                path.display(),
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

    /// Replaces the snapshot for an account wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, account: &str, snapshot: &ListingSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(account);
        fs::write(&path, serde_json::to_string_pretty(snapshot)?)?;
        tracing::debug!(path = %path.display(), entries = snapshot.entries.len(), "saved snapshot");
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use popgrab_pop3::{ListingEntry, MessageNumber, UniqueId};

    fn listing(entries: &[(u32, &str)]) -> MailboxListing {
        MailboxListing::new(
            entries
                .iter()
                .map(|(n, uid)| ListingEntry {
                    number: MessageNumber::new(*n).unwrap(),
                    uid: UniqueId::new(*uid),
                })
                .collect(),
        )
    }

    #[test]
    fn capture_preserves_order_and_ids() {
        let snapshot = ListingSnapshot::capture(&listing(&[(1, "a"), (2, "b")]));
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[0].seq_hint, 1);
        assert_eq!(snapshot.entries[0].uid, "a");
        assert_eq!(snapshot.entries[1].uid, "b");
    }

    #[test]
    fn load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load("work").unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let snapshot = ListingSnapshot::capture(&listing(&[(1, "x"), (2, "y"), (3, "z")]));
        store.save("work", &snapshot).unwrap();

        let loaded = store.load("work").unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn accounts_do_not_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        store
            .save("a", &ListingSnapshot::capture(&listing(&[(1, "only-a")])))
            .unwrap();
        assert!(store.load("b").unwrap().is_none());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        std::fs::write(
            dir.path().join("work.json"),
            r#"{"version": 99, "entries": []}"#,
        )
        .unwrap();

        assert!(matches!(store.load("work"), Err(Error::State(_))));
    }

    #[test]
    fn corrupt_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        std::fs::write(dir.path().join("work.json"), "not json").unwrap();
        assert!(store.load("work").is_err());
    }

    #[test]
    fn account_names_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let snapshot = ListingSnapshot::capture(&listing(&[(1, "u")]));
        store.save("../evil", &snapshot).unwrap();

        // The file stays inside the state directory.
        assert!(dir.path().join(".._evil.json").exists());
    }
}
