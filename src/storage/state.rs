use std::ffi::CString;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::peer::Snapshot;

/// Mode applied to the snapshot file before it is published.
pub const SNAPSHOT_MODE: u32 = 0o660;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("unknown group {0:?}")]
    UnknownGroup(String),
    #[error("snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("snapshot replace failed: {0}")]
    Replace(#[from] tempfile::PersistError),
}

/// Identity applied to the snapshot file, resolved once at startup so a
/// misspelled name fails before the first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    /// Looks the names up in the system user and group databases. With no
    /// user configured the snapshot stays owned by the effective user.
    pub fn resolve(user: Option<&str>, group: &str) -> Result<Self, PersistError> {
        let uid = match user {
            Some(name) => lookup_uid(name)?,
            // SAFETY: geteuid cannot fail.
            None => unsafe { libc::geteuid() },
        };
        Ok(Self {
            uid,
            gid: lookup_gid(group)?,
        })
    }

    /// The process's own effective identity.
    pub fn current() -> Self {
        // SAFETY: geteuid/getegid cannot fail.
        unsafe {
            Self {
                uid: libc::geteuid(),
                gid: libc::getegid(),
            }
        }
    }
}

fn lookup_uid(user: &str) -> Result<u32, PersistError> {
    let unknown = || PersistError::UnknownUser(user.to_string());
    let name = CString::new(user).map_err(|_| unknown())?;
    // SAFETY: getpwnam returns null or a pointer into static storage that
    // stays valid until the next lookup; the uid is copied out immediately.
    let record = unsafe { libc::getpwnam(name.as_ptr()) };
    if record.is_null() {
        return Err(unknown());
    }
    Ok(unsafe { (*record).pw_uid })
}

fn lookup_gid(group: &str) -> Result<u32, PersistError> {
    let unknown = || PersistError::UnknownGroup(group.to_string());
    let name = CString::new(group).map_err(|_| unknown())?;
    // SAFETY: same contract as getpwnam.
    let record = unsafe { libc::getgrnam(name.as_ptr()) };
    if record.is_null() {
        return Err(unknown());
    }
    Ok(unsafe { (*record).gr_gid })
}

/// Publishes the latest snapshot with atomic replacement so concurrent
/// readers never observe a torn write.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    ownership: Ownership,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, ownership: Ownership) -> Result<Self, PersistError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path, ownership })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot to a sibling temp file, syncs it, fixes mode and
    /// ownership, then renames it onto the destination. A failure at any
    /// step leaves the previously published snapshot intact.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(snapshot)?)?;
        tmp.as_file().sync_all()?;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(SNAPSHOT_MODE))?;
        std::os::unix::fs::chown(tmp.path(), Some(self.ownership.uid), Some(self.ownership.gid))?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    pub fn load(&self) -> Result<Snapshot, PersistError> {
        let raw = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::peer::{PeerRecord, Transfer, TransferAmount};

    fn record(name: &str) -> PeerRecord {
        PeerRecord {
            name: name.to_string(),
            ip: "10.0.0.2".to_string(),
            endpoint: None,
            connected: true,
            last_handshake_seconds: 3,
            transfer: Transfer {
                received: TransferAmount::new("1.20", "MiB"),
                sent: TransferAmount::new("3.40", "KiB"),
            },
            public_key: None,
        }
    }

    fn snapshot_of(names: &[&str]) -> Snapshot {
        names
            .iter()
            .map(|name| (name.to_string(), record(name)))
            .collect()
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StateStore::new(dir.path().join("peer-status.json"), Ownership::current()).unwrap();

        let snapshot = snapshot_of(&["alice", "bob"]);
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn save_replaces_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StateStore::new(dir.path().join("peer-status.json"), Ownership::current()).unwrap();

        store.save(&snapshot_of(&["alice", "bob"])).unwrap();
        store.save(&snapshot_of(&["alice"])).unwrap();
        assert_eq!(store.load().unwrap(), snapshot_of(&["alice"]));
    }

    #[test]
    fn published_file_mode_is_group_writable() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StateStore::new(dir.path().join("peer-status.json"), Ownership::current()).unwrap();

        store.save(&snapshot_of(&["alice"])).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, SNAPSHOT_MODE);
    }

    #[test]
    fn abandoned_temp_file_leaves_destination_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StateStore::new(dir.path().join("peer-status.json"), Ownership::current()).unwrap();

        let snapshot = snapshot_of(&["alice"]);
        store.save(&snapshot).unwrap();

        // A writer dying before the rename leaves only a stray temp file.
        let mut tmp = NamedTempFile::new_in(dir.path()).unwrap();
        tmp.write_all(b"{\"partial").unwrap();
        drop(tmp);

        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/nested/peer-status.json");
        let store = StateStore::new(path, Ownership::current()).unwrap();
        store.save(&Snapshot::new()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn unknown_names_fail_resolution() {
        assert!(matches!(
            Ownership::resolve(Some("no-such-user-xyzzy"), "root"),
            Err(PersistError::UnknownUser(_))
        ));
        assert!(matches!(
            Ownership::resolve(Some("root"), "no-such-group-xyzzy"),
            Err(PersistError::UnknownGroup(_))
        ));
    }

    #[test]
    fn unset_user_falls_back_to_the_effective_uid() {
        let resolved = Ownership::resolve(None, "root").unwrap();
        assert_eq!(resolved.uid, Ownership::current().uid);
    }
}
