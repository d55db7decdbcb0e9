//! Saving and loading `dump.rdb` (spec.md ยง4.6).
//!
//! `SAVE` serializes inline on the reactor thread via [`save_foreground`].
//! `BGSAVE`'s orchestration (clone now, serialize-and-write on a blocking
//! thread) lives in [`crate::app::ServerState::start_background_save`],
//! which calls [`write_to_path`] from inside `spawn_blocking`.

pub mod format;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use scopeguard::guard;

use crate::errors::SnapshotError;
use crate::store::Keyspace;

pub use format::{snapshot_keyspace, OwnedSnapshot};

pub const DEFAULT_FILENAME: &str = "dump.rdb";

/// Write `snapshot` to `target` via a temp file + atomic rename, so a crash
/// mid-write never leaves a truncated `dump.rdb` behind (spec.md ยง4.6). The
/// temp name carries the epoch second plus a random suffix, not the PID: a
/// foreground `SAVE` and a `BGSAVE`'s `spawn_blocking` write can be in
/// flight in the same process at once, and a PID-derived name would let
/// them collide on the same temp file.
pub fn write_to_path(snapshot: &OwnedSnapshot, target: &Path) -> Result<(), SnapshotError> {
    let data = format::serialize(snapshot);
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let epoch = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    let suffix: u32 = rand::rng().random();
    let tmp_path = dir.join(format!("temp-{epoch}.{suffix}.rdb"));

    let cleanup = guard(tmp_path.clone(), |path| {
        let _ = std::fs::remove_file(path);
    });

    std::fs::write(&tmp_path, &data)?;
    std::fs::rename(&tmp_path, target)?;
    scopeguard::ScopeGuard::into_inner(cleanup);
    Ok(())
}

/// Run on the reactor thread: `SAVE` (spec.md ยง4.5 SAVE/ยง4.6 "Foreground
/// save"). Blocks the single reactor thread for the duration, matching the
/// spec's description of the foreground path as deliberately simple and
/// synchronous.
pub fn save_foreground(keyspace: &Keyspace, target: &Path) -> Result<(), SnapshotError> {
    let snapshot = snapshot_keyspace(keyspace);
    write_to_path(&snapshot, target)
}

/// Load `dump.rdb` at startup. A missing file is not an error (spec.md
/// ยง4.6 "Load"); any parse failure is fatal and propagated to the caller,
/// which per spec.md ยง7 must abort the process rather than start with a
/// partially-loaded keyspace.
pub fn load_from_path(path: &Path, keyspace: &mut Keyspace) -> Result<(), SnapshotError> {
    if !path.exists() {
        return Ok(());
    }
    let data = std::fs::read(path)?;
    format::load(&data, keyspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;
    use bytes::Bytes;

    #[test]
    fn foreground_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILENAME);

        let mut keyspace = Keyspace::new(1);
        keyspace.db_mut(0).set(
            Bytes::from_static(b"k"),
            Value::Str(Bytes::from_static(b"v")).into_ref(),
        );
        save_foreground(&keyspace, &path).unwrap();

        let mut reloaded = Keyspace::new(1);
        load_from_path(&path, &mut reloaded).unwrap();
        assert_eq!(
            reloaded.db(0).get(b"k".as_slice()).unwrap().borrow().as_str().unwrap(),
            &Bytes::from_static(b"v")
        );
    }

    #[test]
    fn missing_snapshot_file_is_not_an_error() {
        let mut keyspace = Keyspace::new(1);
        let missing = Path::new("/nonexistent/path/dump.rdb");
        assert!(load_from_path(missing, &mut keyspace).is_ok());
        assert!(keyspace.db(0).is_empty());
    }
}
