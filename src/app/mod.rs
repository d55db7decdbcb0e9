//! Server bootstrap and shared state (spec.md §4.1, §5, §6; SPEC_FULL.md
//! §A.1). `ServerState` is the single-threaded equivalent of the C
//! original's global server struct: one instance, `Rc`-shared by every
//! connection task and the cron task, never touched from another thread.

pub mod args;
pub mod logger;
pub mod server;

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Config, SaveRule};
use crate::snapshot;
use crate::store::Keyspace;

pub struct ServerState {
    pub keyspace: RefCell<Keyspace>,
    pub dirty: Cell<u64>,
    pub lastsave: Cell<i64>,
    pub bgsave_in_progress: Cell<bool>,
    pub save_rules: Vec<SaveRule>,
    pub snapshot_path: PathBuf,
    pub timeout_secs: u64,
}

impl ServerState {
    pub fn new(config: &Config, keyspace: Keyspace) -> Self {
        ServerState {
            keyspace: RefCell::new(keyspace),
            dirty: Cell::new(0),
            lastsave: Cell::new(unix_now()),
            bgsave_in_progress: Cell::new(false),
            save_rules: config.save_rules.clone(),
            snapshot_path: PathBuf::from(snapshot::DEFAULT_FILENAME),
            timeout_secs: config.timeout,
        }
    }

    pub fn bump_dirty(&self) {
        self.dirty.set(self.dirty.get() + 1);
    }

    /// Whether any configured `(seconds, changes)` rule is satisfied
    /// (spec.md §3 "Server dirty counter").
    pub fn snapshot_due(&self) -> bool {
        let dirty = self.dirty.get();
        if dirty == 0 {
            return false;
        }
        let elapsed = unix_now() - self.lastsave.get();
        self.save_rules
            .iter()
            .any(|rule| dirty >= rule.changes && elapsed > rule.seconds as i64)
    }

    /// Start a background save if one isn't already running. Shared by the
    /// `BGSAVE` command handler and the cron's dirty-threshold trigger
    /// (spec.md §4.5 BGSAVE, §4.6 "Background save").
    pub fn start_background_save(self: &Rc<Self>) -> bool {
        if self.bgsave_in_progress.get() {
            return false;
        }
        let snapshot = snapshot::snapshot_keyspace(&self.keyspace.borrow());
        self.bgsave_in_progress.set(true);

        let server = Rc::clone(self);
        let target = self.snapshot_path.clone();
        tokio::task::spawn_local(async move {
            let result = tokio::task::spawn_blocking(move || snapshot::write_to_path(&snapshot, &target)).await;
            match result {
                Ok(Ok(())) => {
                    server.dirty.set(0);
                    server.lastsave.set(unix_now());
                    tracing::info!(at = %format_unix(server.lastsave.get()), "background saving terminated with success");
                }
                Ok(Err(err)) => tracing::warn!(%err, "background saving failed"),
                Err(join_err) => tracing::warn!(%join_err, "background save task panicked"),
            }
            server.bgsave_in_progress.set(false);
        });
        true
    }
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Render a UNIX timestamp for log lines, e.g. `lastsave` after a save.
pub fn format_unix(seconds: i64) -> String {
    chrono::DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| seconds.to_string())
}
