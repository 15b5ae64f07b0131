//! Durable per-player snapshot storage.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use shroud_model::{Codec, JsonCodec, PlayerId};

use crate::{PlayerSnapshot, SnapshotError};

/// Keyed storage for snapshots, one per player.
pub trait SnapshotStore {
    fn exists(&self, player: PlayerId) -> Result<bool, SnapshotError>;

    fn save(&self, snapshot: &PlayerSnapshot) -> Result<(), SnapshotError>;

    /// The stored snapshot, or `None` if there is none.
    fn load(&self, player: PlayerId) -> Result<Option<PlayerSnapshot>, SnapshotError>;

    /// Removes the snapshot. Removing a missing snapshot is not an error.
    fn delete(&self, player: PlayerId) -> Result<(), SnapshotError>;

    /// Every player with a stored snapshot, ascending.
    fn list(&self) -> Result<Vec<PlayerId>, SnapshotError>;
}

// ---------------------------------------------------------------------------
// JsonDirSnapshotStore
// ---------------------------------------------------------------------------

/// One file per player, `root/<player id>.json`.
pub struct JsonDirSnapshotStore<C: Codec = JsonCodec> {
    root: PathBuf,
    codec: C,
}

impl JsonDirSnapshotStore<JsonCodec> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_codec(root, JsonCodec)
    }
}

impl<C: Codec> JsonDirSnapshotStore<C> {
    pub fn with_codec(root: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            root: root.into(),
            codec,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, player: PlayerId) -> PathBuf {
        self.root
            .join(format!("{}.{}", player.0, self.codec.extension()))
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl<C: Codec> SnapshotStore for JsonDirSnapshotStore<C> {
    fn exists(&self, player: PlayerId) -> Result<bool, SnapshotError> {
        Ok(self.path_for(player).is_file())
    }

    fn save(&self, snapshot: &PlayerSnapshot) -> Result<(), SnapshotError> {
        let bytes = self
            .codec
            .encode(snapshot)
            .map_err(|source| SnapshotError::Codec {
                player: snapshot.player,
                source,
            })?;
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;
        let path = self.path_for(snapshot.player);
        fs::write(&path, bytes).map_err(io_error(&path))
    }

    fn load(&self, player: PlayerId) -> Result<Option<PlayerSnapshot>, SnapshotError> {
        let path = self.path_for(player);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };
        self.codec
            .decode(&bytes)
            .map(Some)
            .map_err(|source| SnapshotError::Codec { player, source })
    }

    fn delete(&self, player: PlayerId) -> Result<(), SnapshotError> {
        let path = self.path_for(player);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    fn list(&self) -> Result<Vec<PlayerId>, SnapshotError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut players = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_error(&self.root))? {
            let path = entry.map_err(io_error(&self.root))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.codec.extension()) {
                continue;
            }
            // Anything not named after a player id isn't ours.
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                players.push(PlayerId(id));
            }
        }
        players.sort();
        Ok(players)
    }
}

// ---------------------------------------------------------------------------
// MemorySnapshotStore
// ---------------------------------------------------------------------------

/// An in-memory store, for tests and dry runs.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: RefCell<BTreeMap<PlayerId, PlayerSnapshot>>,
    fail_writes: Cell<bool>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every save and delete fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn len(&self) -> usize {
        self.snapshots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.borrow().is_empty()
    }

    fn check_writable(&self) -> Result<(), SnapshotError> {
        if self.fail_writes.get() {
            return Err(SnapshotError::StoreUnavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn exists(&self, player: PlayerId) -> Result<bool, SnapshotError> {
        Ok(self.snapshots.borrow().contains_key(&player))
    }

    fn save(&self, snapshot: &PlayerSnapshot) -> Result<(), SnapshotError> {
        self.check_writable()?;
        self.snapshots
            .borrow_mut()
            .insert(snapshot.player, snapshot.clone());
        Ok(())
    }

    fn load(&self, player: PlayerId) -> Result<Option<PlayerSnapshot>, SnapshotError> {
        Ok(self.snapshots.borrow().get(&player).cloned())
    }

    fn delete(&self, player: PlayerId) -> Result<(), SnapshotError> {
        self.check_writable()?;
        self.snapshots.borrow_mut().remove(&player);
        Ok(())
    }

    fn list(&self) -> Result<Vec<PlayerId>, SnapshotError> {
        Ok(self.snapshots.borrow().keys().copied().collect())
    }
}
