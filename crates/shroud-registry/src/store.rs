//! Durable storage for lobby and arena definitions.
//!
//! The registries load everything once at startup and write one record
//! back after every mutation. A failed write is reported to the caller;
//! the registries never roll back the in-memory change.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use shroud_model::{Codec, JsonCodec};
use tracing::warn;

use crate::{Arena, Lobby, StoreError};

/// Read/write access to the stored definitions.
pub trait DefinitionStore {
    fn load_lobbies(&self) -> Result<Vec<Lobby>, StoreError>;
    fn load_arenas(&self) -> Result<Vec<Arena>, StoreError>;
    fn save_lobby(&self, lobby: &Lobby) -> Result<(), StoreError>;
    fn save_arena(&self, arena: &Arena) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// JsonDirStore
// ---------------------------------------------------------------------------

/// One file per record under `root/lobbies/` and `root/arenas/`.
///
/// Files that fail to decode are skipped with a warning when loading.
///
/// ```text
/// data/
/// ├── lobbies/L.json
/// └── arenas/A1.json
/// ```
pub struct JsonDirStore<C: Codec = JsonCodec> {
    root: PathBuf,
    codec: C,
}

impl JsonDirStore<JsonCodec> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_codec(root, JsonCodec)
    }
}

impl<C: Codec> JsonDirStore<C> {
    pub fn with_codec(root: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            root: root.into(),
            codec,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_dir<T: serde::de::DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>, StoreError> {
        let dir = self.root.join(dir);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(self.codec.extension()) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            // Unreadable files are skipped; the rest still load.
            match self.codec.decode(&bytes) {
                Ok(record) => records.push(record),
                Err(error) => warn!(path = %path.display(), %error, "skipping unreadable record"),
            }
        }
        Ok(records)
    }

    fn save_record<T: serde::Serialize>(&self, dir: &str, key: &str, value: &T) -> Result<(), StoreError> {
        let path = self.record_path(dir, key)?;
        let bytes = self.codec.encode(value).map_err(|source| StoreError::Codec {
            key: key.to_owned(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, bytes).map_err(|source| StoreError::Io { path, source })
    }

    fn record_path(&self, dir: &str, key: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }
        Ok(self
            .root
            .join(dir)
            .join(format!("{key}.{}", self.codec.extension())))
    }
}

/// A key is used as a file stem, so it must not escape its directory.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\', '\0'])
}

impl<C: Codec> DefinitionStore for JsonDirStore<C> {
    fn load_lobbies(&self) -> Result<Vec<Lobby>, StoreError> {
        self.load_dir("lobbies")
    }

    fn load_arenas(&self) -> Result<Vec<Arena>, StoreError> {
        self.load_dir("arenas")
    }

    fn save_lobby(&self, lobby: &Lobby) -> Result<(), StoreError> {
        self.save_record("lobbies", &lobby.name, lobby)
    }

    fn save_arena(&self, arena: &Arena) -> Result<(), StoreError> {
        self.save_record("arenas", &arena.name, arena)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An in-memory store, for tests and dry runs.
///
/// [`set_fail_writes`](Self::set_fail_writes) makes every save fail, to
/// exercise the persistence-failure path.
#[derive(Default)]
pub struct MemoryStore {
    lobbies: RefCell<BTreeMap<String, Lobby>>,
    arenas: RefCell<BTreeMap<String, Arena>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// The stored copy of a lobby, as it would be loaded after a restart.
    pub fn stored_lobby(&self, name: &str) -> Option<Lobby> {
        self.lobbies.borrow().get(name).cloned()
    }

    pub fn stored_arena(&self, name: &str) -> Option<Arena> {
        self.arenas.borrow().get(name).cloned()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl DefinitionStore for MemoryStore {
    fn load_lobbies(&self) -> Result<Vec<Lobby>, StoreError> {
        Ok(self.lobbies.borrow().values().cloned().collect())
    }

    fn load_arenas(&self) -> Result<Vec<Arena>, StoreError> {
        // Claims are transient; a reload never sees one.
        Ok(self
            .arenas
            .borrow()
            .values()
            .cloned()
            .map(|mut a| {
                a.claimed_by = None;
                a
            })
            .collect())
    }

    fn save_lobby(&self, lobby: &Lobby) -> Result<(), StoreError> {
        self.check_writable()?;
        self.lobbies
            .borrow_mut()
            .insert(lobby.name.clone(), lobby.clone());
        Ok(())
    }

    fn save_arena(&self, arena: &Arena) -> Result<(), StoreError> {
        self.check_writable()?;
        self.arenas
            .borrow_mut()
            .insert(arena.name.clone(), arena.clone());
        Ok(())
    }
}
