//! File-backed key-value store keeping one JSON document per key.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde_json::Value;
use std::io;
use std::sync::Mutex;

use crate::persistence::ports::{KeyValueStore, PersistenceError, PersistenceResult};

const DOCUMENT_SUFFIX: &str = ".json";
const STAGING_SUFFIX: &str = ".json.tmp";

/// Durable store writing `<key>.json` files inside a single directory.
///
/// Each write goes to a staging file that is then renamed over the target,
/// so a reader only ever observes the previous or the new document.
pub struct JsonFileStore {
    dir: Dir,
    write_guard: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (creating if needed) the storage directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be created
    /// or opened.
    pub fn open(root: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self::from_dir(dir))
    }

    /// Wraps an already-opened capability directory.
    #[must_use]
    pub const fn from_dir(dir: Dir) -> Self {
        Self {
            dir,
            write_guard: Mutex::new(()),
        }
    }
}

/// Maps a store key onto a file name, rejecting keys that would escape the
/// directory or collide with staging files.
fn document_name(key: &str) -> io::Result<String> {
    let is_valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if !is_valid {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported storage key '{key}'"),
        ));
    }
    Ok(format!("{key}{DOCUMENT_SUFFIX}"))
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        let name = document_name(key).map_err(|err| PersistenceError::read(key, err))?;
        let contents = match self.dir.read_to_string(&name) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PersistenceError::read(key, err)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| PersistenceError::codec(key, err))
    }

    fn set(&self, key: &str, value: &Value) -> PersistenceResult<()> {
        let name = document_name(key).map_err(|err| PersistenceError::write(key, err))?;
        let staging = format!("{key}{STAGING_SUFFIX}");
        let bytes = serde_json::to_vec(value).map_err(|err| PersistenceError::codec(key, err))?;

        let _guard = self
            .write_guard
            .lock()
            .map_err(|err| PersistenceError::write(key, io::Error::other(err.to_string())))?;
        self.dir
            .write(&staging, bytes)
            .map_err(|err| PersistenceError::write(key, err))?;
        self.dir
            .rename(&staging, &self.dir, &name)
            .map_err(|err| PersistenceError::write(key, err))
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        let name = document_name(key).map_err(|err| PersistenceError::remove(key, err))?;
        let _guard = self
            .write_guard
            .lock()
            .map_err(|err| PersistenceError::remove(key, io::Error::other(err.to_string())))?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistenceError::remove(key, err)),
        }
    }
}
