//! Key-value slots for client state.
//!
//! The client persists exactly two values: the bearer token in durable storage
//! and the session identifier in volatile storage.  Both go through the
//! [`Storage`] trait so the controller never touches ambient globals.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};

/// Durable slot holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Volatile slot holding the session identifier.
pub const SESSION_ID_KEY: &str = "session_id";

/// A string key-value store.
pub trait Storage: Send {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`.  Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory storage that lives as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON file that is rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the store at `path`.  A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match File::open(&path) {
            Ok(file) => {
                let state: StateFile = from_reader(BufReader::new(file)).map_err(|err| {
                    Error::serialization("failed to parse state file", Some(Box::new(err)))
                })?;
                state.values
            }
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(Error::io("failed to open state file", err)),
        };
        Ok(Self { path, values })
    }

    /// Returns the backing path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the file.  The new contents land in a sibling file that is renamed
    /// over the old one, so a failed write leaves the previous state readable.
    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create state directory", err))?;
        }
        let staging = self.staging_path();
        let _ = std::fs::remove_file(&staging);
        let file = create_private(&staging)
            .map_err(|err| Error::io("failed to create state file", err))?;
        let state = StateFile {
            version: 1,
            values: self.values.clone(),
        };
        if let Err(err) = write_state(file, &state) {
            let _ = std::fs::remove_file(&staging);
            return Err(err);
        }
        std::fs::rename(&staging, &self.path)
            .map_err(|err| Error::io("failed to replace state file", err))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("state"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Creates `path` readable by the owner only; it holds a bearer token.
fn create_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn write_state(file: File, state: &StateFile) -> Result<()> {
    let mut writer = BufWriter::new(file);
    to_writer_pretty(&mut writer, state).map_err(|err| {
        Error::serialization("failed to serialize state file", Some(Box::new(err)))
    })?;
    writer
        .flush()
        .map_err(|err| Error::io("failed to write state file", err))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|err| Error::io("failed to sync state file", err))
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()
        } else {
            Ok(())
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StateFile {
    version: u8,
    values: BTreeMap<String, String>,
}
