//! File-backed [`Saver`].

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{Saver, Schedule, Store, MAX_SEQUENCE};
use crate::error::{Error, Result};

/// Persists a [`Store`] in a single file.
///
/// The record is the `bincode` standard encoding of the timestamp, sequence, and node, in that
/// order. Saves go to a sibling `*.tmp` file first and are renamed over the target, so a crash
/// mid-save leaves the previous record intact. Saves through one saver, or through its clones,
/// run one at a time.
///
/// # Examples
///
/// ```rust
/// use rfc4122::{FileSystemSaver, Generator};
/// use std::time::Duration;
///
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("generator.state");
/// let saver = FileSystemSaver::new(path, Duration::from_secs(2)).with_report(true);
/// let g = Generator::builder().saver(saver).build()?;
/// println!("{}", g.generate());
/// g.shutdown()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct FileSystemSaver {
    path: PathBuf,
    interval: Duration,
    report: bool,
    writing: Arc<Mutex<()>>,
}

impl FileSystemSaver {
    /// Creates a saver for `path` that is saved to every `interval` once a generator arms it.
    ///
    /// A zero `interval` disables periodic saves; the generator then saves only when asked to
    /// and at shutdown.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
            report: false,
            writing: Arc::default(),
        }
    }

    /// Sets whether every scheduled save is logged.
    pub fn with_report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    /// Returns the path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn checked_path(&self, operation: &'static str) -> Result<&Path> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::filesystem(
                operation,
                &self.path,
                io::Error::new(io::ErrorKind::InvalidInput, "empty path"),
            ));
        }
        Ok(&self.path)
    }

    /// Creates the parent directories and an empty state file.
    fn create(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| Error::filesystem("create", parent, err))?;
        }
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|err| Error::filesystem("create", path, err))?;
        tracing::debug!(path = %path.display(), "created generator state file");
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Store> {
        let malformed = |reason: String| Error::Decode {
            path: self.path.clone(),
            reason,
        };
        let (store, read): (Store, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|err| malformed(err.to_string()))?;
        if read != bytes.len() {
            return Err(malformed(format!(
                "{} trailing bytes",
                bytes.len() - read
            )));
        }
        if store.sequence > MAX_SEQUENCE {
            return Err(malformed(format!(
                "clock sequence {} exceeds 14 bits",
                store.sequence
            )));
        }
        Ok(store)
    }
}

impl Saver for FileSystemSaver {
    /// Loads the state file.
    ///
    /// A missing file is not an error: the parent directories and an empty file are created,
    /// which also proves the location is writable, and an empty [`Store`] is returned. An empty
    /// file likewise reads as an empty store.
    fn read(&self) -> Result<Store> {
        let path = self.checked_path("read")?;
        match fs::read(path) {
            Ok(bytes) if bytes.is_empty() => Ok(Store::default()),
            Ok(bytes) => self.decode(&bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.create(path)?;
                Ok(Store::default())
            }
            Err(err) => Err(Error::filesystem("read", path, err)),
        }
    }

    fn save(&self, store: &Store) -> Result<()> {
        let path = self.checked_path("save")?;
        let bytes = bincode::encode_to_vec(*store, bincode::config::standard()).map_err(|err| {
            let err = io::Error::new(io::ErrorKind::InvalidData, err.to_string());
            Error::filesystem("save", path, err)
        })?;

        let _writing = self.writing.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tmp_name = path.file_name().map(OsString::from).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|()| fs::rename(&tmp, path)) {
            // best effort; the target still holds the previous record
            let _ = fs::remove_file(&tmp);
            return Err(Error::filesystem("save", path, err));
        }
        Ok(())
    }

    fn schedule(&self) -> Option<Schedule> {
        if self.interval.is_zero() {
            return None;
        }
        Some(Schedule {
            interval: self.interval,
            report: self.report,
        })
    }
}
