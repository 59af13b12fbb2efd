//! Output sinks for the file layer and for attached writers
//!
//! [`RollingFileWriter`] is a size/age/count-bounded rotating log file behind
//! a cheap `Clone` handle, suitable as a `tracing_subscriber` writer via a
//! `move || writer.clone()` closure. Rotation renames the active file to
//! `name.1`, shifting existing backups to higher indices and pruning by
//! count; backups past the age bound are removed whenever the file is opened.
//!
//! [`SharedWriter`] adapts any `io::Write` into such a handle, and
//! [`BufferWriter`] is an in-memory capture sink for tests and demos.

use crate::error::{Result, XlogError};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Rotating file sink with bounded growth.
///
/// Limits follow the usual rotating-logger contract: a size threshold at
/// which the file is rolled, a maximum number of rolled files to keep, and a
/// maximum age in days for rolled files. A limit of zero disables that bound.
///
/// Rotation failures degrade to continued writes to the current file; a log
/// call never fails because a backup could not be renamed or deleted.
pub struct RollingFileWriter {
    state: Arc<Mutex<RollingState>>,
}

struct RollingState {
    base_path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    max_age_days: u64,
    file: Option<File>,
    current_size: u64,
}

impl RollingFileWriter {
    /// Open (creating if needed) the log file at `path`.
    ///
    /// Parent directories are created. `max_size_mb`, `max_backups`, and
    /// `max_age_days` of zero mean unlimited size, count, and age.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be created.
    pub fn new<P: AsRef<Path>>(
        path: P,
        max_size_mb: u64,
        max_backups: usize,
        max_age_days: u64,
    ) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                XlogError::io_operation(
                    "create log directory",
                    format!("failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let mut state = RollingState {
            base_path,
            max_bytes: max_size_mb * 1024 * 1024,
            max_backups,
            max_age_days,
            file: None,
            current_size: 0,
        };
        state.open().map_err(|e| {
            XlogError::io_operation(
                "open log file",
                format!("failed to open '{}'", state.base_path.display()),
                e,
            )
        })?;

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Size in bytes of the active log file.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }
}

impl Clone for RollingFileWriter {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl io::Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().flush()
    }
}

impl RollingState {
    fn open(&mut self) -> io::Result<()> {
        // The age bound holds independently of the size limit: stale backups
        // are pruned whenever the file is (re)opened, not only at rotation.
        self.prune_expired_backups();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.base_path)?;
        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.file.is_none() {
            self.open()?;
        }
        if self.should_rotate(buf.len()) {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[WARN] log rotation failed for {}: {}",
                    self.base_path.display(),
                    e
                );
            }
            if self.file.is_none() {
                self.open()?;
            }
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))?;
        let written = file.write(buf)?;
        self.current_size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.max_bytes > 0
            && self.current_size > 0
            && self.current_size + incoming as u64 > self.max_bytes
    }

    /// Roll the active file to `.1`, shifting existing backups up one index.
    fn rotate(&mut self) -> io::Result<()> {
        // Close the handle before renaming so the data is flushed and the
        // rename works on platforms that lock open files.
        self.file = None;

        let mut indices = self.existing_backup_indices();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for index in indices {
            let from = self.backup_path(index);
            if self.max_backups > 0 && index + 1 > self.max_backups {
                let _ = fs::remove_file(&from);
                continue;
            }
            let to = self.backup_path(index + 1);
            if fs::rename(&from, &to).is_err() {
                // On some platforms rename fails if the destination exists.
                let _ = fs::remove_file(&to);
                let _ = fs::rename(&from, &to);
            }
        }

        if self.base_path.exists() {
            fs::rename(&self.base_path, &self.backup_path(1))?;
        }
        self.open()
    }

    /// Backup file path for a given index, e.g. `xlog.log.3`.
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("xlog.log");
        path.set_file_name(format!("{}.{}", file_name, index));
        path
    }

    /// Indices of backup files currently present next to the active file.
    fn existing_backup_indices(&self) -> Vec<usize> {
        let Some(parent) = self.base_path.parent() else {
            return Vec::new();
        };
        let Some(file_name) = self.base_path.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let prefix = format!("{}.", file_name);

        let Ok(entries) = fs::read_dir(parent) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().map(String::from))
            .filter_map(|name| name.strip_prefix(&prefix).and_then(|s| s.parse().ok()))
            .collect()
    }

    /// Remove backups whose modification time exceeds the age bound.
    fn prune_expired_backups(&self) {
        if self.max_age_days == 0 {
            return;
        }
        let Some(cutoff) =
            SystemTime::now().checked_sub(Duration::from_secs(self.max_age_days * 24 * 3600))
        else {
            return;
        };

        for index in self.existing_backup_indices() {
            let path = self.backup_path(index);
            let expired = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if expired {
                let _ = fs::remove_file(&path);
            }
        }
    }
}

/// Adapter turning any writer into a `Clone`-able sink handle.
///
/// This is how arbitrary extra writers are fanned in next to the console and
/// file sinks. Access is serialized behind a mutex.
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn io::Write + Send>>>,
}

impl SharedWriter {
    pub fn new<W: io::Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }
}

impl Clone for SharedWriter {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl io::Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// In-memory sink that captures everything written to it.
#[derive(Clone, Default)]
pub struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl BufferWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
