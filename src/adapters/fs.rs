//! File adapters implementing [`RecordFs`].
//!
//! - [`StdFs`]: `std::fs` rooted at a directory.  On the device the root is
//!   the SPIFFS VFS mount point, on the host any scratch directory.
//! - [`SimFs`]: in-memory simulation backend for host tests, with
//!   availability toggling and open counters.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use log::warn;

use crate::app::ports::{RecordFs, StorageError};

// ───────────────────────────────────────────────────────────────
// std::fs backend
// ───────────────────────────────────────────────────────────────

/// Files addressed by absolute paths, optionally re-rooted under `root`.
pub struct StdFs {
    root: Option<PathBuf>,
}

impl StdFs {
    /// Use paths as given (device: paths already carry the VFS prefix).
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve every path relative to `root` (leading `/` stripped).
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

impl Default for StdFs {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFs for StdFs {
    type Reader = BufReader<File>;
    type Writer = BufWriter<File>;

    fn open_read(&self, path: &str) -> Result<Self::Reader, StorageError> {
        File::open(self.resolve(path))
            .map(BufReader::new)
            .map_err(|_| StorageError::Unavailable)
    }

    fn open_append(&self, path: &str) -> Result<Self::Writer, StorageError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(path))
            .map(BufWriter::new)
            .map_err(|e| {
                warn!("fs: open_append({}) failed: {}", path, e);
                StorageError::Unavailable
            })
    }

    fn open_write(&self, path: &str) -> Result<Self::Writer, StorageError> {
        File::create(self.resolve(path)).map(BufWriter::new).map_err(|e| {
            warn!("fs: open_write({}) failed: {}", path, e);
            StorageError::Unavailable
        })
    }

    fn remove(&self, path: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StorageError::Io),
        }
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        std::fs::rename(self.resolve(from), self.resolve(to)).map_err(|_| StorageError::Io)
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::{SimFs, SimWriter};

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use std::rc::Rc;

    use crate::app::ports::{RecordFs, StorageError};

    #[derive(Default)]
    struct SimState {
        files: HashMap<String, Vec<u8>>,
        unavailable: bool,
        read_opens: usize,
    }

    /// Cloneable handle to a shared in-memory file table.
    #[derive(Clone, Default)]
    pub struct SimFs {
        state: Rc<RefCell<SimState>>,
    }

    impl SimFs {
        pub fn new() -> Self {
            Self::default()
        }

        /// When `false`, every open fails with `StorageError::Unavailable`.
        pub fn set_available(&self, available: bool) {
            self.state.borrow_mut().unavailable = !available;
        }

        pub fn exists(&self, path: &str) -> bool {
            self.state.borrow().files.contains_key(path)
        }

        pub fn contents(&self, path: &str) -> Option<String> {
            self.state
                .borrow()
                .files
                .get(path)
                .map(|b| String::from_utf8_lossy(b).into_owned())
        }

        /// Write bytes behind the codec's back (corruption tests).
        pub fn append_raw(&self, path: &str, bytes: &[u8]) {
            self.state
                .borrow_mut()
                .files
                .entry(path.to_owned())
                .or_default()
                .extend_from_slice(bytes);
        }

        /// How many times a file was opened for reading.
        pub fn read_opens(&self) -> usize {
            self.state.borrow().read_opens
        }

        fn check(&self) -> Result<(), StorageError> {
            if self.state.borrow().unavailable {
                Err(StorageError::Unavailable)
            } else {
                Ok(())
            }
        }
    }

    /// Writes land in the shared table immediately.
    pub struct SimWriter {
        state: Rc<RefCell<SimState>>,
        path: String,
    }

    impl Write for SimWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.state
                .borrow_mut()
                .files
                .entry(self.path.clone())
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl RecordFs for SimFs {
        type Reader = Cursor<Vec<u8>>;
        type Writer = SimWriter;

        fn open_read(&self, path: &str) -> Result<Self::Reader, StorageError> {
            self.check()?;
            let mut state = self.state.borrow_mut();
            state.read_opens += 1;
            state
                .files
                .get(path)
                .cloned()
                .map(Cursor::new)
                .ok_or(StorageError::Unavailable)
        }

        fn open_append(&self, path: &str) -> Result<Self::Writer, StorageError> {
            self.check()?;
            self.state
                .borrow_mut()
                .files
                .entry(path.to_owned())
                .or_default();
            Ok(SimWriter {
                state: Rc::clone(&self.state),
                path: path.to_owned(),
            })
        }

        fn open_write(&self, path: &str) -> Result<Self::Writer, StorageError> {
            self.check()?;
            self.state
                .borrow_mut()
                .files
                .insert(path.to_owned(), Vec::new());
            Ok(SimWriter {
                state: Rc::clone(&self.state),
                path: path.to_owned(),
            })
        }

        fn remove(&self, path: &str) -> Result<(), StorageError> {
            self.check()?;
            self.state.borrow_mut().files.remove(path);
            Ok(())
        }

        fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
            self.check()?;
            let mut state = self.state.borrow_mut();
            if state.files.contains_key(to) {
                return Err(StorageError::Io);
            }
            let data = state.files.remove(from).ok_or(StorageError::Unavailable)?;
            state.files.insert(to.to_owned(), data);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("irrigation-fs-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn std_fs_append_rename_remove() {
        let dir = scratch_dir("basic");
        let fs = StdFs::rooted(&dir);

        let mut w = fs.open_append("/log.txt").unwrap();
        w.write_all(b"one\n").unwrap();
        w.flush().unwrap();
        drop(w);
        let mut w = fs.open_append("/log.txt").unwrap();
        w.write_all(b"two\n").unwrap();
        drop(w);

        let mut text = String::new();
        fs.open_read("/log.txt").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "one\ntwo\n");

        fs.rename("/log.txt", "/moved.txt").unwrap();
        assert_eq!(fs.open_read("/log.txt").err(), Some(StorageError::Unavailable));
        fs.remove("/moved.txt").unwrap();
        fs.remove("/moved.txt").unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn std_fs_open_write_truncates() {
        let dir = scratch_dir("truncate");
        let fs = StdFs::rooted(&dir);
        let mut w = fs.open_write("t.txt").unwrap();
        w.write_all(b"long content").unwrap();
        drop(w);
        let mut w = fs.open_write("t.txt").unwrap();
        w.write_all(b"x").unwrap();
        drop(w);
        let mut text = String::new();
        fs.open_read("t.txt").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "x");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sim_fs_counts_reads_and_toggles_availability() {
        let fs = SimFs::new();
        fs.append_raw("a", b"hello");
        let mut text = String::new();
        fs.open_read("a").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(fs.read_opens(), 1);

        fs.set_available(false);
        assert_eq!(fs.open_read("a").err(), Some(StorageError::Unavailable));
        assert!(fs.open_append("a").is_err());
        fs.set_available(true);
        assert!(fs.open_append("a").is_ok());
    }

    #[test]
    fn sim_fs_rename_refuses_to_clobber() {
        let fs = SimFs::new();
        fs.append_raw("a", b"1");
        fs.append_raw("b", b"2");
        assert_eq!(fs.rename("a", "b"), Err(StorageError::Io));
        fs.remove("b").unwrap();
        fs.rename("a", "b").unwrap();
        assert_eq!(fs.contents("b").as_deref(), Some("1"));
        assert!(!fs.exists("a"));
    }
}
