//! File-backed version store
//!
//! Storage format: one version per line.
//!   `<crc32 as 8 hex digits> <version JSON>\n`
//!
//! Rules:
//!   - Strict append only: no mutation, no deletion, no rewrite
//!   - fsync after every append
//!   - The checksum covers the JSON body; any mismatch is corruption
//!   - The whole log is indexed in memory on open
//!   - A failed append is truncated away; if that fails too, the store
//!     refuses further appends

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StoreError, StoreResult};
use super::memory::VersionIndex;
use super::VersionStore;
use crate::observability::{log_event_with_fields, Event};
use crate::version::{Version, VersionDraft};

/// The append target of the log.
trait LogFile: Write + Send {
    fn size(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

fn write_durably(file: &mut dyn LogFile, line: &[u8]) -> io::Result<()> {
    file.write_all(line)?;
    file.flush()?;
    file.sync()
}

/// Append-only version log backed by a file.
pub struct FileVersionStore {
    path: PathBuf,
    file: Mutex<Box<dyn LogFile>>,
    index: VersionIndex,
    /// Set when a failed append could not be rolled back.
    torn: AtomicBool,
}

impl FileVersionStore {
    /// Open or create a version log at `path`, validating every existing line.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let index = VersionIndex::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (n, line) in reader.lines().enumerate() {
                let line = line?;
                let version = Self::decode_line(&line, n + 1).map_err(|e| {
                    let path_str = path.display().to_string();
                    let reason = e.to_string();
                    log_event_with_fields(
                        Event::StoreCorruption,
                        &[("path", path_str.as_str()), ("reason", reason.as_str())],
                    );
                    e
                })?;
                index.insert(version)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let (items, versions) = index.counts();
        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("items", items.to_string().as_str()),
                ("path", path.display().to_string().as_str()),
                ("versions", versions.to_string().as_str()),
            ],
        );

        Ok(Self {
            path,
            file: Mutex::new(Box::new(file)),
            index,
            torn: AtomicBool::new(false),
        })
    }

    /// Get the log path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct items with history.
    pub fn item_count(&self) -> usize {
        self.index.counts().0
    }

    /// Number of versions in the log.
    pub fn len(&self) -> usize {
        self.index.counts().1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write one line durably, or leave the file as it was.
    fn write_line(&self, file: &mut dyn LogFile, line: &[u8]) -> StoreResult<()> {
        let start = file.size()?;
        if let Err(e) = write_durably(file, line) {
            let path = self.path.display().to_string();
            let reason = e.to_string();
            if let Err(rollback) = file.truncate(start).and_then(|_| file.sync()) {
                self.torn.store(true, Ordering::SeqCst);
                let rollback = rollback.to_string();
                log_event_with_fields(
                    Event::StoreCorruption,
                    &[
                        ("path", path.as_str()),
                        ("reason", reason.as_str()),
                        ("rollback", rollback.as_str()),
                    ],
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn encode_line(version: &Version) -> StoreResult<String> {
        let body = serde_json::to_string(version)?;
        Ok(format!("{:08x} {}\n", compute_checksum(body.as_bytes()), body))
    }

    fn decode_line(line: &str, line_no: usize) -> StoreResult<Version> {
        let corrupted = |reason: &str| StoreError::Corrupted {
            line: line_no,
            reason: reason.to_string(),
        };

        let (checksum, body) = line
            .split_once(' ')
            .ok_or_else(|| corrupted("missing checksum separator"))?;
        let expected =
            u32::from_str_radix(checksum, 16).map_err(|_| corrupted("malformed checksum"))?;
        if !verify_checksum(body.as_bytes(), expected) {
            return Err(corrupted("checksum mismatch"));
        }

        serde_json::from_str(body).map_err(|e| corrupted(&e.to_string()))
    }
}

impl VersionStore for FileVersionStore {
    fn append(&self, draft: VersionDraft) -> StoreResult<Version> {
        // Holding the file across allocation keeps file order equal to id order.
        let mut file = self.file.lock().map_err(|_| StoreError::poisoned())?;
        if self.torn.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "{} holds a partial line; reopen to recover",
                self.path.display()
            )));
        }

        let version = draft.into_version(self.index.allocate_id());
        let line = Self::encode_line(&version)?;
        self.write_line(&mut **file, line.as_bytes())?;

        self.index.insert(version.clone())?;
        Ok(version)
    }

    fn list_ordered(&self, item_type: &str, item_id: &str) -> StoreResult<Vec<Version>> {
        self.index.chain(item_type, item_id)
    }

    fn first_after(
        &self,
        item_type: &str,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Version>> {
        self.index.first_after(item_type, item_id, at)
    }

    fn last(&self, item_type: &str, item_id: &str) -> StoreResult<Option<Version>> {
        self.index.last(item_type, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{EventKind, Metadata};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tempfile::tempdir;

    /// A log file that accepts `budget` more bytes, then fails every write.
    struct FlakyFile {
        file: File,
        budget: Arc<AtomicUsize>,
        truncate_fails: Arc<AtomicBool>,
    }

    impl Write for FlakyFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let budget = self.budget.load(Ordering::SeqCst);
            if budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = self.file.write(&buf[..buf.len().min(budget)])?;
            if budget != usize::MAX {
                self.budget.store(budget - n, Ordering::SeqCst);
            }
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    impl LogFile for FlakyFile {
        fn size(&self) -> io::Result<u64> {
            self.file.size()
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            if self.truncate_fails.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::Other, "read-only filesystem"));
            }
            self.file.truncate(len)
        }

        fn sync(&mut self) -> io::Result<()> {
            self.file.sync()
        }
    }

    /// Open `path` with a log file whose writes fail on demand.
    fn open_flaky(path: &Path) -> (FileVersionStore, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let budget = Arc::new(AtomicUsize::new(usize::MAX));
        let truncate_fails = Arc::new(AtomicBool::new(false));
        let mut store = FileVersionStore::open(path).unwrap();
        let file = OpenOptions::new().append(true).open(path).unwrap();
        store.file = Mutex::new(Box::new(FlakyFile {
            file,
            budget: Arc::clone(&budget),
            truncate_fails: Arc::clone(&truncate_fails),
        }));
        (store, budget, truncate_fails)
    }

    fn draft(item_id: &str, event: EventKind) -> VersionDraft {
        VersionDraft {
            item_type: "Widget".to_string(),
            item_id: item_id.to_string(),
            event,
            created_at: Utc::now(),
            object: Some(r#"{"name":"A"}"#.to_string()),
            object_changes: None,
            whodunnit: Some("alice".to_string()),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_append_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.log");

        let appended = {
            let store = FileVersionStore::open(&path).unwrap();
            store.append(draft("1", EventKind::Create)).unwrap();
            store.append(draft("1", EventKind::Update)).unwrap()
        };

        let store = FileVersionStore::open(&path).unwrap();
        let chain = store.list_ordered("Widget", "1").unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1], appended);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.log");

        let first = FileVersionStore::open(&path)
            .unwrap()
            .append(draft("1", EventKind::Create))
            .unwrap();
        let second = FileVersionStore::open(&path)
            .unwrap()
            .append(draft("2", EventKind::Create))
            .unwrap();

        assert!(second.id() > first.id());
    }

    #[test]
    fn test_lines_carry_checksums() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.log");

        let store = FileVersionStore::open(&path).unwrap();
        store.append(draft("1", EventKind::Create)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let (checksum, body) = contents.trim_end().split_once(' ').unwrap();
        assert_eq!(checksum.len(), 8);
        assert!(verify_checksum(
            body.as_bytes(),
            u32::from_str_radix(checksum, 16).unwrap()
        ));
    }

    #[test]
    fn test_tampered_line_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.log");

        {
            let store = FileVersionStore::open(&path).unwrap();
            store.append(draft("1", EventKind::Create)).unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        fs::write(&path, contents.replace("alice", "mallory")).unwrap();

        let err = FileVersionStore::open(&path).err().unwrap();
        assert!(err.is_corruption());
        assert!(matches!(err, StoreError::Corrupted { line: 1, .. }));
    }

    #[test]
    fn test_line_without_checksum_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.log");
        fs::write(&path, "garbage\n").unwrap();

        let err = FileVersionStore::open(&path).err().unwrap();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("versions.log");

        let store = FileVersionStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_failed_append_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.log");
        let (store, budget, _) = open_flaky(&path);

        // Half a line reaches the file before the disk fills up.
        budget.store(20, Ordering::SeqCst);
        let err = store.append(draft("1", EventKind::Create)).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(store.is_empty());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        budget.store(usize::MAX, Ordering::SeqCst);
        let kept = store.append(draft("2", EventKind::Create)).unwrap();

        let reopened = FileVersionStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.list_ordered("Widget", "1").unwrap().is_empty());
        assert_eq!(reopened.list_ordered("Widget", "2").unwrap(), vec![kept]);
    }

    #[test]
    fn test_unrecoverable_append_refuses_further_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.log");
        let (store, budget, truncate_fails) = open_flaky(&path);

        budget.store(20, Ordering::SeqCst);
        truncate_fails.store(true, Ordering::SeqCst);
        store.append(draft("1", EventKind::Create)).unwrap_err();

        budget.store(usize::MAX, Ordering::SeqCst);
        let err = store.append(draft("2", EventKind::Create)).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.is_empty());

        // The torn line is reported on reopen, not silently replayed.
        let err = FileVersionStore::open(&path).err().unwrap();
        assert!(err.is_corruption());
    }
}
