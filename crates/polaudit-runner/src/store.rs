//! Append-only newline-delimited output store

use crate::error::RunnerError;
use polaudit_domain::DocumentRecord;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Output file shared by every audit task
///
/// Each record is written as one line and flushed under a single lock, so
/// concurrent appends never interleave and a crash leaves at most one
/// partial trailing line.
#[derive(Debug)]
pub struct OutputStore {
    path: PathBuf,
    file: Mutex<File>,
    fsync: bool,
}

impl OutputStore {
    /// Open (or create) the store at `path` for appending
    ///
    /// A partial last line left by an interrupted run is terminated so the
    /// next record starts on a fresh line.
    pub fn open(path: impl AsRef<Path>, fsync: bool) -> Result<Self, RunnerError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        if ends_mid_line(&mut file)? {
            warn!(path = %path.display(), "Output store ends with a partial line, terminating it");
            file.write_all(b"\n")?;
            file.flush()?;
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
            fsync,
        })
    }

    /// Path of the store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and make it durable
    pub fn append(&self, record: &DocumentRecord) -> Result<(), RunnerError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
        file.write_all(line.as_bytes())?;
        file.flush()?;
        if self.fsync {
            file.sync_data()?;
        }
        debug!(url = %record.url, "Record appended");
        Ok(())
    }
}

fn ends_mid_line(file: &mut File) -> Result<bool, RunnerError> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::ResumeTracker;
    use polaudit_domain::{Details, DocType, IdentityHash, Link};
    use std::sync::Arc;

    fn record(url: &str) -> DocumentRecord {
        let link = Link::new("a.org", url, DocType::LegalNotice);
        DocumentRecord::new(&link, Details::empty(DocType::LegalNotice), None, IdentityHash::Sha1)
    }

    #[test]
    fn test_append_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let store = OutputStore::open(&path, true).unwrap();
        store.append(&record("https://a.org/1")).unwrap();
        store.append(&record("https://a.org/2")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: DocumentRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.url, "https://a.org/2");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        OutputStore::open(&path, false).unwrap().append(&record("https://a.org/1")).unwrap();
        OutputStore::open(&path, false).unwrap().append(&record("https://a.org/2")).unwrap();

        let tracker = ResumeTracker::load(&path, IdentityHash::Sha1).unwrap();
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_partial_trailing_line_is_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "{\"url\": \"https://a.o").unwrap();

        let store = OutputStore::open(&path, false).unwrap();
        store.append(&record("https://a.org/1")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let tracker = ResumeTracker::load(&path, IdentityHash::Sha1).unwrap();
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let store = Arc::new(OutputStore::open(&path, false).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.append(&record(&format!("https://a.org/{}/{}", t, i))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 200);
        for line in content.lines() {
            assert!(serde_json::from_str::<DocumentRecord>(line).is_ok());
        }
    }
}
