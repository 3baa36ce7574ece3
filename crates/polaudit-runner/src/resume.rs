//! Resume support: skip links already present in the output store

use crate::error::RunnerError;
use polaudit_domain::{IdentityHash, Link};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use tracing::{debug, info};

/// Set of document identities already written by earlier runs
#[derive(Debug, Clone, Default)]
pub struct ResumeTracker {
    hash: IdentityHash,
    done: HashSet<String>,
}

impl ResumeTracker {
    /// Create an empty tracker
    pub fn new(hash: IdentityHash) -> Self {
        Self {
            hash,
            done: HashSet::new(),
        }
    }

    /// Scan the output store at `path`; a missing file means nothing is done
    pub fn load(path: &Path, hash: IdentityHash) -> Result<Self, RunnerError> {
        match File::open(path) {
            Ok(file) => Self::from_reader(BufReader::new(file), hash),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::new(hash)),
            Err(e) => Err(e.into()),
        }
    }

    /// Scan output lines from `reader`
    ///
    /// Each line contributes its `sha1` field, or the hash of its `url` when
    /// that field is missing. Malformed lines (such as a partial line left by
    /// an interrupted write) are ignored.
    pub fn from_reader(reader: impl BufRead, hash: IdentityHash) -> Result<Self, RunnerError> {
        let mut tracker = Self::new(hash);
        let mut ignored = 0usize;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match identity_of_line(&line, hash) {
                Some(id) => {
                    tracker.done.insert(id);
                }
                None => ignored += 1,
            }
        }
        if ignored > 0 {
            debug!(ignored, "Ignored malformed output lines");
        }
        info!(done = tracker.done.len(), "Loaded resume state");
        Ok(tracker)
    }

    /// Whether `link` was already audited
    pub fn is_done(&self, link: &Link) -> bool {
        self.done.contains(&link.identity(self.hash))
    }

    /// Number of identities already written
    pub fn len(&self) -> usize {
        self.done.len()
    }

    /// Whether nothing was written yet
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    /// Links still to audit, in input order
    ///
    /// Duplicate URLs in the input are audited once.
    pub fn pending(&self, links: Vec<Link>) -> Vec<Link> {
        let mut seen = HashSet::new();
        links
            .into_iter()
            .filter(|link| {
                let id = link.identity(self.hash);
                !self.done.contains(&id) && seen.insert(id)
            })
            .collect()
    }
}

fn identity_of_line(line: &str, hash: IdentityHash) -> Option<String> {
    let value: Value = serde_json::from_str(line).ok()?;
    let obj = value.as_object()?;
    if let Some(id) = obj.get("sha1").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        return Some(id.to_string());
    }
    obj.get("url")
        .and_then(Value::as_str)
        .map(|url| hash.digest(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polaudit_domain::DocType;

    fn link(url: &str) -> Link {
        Link::new("a.org", url, DocType::PrivacyPolicy)
    }

    #[test]
    fn test_sha1_field_and_url_fallback() {
        let known = IdentityHash::Sha1.digest("https://a.org/1");
        let input = format!(
            "{{\"url\": \"https://a.org/1\", \"sha1\": \"{}\"}}\n{{\"url\": \"https://a.org/2\"}}\n",
            known
        );
        let tracker = ResumeTracker::from_reader(input.as_bytes(), IdentityHash::Sha1).unwrap();
        assert_eq!(tracker.len(), 2);
        assert!(tracker.is_done(&link("https://a.org/1")));
        assert!(tracker.is_done(&link("https://a.org/2")));
        assert!(!tracker.is_done(&link("https://a.org/3")));
    }

    #[test]
    fn test_truncated_trailing_line_is_ignored() {
        let input = "{\"url\": \"https://a.org/1\"}\n{\"url\": \"https://a.o";
        let tracker = ResumeTracker::from_reader(input.as_bytes(), IdentityHash::Sha1).unwrap();
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_pending_filters_done_and_duplicates() {
        let input = "{\"url\": \"https://a.org/1\"}\n";
        let tracker = ResumeTracker::from_reader(input.as_bytes(), IdentityHash::Sha1).unwrap();
        let pending = tracker.pending(vec![
            link("https://a.org/1"),
            link("https://a.org/2"),
            link("https://a.org/3"),
            link("https://a.org/2"),
        ]);
        let urls: Vec<&str> = pending.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.org/2", "https://a.org/3"]);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ResumeTracker::load(&dir.path().join("none.jsonl"), IdentityHash::Sha1).unwrap();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_hash_choice_changes_identities() {
        let input = "{\"url\": \"https://a.org/1\"}\n";
        let tracker = ResumeTracker::from_reader(input.as_bytes(), IdentityHash::Sha256).unwrap();
        assert!(tracker.is_done(&link("https://a.org/1")));
        let sha1 = IdentityHash::Sha1.digest("https://a.org/1");
        let input = format!("{{\"sha1\": \"{}\"}}\n", sha1);
        let tracker = ResumeTracker::from_reader(input.as_bytes(), IdentityHash::Sha256).unwrap();
        assert!(!tracker.is_done(&link("https://a.org/1")));
    }
}
