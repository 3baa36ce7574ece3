//! Newline-delimited link input

use crate::error::RunnerError;
use polaudit_domain::Link;
use polaudit_extractor::find_balanced_json;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Parse one input line
///
/// Lines with stray text around the JSON object (a log prefix, a trailing
/// comma) are recovered from their first balanced object.
pub fn parse_link_line(line: &str) -> Option<Link> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line)
        .ok()
        .or_else(|| find_balanced_json(line).and_then(|obj| serde_json::from_str(obj).ok()))
}

/// Read every link from `reader`, skipping blank and unparseable lines
pub fn read_links_from(reader: impl BufRead) -> Result<Vec<Link>, RunnerError> {
    let mut links = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_link_line(&line) {
            Some(link) => links.push(link),
            None => warn!(line = idx + 1, "Skipping unparseable input line"),
        }
    }
    debug!(count = links.len(), "Read input links");
    Ok(links)
}

/// Read every link from the file at `path`
pub fn read_links(path: &Path) -> Result<Vec<Link>, RunnerError> {
    let file = File::open(path)?;
    read_links_from(BufReader::new(file))
}
