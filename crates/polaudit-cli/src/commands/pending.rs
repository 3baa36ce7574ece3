//! Pending command implementation.

use crate::cli::PendingArgs;
use crate::error::Result;
use polaudit_domain::IdentityHash;
use polaudit_runner::{read_links, ResumeTracker};
use std::io::Write;

/// Execute the pending command.
pub fn execute_pending(args: PendingArgs, default_hash: IdentityHash, out: &mut impl Write) -> Result<usize> {
    let hash = args.identity_hash.map(Into::into).unwrap_or(default_hash);
    let links = read_links(&args.links)?;
    let tracker = ResumeTracker::load(&args.output, hash)?;
    let total = links.len();
    let pending = tracker.pending(links);

    writeln!(out, "{} of {} links pending ({} already audited)", pending.len(), total, tracker.len())?;
    if args.list {
        for link in &pending {
            writeln!(out, "{}\t{}", link.doc_type, link.url)?;
        }
    }
    Ok(pending.len())
}
