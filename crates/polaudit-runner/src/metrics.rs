//! Metrics collected during an audit run

use polaudit_extractor::AuditOutcome;

/// Counts collected during one run
///
/// Tracks how every pending link ended up, for the operator summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Links found in the input
    pub input: usize,

    /// Links already present in the output store
    pub already_done: usize,

    /// Links scheduled for this run
    pub pending: usize,

    /// Complete records appended
    pub written: usize,

    /// Partial records appended after cancellation
    pub partial: usize,

    /// Documents where no chunk stated anything
    pub no_facts: usize,

    /// Documents whose text could not be obtained
    pub fetch_failed: usize,

    /// Documents stopped by cancellation before contributing anything
    pub cancelled: usize,

    /// Links never started because the run was cancelled first
    pub not_started: usize,

    /// Tasks that failed (write errors, panics, quota)
    pub errors: usize,

    /// Whether the run stopped on quota exhaustion
    pub quota_halted: bool,

    /// Total runtime in seconds
    pub total_runtime_secs: u64,
}

impl RunMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one document
    pub fn record_outcome(&mut self, outcome: &AuditOutcome) {
        match outcome {
            AuditOutcome::Recorded { partial: false, .. } => self.written += 1,
            AuditOutcome::Recorded { partial: true, .. } => self.partial += 1,
            AuditOutcome::NoFacts { .. } => self.no_facts += 1,
            AuditOutcome::FetchFailed => self.fetch_failed += 1,
            AuditOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Record a failed task
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Lines appended to the output store
    pub fn lines_appended(&self) -> usize {
        self.written + self.partial
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Audit Run Summary".to_string(),
            "=================".to_string(),
            format!("Input links: {}", self.input),
            format!("Already done: {}", self.already_done),
            format!("Pending: {}", self.pending),
            format!("Records written: {}", self.written),
            format!("Partial records: {}", self.partial),
            format!("No facts found: {}", self.no_facts),
            format!("Fetch failures: {}", self.fetch_failed),
            format!("Errors: {}", self.errors),
        ];
        if self.cancelled > 0 || self.not_started > 0 {
            lines.push(format!(
                "Cancelled: {} in flight, {} not started",
                self.cancelled, self.not_started
            ));
        }
        if self.quota_halted {
            lines.push("Run halted: quota exhausted on every model tier".to_string());
        }
        lines.push(format!("Total runtime: {}s", self.total_runtime_secs));
        lines.join("\n")
    }
}
