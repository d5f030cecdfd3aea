//! Structured progress reporting for book translation.
//!
//! Every event is also logged through tracing, so a reporter without a
//! callback still leaves a trail at debug level.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted while translating.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "toc", "chapter", "chunk", "retry"
    pub phase: String,

    /// Current position (1-based)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    /// Human-readable message
    pub message: String,

    /// Elapsed time since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage =
            total.map(|t| if t > 0 { (current as f64 / t as f64) * 100.0 } else { 0.0 });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a single user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };
        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// A reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            percentage = ?event.percentage,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    /// Table of contents sent for translation.
    pub fn toc(&self, titles: usize) {
        self.emit(ProgressEvent::new(
            "toc",
            titles as u64,
            None,
            format!("{} link titles", titles),
        ));
    }

    pub fn chapter(&self, current: usize, total: usize, name: &str) {
        self.emit(ProgressEvent::new(
            "chapter",
            current as u64,
            Some(total as u64),
            format!("translating {}", name),
        ));
    }

    pub fn chunk(&self, current: usize, total: usize, chars: usize) {
        self.emit(ProgressEvent::new(
            "chunk",
            current as u64,
            Some(total as u64),
            format!("{} characters", chars),
        ));
    }

    pub fn retry(&self, attempt: u32, limit: u32, source_lines: usize, translated_lines: usize) {
        self.emit(ProgressEvent::new(
            "retry",
            u64::from(attempt),
            Some(u64::from(limit)),
            format!(
                "expected {} lines, got {}",
                source_lines, translated_lines
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent::new("chapter", 2, Some(8), "translating ch2.xhtml");
        assert_eq!(
            event.format_simple(),
            "[chapter] 2/8 (25%) - translating ch2.xhtml"
        );
    }

    #[test]
    fn test_progress_event_without_total() {
        let event = ProgressEvent::new("toc", 12, None, "12 link titles");
        assert_eq!(event.format_simple(), "[toc] 12 - 12 link titles");
    }

    #[test]
    fn test_progress_reporter_emit() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        let reporter = ProgressReporter::new(Arc::new(move |event| {
            events_clone.lock().unwrap().push(event);
        }));

        reporter.chunk(3, 10, 9_500);
        reporter.retry(1, 3, 40, 31);

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].phase, "chunk");
        assert_eq!(captured[0].current, 3);
        assert!(captured[0].elapsed_secs.is_some());
        assert_eq!(captured[1].message, "expected 40 lines, got 31");
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = ProgressReporter::noop();
        reporter.chapter(1, 1, "ch1.xhtml");
    }
}
