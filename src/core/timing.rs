//! Timed-task instrumentation.
//!
//! Every unit of pipeline work is wrapped by [`timed`], which measures wall
//! clock time and reports exactly one line once the work has finished.

use serde::Serialize;
use std::sync::Mutex;
use std::time::Instant;

use crate::error::Result;

/// Sink for progress lines.
pub trait Reporter: Send + Sync {
    fn line(&self, line: &str);
}

/// Writes progress lines to stderr, keeping stdout free for the JSON response.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn line(&self, line: &str) {
        eprintln!("{}", line);
    }
}

/// Keeps lines in memory; used by tests and by callers that render later.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskTiming {
    pub message: String,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

const FAILED_INFO: &str = "failed";

/// `" - [12 ms]    message -> info"`
pub fn format_line(elapsed_ms: u128, message: &str, info: Option<&str>) -> String {
    let time_info = format!("[{} ms]", elapsed_ms);
    let mut line = format!(" - {:<9} {}", time_info, message);
    if let Some(info) = info {
        line.push_str(" -> ");
        line.push_str(info);
    }
    line
}

/// Run `work`, then report how long it took.
///
/// The closure may return a short annotation that is appended to the line.
/// Errors from `work` are returned untouched; the line is still emitted,
/// annotated as failed.
pub fn timed<F>(reporter: &dyn Reporter, message: &str, work: F) -> Result<TaskTiming>
where
    F: FnOnce() -> Result<Option<String>>,
{
    let start = Instant::now();
    let outcome = work();
    let elapsed_ms = start.elapsed().as_millis();

    match outcome {
        Ok(info) => {
            reporter.line(&format_line(elapsed_ms, message, info.as_deref()));
            Ok(TaskTiming {
                message: message.to_string(),
                elapsed_ms,
                info,
            })
        }
        Err(err) => {
            reporter.line(&format_line(elapsed_ms, message, Some(FAILED_INFO)));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    #[test]
    fn format_pads_time_to_ten_columns() {
        assert_eq!(
            format_line(5, "Cleaned tmp directory", None),
            " - [5 ms]    Cleaned tmp directory"
        );
        assert_eq!(
            format_line(1234, "Created zip file", None),
            " - [1234 ms] Created zip file"
        );
    }

    #[test]
    fn format_keeps_a_space_for_long_durations() {
        assert_eq!(format_line(123456, "Slow", None), " - [123456 ms] Slow");
    }

    #[test]
    fn format_appends_info() {
        assert_eq!(
            format_line(7, "Updated minimum chrome version", Some("v110")),
            " - [7 ms]    Updated minimum chrome version -> v110"
        );
    }

    #[test]
    fn emits_one_line_after_work_completes() {
        let reporter = MemoryReporter::new();
        let ran = Cell::new(false);

        let timing = timed(&reporter, "Did work", || {
            assert!(reporter.lines().is_empty());
            ran.set(true);
            Ok(Some("done".to_string()))
        })
        .unwrap();

        assert!(ran.get());
        let lines = reporter.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Did work -> done"));
        assert_eq!(timing.info.as_deref(), Some("done"));
        assert_eq!(timing.message, "Did work");
    }

    #[test]
    fn errors_pass_through_unchanged() {
        let reporter = MemoryReporter::new();

        let err = timed(&reporter, "Broken", || {
            Err(Error::internal_io("disk full", Some("write".to_string())))
        })
        .unwrap_err();

        assert_eq!(err.code.as_str(), "internal.io_error");
        assert_eq!(err.details["error"], "disk full");
        let lines = reporter.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Broken -> failed"));
    }
}
