use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Page source failed at offset {offset} (limit {limit})")]
    Source {
        offset: usize,
        limit: usize,
        source: anyhow::Error,
    },

    #[error("Invalid loader configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Failed to read configuration from {path:?}")]
    Config { path: PathBuf, source: anyhow::Error },
}

/// Receives page-source failures swallowed by the loader.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &LoaderError);
}

/// Default reporter: one structured `error!` event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, error: &LoaderError) {
        LogHelper::log_loader_error("Error loading more items", error);
    }
}

/// Queues user-facing messages for a toast area, and logs like the default reporter.
#[derive(Debug, Default)]
pub struct ToastReporter {
    messages: Mutex<Vec<String>>,
}

impl ToastReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued message, oldest first.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl ErrorReporter for ToastReporter {
    fn report(&self, error: &LoaderError) {
        LogHelper::log_loader_error("Error loading more items", error);
        self.messages.lock().push(UserErrorFormatter::format_for_ui(error));
    }
}

/// Error context wrapper for repository operations
pub struct ErrorContext {
    operation: String,
    details: Vec<(String, String)>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    pub fn wrap<T>(self, result: Result<T>) -> Result<T> {
        result.with_context(|| {
            let mut msg = format!("Operation '{}' failed", self.operation);
            if !self.details.is_empty() {
                msg.push_str(" with context:");
                for (key, value) in self.details {
                    msg.push_str(&format!("\n  {}: {}", key, value));
                }
            }
            msg
        })
    }
}

/// Structured logging helpers
pub struct LogHelper;

impl LogHelper {
    pub fn log_loader_error(context: &str, error: &LoaderError) {
        match error {
            LoaderError::Source {
                offset,
                limit,
                source,
            } => {
                error!(
                    offset = offset,
                    limit = limit,
                    error = %source,
                    error_chain = ?source.chain().map(|e| e.to_string()).collect::<Vec<_>>(),
                    "{}", context
                );
            }
            other => {
                error!(error = %other, "{}", context);
            }
        }
    }

    pub fn log_empty_page_streak(offset: usize, streak: u32, max: u32) {
        warn!(
            offset = offset,
            streak = streak,
            max = max,
            "Page source returned an empty page but reported more"
        );
    }

    pub fn log_performance_warning(operation: &str, duration_ms: u64, threshold_ms: u64) {
        if duration_ms > threshold_ms {
            warn!(
                operation = %operation,
                duration_ms = duration_ms,
                threshold_ms = threshold_ms,
                "Operation exceeded performance threshold"
            );
        }
    }
}

/// User-friendly error messages for the inline retry affordance
pub struct UserErrorFormatter;

impl UserErrorFormatter {
    pub fn format_for_ui(error: &LoaderError) -> String {
        match error {
            LoaderError::Source { source, .. } => Self::format_source_error(source),
            LoaderError::InvalidConfig { field, reason } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            LoaderError::Config { path, .. } => {
                format!("Could not read settings from {}", path.display())
            }
        }
    }

    fn format_source_error(error: &anyhow::Error) -> String {
        let error_str = format!("{:#}", error).to_lowercase();

        if error_str.contains("timeout") || error_str.contains("timed out") {
            return "Loading timed out. Tap retry to try again.".to_string();
        }

        if error_str.contains("network") || error_str.contains("connection") {
            return "Network connection error. Check your connection and retry.".to_string();
        }

        if error_str.contains("database") || error_str.contains("sqlite") {
            return "A database error occurred while loading more rows. Please retry.".to_string();
        }

        "Could not load more items. Please retry.".to_string()
    }
}

/// Logs a warning on drop when the guarded operation ran longer than its threshold.
pub struct PerformanceMonitor {
    operation: String,
    start: Instant,
    threshold_ms: u64,
}

impl PerformanceMonitor {
    pub fn new(operation: impl Into<String>, threshold_ms: u64) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
            threshold_ms,
        }
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        LogHelper::log_performance_warning(&self.operation, duration_ms, self.threshold_ms);

        debug!(
            operation = %self.operation,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn source_error(message: &str) -> LoaderError {
        LoaderError::Source {
            offset: 100,
            limit: 50,
            source: anyhow::anyhow!(message.to_string()),
        }
    }

    #[test]
    fn test_source_error_display_and_chain() {
        let error = source_error("Network error");
        assert_eq!(
            error.to_string(),
            "Page source failed at offset 100 (limit 50)"
        );
        assert_eq!(error.source().unwrap().to_string(), "Network error");
    }

    #[test]
    fn test_user_messages() {
        assert!(UserErrorFormatter::format_for_ui(&source_error("request timed out"))
            .contains("timed out"));
        assert!(UserErrorFormatter::format_for_ui(&source_error("connection refused"))
            .contains("Network"));
        assert!(UserErrorFormatter::format_for_ui(&source_error("sqlite busy"))
            .contains("database"));
        assert_eq!(
            UserErrorFormatter::format_for_ui(&source_error("boom")),
            "Could not load more items. Please retry."
        );
    }

    #[test]
    fn test_user_message_sees_context_chain() {
        let error = LoaderError::Source {
            offset: 0,
            limit: 10,
            source: anyhow::anyhow!("connection reset").context("fetch KOL page"),
        };
        assert!(UserErrorFormatter::format_for_ui(&error).contains("Network"));
    }

    #[test]
    fn test_toast_reporter_queues_messages() {
        let reporter = ToastReporter::new();
        assert!(reporter.is_empty());

        reporter.report(&source_error("boom"));
        reporter.report(&source_error("connection lost"));
        assert_eq!(reporter.len(), 2);

        let messages = reporter.drain();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("Network"));
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_error_context() {
        let result: Result<()> = Err(anyhow::anyhow!("no such table: kol_accounts"));

        let wrapped = ErrorContext::new("list_kol_page")
            .with_detail("offset", 50)
            .with_detail("limit", 25)
            .wrap(result);

        let error_msg = format!("{:#}", wrapped.unwrap_err());
        assert!(error_msg.contains("list_kol_page"));
        assert!(error_msg.contains("offset: 50"));
        assert!(error_msg.contains("no such table"));
    }
}
