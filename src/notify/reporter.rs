//! Diagnostic error reporting with a re-entrancy guard.
//!
//! A report logs structured detail, keeps it in a bounded history and shows
//! an error toast. A report started from inside another report on the same
//! thread (the notifier failing and reporting again) is suppressed, so an
//! error raised by the reporting path itself produces one log entry, not a
//! cascade. Reports from other threads proceed normally.

#[cfg(test)]
#[path = "reporter_test.rs"]
mod reporter_test;

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, error, warn};

use super::Notifier;
use crate::error::PortalError;

pub const DEFAULT_LOG_CAPACITY: usize = 200;

// =============================================================================
// DIAGNOSTIC
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub code: &'static str,
    pub status: Option<u16>,
    pub url: Option<String>,
    /// Operation that failed, e.g. `vendors.load`.
    pub context: String,
}

impl Diagnostic {
    #[must_use]
    pub fn from_error(err: &PortalError, context: &str, url: Option<&str>) -> Self {
        Self {
            message: err.to_string(),
            code: err.error_code(),
            status: err.status(),
            url: url.map(ToOwned::to_owned),
            context: context.to_owned(),
        }
    }
}

/// Bounded history of reported diagnostics, newest last.
#[derive(Debug)]
pub struct DiagnosticLog {
    capacity: usize,
    entries: Mutex<VecDeque<Diagnostic>>,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl DiagnosticLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: Mutex::new(VecDeque::new()) }
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(diagnostic);
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// REPORTER
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    Reported,
    /// Raised while this thread was already reporting.
    Suppressed,
}

pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
    log: Arc<DiagnosticLog>,
    /// Threads currently inside `report`.
    active: Mutex<HashSet<ThreadId>>,
}

impl ErrorReporter {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_log(notifier, Arc::new(DiagnosticLog::default()))
    }

    #[must_use]
    pub fn with_log(notifier: Arc<dyn Notifier>, log: Arc<DiagnosticLog>) -> Self {
        Self { notifier, log, active: Mutex::new(HashSet::new()) }
    }

    #[must_use]
    pub fn log(&self) -> &Arc<DiagnosticLog> {
        &self.log
    }

    /// Log `diagnostic` and show `user_message` as an error toast.
    pub fn report(&self, diagnostic: Diagnostic, user_message: &str) -> ReportOutcome {
        let Some(_guard) = ReportGuard::enter(&self.active) else {
            warn!(
                code = diagnostic.code,
                context = %diagnostic.context,
                "nested error report suppressed: {}",
                diagnostic.message
            );
            return ReportOutcome::Suppressed;
        };

        error!(
            code = diagnostic.code,
            status = ?diagnostic.status,
            url = ?diagnostic.url,
            context = %diagnostic.context,
            "{}",
            diagnostic.message
        );
        self.log.push(diagnostic);

        if let Err(e) = self.notifier.error(user_message) {
            debug!(error = %e, "error toast failed; dropped");
        }
        ReportOutcome::Reported
    }

    pub fn report_error(&self, err: &PortalError, context: &str, url: Option<&str>) -> ReportOutcome {
        self.report(Diagnostic::from_error(err, context, url), &err.user_message())
    }
}

struct ReportGuard<'a> {
    active: &'a Mutex<HashSet<ThreadId>>,
    thread: ThreadId,
}

impl<'a> ReportGuard<'a> {
    fn enter(active: &'a Mutex<HashSet<ThreadId>>) -> Option<Self> {
        let thread = thread::current().id();
        let entered = active.lock().unwrap_or_else(PoisonError::into_inner).insert(thread);
        entered.then_some(Self { active, thread })
    }
}

impl Drop for ReportGuard<'_> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.thread);
    }
}
