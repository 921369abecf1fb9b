//! User notifications: transient toasts and the diagnostic error path.
//!
//! DESIGN
//! ======
//! Controllers receive a [`Notifier`] at construction instead of probing for
//! one at runtime. [`TracingNotifier`] is the default when none is given.
//! Toasts are auto-dismissed: each carries its own time-to-live and
//! [`ToastBoard`] hides it once that has elapsed.
//!
//! ERROR HANDLING
//! ==============
//! Notifier failures come back as [`NotifyError`] and are swallowed by the
//! [`ErrorReporter`]; reporting an error must never raise a new one.


pub mod reporter;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

pub use reporter::{Diagnostic, DiagnosticLog, ErrorReporter, ReportOutcome};

use crate::config::{DEFAULT_TOAST_SECS, PortalConfig};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created: Instant,
    pub ttl: Duration,
}

impl Toast {
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= self.ttl
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification surface unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// NOTIFIER TRAIT
// =============================================================================

pub trait Notifier: Send + Sync {
    /// Show a toast.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the surface cannot display it.
    fn notify(&self, kind: ToastKind, message: &str) -> Result<(), NotifyError>;

    /// # Errors
    ///
    /// See [`Notifier::notify`].
    fn success(&self, message: &str) -> Result<(), NotifyError> {
        self.notify(ToastKind::Success, message)
    }

    /// # Errors
    ///
    /// See [`Notifier::notify`].
    fn error(&self, message: &str) -> Result<(), NotifyError> {
        self.notify(ToastKind::Error, message)
    }

    /// # Errors
    ///
    /// See [`Notifier::notify`].
    fn info(&self, message: &str) -> Result<(), NotifyError> {
        self.notify(ToastKind::Info, message)
    }
}

// =============================================================================
// IMPLEMENTATIONS
// =============================================================================

/// Default notifier: toasts become log lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: ToastKind, message: &str) -> Result<(), NotifyError> {
        match kind {
            ToastKind::Error => warn!(toast = "error", "{message}"),
            ToastKind::Success => info!(toast = "success", "{message}"),
            ToastKind::Info => info!(toast = "info", "{message}"),
        }
        Ok(())
    }
}

/// Terminal notifier used by the CLI; toasts go to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: ToastKind, message: &str) -> Result<(), NotifyError> {
        let marker = match kind {
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        };
        eprintln!("[{marker}] {message}");
        Ok(())
    }
}

/// In-memory toast stack with auto-dismiss.
#[derive(Debug)]
pub struct ToastBoard {
    ttl: Duration,
    next_id: AtomicU64,
    toasts: Mutex<Vec<Toast>>,
}

impl Default for ToastBoard {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TOAST_SECS))
    }
}

impl ToastBoard {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, next_id: AtomicU64::new(1), toasts: Mutex::new(Vec::new()) }
    }

    /// Board using the configured toast lifetime.
    #[must_use]
    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(config.toast_ttl)
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Add a toast created at `now`, dropping any that expired by then.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the board's lock is poisoned.
    pub fn push_at(&self, kind: ToastKind, message: &str, now: Instant) -> Result<u64, NotifyError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut toasts = self
            .toasts
            .lock()
            .map_err(|_| NotifyError::Unavailable("toast board lock poisoned".into()))?;
        toasts.retain(|t| !t.is_expired(now));
        toasts.push(Toast { id, kind, message: message.to_owned(), created: now, ttl: self.ttl });
        Ok(id)
    }

    /// Toasts still on screen at `now`, oldest first.
    #[must_use]
    pub fn visible(&self, now: Instant) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| !t.is_expired(now))
            .cloned()
            .collect()
    }

    /// Drop expired toasts; returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        let before = toasts.len();
        toasts.retain(|t| !t.is_expired(now));
        before - toasts.len()
    }

    /// Dismiss one toast early.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        before != toasts.len()
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, kind: ToastKind, message: &str) -> Result<(), NotifyError> {
        self.push_at(kind, message, Instant::now()).map(|_| ())
    }
}
