use super::*;
use crate::notify::{NotifyError, ToastBoard, ToastKind};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Notifier whose error path reports another error through the same reporter.
struct ReentrantNotifier {
    reporter: OnceLock<Arc<ErrorReporter>>,
    calls: AtomicUsize,
    nested: Mutex<Vec<ReportOutcome>>,
}

impl Notifier for ReentrantNotifier {
    fn notify(&self, _kind: ToastKind, _message: &str) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reporter) = self.reporter.get() {
            let nested = reporter.report_error(&PortalError::Render("toast container missing".into()), "toast", None);
            self.nested.lock().unwrap().push(nested);
        }
        Err(NotifyError::Unavailable("no toast container".into()))
    }
}

fn http_error() -> PortalError {
    PortalError::Http { status: 500, message: "database locked".into() }
}

#[test]
fn report_logs_and_toasts() {
    let board = Arc::new(ToastBoard::default());
    let reporter = ErrorReporter::new(board.clone());

    let outcome = reporter.report_error(&http_error(), "vendors.load", Some("/api/pr/vendors"));
    assert_eq!(outcome, ReportOutcome::Reported);

    let entries = reporter.log().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, Some(500));
    assert_eq!(entries[0].url.as_deref(), Some("/api/pr/vendors"));
    assert_eq!(entries[0].context, "vendors.load");
    assert_eq!(entries[0].code, "E_HTTP");

    let toasts = board.visible(Instant::now());
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert_eq!(toasts[0].message, "database locked");
}

#[test]
fn nested_report_is_suppressed_and_logged_once() {
    let notifier = Arc::new(ReentrantNotifier {
        reporter: OnceLock::new(),
        calls: AtomicUsize::new(0),
        nested: Mutex::new(Vec::new()),
    });
    let reporter = Arc::new(ErrorReporter::new(notifier.clone()));
    notifier.reporter.set(reporter.clone()).ok();

    let outcome = reporter.report_error(&http_error(), "designs.create", None);

    assert_eq!(outcome, ReportOutcome::Reported);
    assert_eq!(reporter.log().len(), 1);
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*notifier.nested.lock().unwrap(), vec![ReportOutcome::Suppressed]);
}

#[test]
fn guard_releases_after_report() {
    let notifier = Arc::new(ReentrantNotifier {
        reporter: OnceLock::new(),
        calls: AtomicUsize::new(0),
        nested: Mutex::new(Vec::new()),
    });
    let reporter = ErrorReporter::new(notifier.clone());

    assert_eq!(reporter.report_error(&http_error(), "a", None), ReportOutcome::Reported);
    assert_eq!(reporter.report_error(&http_error(), "b", None), ReportOutcome::Reported);
    assert_eq!(reporter.log().len(), 2);
}

#[test]
fn notifier_failure_is_swallowed() {
    let notifier = Arc::new(ReentrantNotifier {
        reporter: OnceLock::new(),
        calls: AtomicUsize::new(0),
        nested: Mutex::new(Vec::new()),
    });
    let reporter = ErrorReporter::new(notifier);
    assert_eq!(reporter.report_error(&http_error(), "x", None), ReportOutcome::Reported);
}

#[test]
fn log_is_bounded() {
    let log = DiagnosticLog::with_capacity(2);
    for n in 0..3 {
        log.push(Diagnostic::from_error(&PortalError::Validation(format!("e{n}")), "form", None));
    }
    let messages: Vec<String> = log.entries().into_iter().map(|d| d.message).collect();
    assert_eq!(messages, vec!["e1", "e2"]);
}

/// Notifier that holds each caller until `expected` callers are inside it
/// at once, or a deadline passes.
struct RendezvousNotifier {
    inside: AtomicUsize,
    expected: usize,
}

impl Notifier for RendezvousNotifier {
    fn notify(&self, _kind: ToastKind, _message: &str) -> Result<(), NotifyError> {
        self.inside.fetch_add(1, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(2);
        while self.inside.load(Ordering::SeqCst) < self.expected && Instant::now() < deadline {
            std::thread::yield_now();
        }
        Ok(())
    }
}

#[test]
fn concurrent_reports_from_other_threads_are_not_suppressed() {
    let notifier = Arc::new(RendezvousNotifier { inside: AtomicUsize::new(0), expected: 2 });
    let reporter = ErrorReporter::new(notifier.clone());

    let reporter = &reporter;
    let outcomes: Vec<ReportOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["vendors.load", "designs.load"]
            .into_iter()
            .map(|context| scope.spawn(move || reporter.report_error(&http_error(), context, None)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes, vec![ReportOutcome::Reported; 2]);
    assert_eq!(reporter.log().len(), 2);
    assert_eq!(notifier.inside.load(Ordering::SeqCst), 2);
}
