//! Generic list/detail/edit/delete controller for one resource collection.
//!
//! DESIGN
//! ======
//! One controller per resource, owned by the page that shows it. The cycle
//! is always fetch → render → act → reload: after any successful mutation
//! the controller re-fetches instead of patching `items` locally, so the
//! view is never staler than one round trip.
//!
//! Operations take `&self`; state sits behind a `Mutex` that is never held
//! across an `.await`, so overlapping operations on one task are possible.
//! Two mechanisms keep them orderly:
//! - `loading` makes a second `load()` a no-op while one is in flight.
//! - `latest_seq` numbers every list request; a response whose number is
//!   no longer the latest is dropped. Post-mutation reloads go through
//!   `refresh()`, which always takes a new number and so supersedes any
//!   older in-flight load.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is reported once (toast + diagnostic log) and also
//! returned to the caller. Failed loads, including a fetch whose rows fail
//! to render, and failed mutations leave `items` and the rendered view
//! exactly as they were. A load future dropped mid-request releases the
//! in-flight flag on drop.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::error::PortalError;
use crate::export::{ExportFile, ExportFormat, build_export, export_filename};
use crate::form::{FormData, FormRules, SelectedFile};
use crate::notify::{DiagnosticLog, ErrorReporter, Notifier, TracingNotifier};
use crate::preview::PreviewSlot;
use crate::record::{Record, RecordId};
use crate::resources::ResourceSpec;
use crate::table::ActionKind;
use crate::transport::{FileAction, ResourceTransport, item_path};
use crate::view::Node;

// =============================================================================
// CONFIRMATION
// =============================================================================

/// Interactive yes/no prompt shown before destructive actions.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Declines everything. The default, so nothing is deleted without a host
/// that can actually ask.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAll;

impl Confirm for DenyAll {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Accepts everything; for hosts where the user already confirmed.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

// =============================================================================
// EVENTS AND OUTCOMES
// =============================================================================

/// A handler slot registered by `initialize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    Submit,
    FileChange,
    Action(ActionKind),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Submit(FormData),
    FileChanged(Option<SelectedFile>),
    Action { kind: ActionKind, id: RecordId },
}

impl UiEvent {
    #[must_use]
    pub fn binding(&self) -> Binding {
        match self {
            Self::Submit(_) => Binding::Submit,
            Self::FileChanged(_) => Binding::FileChange,
            Self::Action { kind, .. } => Binding::Action(*kind),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub record: Record,
    pub form: FormData,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// A load was already in flight.
    Skipped,
    /// A newer request superseded this one; its response was dropped.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiOutcome {
    Ignored,
    Saved(Option<Record>),
    Editing(EditSession),
    Removed(RemoveOutcome),
    PreviewUpdated,
    /// Open this URL in a new browsing context.
    Open(String),
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug, Default)]
struct ControllerState {
    items: Vec<Record>,
    selected_id: Option<RecordId>,
    loading: bool,
    latest_seq: u64,
    bindings: Vec<Binding>,
    view: Option<Node>,
    draft: Option<FormData>,
    modal_open: bool,
}

impl ControllerState {
    /// Mark a list request in flight and return its sequence number.
    fn claim_request(&mut self) -> u64 {
        self.loading = true;
        self.latest_seq += 1;
        self.latest_seq
    }
}

pub struct ResourceListController<T: ResourceTransport> {
    spec: ResourceSpec,
    rules: FormRules,
    transport: T,
    notifier: Arc<dyn Notifier>,
    reporter: ErrorReporter,
    confirm: Arc<dyn Confirm>,
    state: Mutex<ControllerState>,
    preview: tokio::sync::Mutex<PreviewSlot>,
}

impl<T: ResourceTransport> ResourceListController<T> {
    #[must_use]
    pub fn new(spec: ResourceSpec, transport: T) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
        Self {
            rules: spec.rules.clone(),
            spec,
            transport,
            reporter: ErrorReporter::new(notifier.clone()),
            notifier,
            confirm: Arc::new(DenyAll),
            state: Mutex::new(ControllerState::default()),
            preview: tokio::sync::Mutex::new(PreviewSlot::default()),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.reporter = ErrorReporter::new(notifier.clone());
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    #[must_use]
    pub fn with_max_upload(mut self, max_bytes: u64) -> Self {
        self.rules = self.rules.with_max_upload(max_bytes);
        self
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    #[must_use]
    pub fn items(&self) -> Vec<Record> {
        self.state().items.clone()
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<RecordId> {
        self.state().selected_id.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    #[must_use]
    pub fn is_modal_open(&self) -> bool {
        self.state().modal_open
    }

    /// Form kept after a failed submission so the user can retry.
    #[must_use]
    pub fn draft(&self) -> Option<FormData> {
        self.state().draft.clone()
    }

    #[must_use]
    pub fn bindings(&self) -> Vec<Binding> {
        self.state().bindings.clone()
    }

    /// Last successfully rendered `<tbody>`, if any.
    #[must_use]
    pub fn view(&self) -> Option<Node> {
        self.state().view.clone()
    }

    #[must_use]
    pub fn view_html(&self) -> String {
        self.state().view.as_ref().map(Node::to_html).unwrap_or_default()
    }

    pub async fn preview_html(&self) -> String {
        self.preview.lock().await.render().to_html()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Arc<DiagnosticLog> {
        self.reporter.log()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Register handlers and perform the first load. Later calls neither
    /// re-register nor reload, and return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns the initial load's error; the handlers stay registered.
    pub async fn initialize(&self) -> Result<bool, PortalError> {
        {
            let mut state = self.state();
            if !state.bindings.is_empty() {
                debug!(resource = self.spec.key, "already initialized");
                return Ok(false);
            }
            state.bindings = self.required_bindings();
        }
        self.load().await?;
        Ok(true)
    }

    fn required_bindings(&self) -> Vec<Binding> {
        let mut bindings = vec![Binding::Submit];
        if self.spec.has_files() {
            bindings.push(Binding::FileChange);
        }
        bindings.extend(self.spec.table.actions.iter().copied().map(Binding::Action));
        bindings
    }

    /// Route a UI event to its operation. Events without a registered
    /// handler are ignored.
    ///
    /// # Errors
    ///
    /// Whatever the routed operation returns.
    pub async fn dispatch(&self, event: UiEvent) -> Result<UiOutcome, PortalError> {
        let binding = event.binding();
        if !self.state().bindings.contains(&binding) {
            debug!(resource = self.spec.key, ?binding, "event without handler ignored");
            return Ok(UiOutcome::Ignored);
        }
        match event {
            UiEvent::Submit(form) => self.submit(form).await.map(UiOutcome::Saved),
            UiEvent::FileChanged(file) => self.select_file(file).await.map(|()| UiOutcome::PreviewUpdated),
            UiEvent::Action { kind: ActionKind::Edit, id } => self.begin_edit(&id).await.map(UiOutcome::Editing),
            UiEvent::Action { kind: ActionKind::Delete, id } => self.remove(&id).await.map(UiOutcome::Removed),
            UiEvent::Action { kind: ActionKind::View, id } => Ok(UiOutcome::Open(self.file_link(&id, FileAction::View))),
            UiEvent::Action { kind: ActionKind::Download, id } => {
                Ok(UiOutcome::Open(self.file_link(&id, FileAction::Download)))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Loading and rendering
    // -------------------------------------------------------------------------

    /// Fetch the collection and re-render. A call made while another load
    /// is in flight does nothing.
    ///
    /// # Errors
    ///
    /// Transport or render failure; prior items and view are kept.
    pub async fn load(&self) -> Result<LoadOutcome, PortalError> {
        let seq = {
            let mut state = self.state();
            if state.loading {
                debug!(resource = self.spec.key, "load already in flight; skipped");
                return Ok(LoadOutcome::Skipped);
            }
            state.claim_request()
        };
        self.run_load(seq).await
    }

    /// Like [`Self::load`], but always issues a new request, superseding any
    /// load still in flight. Never skipped.
    ///
    /// # Errors
    ///
    /// As for [`Self::load`].
    pub async fn refresh(&self) -> Result<LoadOutcome, PortalError> {
        let seq = self.state().claim_request();
        self.run_load(seq).await
    }

    async fn run_load(&self, seq: u64) -> Result<LoadOutcome, PortalError> {
        let guard = LoadingGuard { state: &self.state, seq, armed: true };
        let fetched = self.transport.list(self.spec.endpoint).await;
        guard.disarm();

        let mut state = self.state();
        if seq != state.latest_seq {
            debug!(resource = self.spec.key, seq, latest = state.latest_seq, "stale list response dropped");
            return Ok(LoadOutcome::Stale);
        }
        state.loading = false;

        let items = match fetched {
            Ok(items) => items,
            Err(err) => {
                drop(state);
                self.report(&err, "load", Some(self.spec.endpoint));
                return Err(err);
            }
        };

        let count = items.len();
        match self.spec.table.render_body(&items) {
            Ok(view) => {
                state.items = items;
                state.view = Some(view);
                debug!(resource = self.spec.key, seq, count, "list rendered");
                Ok(LoadOutcome::Loaded(count))
            }
            Err(err) => {
                drop(state);
                self.report(&err, "render", None);
                Err(err)
            }
        }
    }

    /// Replace the rendered view with `items`. On failure the previous view
    /// stays.
    ///
    /// # Errors
    ///
    /// [`PortalError::Render`] from the table.
    pub fn render(&self, items: &[Record]) -> Result<Node, PortalError> {
        match self.spec.table.render_body(items) {
            Ok(view) => {
                self.state().view = Some(view.clone());
                Ok(view)
            }
            Err(err) => {
                self.report(&err, "render", None);
                Err(err)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Validate and POST a new record, then reload.
    ///
    /// # Errors
    ///
    /// [`PortalError::Validation`] without any request, or the transport
    /// error. The form is kept as the draft either way.
    pub async fn create(&self, form: FormData) -> Result<Option<Record>, PortalError> {
        self.state().draft = Some(form.clone());
        if let Err(err) = self.rules.validate(&form) {
            self.report(&err, "create", None);
            return Err(err);
        }

        let created = match self.transport.create(self.spec.endpoint, &form).await {
            Ok(created) => created,
            Err(err) => {
                self.report(&err, "create", Some(self.spec.endpoint));
                return Err(err);
            }
        };
        info!(resource = self.spec.key, id = ?created.as_ref().and_then(Record::id), "record created");

        self.state().draft = None;
        self.preview.lock().await.clear();
        self.toast_success("Created");
        self.reload_after_mutation().await;
        Ok(created)
    }

    /// Validate and PUT changes to `id`, close the editor, then reload.
    ///
    /// # Errors
    ///
    /// As for [`Self::create`].
    pub async fn update(&self, id: &RecordId, form: FormData) -> Result<Option<Record>, PortalError> {
        self.state().draft = Some(form.clone());
        let path = item_path(self.spec.endpoint, id);
        if let Err(err) = self.rules.for_update().validate(&form) {
            self.report(&err, "update", None);
            return Err(err);
        }

        let updated = match self.transport.update(self.spec.endpoint, id, &form).await {
            Ok(updated) => updated,
            Err(err) => {
                self.report(&err, "update", Some(&path));
                return Err(err);
            }
        };
        info!(resource = self.spec.key, %id, "record updated");

        {
            let mut state = self.state();
            state.draft = None;
            state.modal_open = false;
            state.selected_id = None;
        }
        self.preview.lock().await.clear();
        self.toast_success("Saved");
        self.reload_after_mutation().await;
        Ok(updated)
    }

    /// Fetch `id` and open it for editing.
    ///
    /// # Errors
    ///
    /// Transport error; selection is left unchanged.
    pub async fn begin_edit(&self, id: &RecordId) -> Result<EditSession, PortalError> {
        let record = match self.transport.fetch(self.spec.endpoint, id).await {
            Ok(record) => record,
            Err(err) => {
                self.report(&err, "fetch", Some(&item_path(self.spec.endpoint, id)));
                return Err(err);
            }
        };
        let form = FormData::from_record(&record, self.spec.form_fields);
        {
            let mut state = self.state();
            state.selected_id = Some(id.clone());
            state.modal_open = true;
        }
        Ok(EditSession { record, form })
    }

    pub fn cancel_edit(&self) {
        let mut state = self.state();
        state.selected_id = None;
        state.modal_open = false;
    }

    /// Save `form` as an update when a record is selected, else as a new one.
    ///
    /// # Errors
    ///
    /// As for [`Self::create`].
    pub async fn submit(&self, form: FormData) -> Result<Option<Record>, PortalError> {
        let selected = self.state().selected_id.clone();
        match selected {
            Some(id) => self.update(&id, form).await,
            None => self.create(form).await,
        }
    }

    /// Ask for confirmation, DELETE `id`, then reload.
    ///
    /// # Errors
    ///
    /// Transport error; `items` is untouched.
    pub async fn remove(&self, id: &RecordId) -> Result<RemoveOutcome, PortalError> {
        if !self.confirm.confirm(self.spec.confirm_delete) {
            debug!(resource = self.spec.key, %id, "delete not confirmed");
            return Ok(RemoveOutcome::Cancelled);
        }

        if let Err(err) = self.transport.delete(self.spec.endpoint, id).await {
            self.report(&err, "delete", Some(&item_path(self.spec.endpoint, id)));
            return Err(err);
        }
        info!(resource = self.spec.key, %id, "record deleted");

        {
            let mut state = self.state();
            if state.selected_id.as_ref() == Some(id) {
                state.selected_id = None;
                state.modal_open = false;
            }
        }
        self.toast_success("Deleted");
        self.reload_after_mutation().await;
        Ok(RemoveOutcome::Removed)
    }

    async fn reload_after_mutation(&self) {
        // Failures are reported by `run_load`; the mutation itself succeeded.
        if let Err(err) = self.refresh().await {
            debug!(resource = self.spec.key, error = %err, "reload after mutation failed");
        }
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    /// Show a preview for the chosen file, or clear it.
    ///
    /// # Errors
    ///
    /// Preview encoding failure.
    pub async fn select_file(&self, file: Option<SelectedFile>) -> Result<(), PortalError> {
        let result = self.preview.lock().await.show(file.as_ref()).await;
        if let Err(err) = &result {
            self.report(err, "preview", None);
        }
        result
    }

    #[must_use]
    pub fn file_link(&self, id: &RecordId, action: FileAction) -> String {
        self.transport.file_url(self.spec.endpoint, id, action)
    }

    // -------------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`Self::export_dated`].
    pub async fn export_csv(&self) -> Result<ExportFile, PortalError> {
        self.export_dated(ExportFormat::Csv, today()).await
    }

    /// # Errors
    ///
    /// See [`Self::export_dated`].
    pub async fn export_json(&self) -> Result<ExportFile, PortalError> {
        self.export_dated(ExportFormat::Json, today()).await
    }

    /// Export the full collection, named for `date`. If the fetch fails but
    /// items are already loaded, those are exported instead.
    ///
    /// # Errors
    ///
    /// The fetch error when nothing is loaded, or a serialization error.
    pub async fn export_dated(&self, format: ExportFormat, date: Date) -> Result<ExportFile, PortalError> {
        let items = match self.transport.list(self.spec.endpoint).await {
            Ok(items) => items,
            Err(err) => {
                let loaded = self.items();
                if loaded.is_empty() {
                    self.report(&err, "export", Some(self.spec.endpoint));
                    return Err(err);
                }
                warn!(resource = self.spec.key, error = %err, "export fetch failed; using loaded items");
                loaded
            }
        };

        match build_export(self.spec.key, &items, &self.spec.export_columns, format, date) {
            Ok(file) => {
                info!(resource = self.spec.key, filename = %file.filename, rows = items.len(), "export built");
                Ok(file)
            }
            Err(err) => {
                self.report(&err, "export", None);
                Err(err)
            }
        }
    }

    /// Download the server-rendered export.
    ///
    /// # Errors
    ///
    /// Transport error.
    pub async fn export_remote(&self, format: ExportFormat) -> Result<ExportFile, PortalError> {
        match self.transport.export(self.spec.endpoint, format).await {
            Ok(bytes) => Ok(ExportFile {
                filename: export_filename(self.spec.key, format, today()),
                mime: format.mime(),
                bytes,
            }),
            Err(err) => {
                self.report(&err, "export", Some(self.spec.endpoint));
                Err(err)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    fn report(&self, err: &PortalError, op: &str, url: Option<&str>) {
        let context = format!("{}.{op}", self.spec.key);
        self.reporter.report_error(err, &context, url);
    }

    fn toast_success(&self, message: &str) {
        if let Err(e) = self.notifier.success(message) {
            debug!(error = %e, "success toast failed; dropped");
        }
    }
}

/// Clears `loading` if a load future is dropped before its response
/// arrives, unless a newer request has taken over since.
struct LoadingGuard<'a> {
    state: &'a Mutex<ControllerState>,
    seq: u64,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.latest_seq == self.seq {
            state.loading = false;
            debug!(seq = self.seq, "cancelled load released the loading flag");
        }
    }
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
