use std::path::PathBuf;

use crate::view_model::{AppViewModel, ReportSummary};
use crate::{ConnectionCount, ExportFormat, HarvestReport, Progress, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    /// Cancel requested but not yet applied by the engine.
    Cancelling,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Cancelling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

/// Control-surface state. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    active: Option<SessionId>,
    format: Option<ExportFormat>,
    count: Option<ConnectionCount>,
    progress: Option<Progress>,
    summary: Option<ReportSummary>,
    saved_to: Option<PathBuf>,
    notices: Vec<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            active_session: self.active,
            format: self.format,
            count: self.count,
            progress: self.progress,
            summary: self.summary.clone(),
            saved_to: self.saved_to.clone(),
            pending_notices: self.notices.len(),
            dirty: self.dirty,
        }
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drains notices queued for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    pub(crate) fn begin_harvest(&mut self, format: ExportFormat) {
        self.session = SessionState::Running;
        self.active = None;
        self.format = Some(format);
        self.progress = None;
        self.summary = None;
        self.saved_to = None;
        self.dirty = true;
    }

    pub(crate) fn attach_session(&mut self, session: SessionId) {
        self.active = Some(session);
        self.dirty = true;
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
        self.dirty = true;
    }

    pub(crate) fn set_count(&mut self, count: ConnectionCount) {
        self.count = Some(count);
        self.dirty = true;
    }

    pub(crate) fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
        self.dirty = true;
    }

    pub(crate) fn set_summary(&mut self, report: &HarvestReport) {
        self.summary = Some(ReportSummary::from_report(report));
        self.dirty = true;
    }

    pub(crate) fn set_saved_to(&mut self, path: PathBuf) {
        self.saved_to = Some(path);
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, severity: Severity, text: impl Into<String>) {
        self.notices.push(Notice {
            severity,
            text: text.into(),
        });
        self.dirty = true;
    }
}
