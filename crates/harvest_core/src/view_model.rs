use std::path::PathBuf;

use crate::{ConnectionCount, ExportFormat, HarvestReport, Progress, SessionId, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: Vec<String>,
}

impl ReportSummary {
    pub fn from_report(report: &HarvestReport) -> Self {
        Self {
            total: report.total,
            processed: report.processed,
            succeeded: report.succeeded(),
            failed: report
                .failures
                .iter()
                .map(|failure| failure.identity.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub active_session: Option<SessionId>,
    pub format: Option<ExportFormat>,
    pub count: Option<ConnectionCount>,
    pub progress: Option<Progress>,
    pub summary: Option<ReportSummary>,
    pub saved_to: Option<PathBuf>,
    pub pending_notices: usize,
    pub dirty: bool,
}
