use crate::{ConnectionCount, ExportArtifact, HarvestReport, ItemFailure, Progress, SessionId};

/// Notifications from the engine to whoever is listening. Every event names the
/// session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    /// Identities resolved; the step loop is about to begin.
    Started {
        session: SessionId,
        count: ConnectionCount,
    },
    /// One identity processed, successfully or not.
    Progress {
        session: SessionId,
        progress: Progress,
    },
    /// A single lookup failed; the harvest carries on.
    ItemFailed {
        session: SessionId,
        failure: ItemFailure,
    },
    /// Emitted once, after the final step. `artifact` is `None` only if rendering
    /// the export failed.
    Completed {
        session: SessionId,
        report: HarvestReport,
        artifact: Option<ExportArtifact>,
    },
    /// Cancellation applied at a step boundary. No artifact is produced.
    Cancelled {
        session: SessionId,
        report: HarvestReport,
    },
    /// Identity resolution failed before any step ran.
    Failed { session: SessionId, error: String },
}

impl HarvestEvent {
    pub fn session(&self) -> SessionId {
        match self {
            HarvestEvent::Started { session, .. }
            | HarvestEvent::Progress { session, .. }
            | HarvestEvent::ItemFailed { session, .. }
            | HarvestEvent::Completed { session, .. }
            | HarvestEvent::Cancelled { session, .. }
            | HarvestEvent::Failed { session, .. } => *session,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HarvestEvent::Completed { .. }
                | HarvestEvent::Cancelled { .. }
                | HarvestEvent::Failed { .. }
        )
    }
}
