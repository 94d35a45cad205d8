use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for the connection count.
    CountRequested,
    /// Engine answered the count query.
    CountReceived(crate::ConnectionCount),
    /// Count query failed before any harvest started.
    CountFailed(String),
    /// User asked for a harvest in the given format.
    StartClicked(crate::ExportFormat),
    /// Engine accepted the start command and assigned a session.
    HarvestStarted(crate::SessionId),
    /// User asked to cancel the running harvest.
    CancelClicked,
    /// Event from the engine's progress stream.
    Engine(crate::HarvestEvent),
    /// Export artifact written.
    ArtifactSaved(PathBuf),
    /// Export artifact could not be written.
    ArtifactSaveFailed(String),
}
