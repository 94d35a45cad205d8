use crate::{ExportArtifact, ExportFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    QueryConnectionCount,
    StartHarvest { format: ExportFormat },
    CancelHarvest,
    SaveArtifact(ExportArtifact),
}
