//! Harvest core: record model, exporters, the harvest session state machine and
//! the control-surface state. Nothing in here performs IO.
mod effect;
mod event;
mod export;
mod identity;
mod msg;
mod record;
mod session;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use event::HarvestEvent;
pub use export::{
    serialize, to_csv, to_json, ExportArtifact, ExportFormat, ParseFormatError, SerializeError,
    CSV_HEADER,
};
pub use identity::{ConnectionCount, ConnectionIdentity};
pub use msg::Msg;
pub use record::{profile_url, ConnectionRecord, RawContact, DEFAULT_PROFILE_BASE_URL};
pub use session::{
    HarvestReport, HarvestSession, HarvestState, ItemFailure, Progress, SessionId, Step,
};
pub use state::{AppState, Notice, SessionState, Severity};
pub use update::update;
pub use view_model::{AppViewModel, ReportSummary};
