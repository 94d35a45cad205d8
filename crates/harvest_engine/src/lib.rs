//! Harvest engine: network lookups, the rate-limited step loop and the
//! command/event channels around it.
mod control;
mod engine;
mod filename;
mod harvest;
mod identity;
mod page;
mod payload;
mod persist;
mod sink;
mod types;
mod voyager;

pub use control::{SessionControl, SessionRegistry};
pub use engine::{Clock, EngineConfig, EngineError, EngineHandle};
pub use filename::export_filename;
pub use harvest::{run_harvest, HarvestOutcome, HarvestServices, HarvestSettings};
pub use identity::{resolve_identities, ResolvedIdentities};
pub use page::{parse_displayed_count, DisplayedCountSource, FixedCount, HtmlHeaderCount};
pub use payload::{CONTACT_INFO_TYPE, MINI_PROFILE_TYPE};
pub use persist::{prepare_output_dir, ExportWriter, PersistError};
pub use sink::{ChannelEventSink, EventSink};
pub use types::{FailureKind, LookupError};
pub use voyager::{ApiSettings, ConnectionDirectory, ContactLookup, VoyagerClient};
