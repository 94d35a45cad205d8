use std::sync::{mpsc, Arc};

use harvest_core::HarvestEvent;
use harvest_logging::harvest_debug;

use crate::SessionRegistry;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Forwards events of the active session over a channel and drops the rest.
pub struct ChannelEventSink {
    tx: mpsc::Sender<HarvestEvent>,
    registry: Arc<SessionRegistry>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<HarvestEvent>, registry: Arc<SessionRegistry>) -> Self {
        Self { tx, registry }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: HarvestEvent) {
        if !self.registry.is_active(event.session()) {
            harvest_debug!("Dropping event from stale session {}", event.session());
            return;
        }
        // Fire-and-forget: nobody listening is not an error.
        let _ = self.tx.send(event);
    }
}
