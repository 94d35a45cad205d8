#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use harvest_core::{ConnectionIdentity, HarvestEvent, Progress, RawContact};
use harvest_engine::{
    ConnectionDirectory, ContactLookup, EventSink, FailureKind, FixedCount, HarvestServices,
    HarvestSettings, LookupError, SessionRegistry,
};
use tokio::sync::Notify;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harvest_logging::initialize_for_tests);
}

pub fn ids(values: &[&str]) -> Vec<ConnectionIdentity> {
    values.iter().copied().map(ConnectionIdentity::from).collect()
}

pub fn http_error(code: u16) -> LookupError {
    LookupError {
        kind: FailureKind::HttpStatus(code),
        message: format!("status {code}"),
    }
}

pub fn fast_settings() -> HarvestSettings {
    HarvestSettings {
        step_delay: Duration::ZERO,
        ..HarvestSettings::default()
    }
}

#[derive(Default)]
pub struct StaticDirectory {
    identities: Vec<ConnectionIdentity>,
    failure: Option<LookupError>,
    requests: Mutex<Vec<(u32, u32)>>,
}

impl StaticDirectory {
    pub fn new(identities: Vec<ConnectionIdentity>) -> Self {
        Self {
            identities,
            ..Self::default()
        }
    }

    pub fn failing(failure: LookupError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ConnectionDirectory for StaticDirectory {
    async fn list_connections(
        &self,
        count: u32,
        start: u32,
    ) -> Result<Vec<ConnectionIdentity>, LookupError> {
        self.requests.lock().unwrap().push((count, start));
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.identities.clone()),
        }
    }
}

/// Answers every lookup with the identity as first name, except those listed
/// in `failing`.
#[derive(Default)]
pub struct ScriptedLookup {
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLookup {
    pub fn failing_on(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ContactLookup for ScriptedLookup {
    async fn contact_info(&self, identity: &ConnectionIdentity) -> Result<RawContact, LookupError> {
        self.calls.lock().unwrap().push(identity.to_string());
        if self.failing.iter().any(|f| f == identity.as_str()) {
            return Err(http_error(500));
        }
        Ok(RawContact {
            first_name: Some(identity.to_string()),
            last_name: Some("Tester".into()),
            email: Some(format!("{identity}@example.com")),
            phones: None,
            headline: Some("Engineer".into()),
        })
    }
}

/// Blocks the lookup with index `gate` until released.
pub struct GatedLookup {
    gate: usize,
    calls: AtomicUsize,
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedLookup {
    pub fn new(gate: usize) -> Self {
        Self {
            gate,
            calls: AtomicUsize::new(0),
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContactLookup for GatedLookup {
    async fn contact_info(&self, identity: &ConnectionIdentity) -> Result<RawContact, LookupError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if index == self.gate {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok(RawContact {
            first_name: Some(identity.to_string()),
            ..RawContact::default()
        })
    }
}

/// Records events; optionally cancels the active session once a given step
/// has reported progress.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<HarvestEvent>>,
    cancel_after: Option<(usize, Arc<SessionRegistry>)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(step: usize, registry: Arc<SessionRegistry>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel_after: Some((step, registry)),
        }
    }

    pub fn events(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<Progress> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HarvestEvent::Progress { progress, .. } => Some(progress),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: HarvestEvent) {
        if let (HarvestEvent::Progress { progress, .. }, Some((step, registry))) =
            (&event, &self.cancel_after)
        {
            if progress.completed == *step {
                registry.cancel_active();
            }
        }
        self.events.lock().unwrap().push(event);
    }
}

pub fn services(
    displayed: u32,
    directory: Arc<StaticDirectory>,
    lookup: Arc<dyn ContactLookup>,
) -> HarvestServices {
    HarvestServices {
        page: Arc::new(FixedCount(displayed)),
        directory,
        lookup,
    }
}
