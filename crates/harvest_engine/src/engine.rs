use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use harvest_core::{ConnectionCount, ExportFormat, HarvestEvent, SessionId};
use harvest_logging::{harvest_info, harvest_warn};
use thiserror::Error;

use crate::identity::resolve_identities;
use crate::{
    run_harvest, ApiSettings, ChannelEventSink, DisplayedCountSource, FailureKind,
    HarvestServices, HarvestSettings, LookupError, SessionControl, SessionRegistry, VoyagerClient,
};

pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub struct EngineConfig {
    pub api: ApiSettings,
    pub harvest: HarvestSettings,
    pub page: Arc<dyn DisplayedCountSource>,
    /// Stamp used in export filenames.
    pub clock: Clock,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not build api client: {0}")]
    Client(#[from] LookupError),
}

enum EngineCommand {
    QueryCount {
        reply: mpsc::Sender<Result<ConnectionCount, LookupError>>,
    },
    Start {
        control: SessionControl,
        format: ExportFormat,
    },
    Cancel {
        reply: mpsc::Sender<Option<SessionId>>,
    },
}

/// Command side and event side of the engine. Commands run on a dedicated
/// thread that owns the async runtime; events come back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<HarvestEvent>,
    registry: Arc<SessionRegistry>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client = Arc::new(VoyagerClient::new(config.api)?);
        let services = HarvestServices {
            page: config.page,
            directory: client.clone(),
            lookup: client,
        };
        Self::with_services(services, config.harvest, config.clock)
    }

    /// Build an engine over arbitrary collaborators.
    pub fn with_services(
        services: HarvestServices,
        settings: HarvestSettings,
        clock: Clock,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let registry = SessionRegistry::new();
        let sink = Arc::new(ChannelEventSink::new(event_tx, registry.clone()));
        let settings = Arc::new(settings);

        let thread_registry = registry.clone();
        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                handle_command(
                    &runtime,
                    command,
                    &services,
                    &settings,
                    &sink,
                    &clock,
                    &thread_registry,
                );
            }
            harvest_info!("Engine command channel closed; shutting down");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            registry,
        })
    }

    /// GET_CONNECTION_COUNT. Blocks until the engine answers.
    pub fn connection_count(&self) -> Result<ConnectionCount, LookupError> {
        let (reply, rx) = mpsc::channel();
        self.cmd_tx
            .send(EngineCommand::QueryCount { reply })
            .map_err(|_| engine_stopped())?;
        rx.recv().map_err(|_| engine_stopped())?
    }

    /// START_HARVEST. Supersedes any running harvest and returns the new session.
    pub fn start(&self, format: ExportFormat) -> SessionId {
        let control = self.registry.begin();
        let session = control.id();
        if self
            .cmd_tx
            .send(EngineCommand::Start { control, format })
            .is_err()
        {
            harvest_warn!("Engine stopped; session {} will not run", session);
        }
        session
    }

    /// CANCEL_HARVEST. Returns once the request is recorded, naming the session
    /// it applies to. The harvest itself stops at its next step boundary.
    pub fn cancel(&self) -> Option<SessionId> {
        let (reply, rx) = mpsc::channel();
        self.cmd_tx.send(EngineCommand::Cancel { reply }).ok()?;
        rx.recv().ok().flatten()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<HarvestEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    command: EngineCommand,
    services: &HarvestServices,
    settings: &Arc<HarvestSettings>,
    sink: &Arc<ChannelEventSink>,
    clock: &Clock,
    registry: &SessionRegistry,
) {
    match command {
        EngineCommand::QueryCount { reply } => {
            let services = services.clone();
            runtime.spawn(async move {
                let result =
                    resolve_identities(services.page.as_ref(), services.directory.as_ref())
                        .await
                        .map(|resolved| resolved.count);
                let _ = reply.send(result);
            });
        }
        EngineCommand::Start { control, format } => {
            let services = services.clone();
            let settings = settings.clone();
            let sink = sink.clone();
            let stamp = clock();
            runtime.spawn(async move {
                run_harvest(&control, format, &services, &settings, sink.as_ref(), &stamp).await;
                control.finish();
            });
        }
        EngineCommand::Cancel { reply } => {
            let cancelled = registry.cancel_active();
            if let Some(session) = cancelled {
                harvest_info!("Cancel requested for session {}", session);
            }
            let _ = reply.send(cancelled);
        }
    }
}

fn engine_stopped() -> LookupError {
    LookupError::new(FailureKind::Network, "engine is not running")
}
