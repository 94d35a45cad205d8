use std::sync::Arc;
use std::time::Duration;

use harvest_core::{
    serialize, ConnectionRecord, ExportArtifact, ExportFormat, HarvestEvent, HarvestReport,
    HarvestSession, ItemFailure, SessionId, Step, DEFAULT_PROFILE_BASE_URL,
};
use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};

use crate::filename::export_filename;
use crate::identity::resolve_identities;
use crate::{
    ConnectionDirectory, ContactLookup, DisplayedCountSource, EventSink, LookupError,
    SessionControl,
};

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Fixed pause between lookups.
    pub step_delay: Duration,
    pub profile_base_url: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(1500),
            profile_base_url: DEFAULT_PROFILE_BASE_URL.to_string(),
        }
    }
}

/// The external collaborators a harvest talks to.
#[derive(Clone)]
pub struct HarvestServices {
    pub page: Arc<dyn DisplayedCountSource>,
    pub directory: Arc<dyn ConnectionDirectory>,
    pub lookup: Arc<dyn ContactLookup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    Completed {
        report: HarvestReport,
        artifact: Option<ExportArtifact>,
    },
    Cancelled(HarvestReport),
    Failed(LookupError),
    /// A newer session took over; nothing further was emitted.
    Superseded(HarvestReport),
}

/// Run one harvest to its end: resolve identities, then walk them one lookup at
/// a time with a fixed pause in between.
///
/// Cancellation is checked only at step boundaries. A lookup in flight when
/// cancel arrives still completes, is recorded and reports progress.
pub async fn run_harvest(
    control: &SessionControl,
    format: ExportFormat,
    services: &HarvestServices,
    settings: &HarvestSettings,
    sink: &dyn EventSink,
    stamp: &str,
) -> HarvestOutcome {
    let id = control.id();
    harvest_info!("Session {} starting ({} export)", id, format);

    let resolved =
        match resolve_identities(services.page.as_ref(), services.directory.as_ref()).await {
            Ok(resolved) => resolved,
            Err(err) => {
                harvest_error!("Session {} could not resolve identities: {}", id, err);
                sink.emit(HarvestEvent::Failed {
                    session: id,
                    error: err.to_string(),
                });
                return HarvestOutcome::Failed(err);
            }
        };

    sink.emit(HarvestEvent::Started {
        session: id,
        count: resolved.count,
    });
    let mut session = HarvestSession::new(id, format, resolved.identities);

    loop {
        if control.is_superseded() {
            harvest_info!("Session {} superseded after {} steps", id, session.cursor());
            return HarvestOutcome::Superseded(session.into_report());
        }
        if control.cancel_requested() {
            session.request_cancel();
        }

        match session.next_step() {
            Step::Fetch { index, identity } => {
                harvest_debug!("Session {} step {} -> {}", id, index + 1, identity);
                let outcome = match services.lookup.contact_info(&identity).await {
                    Ok(raw) => Ok(ConnectionRecord::from_contact(
                        &identity,
                        &settings.profile_base_url,
                        raw,
                    )),
                    Err(err) => {
                        harvest_warn!("Session {} lookup for {} failed: {}", id, identity, err);
                        sink.emit(HarvestEvent::ItemFailed {
                            session: id,
                            failure: ItemFailure {
                                identity: identity.clone(),
                                error: err.to_string(),
                            },
                        });
                        Err(err.to_string())
                    }
                };
                if let Some(progress) = session.complete_step(outcome) {
                    sink.emit(HarvestEvent::Progress {
                        session: id,
                        progress,
                    });
                }
                if session.has_more() {
                    pause(control, settings.step_delay).await;
                }
            }
            Step::Completed => {
                let artifact = render_artifact(id, session.format(), session.records(), stamp);
                let report = session.into_report();
                harvest_info!(
                    "Session {} completed: {} of {} records",
                    id,
                    report.succeeded(),
                    report.total
                );
                sink.emit(HarvestEvent::Completed {
                    session: id,
                    report: report.clone(),
                    artifact: artifact.clone(),
                });
                return HarvestOutcome::Completed { report, artifact };
            }
            Step::Cancelled => {
                let report = session.into_report();
                harvest_info!(
                    "Session {} cancelled after {} of {} steps",
                    id,
                    report.processed,
                    report.total
                );
                sink.emit(HarvestEvent::Cancelled {
                    session: id,
                    report: report.clone(),
                });
                return HarvestOutcome::Cancelled(report);
            }
        }
    }
}

/// Rate-limiting pause. Ends early on cancel; that only shortens the wait, the
/// boundary check still decides what happens next.
async fn pause(control: &SessionControl, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = control.cancelled() => {}
    }
}

fn render_artifact(
    id: SessionId,
    format: ExportFormat,
    records: &[ConnectionRecord],
    stamp: &str,
) -> Option<ExportArtifact> {
    match serialize(records, format) {
        Ok(body) => Some(ExportArtifact {
            filename: export_filename(format, stamp),
            format,
            body,
        }),
        Err(err) => {
            harvest_error!("Session {} could not render export: {}", id, err);
            None
        }
    }
}
