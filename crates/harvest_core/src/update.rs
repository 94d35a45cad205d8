use crate::{AppState, Effect, HarvestEvent, Msg, Progress, SessionState, Severity};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::CountRequested => vec![Effect::QueryConnectionCount],
        Msg::CountReceived(count) => {
            state.set_count(count);
            Vec::new()
        }
        Msg::CountFailed(error) => {
            state.notify(Severity::Error, format!("Could not count connections: {error}"));
            Vec::new()
        }
        Msg::StartClicked(format) => {
            // A start while a harvest is running supersedes it; the engine drops the old one.
            if state.session().is_active() {
                if let Some(previous) = state.active_session() {
                    state.notify(
                        Severity::Info,
                        format!("Harvest {previous} superseded by a new harvest"),
                    );
                }
            }
            state.begin_harvest(format);
            vec![Effect::StartHarvest { format }]
        }
        Msg::HarvestStarted(session) => {
            if state.session().is_active() {
                state.attach_session(session);
            }
            Vec::new()
        }
        Msg::CancelClicked => {
            if state.session() == SessionState::Running {
                state.set_session(SessionState::Cancelling);
                vec![Effect::CancelHarvest]
            } else {
                Vec::new()
            }
        }
        Msg::Engine(event) => apply_event(&mut state, event),
        Msg::ArtifactSaved(path) => {
            state.notify(Severity::Info, format!("Export written to {}", path.display()));
            state.set_saved_to(path);
            Vec::new()
        }
        Msg::ArtifactSaveFailed(error) => {
            state.notify(Severity::Error, format!("Could not write export: {error}"));
            Vec::new()
        }
    };

    (state, effects)
}

fn apply_event(state: &mut AppState, event: HarvestEvent) -> Vec<Effect> {
    // Events from superseded or unknown sessions are stale.
    if state.active_session() != Some(event.session()) || !state.session().is_active() {
        return Vec::new();
    }

    match event {
        HarvestEvent::Started { count, .. } => {
            state.set_count(count);
            if count.verified_count > 0 {
                state.set_progress(Progress::new(0, count.verified_count));
            }
            Vec::new()
        }
        HarvestEvent::Progress { progress, .. } => {
            state.set_progress(progress);
            Vec::new()
        }
        HarvestEvent::ItemFailed { failure, .. } => {
            state.notify(
                Severity::Warning,
                format!("Lookup failed for {}: {}", failure.identity, failure.error),
            );
            Vec::new()
        }
        HarvestEvent::Completed {
            report, artifact, ..
        } => {
            state.set_session(SessionState::Completed);
            state.set_summary(&report);
            match artifact {
                Some(artifact) => vec![Effect::SaveArtifact(artifact)],
                None => {
                    state.notify(Severity::Error, "Harvest finished but the export could not be rendered");
                    Vec::new()
                }
            }
        }
        HarvestEvent::Cancelled { report, .. } => {
            state.set_session(SessionState::Cancelled);
            state.set_summary(&report);
            Vec::new()
        }
        HarvestEvent::Failed { error, .. } => {
            state.set_session(SessionState::Failed);
            state.notify(Severity::Error, format!("Harvest failed: {error}"));
            Vec::new()
        }
    }
}
