use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use harvest_core::{update, AppState, AppViewModel, Effect, ExportFormat, Msg};
use harvest_engine::{EngineHandle, ExportWriter};
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};

use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(75);

/// Terminal control surface: feeds user input and engine events through
/// [`update`] and carries out the resulting effects.
pub struct ControlSurface<W: Write> {
    engine: EngineHandle,
    state: AppState,
    writer: ExportWriter,
    queue: VecDeque<Msg>,
    out: W,
    last_status: Option<String>,
}

impl<W: Write> ControlSurface<W> {
    pub fn new(engine: EngineHandle, output_dir: PathBuf, out: W) -> Self {
        Self {
            engine,
            state: AppState::new(),
            writer: ExportWriter::new(output_dir),
            queue: VecDeque::new(),
            out,
            last_status: None,
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Query and print the connection count.
    pub fn count(&mut self) -> io::Result<AppViewModel> {
        self.dispatch(Msg::CountRequested)?;
        let view = self.state.view();
        if let Some(count) = &view.count {
            for line in render::count_lines(count) {
                writeln!(self.out, "{line}")?;
            }
        }
        Ok(view)
    }

    /// Run one harvest to its end. `input` carries user commands, typically
    /// from [`spawn_input_reader`].
    pub fn harvest(
        &mut self,
        format: ExportFormat,
        input: &mpsc::Receiver<Msg>,
    ) -> io::Result<AppViewModel> {
        self.dispatch(Msg::StartClicked(format))?;

        while self.state.session().is_active() {
            while let Ok(msg) = input.try_recv() {
                self.dispatch(msg)?;
            }
            if let Some(event) = self.engine.recv_timeout(POLL_INTERVAL) {
                self.dispatch(Msg::Engine(event))?;
            }
        }

        let view = self.state.view();
        for line in render::summary_lines(&view) {
            writeln!(self.out, "{line}")?;
        }
        Ok(view)
    }

    pub fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        self.queue.push_back(msg);
        while let Some(msg) = self.queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                self.run_effect(effect);
            }
            if self.state.consume_dirty() {
                self.render()?;
            }
        }
        Ok(())
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::QueryConnectionCount => {
                let msg = match self.engine.connection_count() {
                    Ok(count) => Msg::CountReceived(count),
                    Err(err) => Msg::CountFailed(err.to_string()),
                };
                self.queue.push_back(msg);
            }
            Effect::StartHarvest { format } => {
                let session = self.engine.start(format);
                harvest_info!("Started harvest {} ({})", session, format);
                self.queue.push_back(Msg::HarvestStarted(session));
            }
            Effect::CancelHarvest => match self.engine.cancel() {
                Some(session) => harvest_info!("Cancel acknowledged for {}", session),
                None => harvest_debug!("Cancel ignored: no harvest running"),
            },
            Effect::SaveArtifact(artifact) => {
                let msg = match self.writer.save(&artifact) {
                    Ok(path) => Msg::ArtifactSaved(path),
                    Err(err) => {
                        harvest_warn!("Could not save {}: {}", artifact.filename, err);
                        Msg::ArtifactSaveFailed(err.to_string())
                    }
                };
                self.queue.push_back(msg);
            }
        }
    }

    fn render(&mut self) -> io::Result<()> {
        for notice in self.state.take_notices() {
            writeln!(self.out, "{}", render::notice_line(&notice))?;
        }
        let view = self.state.view();
        if view.format.is_some() {
            let status = render::status_line(&view);
            if self.last_status.as_deref() != Some(status.as_str()) {
                writeln!(self.out, "{status}")?;
                self.last_status = Some(status);
            }
        }
        self.out.flush()
    }
}

/// Map one line of user input to a message.
pub fn parse_input(line: &str) -> Option<Msg> {
    match line.trim().to_ascii_lowercase().as_str() {
        "c" | "cancel" => Some(Msg::CancelClicked),
        _ => None,
    }
}

/// Read commands from stdin on a background thread. End of input is not a
/// cancel; the harvest keeps running.
pub fn spawn_input_reader() -> mpsc::Receiver<Msg> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(msg) = parse_input(&line) {
                if tx.send(msg).is_err() {
                    break;
                }
            }
        }
    });
    rx
}
