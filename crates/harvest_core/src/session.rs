//! The per-harvest state machine.
//!
//! A [`HarvestSession`] is driven by explicit calls: [`HarvestSession::next_step`]
//! decides what happens at a step boundary, [`HarvestSession::complete_step`]
//! records the outcome of the lookup that boundary asked for. The caller owns
//! the scheduling (delays, network IO); the session owns the ordering and the
//! cancellation checkpoint.
use std::fmt;

use crate::{ConnectionIdentity, ConnectionRecord, ExportFormat};

/// Identifies one harvest. Events from a session that is no longer the active
/// one are stale and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((completed as f64 / total as f64) * 100.0).round().min(100.0) as u8
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub identity: ConnectionIdentity,
    pub error: String,
}

/// What the caller should do at the current step boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Look up `identity` and report back through `complete_step`.
    Fetch {
        index: usize,
        identity: ConnectionIdentity,
    },
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub session: SessionId,
    pub total: usize,
    /// Steps that ran a lookup, successful or not.
    pub processed: usize,
    pub records: Vec<ConnectionRecord>,
    pub failures: Vec<ItemFailure>,
}

impl HarvestReport {
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }
}

#[derive(Debug, Clone)]
pub struct HarvestSession {
    id: SessionId,
    format: ExportFormat,
    identities: Vec<ConnectionIdentity>,
    /// Index of the next identity to process.
    cursor: usize,
    in_flight: bool,
    records: Vec<ConnectionRecord>,
    failures: Vec<ItemFailure>,
    cancelled: bool,
    state: HarvestState,
}

impl HarvestSession {
    pub fn new(id: SessionId, format: ExportFormat, identities: Vec<ConnectionIdentity>) -> Self {
        Self {
            id,
            format,
            identities,
            cursor: 0,
            in_flight: false,
            records: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
            state: HarvestState::Running,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn total(&self) -> usize {
        self.identities.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn records(&self) -> &[ConnectionRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    pub fn state(&self) -> HarvestState {
        self.state
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Flag the session for cancellation. Takes effect at the next step boundary;
    /// a lookup already in flight still completes and is recorded.
    pub fn request_cancel(&mut self) {
        if self.state == HarvestState::Running {
            self.cancelled = true;
        }
    }

    /// Step boundary. Exhaustion is checked before cancellation, so a cancel that
    /// arrives during the final lookup still ends in `Completed`.
    pub fn next_step(&mut self) -> Step {
        match self.state {
            HarvestState::Completed => return Step::Completed,
            HarvestState::Cancelled => return Step::Cancelled,
            HarvestState::Running => {}
        }
        if self.cursor >= self.identities.len() {
            self.state = HarvestState::Completed;
            return Step::Completed;
        }
        if self.cancelled && !self.in_flight {
            self.state = HarvestState::Cancelled;
            return Step::Cancelled;
        }
        self.in_flight = true;
        Step::Fetch {
            index: self.cursor,
            identity: self.identities[self.cursor].clone(),
        }
    }

    /// Record the outcome of the lookup requested by the last `Fetch` step and
    /// advance the cursor. Returns `None` when no lookup was outstanding.
    pub fn complete_step(&mut self, outcome: Result<ConnectionRecord, String>) -> Option<Progress> {
        if !self.in_flight || self.cursor >= self.identities.len() {
            return None;
        }
        match outcome {
            Ok(record) => self.records.push(record),
            Err(error) => self.failures.push(ItemFailure {
                identity: self.identities[self.cursor].clone(),
                error,
            }),
        }
        self.in_flight = false;
        self.cursor += 1;
        Some(Progress::new(self.cursor, self.identities.len()))
    }

    /// True while identities remain to be processed, i.e. the caller should pause
    /// before the next boundary.
    pub fn has_more(&self) -> bool {
        self.state == HarvestState::Running && self.cursor < self.identities.len()
    }

    pub fn into_report(self) -> HarvestReport {
        HarvestReport {
            session: self.id,
            total: self.identities.len(),
            processed: self.cursor,
            records: self.records,
            failures: self.failures,
        }
    }
}
