use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use harvest_core::SessionId;
use tokio_util::sync::CancellationToken;

/// Tracks which harvest is active. Starting a new one supersedes the old:
/// its token is cancelled and it is no longer current.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    active: Mutex<Option<(SessionId, CancellationToken)>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new session, superseding any active one.
    pub fn begin(self: &Arc<Self>) -> SessionControl {
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let token = CancellationToken::new();
        let mut active = self.lock();
        if let Some((_, previous)) = active.replace((id, token.clone())) {
            previous.cancel();
        }
        SessionControl {
            id,
            token,
            registry: Arc::clone(self),
        }
    }

    /// Request cancellation of the active session, if any.
    pub fn cancel_active(&self) -> Option<SessionId> {
        self.lock().as_ref().map(|(id, token)| {
            token.cancel();
            *id
        })
    }

    pub fn is_active(&self, id: SessionId) -> bool {
        matches!(self.lock().as_ref(), Some((active, _)) if *active == id)
    }

    pub fn active(&self) -> Option<SessionId> {
        self.lock().as_ref().map(|(id, _)| *id)
    }

    /// Clear `id` if it is still the active session.
    pub fn finish(&self, id: SessionId) {
        let mut active = self.lock();
        if matches!(active.as_ref(), Some((current, _)) if *current == id) {
            *active = None;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(SessionId, CancellationToken)>> {
        // A poisoned lock only means another thread panicked mid-update of a plain value.
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The engine-side handle of one session.
#[derive(Debug, Clone)]
pub struct SessionControl {
    id: SessionId,
    token: CancellationToken,
    registry: Arc<SessionRegistry>,
}

impl SessionControl {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn cancel_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_superseded(&self) -> bool {
        !self.registry.is_active(self.id)
    }

    /// Resolves once cancellation is requested (or the session superseded).
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn finish(&self) {
        self.registry.finish(self.id);
    }
}
