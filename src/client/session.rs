use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::client::dispatch::EventDispatcher;
use crate::client::queue::OutboundQueue;
use crate::types::events::server::ToolUseEvent;
use crate::types::Frame;

/// Progress through the one-shot protocol steps. Each flag only ever goes
/// from false to true.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) initiated: bool,
    pub(crate) session_started: bool,
    pub(crate) prompt_started: bool,
    pub(crate) audio_started: bool,
    pub(crate) audio_ended: bool,
    pub(crate) prompt_ended: bool,
    pub(crate) robots: Vec<String>,
    /// Tool call waiting for its `contentEnd`. A second `toolUse` before that
    /// replaces it.
    pub(crate) pending_tool: Option<ToolUseEvent>,
}

pub(crate) struct SessionData {
    id: String,
    prompt_name: String,
    audio_content_id: String,
    active: AtomicBool,
    queue: OutboundQueue,
    dispatcher: EventDispatcher,
    state: Mutex<SessionState>,
}

impl SessionData {
    pub(crate) fn new(id: &str, default_robot: &str) -> Self {
        Self {
            id: id.to_string(),
            prompt_name: Uuid::new_v4().to_string(),
            audio_content_id: Uuid::new_v4().to_string(),
            active: AtomicBool::new(true),
            queue: OutboundQueue::new(),
            dispatcher: EventDispatcher::default(),
            state: Mutex::new(SessionState {
                robots: vec![default_robot.to_string()],
                ..SessionState::default()
            }),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn prompt_name(&self) -> &str {
        &self.prompt_name
    }

    pub(crate) fn audio_content_id(&self) -> &str {
        &self.audio_content_id
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Marks the session inactive and fires the close signal, in that order.
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.queue.close();
    }

    /// Appends a frame unless the session is no longer active.
    pub(crate) fn enqueue(&self, frame: Frame) -> bool {
        if !self.is_active() {
            tracing::debug!(
                session_id = %self.id,
                kind = frame.kind(),
                "dropping frame for inactive session"
            );
            return false;
        }
        tracing::trace!(session_id = %self.id, kind = frame.kind(), "queued frame");
        self.queue.push(frame);
        true
    }

    pub(crate) fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub(crate) fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
