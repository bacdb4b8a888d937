use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};

use crate::client::queue::Wake;
use crate::client::session::SessionData;
use crate::client::Inner;

/// Pull side of a session's outbound queue, handed to the transport.
///
/// `next` yields serialized frames in FIFO order and suspends while the queue
/// is empty. It ends once the session is inactive or gone. Cancelling,
/// failing or dropping the stream releases the session's resources through
/// the same guarded path as a forced close.
pub struct OutboundStream {
    session: Arc<SessionData>,
    manager: Weak<Inner>,
    released: bool,
}

impl OutboundStream {
    pub(crate) fn new(session: Arc<SessionData>, manager: Weak<Inner>) -> Self {
        Self {
            session,
            manager,
            released: false,
        }
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Next serialized frame, `Ok(None)` at end of stream, or an error if a
    /// frame could not be serialized.
    pub async fn next(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if self.released || !self.is_live() {
                return Ok(None);
            }

            if let Some(frame) = self.session.queue().pop() {
                let bytes = frame
                    .to_bytes()
                    .with_context(|| format!("failed to serialize {} frame", frame.kind()))?;
                return Ok(Some(bytes));
            }

            match self.session.queue().wait().await {
                Wake::Item => continue,
                Wake::Closed => {
                    tracing::debug!(session_id = %self.session.id(), "close signal received");
                    return Ok(None);
                }
            }
        }
    }

    /// The transport stopped pulling early.
    pub fn cancel(&mut self) {
        tracing::debug!(session_id = %self.session.id(), "outbound stream cancelled");
        self.release();
    }

    /// The transport hit an upstream fault.
    pub fn fail(&mut self, error: anyhow::Error) {
        tracing::error!(session_id = %self.session.id(), "outbound stream failed: {:#}", error);
        self.release();
    }

    pub fn into_stream(self) -> BoxStream<'static, Result<Vec<u8>>> {
        stream::unfold(self, |mut outbound| async move {
            match outbound.next().await {
                Ok(Some(frame)) => Some((Ok(frame), outbound)),
                Ok(None) => None,
                Err(e) => {
                    outbound.release();
                    Some((Err(e), outbound))
                }
            }
        })
        .boxed()
    }

    fn is_live(&self) -> bool {
        self.session.is_active()
            && self
                .manager
                .upgrade()
                .map(|inner| inner.is_current(&self.session))
                .unwrap_or(false)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(inner) = self.manager.upgrade() {
            inner.release(&self.session);
        }
    }
}

impl Drop for OutboundStream {
    fn drop(&mut self) {
        self.release();
    }
}
