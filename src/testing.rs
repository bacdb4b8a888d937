//! In-memory collaborators for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::Value;

use crate::fleet::Publisher;
use crate::transport::{DuplexTransport, InboundChunk, InboundStream};
use crate::OutboundStream;

/// Records every frame a session sends and lets tests feed inbound chunks.
#[derive(Default)]
pub(crate) struct MemoryTransport {
    frames: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    senders: Mutex<HashMap<String, mpsc::UnboundedSender<Result<InboundChunk>>>>,
    ended: Arc<Mutex<HashSet<String>>>,
    refuse: bool,
}

impl MemoryTransport {
    pub(crate) fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub(crate) fn frames(&self, session_id: &str) -> Vec<Value> {
        self.frames.lock().unwrap().get(session_id).cloned().unwrap_or_default()
    }

    /// The single key under `event` for each recorded frame.
    pub(crate) fn kinds(&self, session_id: &str) -> Vec<String> {
        self.frames(session_id)
            .iter()
            .filter_map(|frame| frame["event"].as_object()?.keys().next().cloned())
            .collect()
    }

    /// True once the writer for `session_id` stopped pulling and dropped its
    /// outbound stream.
    pub(crate) fn outbound_ended(&self, session_id: &str) -> bool {
        self.ended.lock().unwrap().contains(session_id)
    }

    pub(crate) fn is_open(&self, session_id: &str) -> bool {
        self.senders.lock().unwrap().contains_key(session_id)
    }

    pub(crate) fn push_chunk(&self, session_id: &str, chunk: Result<InboundChunk>) {
        let senders = self.senders.lock().unwrap();
        let sender = senders.get(session_id).expect("stream not open");
        sender.unbounded_send(chunk).expect("inbound stream dropped");
    }

    pub(crate) fn push(&self, session_id: &str, value: Value) {
        self.push_chunk(session_id, Ok(InboundChunk::Bytes(value.to_string().into_bytes())));
    }

    /// Ends the inbound stream.
    pub(crate) fn finish(&self, session_id: &str) {
        self.senders.lock().unwrap().remove(session_id);
    }
}

#[async_trait]
impl DuplexTransport for MemoryTransport {
    async fn open(&self, session_id: &str, mut outbound: OutboundStream) -> Result<InboundStream> {
        if self.refuse {
            anyhow::bail!("connection refused");
        }

        let (tx, rx) = mpsc::unbounded();
        self.senders.lock().unwrap().insert(session_id.to_string(), tx);

        let frames = self.frames.clone();
        let ended = self.ended.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            while let Ok(Some(bytes)) = outbound.next().await {
                let frame: Value = serde_json::from_slice(&bytes).expect("frames are JSON");
                frames.lock().unwrap().entry(session_id.clone()).or_default().push(frame);
            }
            drop(outbound);
            ended.lock().unwrap().insert(session_id);
        });

        Ok(rx.boxed())
    }
}

/// Publisher that forwards every publish to a channel.
pub(crate) struct RecordingPublisher {
    tx: tokio::sync::mpsc::UnboundedSender<(String, String)>,
}

impl RecordingPublisher {
    pub(crate) fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        let _ = self.tx.send((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub(crate) async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Routes test logs through the libtest capture; `RUST_LOG` picks the level.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_test_writer()
        .try_init();
}
