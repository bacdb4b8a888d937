use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::fleet::HttpPublisher;
use crate::metadata::{MemoryMetadataStore, MetadataStore};
use crate::prompt;
use crate::tools::ToolDispatcher;
use crate::transport::{DuplexTransport, InboundChunk, InboundStream, StreamException, WsTransport};
use crate::types::audio::{AudioConfiguration, TextConfiguration};
use crate::types::events::client::{
    AudioInput, ContentEnd, ContentStart, PromptEnd, PromptStart, Role, SessionEnd, SessionStart,
    TextInput, ToolResultInput,
};
use crate::types::events::error::{SOURCE_BIDIRECTIONAL_STREAM, SOURCE_RESPONSE_STREAM};
use crate::types::events::server::{ContentEndEvent, ToolUseEvent};
use crate::types::events::session::{ToolEndEvent, ToolResultEvent};
use crate::types::events::ErrorEvent;
use crate::types::{ClientEvent, EventKind, Frame, ServerEvent, SessionEvent, ToolResult};
use self::session::SessionData;

pub(crate) mod consts;
mod config;
mod dispatch;
mod error;
mod queue;
mod session;
mod stream;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use dispatch::EventHandler;
pub use error::{ConfigError, SessionError};
pub use stream::OutboundStream;
pub(crate) use utils::build_request;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State shared by every handle of one manager. Sessions only share the
/// lookup tables below; everything else lives in their own `SessionData`.
pub(crate) struct Inner {
    config: Config,
    transport: Arc<dyn DuplexTransport>,
    tools: Arc<ToolDispatcher>,
    metadata: Arc<dyn MetadataStore>,
    sessions: Mutex<HashMap<String, Arc<SessionData>>>,
    last_activity: Mutex<HashMap<String, Instant>>,
    cleanup_in_progress: Mutex<HashSet<String>>,
}

/// Clears a session's cleanup marker when the cleanup finishes, however it finishes.
struct CleanupGuard<'a> {
    inner: &'a Inner,
    session_id: String,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        lock(&self.inner.cleanup_in_progress).remove(&self.session_id);
    }
}

impl Inner {
    fn get(&self, session_id: &str) -> Option<Arc<SessionData>> {
        lock(&self.sessions).get(session_id).cloned()
    }

    pub(crate) fn contains(&self, session_id: &str) -> bool {
        lock(&self.sessions).contains_key(session_id)
    }

    /// Whether `session` is still the entry registered under its id. A closed
    /// session's id may already belong to a newer session.
    pub(crate) fn is_current(&self, session: &Arc<SessionData>) -> bool {
        lock(&self.sessions)
            .get(session.id())
            .map(|entry| Arc::ptr_eq(entry, session))
            .unwrap_or(false)
    }

    fn touch(&self, session_id: &str) {
        let now = Instant::now();
        lock(&self.last_activity)
            .entry(session_id.to_string())
            .and_modify(|last| *last = (*last).max(now))
            .or_insert(now);
    }

    fn begin_cleanup(&self, session_id: &str) -> Option<CleanupGuard<'_>> {
        if !lock(&self.cleanup_in_progress).insert(session_id.to_string()) {
            return None;
        }
        Some(CleanupGuard {
            inner: self,
            session_id: session_id.to_string(),
        })
    }

    fn is_cleanup_in_progress(&self, session_id: &str) -> bool {
        lock(&self.cleanup_in_progress).contains(session_id)
    }

    fn cleanup_session_resources(&self, session_id: &str) {
        if let Some(session) = self.get(session_id) {
            session.deactivate();
        }
        lock(&self.sessions).remove(session_id);
        lock(&self.last_activity).remove(session_id);
        tracing::info!(session_id, "session resources released");
    }

    /// Immediate teardown without protocol frames. No-op when the session is
    /// gone or another cleanup already owns it.
    pub(crate) fn force_close(&self, session_id: &str) {
        if !self.contains(session_id) {
            tracing::debug!(session_id, "force close skipped: session not active");
            return;
        }
        let Some(_guard) = self.begin_cleanup(session_id) else {
            tracing::info!(session_id, "force close skipped: cleanup already in progress");
            return;
        };
        tracing::info!(session_id, "force closing session");
        self.cleanup_session_resources(session_id);
    }

    /// Force-closes `session` only while it is still the registered entry for
    /// its id, so a stale stream cannot tear down a newer session.
    pub(crate) fn release(&self, session: &Arc<SessionData>) {
        let session_id = session.id();
        let Some(_guard) = self.begin_cleanup(session_id) else {
            tracing::info!(session_id, "release skipped: cleanup already in progress");
            return;
        };
        if !self.is_current(session) {
            tracing::debug!(session_id, "release skipped: session already replaced or removed");
            return;
        }
        tracing::info!(session_id, "releasing session after stream ended");
        self.cleanup_session_resources(session_id);
    }
}

/// Owns every live session: creation, the protocol steps, inbound processing,
/// tool resolution and teardown.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        config: Config,
        transport: Arc<dyn DuplexTransport>,
        tools: Arc<ToolDispatcher>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                tools,
                metadata,
                sessions: Mutex::new(HashMap::new()),
                last_activity: Mutex::new(HashMap::new()),
                cleanup_in_progress: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Wires the websocket transport, the HTTP fleet publisher and the robot
    /// metadata file named in `config`.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let transport = Arc::new(WsTransport::new(&config)?);
        let publisher = Arc::new(HttpPublisher::from_config(&config));
        let tools = Arc::new(ToolDispatcher::new(publisher, config.fleet().clone()));
        let metadata = match config.metadata_path() {
            Some(path) => MemoryMetadataStore::from_json_file(path)?,
            None => MemoryMetadataStore::new(),
        };
        Ok(Self::new(config, transport, tools, Arc::new(metadata)))
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_config(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn tools(&self) -> &Arc<ToolDispatcher> {
        &self.inner.tools
    }

    pub fn create_session(
        &self,
        session_id: Option<String>,
    ) -> Result<SessionHandle, SessionError> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        {
            let mut sessions = lock(&self.inner.sessions);
            if sessions.contains_key(&session_id) {
                return Err(SessionError::AlreadyExists(session_id));
            }
            let session = SessionData::new(&session_id, self.inner.config.default_robot());
            sessions.insert(session_id.clone(), Arc::new(session));
        }
        self.inner.touch(&session_id);
        tracing::info!(session_id = %session_id, "created session");
        Ok(SessionHandle {
            session_id,
            manager: self.clone(),
        })
    }

    /// Handle to an existing session.
    pub fn session(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        if !self.inner.contains(session_id) {
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        Ok(SessionHandle {
            session_id: session_id.to_string(),
            manager: self.clone(),
        })
    }

    pub fn register_event_handler<F>(
        &self,
        session_id: &str,
        kind: EventKind,
        handler: F,
    ) -> Result<(), SessionError>
    where
        F: Fn(&SessionEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let session = self
            .inner
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        session.dispatcher().on(kind, Arc::new(handler));
        Ok(())
    }

    /// Robots the session's actions are sent to; "all" means the whole fleet.
    pub fn set_robots(&self, session_id: &str, robots: Vec<String>) -> Result<(), SessionError> {
        let session = self.active_session(session_id)?;
        tracing::info!(session_id, robots = ?robots, "targeting robots");
        session.state().robots = robots;
        Ok(())
    }

    pub fn robots(&self, session_id: &str) -> Option<Vec<String>> {
        let session = self.inner.get(session_id)?;
        let robots = session.state().robots.clone();
        Some(robots)
    }

    /// Opens the model stream and processes inbound chunks until the stream
    /// ends or the session closes.
    pub async fn initiate_session(&self, session_id: &str) -> Result<(), SessionError> {
        let session = self.active_session(session_id)?;
        {
            let mut state = session.state();
            if state.initiated {
                return Err(SessionError::AlreadyInitiated(session_id.to_string()));
            }
            state.initiated = true;
        }

        let span = tracing::info_span!("session", session_id = %session_id);
        async move {
            self.setup_session_start(&session);

            let outbound = OutboundStream::new(session.clone(), Arc::downgrade(&self.inner));
            tracing::info!("opening bidirectional stream");
            let inbound = match self.inner.transport.open(session_id, outbound).await {
                Ok(inbound) => inbound,
                Err(e) => {
                    tracing::error!("failed to open bidirectional stream: {:#}", e);
                    let details = format!("{:#}", e);
                    self.dispatch(
                        &session,
                        SessionEvent::Error(
                            ErrorEvent::new(
                                SOURCE_BIDIRECTIONAL_STREAM,
                                "Failed to open bidirectional stream",
                            )
                            .with_details(&details),
                        ),
                    );
                    if session.is_active() {
                        self.close(session_id).await;
                    }
                    return Err(SessionError::Transport(details));
                }
            };

            self.process_response_stream(&session, inbound).await;
            Ok(())
        }
        .instrument(span)
        .await
    }

    pub fn setup_prompt_start(&self, session_id: &str) -> Result<(), SessionError> {
        let session = self.active_session(session_id)?;
        self.setup_session_start(&session);
        {
            let mut state = session.state();
            if state.prompt_started {
                tracing::debug!(session_id, "prompt already started");
                return Ok(());
            }
            state.prompt_started = true;
        }

        let tools = self.inner.tools.tool_specs();
        tracing::info!(session_id, tools = tools.len(), "starting prompt");
        let prompt_start = PromptStart::new(session.prompt_name(), tools)
            .with_audio_output_configuration(self.inner.config.output_audio());
        self.enqueue(&session, ClientEvent::PromptStart(prompt_start));
        Ok(())
    }

    /// Sends the system prompt as one text content block. The default prompt
    /// is used when `content` is `None`; a background placeholder is filled
    /// from the first target robot's record.
    pub async fn setup_system_prompt(
        &self,
        session_id: &str,
        text_config: Option<TextConfiguration>,
        content: Option<String>,
    ) -> Result<(), SessionError> {
        let session = self.active_session(session_id)?;
        let (prompt_started, robot) = {
            let state = session.state();
            (state.prompt_started, state.robots.first().cloned())
        };
        if !prompt_started {
            return Err(SessionError::PromptNotStarted(session_id.to_string()));
        }

        let record = match robot {
            Some(robot) => match self.inner.metadata.get(&robot).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        session_id,
                        robot = %robot,
                        "robot metadata lookup failed: {:#}",
                        e
                    );
                    None
                }
            },
            None => None,
        };

        let template = content.unwrap_or_else(prompt::default_system_prompt);
        let text = prompt::apply_background(&template, record.as_ref());
        let content_name = Uuid::new_v4().to_string();
        let prompt_name = session.prompt_name();
        tracing::debug!(session_id, "system prompt: {}", text);

        self.enqueue(
            &session,
            ClientEvent::ContentStart(ContentStart::text(
                prompt_name,
                &content_name,
                Role::System,
                text_config.unwrap_or_default(),
            )),
        );
        self.enqueue(
            &session,
            ClientEvent::TextInput(TextInput::new(prompt_name, &content_name, text)),
        );
        self.enqueue(
            &session,
            ClientEvent::ContentEnd(ContentEnd::new(prompt_name, &content_name)),
        );
        Ok(())
    }

    pub fn setup_start_audio(
        &self,
        session_id: &str,
        config: Option<AudioConfiguration>,
    ) -> Result<(), SessionError> {
        let session = self.active_session(session_id)?;
        {
            let mut state = session.state();
            if !state.prompt_started {
                return Err(SessionError::PromptNotStarted(session_id.to_string()));
            }
            if state.audio_started {
                tracing::debug!(session_id, "audio content already started");
                return Ok(());
            }
            state.audio_started = true;
        }

        tracing::info!(session_id, "starting audio content");
        self.enqueue(
            &session,
            ClientEvent::ContentStart(ContentStart::audio(
                session.prompt_name(),
                session.audio_content_id(),
                config.unwrap_or_default(),
            )),
        );
        Ok(())
    }

    /// Queues one chunk of raw 16 kHz PCM from the operator.
    pub fn stream_audio(&self, session_id: &str, audio: &[u8]) -> Result<(), SessionError> {
        let session = self.active_session(session_id)?;
        let (started, ended) = {
            let state = session.state();
            (state.audio_started, state.audio_ended)
        };
        if !started {
            return Err(SessionError::AudioNotStarted(session_id.to_string()));
        }
        if ended {
            return Err(SessionError::AudioEnded(session_id.to_string()));
        }

        let content = crate::utils::audio::encode_bytes(audio);
        self.enqueue(
            &session,
            ClientEvent::AudioInput(AudioInput::new(
                session.prompt_name(),
                session.audio_content_id(),
                content,
            )),
        );
        Ok(())
    }

    pub async fn end_audio_content(&self, session_id: &str) -> Result<(), SessionError> {
        let session = self
            .inner
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        self.send_content_end(&session).await;
        Ok(())
    }

    pub async fn end_prompt(&self, session_id: &str) -> Result<(), SessionError> {
        let session = self
            .inner
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        self.send_prompt_end(&session).await;
        Ok(())
    }

    /// Graceful teardown: ends open audio and prompt content, sends
    /// `sessionEnd`, then releases the session. Concurrent or repeated calls
    /// are no-ops while one is in flight.
    pub async fn close(&self, session_id: &str) {
        let Some(_guard) = self.inner.begin_cleanup(session_id) else {
            tracing::info!(session_id, "close skipped: cleanup already in progress");
            return;
        };
        let Some(session) = self.inner.get(session_id) else {
            tracing::debug!(session_id, "close skipped: session not found");
            return;
        };

        tracing::info!(session_id, "closing session");
        self.send_content_end(&session).await;
        self.send_prompt_end(&session).await;
        if let Err(e) = self.send_session_end(&session).await {
            tracing::error!(session_id, "graceful close failed, releasing resources: {}", e);
            self.inner.cleanup_session_resources(session_id);
        }
    }

    pub fn force_close(&self, session_id: &str) {
        self.inner.force_close(session_id);
    }

    /// Gracefully closes every session.
    pub async fn shutdown(&self) {
        let sessions = self.list_active_sessions();
        tracing::info!(sessions = sessions.len(), "shutting down session manager");
        futures::future::join_all(sessions.iter().map(|id| self.close(id))).await;
    }

    pub fn is_session_active(&self, session_id: &str) -> bool {
        self.inner.get(session_id).map(|s| s.is_active()).unwrap_or(false)
    }

    pub fn is_cleanup_in_progress(&self, session_id: &str) -> bool {
        self.inner.is_cleanup_in_progress(session_id)
    }

    pub fn list_active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.inner.sessions)
            .iter()
            .filter(|(_, session)| session.is_active())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn last_activity(&self, session_id: &str) -> Option<Instant> {
        lock(&self.inner.last_activity).get(session_id).copied()
    }

    /// Force-closes every session idle for longer than the configured
    /// timeout as of `now`, returning their ids.
    pub fn sweep_idle_at(&self, now: Instant) -> Vec<String> {
        let timeout = self.inner.config.idle_timeout();
        let ids: Vec<String> = lock(&self.inner.sessions).keys().cloned().collect();
        let stale: Vec<String> = {
            let activity = lock(&self.inner.last_activity);
            ids.into_iter()
                .filter(|id| match activity.get(id) {
                    Some(last) => now.saturating_duration_since(*last) > timeout,
                    None => true,
                })
                .collect()
        };

        for session_id in &stale {
            tracing::info!(session_id = %session_id, "closing idle session");
            self.inner.force_close(session_id);
        }
        stale
    }

    pub fn sweep_idle(&self) -> Vec<String> {
        self.sweep_idle_at(Instant::now())
    }

    /// Runs the idle sweep every sweep interval until the manager is dropped.
    pub fn spawn_idle_sweeper(&self) -> JoinHandle<()> {
        let inner = Arc::downgrade(&self.inner);
        let period = self.inner.config.sweep_interval().max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let closed = SessionManager { inner }.sweep_idle();
                if !closed.is_empty() {
                    tracing::info!(closed = closed.len(), "idle sweep finished");
                }
            }
        })
    }

    fn active_session(&self, session_id: &str) -> Result<Arc<SessionData>, SessionError> {
        let session = self
            .inner
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        if !session.is_active() {
            return Err(SessionError::Inactive(session_id.to_string()));
        }
        Ok(session)
    }

    fn enqueue(&self, session: &SessionData, event: ClientEvent) {
        if session.enqueue(Frame::from(event)) {
            self.inner.touch(session.id());
        }
    }

    fn dispatch(&self, session: &SessionData, event: SessionEvent) {
        session.dispatcher().dispatch(session.id(), &event);
    }

    /// Events raised after an await may find the session already removed;
    /// those are dropped.
    fn dispatch_if_current(&self, session: &Arc<SessionData>, event: SessionEvent) {
        if !self.inner.is_current(session) {
            tracing::debug!(
                session_id = %session.id(),
                kind = %event.kind(),
                "session removed, event dropped"
            );
            return;
        }
        self.dispatch(session, event);
    }

    fn setup_session_start(&self, session: &SessionData) {
        {
            let mut state = session.state();
            if state.session_started {
                return;
            }
            state.session_started = true;
        }
        tracing::debug!(session_id = %session.id(), "starting session");
        self.enqueue(
            session,
            ClientEvent::SessionStart(SessionStart::new(self.inner.config.inference().clone())),
        );
    }

    async fn process_response_stream(
        &self,
        session: &Arc<SessionData>,
        mut inbound: InboundStream,
    ) {
        let mut failed = false;
        loop {
            let item = tokio::select! {
                item = inbound.next() => item,
                _ = session.queue().closed() => {
                    tracing::info!("session closed, stopping response processing");
                    break;
                }
            };
            let Some(item) = item else {
                break;
            };
            if !session.is_active() {
                tracing::info!("session no longer active, stopping response processing");
                break;
            }

            match item {
                Ok(InboundChunk::Bytes(bytes)) => {
                    self.process_response_chunk(session, &bytes).await
                }
                Ok(InboundChunk::Exception(exception)) => {
                    self.handle_stream_exception(session, exception)
                }
                Err(e) => {
                    tracing::error!("error processing response stream: {:#}", e);
                    self.dispatch(
                        session,
                        SessionEvent::Error(
                            ErrorEvent::new(
                                SOURCE_RESPONSE_STREAM,
                                "Error processing response stream",
                            )
                            .with_details(&format!("{:#}", e)),
                        ),
                    );
                    failed = true;
                    break;
                }
            }
        }

        if failed {
            if session.is_active() {
                self.close(session.id()).await;
            }
            return;
        }

        tracing::info!("response stream complete");
        self.dispatch_if_current(
            session,
            SessionEvent::StreamComplete {
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        );
    }

    async fn process_response_chunk(&self, session: &Arc<SessionData>, bytes: &[u8]) {
        self.inner.touch(session.id());
        match ServerEvent::classify(bytes) {
            Ok(event) => {
                tracing::debug!(kind = event.kind(), "received event");
                self.handle_server_event(session, event).await;
            }
            Err(e) => {
                tracing::warn!(
                    "skipping unparseable response chunk: {} ({})",
                    e,
                    String::from_utf8_lossy(bytes)
                );
            }
        }
    }

    fn handle_stream_exception(&self, session: &SessionData, exception: StreamException) {
        tracing::error!(
            kind = exception.kind.as_str(),
            "model stream exception: {}",
            exception.message
        );
        self.dispatch(
            session,
            SessionEvent::Error(ErrorEvent::new(exception.kind.as_str(), &exception.message)),
        );
    }

    async fn handle_server_event(&self, session: &Arc<SessionData>, event: ServerEvent) {
        match event {
            ServerEvent::ContentStart(e) => self.dispatch(session, SessionEvent::ContentStart(e)),
            ServerEvent::TextOutput(e) => self.dispatch(session, SessionEvent::TextOutput(e)),
            ServerEvent::AudioOutput(e) => self.dispatch(session, SessionEvent::AudioOutput(e)),
            ServerEvent::ContentEnd(e) => self.dispatch(session, SessionEvent::ContentEnd(e)),
            ServerEvent::ToolUse(tool_use) => self.stash_tool_use(session, tool_use),
            ServerEvent::ToolEnd(end) => self.handle_tool_end(session, end).await,
            ServerEvent::Other { event_type, payload } => {
                self.dispatch(session, SessionEvent::Other { event_type, payload })
            }
        }
    }

    fn stash_tool_use(&self, session: &SessionData, tool_use: ToolUseEvent) {
        tracing::info!(
            tool = tool_use.tool_name(),
            tool_use_id = tool_use.tool_use_id(),
            "tool use requested"
        );
        self.dispatch(session, SessionEvent::ToolUse(tool_use.clone()));
        let replaced = session.state().pending_tool.replace(tool_use);
        if let Some(replaced) = replaced {
            tracing::warn!(
                tool_use_id = replaced.tool_use_id(),
                "pending tool call replaced before it completed"
            );
        }
    }

    async fn handle_tool_end(&self, session: &Arc<SessionData>, end: ContentEndEvent) {
        let (pending, robots) = {
            let mut state = session.state();
            (state.pending_tool.take(), state.robots.clone())
        };
        let Some(tool_use) = pending else {
            tracing::warn!("tool content ended with no pending tool call");
            self.dispatch(session, SessionEvent::ContentEnd(end));
            return;
        };

        self.dispatch(session, SessionEvent::ToolEnd(ToolEndEvent::from_tool_use(&tool_use)));
        let result = self
            .inner
            .tools
            .resolve(&robots, tool_use.tool_name(), tool_use.arguments())
            .await;
        self.send_tool_result(session, tool_use.tool_use_id(), &result);
        self.dispatch_if_current(
            session,
            SessionEvent::ToolResult(ToolResultEvent::new(tool_use.tool_use_id(), result)),
        );
    }

    fn send_tool_result(&self, session: &SessionData, tool_use_id: &str, result: &ToolResult) {
        if !session.is_active() {
            tracing::debug!(tool_use_id, "session closed before tool result could be sent");
            return;
        }
        let content_name = Uuid::new_v4().to_string();
        let prompt_name = session.prompt_name();
        self.enqueue(
            session,
            ClientEvent::ContentStart(ContentStart::tool_result(
                prompt_name,
                &content_name,
                tool_use_id,
            )),
        );
        self.enqueue(
            session,
            ClientEvent::ToolResult(ToolResultInput::new(
                prompt_name,
                &content_name,
                result.to_content(),
            )),
        );
        self.enqueue(session, ClientEvent::ContentEnd(ContentEnd::new(prompt_name, &content_name)));
    }

    async fn send_content_end(&self, session: &SessionData) {
        let should_send = {
            let mut state = session.state();
            if state.audio_started && !state.audio_ended {
                state.audio_ended = true;
                true
            } else {
                false
            }
        };
        if !should_send {
            return;
        }
        self.enqueue(
            session,
            ClientEvent::ContentEnd(ContentEnd::new(
                session.prompt_name(),
                session.audio_content_id(),
            )),
        );
        tokio::time::sleep(self.inner.config.audio_end_delay()).await;
    }

    async fn send_prompt_end(&self, session: &SessionData) {
        let should_send = {
            let mut state = session.state();
            if state.prompt_started && !state.prompt_ended {
                state.prompt_ended = true;
                true
            } else {
                false
            }
        };
        if !should_send {
            return;
        }
        self.enqueue(session, ClientEvent::PromptEnd(PromptEnd::new(session.prompt_name())));
        tokio::time::sleep(self.inner.config.prompt_end_delay()).await;
    }

    async fn send_session_end(&self, session: &SessionData) -> Result<(), SessionError> {
        if !self.inner.contains(session.id()) {
            return Err(SessionError::NotFound(session.id().to_string()));
        }
        self.enqueue(session, ClientEvent::SessionEnd(SessionEnd::new()));
        tokio::time::sleep(self.inner.config.session_end_delay()).await;
        self.inner.cleanup_session_resources(session.id());
        tracing::info!(session_id = %session.id(), "session closed");
        Ok(())
    }
}

/// A single session's view of its manager.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    manager: SessionManager,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub fn is_active(&self) -> bool {
        self.manager.is_session_active(&self.session_id)
    }

    pub fn on_event<F>(&self, kind: EventKind, handler: F) -> Result<(), SessionError>
    where
        F: Fn(&SessionEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.manager.register_event_handler(&self.session_id, kind, handler)
    }

    pub fn set_robots(&self, robots: Vec<String>) -> Result<(), SessionError> {
        self.manager.set_robots(&self.session_id, robots)
    }

    pub fn robots(&self) -> Option<Vec<String>> {
        self.manager.robots(&self.session_id)
    }

    pub async fn initiate(&self) -> Result<(), SessionError> {
        self.manager.initiate_session(&self.session_id).await
    }

    pub fn setup_prompt_start(&self) -> Result<(), SessionError> {
        self.manager.setup_prompt_start(&self.session_id)
    }

    pub async fn setup_system_prompt(
        &self,
        text_config: Option<TextConfiguration>,
        content: Option<String>,
    ) -> Result<(), SessionError> {
        self.manager.setup_system_prompt(&self.session_id, text_config, content).await
    }

    pub fn setup_start_audio(
        &self,
        config: Option<AudioConfiguration>,
    ) -> Result<(), SessionError> {
        self.manager.setup_start_audio(&self.session_id, config)
    }

    pub fn stream_audio(&self, audio: &[u8]) -> Result<(), SessionError> {
        self.manager.stream_audio(&self.session_id, audio)
    }

    pub async fn end_audio_content(&self) -> Result<(), SessionError> {
        self.manager.end_audio_content(&self.session_id).await
    }

    pub async fn end_prompt(&self) -> Result<(), SessionError> {
        self.manager.end_prompt(&self.session_id).await
    }

    pub async fn close(&self) {
        self.manager.close(&self.session_id).await
    }
}
