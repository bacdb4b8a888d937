//! Tool resolution: externally registered tools first, then the built-in
//! robot actions, then a soft success for anything else.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::{json, Value};

use crate::fleet::{self, Action, Fleet, Publisher};
use crate::types::{Tool, ToolResult, ToolSpec};

/// Executes an externally provided tool, e.g. one backed by a plugin server.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, payload: Value) -> Result<ToolResult>;
}

/// An external tool and where it came from.
#[derive(Clone)]
pub struct ToolRegistration {
    name: String,
    description: String,
    input_schema: Option<Value>,
    source: String,
    auto_approved: bool,
    handler: Arc<dyn ToolHandler>,
}

impl ToolRegistration {
    pub fn new(name: &str, source: &str, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            input_schema: None,
            source: source.to_string(),
            auto_approved: false,
            handler,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_auto_approve(mut self, auto_approved: bool) -> Self {
        self.auto_approved = auto_approved;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_auto_approved(&self) -> bool {
        self.auto_approved
    }

    pub fn tool(&self) -> Tool {
        let spec = ToolSpec::new(&self.name, &self.description);
        let spec = match &self.input_schema {
            Some(schema) => spec.with_input_schema(schema),
            None => spec,
        };
        Tool::from(spec)
    }
}

impl fmt::Debug for ToolRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistration")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("auto_approved", &self.auto_approved)
            .finish_non_exhaustive()
    }
}

pub struct ToolDispatcher {
    registry: RwLock<HashMap<String, ToolRegistration>>,
    publisher: Arc<dyn Publisher>,
    fleet: Fleet,
}

impl ToolDispatcher {
    pub fn new(publisher: Arc<dyn Publisher>, fleet: Fleet) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            publisher,
            fleet,
        }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// Adds or replaces an external tool.
    pub fn register(&self, registration: ToolRegistration) {
        let name = registration.name.clone();
        let source = registration.source.clone();
        let previous = self.write().insert(name.clone(), registration);
        match previous {
            Some(old) => tracing::warn!(
                tool = %name,
                old_source = %old.source,
                new_source = %source,
                "replaced registered tool"
            ),
            None => tracing::info!(tool = %name, source = %source, "registered tool"),
        }
    }

    pub fn unregister(&self, name: &str) -> Option<ToolRegistration> {
        self.write().remove(name)
    }

    /// Drops every tool contributed by `source`, returning how many were removed.
    pub fn unregister_source(&self, source: &str) -> usize {
        let mut registry = self.write();
        let before = registry.len();
        registry.retain(|_, registration| registration.source != source);
        let removed = before - registry.len();
        tracing::info!(source, removed, "unregistered tool source");
        removed
    }

    pub fn tools_by_source(&self, source: &str) -> Vec<ToolRegistration> {
        let mut tools: Vec<ToolRegistration> = self
            .read()
            .values()
            .filter(|registration| registration.source == source)
            .cloned()
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn registered_tools(&self) -> Vec<ToolRegistration> {
        let mut tools: Vec<ToolRegistration> = self.read().values().cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn is_auto_approved(&self, name: &str) -> bool {
        self.read().get(name).map(|r| r.auto_approved).unwrap_or(false)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Built-in actions followed by the external tools, as advertised in `promptStart`.
    pub fn tool_specs(&self) -> Vec<Tool> {
        let mut tools = fleet::action_tools();
        tools.extend(self.registered_tools().iter().map(ToolRegistration::tool));
        tools
    }

    /// Resolves one tool call for a session targeting `targets`.
    pub async fn resolve(&self, targets: &[String], tool_name: &str, payload: Value) -> ToolResult {
        if let Some(result) = self.invoke_external(tool_name, &payload).await {
            return result;
        }

        if let Some(action) = fleet::find_action(tool_name) {
            return self.dispatch_action(action, targets);
        }

        // Models sometimes change the case of a tool name.
        let normalized = tool_name.to_lowercase();
        if normalized != tool_name {
            if let Some(result) = self.invoke_external(&normalized, &payload).await {
                return result;
            }
        }

        tracing::info!(tool = tool_name, "no handler for tool");
        ToolResult::success(&format!(
            "Tool {} is not available; nothing was executed.",
            tool_name
        ))
    }

    async fn invoke_external(&self, tool_name: &str, payload: &Value) -> Option<ToolResult> {
        // Clone the handler out so the lock is not held across the await.
        let registration = self.read().get(tool_name).cloned()?;
        tracing::info!(tool = tool_name, source = %registration.source, "invoking external tool");

        let result = match registration.handler.invoke(payload.clone()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(tool = tool_name, "external tool failed: {:#}", e);
                ToolResult::failure(&format!("Tool {} failed: {}", tool_name, e))
            }
        };
        Some(result)
    }

    /// Fans one action out to every target robot. Publishing runs in the
    /// background and failures are only logged; the result never waits on it.
    fn dispatch_action(&self, action: &Action, targets: &[String]) -> ToolResult {
        let robots = self.fleet.expand(targets);
        let message = json!({ "toolName": action.name }).to_string();

        for robot in &robots {
            let publisher = self.publisher.clone();
            let topic = Fleet::topic_for(robot);
            let message = message.clone();
            tokio::spawn(async move {
                if let Err(e) = publisher.publish(&topic, &message).await {
                    tracing::error!(topic = %topic, "failed to publish action: {:#}", e);
                }
            });
        }

        tracing::info!(action = action.name, robots = ?robots, "dispatched action");
        ToolResult::new(
            true,
            json!({
                "success": true,
                "message": format!("Tool {} processed successfully.", action.name),
                "action": action.label,
                "durationSecs": action.duration_secs,
                "robots": robots,
            }),
        )
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ToolRegistration>> {
        self.registry.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ToolRegistration>> {
        self.registry.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::MockPublisher;
    use std::collections::HashSet;
    use std::time::Duration;
    use crate::testing::RecordingPublisher;
    use tokio::sync::mpsc;

    fn recording_dispatcher(
        size: usize,
    ) -> (ToolDispatcher, mpsc::UnboundedReceiver<(String, String)>) {
        let (publisher, rx) = RecordingPublisher::new();
        (ToolDispatcher::new(Arc::new(publisher), Fleet::numbered(size)), rx)
    }

    fn targets(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn all_fans_out_to_every_robot() {
        let (dispatcher, mut rx) = recording_dispatcher(6);
        let result = dispatcher.resolve(&targets(&["all"]), "stand", json!({})).await;
        assert!(result.is_success());

        let mut topics = HashSet::new();
        for _ in 0..6 {
            let (topic, payload) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("publish timed out")
                .expect("publisher dropped");
            assert_eq!(payload, r#"{"toolName":"stand"}"#);
            topics.insert(topic);
        }
        let expected: HashSet<String> = (1..=6).map(|i| format!("robot_{}/topic", i)).collect();
        assert_eq!(topics, expected);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn action_names_are_case_insensitive() {
        let (dispatcher, mut rx) = recording_dispatcher(6);
        let result = dispatcher.resolve(&targets(&["robot_2"]), "WAVE", json!({})).await;
        assert_eq!(result.message(), Some("Tool wave processed successfully."));
        assert_eq!(result.payload()["robots"], json!(["robot_2"]));

        let (topic, payload) = rx.recv().await.unwrap();
        assert_eq!(topic, "robot_2/topic");
        assert_eq!(payload, r#"{"toolName":"wave"}"#);
    }

    #[tokio::test]
    async fn unknown_tools_succeed_softly_without_publishing() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().never();
        let dispatcher = ToolDispatcher::new(Arc::new(publisher), Fleet::default());

        let result = dispatcher.resolve(&targets(&["robot_1"]), "get_weather", json!({})).await;
        assert!(result.is_success());
        assert!(result.message().unwrap().contains("get_weather"));
    }

    #[tokio::test]
    async fn external_tools_take_precedence() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().never();
        let dispatcher = ToolDispatcher::new(Arc::new(publisher), Fleet::default());

        let mut handler = MockToolHandler::new();
        handler
            .expect_invoke()
            .withf(|payload| payload["city"] == "Seattle")
            .times(1)
            .returning(|_| Ok(ToolResult::new(true, json!("72F and sunny"))));
        dispatcher.register(ToolRegistration::new("wave", "weather", Arc::new(handler)));

        let result = dispatcher
            .resolve(&targets(&["robot_1"]), "wave", json!({"city": "Seattle"}))
            .await;
        assert_eq!(result.to_content(), "72F and sunny");
    }

    #[tokio::test]
    async fn external_tools_match_a_case_variant_name() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().never();
        let dispatcher = ToolDispatcher::new(Arc::new(publisher), Fleet::default());

        let mut handler = MockToolHandler::new();
        handler
            .expect_invoke()
            .times(1)
            .returning(|_| Ok(ToolResult::success("Lights on in the lobby.")));
        dispatcher.register(ToolRegistration::new("lights_on", "building", Arc::new(handler)));

        let result = dispatcher.resolve(&targets(&["robot_1"]), "Lights_On", json!({})).await;
        assert!(result.is_success());
        assert_eq!(result.message(), Some("Lights on in the lobby."));
    }

    #[tokio::test]
    async fn failing_external_tool_reports_structured_failure() {
        let (dispatcher, _rx) = recording_dispatcher(1);
        let mut handler = MockToolHandler::new();
        handler
            .expect_invoke()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("upstream timeout")));
        dispatcher.register(ToolRegistration::new("weather/lookup", "weather", Arc::new(handler)));

        let result = dispatcher.resolve(&targets(&["robot_1"]), "weather/lookup", json!({})).await;
        assert!(!result.is_success());
        assert_eq!(result.payload()["success"], false);
        assert!(result.payload()["error"].as_str().unwrap().contains("upstream timeout"));
    }

    #[test]
    fn registry_tracks_sources_and_approval() {
        let (dispatcher, _rx) = recording_dispatcher(1);
        let handler: Arc<dyn ToolHandler> = Arc::new(MockToolHandler::new());
        dispatcher.register(
            ToolRegistration::new("fs/read", "fs", handler.clone()).with_auto_approve(true),
        );
        dispatcher.register(ToolRegistration::new("fs/write", "fs", handler.clone()));
        dispatcher.register(
            ToolRegistration::new("weather/lookup", "weather", handler)
                .with_description("Look up the weather.")
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"city": {"type": "string"}}
                })),
        );

        assert_eq!(dispatcher.len(), 3);
        assert!(dispatcher.is_auto_approved("fs/read"));
        assert!(!dispatcher.is_auto_approved("fs/write"));
        assert!(!dispatcher.is_auto_approved("missing"));
        assert_eq!(dispatcher.tools_by_source("fs").len(), 2);

        let specs = dispatcher.tool_specs();
        assert_eq!(specs.len(), fleet::ACTIONS.len() + 3);
        let weather = specs.iter().find(|t| t.name() == "weather/lookup").unwrap();
        assert!(weather.spec().input_schema().json().contains("city"));

        assert_eq!(dispatcher.unregister_source("fs"), 2);
        assert!(dispatcher.unregister("weather/lookup").is_some());
        assert!(dispatcher.is_empty());
    }
}
