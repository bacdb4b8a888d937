use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ErrorEvent;
use super::server::{
    AudioOutputEvent, ContentEndEvent, ContentStartEvent, TextOutputEvent, ToolUseEvent,
};
use crate::tools::ToolResult;

/// Name a handler registers under. `Any` receives every event after the
/// kind-specific handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContentStart,
    TextOutput,
    AudioOutput,
    ToolUse,
    ToolEnd,
    ContentEnd,
    ToolResult,
    StreamComplete,
    Error,
    Other(String),
    Any,
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::ContentStart => "contentStart",
            EventKind::TextOutput => "textOutput",
            EventKind::AudioOutput => "audioOutput",
            EventKind::ToolUse => "toolUse",
            EventKind::ToolEnd => "toolEnd",
            EventKind::ContentEnd => "contentEnd",
            EventKind::ToolResult => "toolResult",
            EventKind::StreamComplete => "streamComplete",
            EventKind::Error => "error",
            EventKind::Other(name) => name,
            EventKind::Any => "any",
        }
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "contentStart" => EventKind::ContentStart,
            "textOutput" => EventKind::TextOutput,
            "audioOutput" => EventKind::AudioOutput,
            "toolUse" => EventKind::ToolUse,
            "toolEnd" => EventKind::ToolEnd,
            "contentEnd" => EventKind::ContentEnd,
            "toolResult" => EventKind::ToolResult,
            "streamComplete" => EventKind::StreamComplete,
            "error" => EventKind::Error,
            "any" => EventKind::Any,
            other => EventKind::Other(other.to_string()),
        })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEndEvent {
    tool_use_id: String,
    tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_use_content: Option<String>,
}

impl ToolEndEvent {
    pub fn from_tool_use(tool_use: &ToolUseEvent) -> Self {
        Self {
            tool_use_id: tool_use.tool_use_id().to_string(),
            tool_name: tool_use.tool_name().to_string(),
            tool_use_content: tool_use.content().map(str::to_string),
        }
    }

    pub fn tool_use_id(&self) -> &str {
        &self.tool_use_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultEvent {
    tool_use_id: String,
    result: ToolResult,
}

impl ToolResultEvent {
    pub fn new(tool_use_id: &str, result: ToolResult) -> Self {
        Self {
            tool_use_id: tool_use_id.to_string(),
            result,
        }
    }

    pub fn tool_use_id(&self) -> &str {
        &self.tool_use_id
    }

    pub fn result(&self) -> &ToolResult {
        &self.result
    }
}

/// Everything delivered to a session's handlers: classified model output plus
/// the locally synthesized tool and lifecycle events.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ContentStart(ContentStartEvent),
    TextOutput(TextOutputEvent),
    AudioOutput(AudioOutputEvent),
    ToolUse(ToolUseEvent),
    ToolEnd(ToolEndEvent),
    ContentEnd(ContentEndEvent),
    ToolResult(ToolResultEvent),
    StreamComplete { timestamp: String },
    Error(ErrorEvent),
    Other { event_type: String, payload: Value },
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::ContentStart(_) => EventKind::ContentStart,
            SessionEvent::TextOutput(_) => EventKind::TextOutput,
            SessionEvent::AudioOutput(_) => EventKind::AudioOutput,
            SessionEvent::ToolUse(_) => EventKind::ToolUse,
            SessionEvent::ToolEnd(_) => EventKind::ToolEnd,
            SessionEvent::ContentEnd(_) => EventKind::ContentEnd,
            SessionEvent::ToolResult(_) => EventKind::ToolResult,
            SessionEvent::StreamComplete { .. } => EventKind::StreamComplete,
            SessionEvent::Error(_) => EventKind::Error,
            SessionEvent::Other { event_type, .. } => EventKind::Other(event_type.clone()),
        }
    }

    /// `{"type": ..., "data": ...}`, the shape forwarded to front ends.
    pub fn to_json(&self) -> Value {
        let data = match self {
            SessionEvent::ContentStart(e) => serde_json::to_value(e),
            SessionEvent::TextOutput(e) => serde_json::to_value(e),
            SessionEvent::AudioOutput(e) => serde_json::to_value(e),
            SessionEvent::ToolUse(e) => serde_json::to_value(e),
            SessionEvent::ToolEnd(e) => serde_json::to_value(e),
            SessionEvent::ContentEnd(e) => serde_json::to_value(e),
            SessionEvent::ToolResult(e) => serde_json::to_value(e),
            SessionEvent::StreamComplete { timestamp } => Ok(json!({ "timestamp": timestamp })),
            SessionEvent::Error(e) => serde_json::to_value(e),
            SessionEvent::Other { payload, .. } => Ok(payload.clone()),
        }
        .unwrap_or(Value::Null);
        json!({ "type": self.kind().as_str(), "data": data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_names() {
        for name in ["toolUse", "toolEnd", "streamComplete", "any", "usageEvent"] {
            let kind: EventKind = name.parse().unwrap();
            assert_eq!(kind.as_str(), name);
        }
        assert_eq!(
            "usageEvent".parse::<EventKind>().unwrap(),
            EventKind::Other("usageEvent".into())
        );
    }

    #[test]
    fn other_events_keep_their_own_type() {
        let event = SessionEvent::Other {
            event_type: "usageEvent".to_string(),
            payload: json!({"totalTokens": 3}),
        };
        let json = event.to_json();
        assert_eq!(json["type"], "usageEvent");
        assert_eq!(json["data"]["totalTokens"], 3);
    }
}
