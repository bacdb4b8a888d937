use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `contentStart` from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStartEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ContentStartEvent {
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Fields this crate does not model, kept verbatim.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// `textOutput` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOutputEvent {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TextOutputEvent {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }
}

/// `audioOutput` event, base64 LPCM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioOutputEvent {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl AudioOutputEvent {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }
}

/// `toolUse` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUseEvent {
    tool_name: String,
    tool_use_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ToolUseEvent {
    pub fn new(tool_name: &str, tool_use_id: &str, content: Option<&str>) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            tool_use_id: tool_use_id.to_string(),
            content: content.map(str::to_string),
            extra: Map::new(),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn tool_use_id(&self) -> &str {
        &self.tool_use_id
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Tool arguments. The model sends them as a JSON string; text that is not
    /// JSON is passed through as a string and a missing body becomes `{}`.
    pub fn arguments(&self) -> Value {
        match self.content.as_deref() {
            None | Some("") => Value::Object(Map::new()),
            Some(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
            }
        }
    }
}

/// `contentEnd` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEndEvent {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ContentEndEvent {
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    pub fn is_tool(&self) -> bool {
        self.content_type.as_deref() == Some("TOOL")
    }
}

/// Inbound signal from the model, classified by the single key under `event`.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    ContentStart(ContentStartEvent),
    TextOutput(TextOutputEvent),
    AudioOutput(AudioOutputEvent),
    ToolUse(ToolUseEvent),
    /// `contentEnd` whose type is `TOOL`.
    ToolEnd(ContentEndEvent),
    ContentEnd(ContentEndEvent),
    Other { event_type: String, payload: Value },
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("chunk is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("chunk is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("chunk carries no event")]
    Empty,
}

impl ServerEvent {
    pub fn classify(bytes: &[u8]) -> Result<Self, ClassifyError> {
        let text = std::str::from_utf8(bytes)?;
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ClassifyError> {
        let envelope = match value.get("event").and_then(Value::as_object) {
            Some(envelope) => envelope.clone(),
            None => {
                return match value {
                    Value::Object(ref map) if !map.is_empty() => Ok(ServerEvent::Other {
                        event_type: "unknown".to_string(),
                        payload: value,
                    }),
                    _ => Err(ClassifyError::Empty),
                };
            }
        };

        let Some((key, body)) = envelope.iter().next() else {
            return Err(ClassifyError::Empty);
        };

        let event = match key.as_str() {
            "contentStart" => ServerEvent::ContentStart(serde_json::from_value(body.clone())?),
            "textOutput" => ServerEvent::TextOutput(serde_json::from_value(body.clone())?),
            "audioOutput" => ServerEvent::AudioOutput(serde_json::from_value(body.clone())?),
            "toolUse" => ServerEvent::ToolUse(serde_json::from_value(body.clone())?),
            "contentEnd" => {
                let end: ContentEndEvent = serde_json::from_value(body.clone())?;
                if end.is_tool() {
                    ServerEvent::ToolEnd(end)
                } else {
                    ServerEvent::ContentEnd(end)
                }
            }
            other => ServerEvent::Other {
                event_type: other.to_string(),
                payload: Value::Object(envelope.clone()),
            },
        };
        Ok(event)
    }

    pub fn kind(&self) -> &str {
        match self {
            ServerEvent::ContentStart(_) => "contentStart",
            ServerEvent::TextOutput(_) => "textOutput",
            ServerEvent::AudioOutput(_) => "audioOutput",
            ServerEvent::ToolUse(_) => "toolUse",
            ServerEvent::ToolEnd(_) => "toolEnd",
            ServerEvent::ContentEnd(_) => "contentEnd",
            ServerEvent::Other { event_type, .. } => event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(value: Value) -> ServerEvent {
        ServerEvent::classify(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn classifies_text_output() {
        let event =
            classify(json!({"event": {"textOutput": {"content": "hello", "role": "ASSISTANT"}}}));
        match event {
            ServerEvent::TextOutput(text) => {
                assert_eq!(text.content(), "hello");
                assert_eq!(text.role(), Some("ASSISTANT"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn tool_typed_content_end_is_tool_end() {
        let event =
            classify(json!({"event": {"contentEnd": {"type": "TOOL", "stopReason": "TOOL_USE"}}}));
        assert!(matches!(event, ServerEvent::ToolEnd(_)));

        let event = classify(json!({"event": {"contentEnd": {"type": "TEXT"}}}));
        assert!(matches!(event, ServerEvent::ContentEnd(_)));
    }

    #[test]
    fn tool_use_arguments_are_parsed() {
        let event = classify(json!({"event": {"toolUse": {
            "toolName": "wave", "toolUseId": "tu-1", "content": "{\"speed\":2}"
        }}}));
        let ServerEvent::ToolUse(tool) = event else {
            panic!("expected toolUse");
        };
        assert_eq!(tool.tool_name(), "wave");
        assert_eq!(tool.arguments(), json!({"speed": 2}));
        assert_eq!(ToolUseEvent::new("x", "y", None).arguments(), json!({}));
    }

    #[test]
    fn unknown_kinds_pass_through() {
        let event = classify(json!({"event": {"usageEvent": {"totalTokens": 12}}}));
        assert_eq!(event.kind(), "usageEvent");
        if let ServerEvent::Other { payload, .. } = event {
            assert_eq!(payload["usageEvent"]["totalTokens"], 12);
        }

        let event = classify(json!({"status": "ok"}));
        assert_eq!(event.kind(), "unknown");
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(ServerEvent::classify(b"not json"), Err(ClassifyError::Json(_))));
        assert!(matches!(ServerEvent::classify(&[0xff, 0xfe]), Err(ClassifyError::Utf8(_))));
        assert!(matches!(ServerEvent::classify(b"{\"event\":{}}"), Err(ClassifyError::Empty)));
    }
}
