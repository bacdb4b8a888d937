use serde::{Deserialize, Serialize};

use crate::audio::{AudioConfiguration, Base64EncodedAudioBytes, TextConfiguration};
use crate::session::InferenceConfig;
use crate::tools::{Tool, ToolChoice, ToolConfiguration};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientEvent {
    SessionStart(SessionStart),
    PromptStart(PromptStart),
    ContentStart(ContentStart),
    TextInput(TextInput),
    AudioInput(AudioInput),
    ToolResult(ToolResultInput),
    ContentEnd(ContentEnd),
    PromptEnd(PromptEnd),
    SessionEnd(SessionEnd),
}

impl ClientEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::SessionStart(_) => "sessionStart",
            ClientEvent::PromptStart(_) => "promptStart",
            ClientEvent::ContentStart(_) => "contentStart",
            ClientEvent::TextInput(_) => "textInput",
            ClientEvent::AudioInput(_) => "audioInput",
            ClientEvent::ToolResult(_) => "toolResult",
            ClientEvent::ContentEnd(_) => "contentEnd",
            ClientEvent::PromptEnd(_) => "promptEnd",
            ClientEvent::SessionEnd(_) => "sessionEnd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    Text,
    Audio,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// `sessionStart`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    inference_configuration: InferenceConfig,
}

impl SessionStart {
    pub fn new(inference_configuration: InferenceConfig) -> Self {
        Self { inference_configuration }
    }

    pub fn inference_configuration(&self) -> &InferenceConfig {
        &self.inference_configuration
    }
}

/// `promptStart`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStart {
    prompt_name: String,
    text_output_configuration: TextConfiguration,
    audio_output_configuration: AudioConfiguration,
    tool_use_output_configuration: TextConfiguration,
    tool_choice: ToolChoice,
    tool_configuration: ToolConfiguration,
}

impl PromptStart {
    pub fn new(prompt_name: &str, tools: Vec<Tool>) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            text_output_configuration: TextConfiguration::plain(),
            audio_output_configuration: AudioConfiguration::output(),
            tool_use_output_configuration: TextConfiguration::json(),
            tool_choice: ToolChoice::default(),
            tool_configuration: ToolConfiguration::new(tools),
        }
    }

    pub fn with_audio_output_configuration(mut self, config: AudioConfiguration) -> Self {
        self.audio_output_configuration = config;
        self
    }

    pub fn prompt_name(&self) -> &str {
        &self.prompt_name
    }

    pub fn tools(&self) -> &[Tool] {
        self.tool_configuration.tools()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultInputConfiguration {
    tool_use_id: String,
    #[serde(rename = "type")]
    content_type: ContentType,
    text_input_configuration: TextConfiguration,
}

/// `contentStart` opening a text, audio or tool-result content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStart {
    prompt_name: String,
    content_name: String,
    #[serde(rename = "type")]
    content_type: ContentType,
    interactive: bool,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_input_configuration: Option<TextConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_input_configuration: Option<AudioConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_result_input_configuration: Option<ToolResultInputConfiguration>,
}

impl ContentStart {
    pub fn text(
        prompt_name: &str,
        content_name: &str,
        role: Role,
        config: TextConfiguration,
    ) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            content_name: content_name.to_string(),
            content_type: ContentType::Text,
            interactive: true,
            role,
            text_input_configuration: Some(config),
            audio_input_configuration: None,
            tool_result_input_configuration: None,
        }
    }

    pub fn audio(prompt_name: &str, content_name: &str, config: AudioConfiguration) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            content_name: content_name.to_string(),
            content_type: ContentType::Audio,
            interactive: true,
            role: Role::User,
            text_input_configuration: None,
            audio_input_configuration: Some(config),
            tool_result_input_configuration: None,
        }
    }

    pub fn tool_result(prompt_name: &str, content_name: &str, tool_use_id: &str) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            content_name: content_name.to_string(),
            content_type: ContentType::Tool,
            interactive: false,
            role: Role::Tool,
            text_input_configuration: None,
            audio_input_configuration: None,
            tool_result_input_configuration: Some(ToolResultInputConfiguration {
                tool_use_id: tool_use_id.to_string(),
                content_type: ContentType::Text,
                text_input_configuration: TextConfiguration::plain(),
            }),
        }
    }

    pub fn prompt_name(&self) -> &str {
        &self.prompt_name
    }

    pub fn content_name(&self) -> &str {
        &self.content_name
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// `textInput`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInput {
    prompt_name: String,
    content_name: String,
    content: String,
}

impl TextInput {
    pub fn new(prompt_name: &str, content_name: &str, content: String) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            content_name: content_name.to_string(),
            content,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// `audioInput`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInput {
    prompt_name: String,
    content_name: String,
    content: Base64EncodedAudioBytes,
}

impl AudioInput {
    pub fn new(prompt_name: &str, content_name: &str, content: Base64EncodedAudioBytes) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            content_name: content_name.to_string(),
            content,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// `toolResult`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultInput {
    prompt_name: String,
    content_name: String,
    content: String,
}

impl ToolResultInput {
    pub fn new(prompt_name: &str, content_name: &str, content: String) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            content_name: content_name.to_string(),
            content,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// `contentEnd`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEnd {
    prompt_name: String,
    content_name: String,
}

impl ContentEnd {
    pub fn new(prompt_name: &str, content_name: &str) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            content_name: content_name.to_string(),
        }
    }

    pub fn content_name(&self) -> &str {
        &self.content_name
    }
}

/// `promptEnd`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEnd {
    prompt_name: String,
}

impl PromptEnd {
    pub fn new(prompt_name: &str) -> Self {
        Self { prompt_name: prompt_name.to_string() }
    }
}

/// `sessionEnd`, serialized as an empty object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionEnd {}

impl SessionEnd {
    pub fn new() -> Self {
        Self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_content_start_shape() {
        let event = ClientEvent::ContentStart(ContentStart::tool_result("p-1", "c-1", "tu-1"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({
                "contentStart": {
                    "promptName": "p-1",
                    "contentName": "c-1",
                    "type": "TOOL",
                    "interactive": false,
                    "role": "TOOL",
                    "toolResultInputConfiguration": {
                        "toolUseId": "tu-1",
                        "type": "TEXT",
                        "textInputConfiguration": { "mediaType": "text/plain" }
                    }
                }
            })
        );
    }

    #[test]
    fn audio_content_start_is_interactive_user_content() {
        let start = ContentStart::audio("p-1", "a-1", AudioConfiguration::input());
        let json = serde_json::to_value(&start).unwrap();
        assert_eq!(json["type"], "AUDIO");
        assert_eq!(json["role"], "USER");
        assert_eq!(json["interactive"], true);
        assert_eq!(json["audioInputConfiguration"]["sampleRateHertz"], 16000);
        assert!(json.get("textInputConfiguration").is_none());
    }

    #[test]
    fn prompt_start_advertises_tools_with_any_choice() {
        let tools = vec![Tool::from(crate::tools::ToolSpec::new("stand", "Stand up."))];
        let json = serde_json::to_value(PromptStart::new("p-1", tools)).unwrap();
        assert_eq!(json["toolChoice"], json!({ "any": {} }));
        assert_eq!(json["toolUseOutputConfiguration"]["mediaType"], "application/json");
        assert_eq!(json["audioOutputConfiguration"]["voiceId"], "tiffany");
        assert_eq!(json["toolConfiguration"]["tools"][0]["toolSpec"]["name"], "stand");
    }
}
