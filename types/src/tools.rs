use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Schema advertised for tools that take no arguments.
pub const EMPTY_OBJECT_SCHEMA: &str = r#"{"type":"object","properties":{},"required":[]}"#;

/// Tool selection policy sent with `promptStart`, e.g. `{"any":{}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolChoice {
    Any {},
}

impl Default for ToolChoice {
    fn default() -> Self {
        ToolChoice::Any {}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    tool_spec: ToolSpec,
}

impl Tool {
    pub fn new(tool_spec: ToolSpec) -> Self {
        Self { tool_spec }
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    pub fn name(&self) -> &str {
        self.tool_spec.name()
    }
}

impl From<ToolSpec> for Tool {
    fn from(tool_spec: ToolSpec) -> Self {
        Self::new(tool_spec)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    name: String,
    description: String,
    input_schema: InputSchema,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: InputSchema::default(),
        }
    }

    pub fn with_input_schema(mut self, schema: &Value) -> Self {
        self.input_schema = InputSchema::from_value(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }
}

/// JSON schema carried as a serialized string under `json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    json: String,
}

impl InputSchema {
    pub fn from_value(schema: &Value) -> Self {
        Self { json: schema.to_string() }
    }

    pub fn json(&self) -> &str {
        &self.json
    }
}

impl Default for InputSchema {
    fn default() -> Self {
        Self { json: EMPTY_OBJECT_SCHEMA.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolConfiguration {
    tools: Vec<Tool>,
}

impl ToolConfiguration {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }
}

/// Outcome of a tool invocation, fed back to the model as the tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    success: bool,
    payload: Value,
}

impl ToolResult {
    pub fn new(success: bool, payload: Value) -> Self {
        Self { success, payload }
    }

    pub fn success(message: &str) -> Self {
        Self::new(true, json!({ "success": true, "message": message }))
    }

    pub fn failure(error: &str) -> Self {
        Self::new(false, json!({ "success": false, "error": error }))
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(Value::as_str)
    }

    /// Text sent in the `toolResult` frame: strings pass through, anything
    /// else is serialized as JSON.
    pub fn to_content(&self) -> String {
        match &self.payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_spec_wire_shape() {
        let tool = Tool::from(ToolSpec::new("wave", "Command the robot to wave its hand."));
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["toolSpec"]["name"], "wave");
        assert_eq!(json["toolSpec"]["inputSchema"]["json"], EMPTY_OBJECT_SCHEMA);
    }

    #[test]
    fn tool_choice_any_is_an_empty_object() {
        let json = serde_json::to_string(&ToolChoice::default()).unwrap();
        assert_eq!(json, r#"{"any":{}}"#);
    }

    #[test]
    fn result_content_passes_strings_through() {
        let text = ToolResult::new(true, Value::String("done".to_string()));
        assert_eq!(text.to_content(), "done");

        let structured = ToolResult::success("Tool wave processed successfully.");
        let parsed: Value = serde_json::from_str(&structured.to_content()).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(structured.message(), Some("Tool wave processed successfully."));
    }
}
