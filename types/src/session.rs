use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TOP_P: f32 = 0.5;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Inference parameters sent once per session with `sessionStart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    max_tokens: u32,
    top_p: f32,
    temperature: f32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl InferenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_defaults() {
        let json = serde_json::to_value(InferenceConfig::default()).unwrap();
        assert_eq!(json["maxTokens"], 1024);
        assert_eq!(json["topP"], 0.5);
        assert_eq!(json["temperature"].as_f64().map(|t| (t * 10.0).round()), Some(3.0));
    }
}
