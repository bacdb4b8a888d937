//! Session manager configuration.
//!
//! Settings come from the environment (a `.env` file is honored for local
//! development) or from [`ConfigBuilder`] in code and tests.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::client::consts;
use crate::client::error::ConfigError;
use crate::fleet::Fleet;
use crate::types::audio::{AudioConfiguration, DEFAULT_VOICE_ID};
use crate::types::InferenceConfig;

#[derive(Debug)]
pub struct Config {
    base_url: String,
    api_key: SecretString,
    model: String,
    publish_url: String,
    publish_token: Option<SecretString>,
    fleet: Fleet,
    default_robot: String,
    inference: InferenceConfig,
    idle_timeout: Duration,
    sweep_interval: Duration,
    audio_end_delay: Duration,
    prompt_end_delay: Duration,
    session_end_delay: Duration,
    metadata_path: Option<PathBuf>,
    voice_id: String,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn with_publish_url(mut self, publish_url: &str) -> Self {
        self.config.publish_url = publish_url.to_string();
        self
    }

    pub fn with_publish_token(mut self, token: &str) -> Self {
        self.config.publish_token = Some(SecretString::from(token.to_string()));
        self
    }

    pub fn with_fleet(mut self, fleet: Fleet) -> Self {
        self.config.fleet = fleet;
        self
    }

    pub fn with_default_robot(mut self, robot: &str) -> Self {
        self.config.default_robot = robot.to_string();
        self
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.config.inference = inference;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Pauses between the teardown frames of a graceful close.
    pub fn with_teardown_delays(
        mut self,
        audio_end: Duration,
        prompt_end: Duration,
        session_end: Duration,
    ) -> Self {
        self.config.audio_end_delay = audio_end;
        self.config.prompt_end_delay = prompt_end;
        self.config.session_end_delay = session_end;
        self
    }

    pub fn with_metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.metadata_path = Some(path.into());
        self
    }

    /// Voice the model answers with.
    pub fn with_voice_id(mut self, voice_id: &str) -> Self {
        self.config.voice_id = voice_id.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Defaults only; the API key is left empty.
    pub fn new() -> Self {
        Self {
            base_url: consts::BASE_URL.to_string(),
            api_key: SecretString::from(String::new()),
            model: consts::DEFAULT_MODEL.to_string(),
            publish_url: consts::DEFAULT_PUBLISH_URL.to_string(),
            publish_token: None,
            fleet: Fleet::numbered(consts::DEFAULT_FLEET_SIZE),
            default_robot: consts::DEFAULT_ROBOT_ID.to_string(),
            inference: InferenceConfig::default(),
            idle_timeout: Duration::from_secs(consts::IDLE_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(consts::SWEEP_INTERVAL_SECS),
            audio_end_delay: Duration::from_millis(consts::AUDIO_END_DELAY_MS),
            prompt_end_delay: Duration::from_millis(consts::PROMPT_END_DELAY_MS),
            session_end_delay: Duration::from_millis(consts::SESSION_END_DELAY_MS),
            metadata_path: None,
            voice_id: DEFAULT_VOICE_ID.to_string(),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Loads configuration from environment variables.
    ///
    // *   `MODEL_API_KEY`: bearer credential for the model stream. Required.
    // *   `MODEL_STREAM_URL`, `MODEL_ID`: stream endpoint and model identifier.
    // *   `PUBLISH_URL`: base URL of the fleet message bus.
    // *   `FLEET_IDS` (comma separated) or `FLEET_SIZE`: robots addressed by "all".
    // *   `DEFAULT_ROBOT`: robot a new session targets.
    // *   `SESSION_IDLE_TIMEOUT_SECS`, `SESSION_SWEEP_INTERVAL_SECS`: idle eviction.
    // *   `ROBOT_METADATA_PATH`: optional JSON file of robot background records.
    // *   `PUBLISH_TOKEN`: optional bearer token for the message bus.
    // *   `VOICE_ID`: voice of the spoken replies, defaults to "tiffany".
    //
    // Log filtering is left to the subscriber the binary installs (`RUST_LOG`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_key = env::var(consts::MODEL_API_KEY)
            .map_err(|_| ConfigError::MissingVar(consts::MODEL_API_KEY.to_string()))?;

        let mut config = Self::new();
        config.api_key = SecretString::from(api_key);

        if let Ok(url) = env::var(consts::MODEL_STREAM_URL) {
            config.base_url = url;
        }
        if let Ok(model) = env::var(consts::MODEL_ID) {
            config.model = model;
        }
        if let Ok(url) = env::var(consts::PUBLISH_URL) {
            config.publish_url = url;
        }
        config.publish_token = env::var(consts::PUBLISH_TOKEN).ok().map(SecretString::from);

        config.fleet = match env::var(consts::FLEET_IDS) {
            Ok(ids) => parse_fleet_ids(&ids)?,
            Err(_) => match env::var(consts::FLEET_SIZE) {
                Ok(size) => Fleet::numbered(parse_number(consts::FLEET_SIZE, &size)? as usize),
                Err(_) => config.fleet,
            },
        };

        if let Ok(robot) = env::var(consts::DEFAULT_ROBOT) {
            config.default_robot = robot;
        }
        if let Ok(secs) = env::var(consts::SESSION_IDLE_TIMEOUT_SECS) {
            let secs = parse_number(consts::SESSION_IDLE_TIMEOUT_SECS, &secs)?;
            config.idle_timeout = Duration::from_secs(secs);
        }
        if let Ok(secs) = env::var(consts::SESSION_SWEEP_INTERVAL_SECS) {
            let secs = parse_number(consts::SESSION_SWEEP_INTERVAL_SECS, &secs)?;
            config.sweep_interval = Duration::from_secs(secs);
        }
        config.metadata_path = env::var(consts::ROBOT_METADATA_PATH).ok().map(PathBuf::from);

        if let Ok(voice) = env::var(consts::VOICE_ID) {
            config.voice_id = voice;
        }

        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn publish_url(&self) -> &str {
        &self.publish_url
    }

    pub fn publish_token(&self) -> Option<&SecretString> {
        self.publish_token.as_ref()
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn default_robot(&self) -> &str {
        &self.default_robot
    }

    pub fn inference(&self) -> &InferenceConfig {
        &self.inference
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn audio_end_delay(&self) -> Duration {
        self.audio_end_delay
    }

    pub fn prompt_end_delay(&self) -> Duration {
        self.prompt_end_delay
    }

    pub fn session_end_delay(&self) -> Duration {
        self.session_end_delay
    }

    pub fn metadata_path(&self) -> Option<&PathBuf> {
        self.metadata_path.as_ref()
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    /// Output audio advertised in `promptStart`.
    pub fn output_audio(&self) -> AudioConfiguration {
        AudioConfiguration::output().with_voice_id(&self.voice_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_fleet_ids(value: &str) -> Result<Fleet, ConfigError> {
    let ids: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: consts::FLEET_IDS.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Fleet::new(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_match_the_deployment() {
        let config = Config::new();
        assert_eq!(config.model(), "amazon.nova-sonic-v1:0");
        assert_eq!(config.fleet().ids().len(), 6);
        assert_eq!(config.default_robot(), "robot_1");
        assert_eq!(config.idle_timeout(), Duration::from_secs(300));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.audio_end_delay(), Duration::from_millis(500));
        assert_eq!(config.api_key().expose_secret(), "");
        assert!(config.publish_token().is_none());
        assert_eq!(config.output_audio(), AudioConfiguration::output());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::builder()
            .with_api_key("secret")
            .with_fleet(Fleet::numbered(2))
            .with_teardown_delays(Duration::ZERO, Duration::ZERO, Duration::from_millis(5))
            .with_publish_token("bus-token")
            .with_voice_id("matthew")
            .build();
        assert_eq!(config.api_key().expose_secret(), "secret");
        assert_eq!(config.publish_token().unwrap().expose_secret(), "bus-token");
        assert_eq!(config.output_audio().voice_id(), Some("matthew"));
        assert_eq!(config.fleet().ids(), ["robot_1", "robot_2"]);
        assert_eq!(config.session_end_delay(), Duration::from_millis(5));
    }

    #[test]
    fn fleet_ids_are_trimmed_and_non_empty() {
        let fleet = parse_fleet_ids(" alpha, beta,,gamma ").unwrap();
        assert_eq!(fleet.ids(), ["alpha", "beta", "gamma"]);
        assert!(parse_fleet_ids(" , ").is_err());
    }

    #[test]
    fn numbers_reject_garbage() {
        assert_eq!(parse_number("X", " 42 ").unwrap(), 42);
        assert!(matches!(parse_number("X", "soon"), Err(ConfigError::InvalidValue { .. })));
    }
}
