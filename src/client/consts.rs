pub const MODEL_API_KEY: &str = "MODEL_API_KEY";
pub const MODEL_STREAM_URL: &str = "MODEL_STREAM_URL";
pub const MODEL_ID: &str = "MODEL_ID";
pub const PUBLISH_URL: &str = "PUBLISH_URL";
pub const FLEET_IDS: &str = "FLEET_IDS";
pub const FLEET_SIZE: &str = "FLEET_SIZE";
pub const DEFAULT_ROBOT: &str = "DEFAULT_ROBOT";
pub const SESSION_IDLE_TIMEOUT_SECS: &str = "SESSION_IDLE_TIMEOUT_SECS";
pub const SESSION_SWEEP_INTERVAL_SECS: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const ROBOT_METADATA_PATH: &str = "ROBOT_METADATA_PATH";
pub const PUBLISH_TOKEN: &str = "PUBLISH_TOKEN";
pub const VOICE_ID: &str = "VOICE_ID";

pub const BASE_URL: &str = "wss://localhost:8443/v1/stream";
pub const DEFAULT_MODEL: &str = "amazon.nova-sonic-v1:0";
pub const DEFAULT_PUBLISH_URL: &str = "http://localhost:8080";
pub const DEFAULT_FLEET_SIZE: usize = 6;
pub const DEFAULT_ROBOT_ID: &str = "robot_1";

pub const IDLE_TIMEOUT_SECS: u64 = 300;
pub const SWEEP_INTERVAL_SECS: u64 = 60;
pub const AUDIO_END_DELAY_MS: u64 = 500;
pub const PROMPT_END_DELAY_MS: u64 = 300;
pub const SESSION_END_DELAY_MS: u64 = 300;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const SESSION_ID_HEADER: &str = "X-Session-Id";
