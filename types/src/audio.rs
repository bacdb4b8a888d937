use serde::{Deserialize, Serialize};

pub type Base64EncodedAudioBytes = String;

pub const INPUT_SAMPLE_RATE_HZ: u32 = 16_000;
pub const OUTPUT_SAMPLE_RATE_HZ: u32 = 24_000;
pub const SAMPLE_SIZE_BITS: u16 = 16;
pub const CHANNEL_COUNT: u16 = 1;
pub const DEFAULT_VOICE_ID: &str = "tiffany";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioType {
    #[serde(rename = "SPEECH")]
    Speech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioMediaType {
    #[serde(rename = "audio/lpcm")]
    Lpcm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    #[serde(rename = "base64")]
    Base64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextMediaType {
    #[serde(rename = "text/plain")]
    Plain,
    #[serde(rename = "application/json")]
    Json,
}

/// LPCM stream parameters, used for both the microphone input and the
/// synthesized output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfiguration {
    audio_type: AudioType,
    media_type: AudioMediaType,
    sample_rate_hertz: u32,
    sample_size_bits: u16,
    channel_count: u16,
    encoding: AudioEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_id: Option<String>,
}

impl AudioConfiguration {
    /// 16 kHz mono input as captured from the operator.
    pub fn input() -> Self {
        Self {
            audio_type: AudioType::Speech,
            media_type: AudioMediaType::Lpcm,
            sample_rate_hertz: INPUT_SAMPLE_RATE_HZ,
            sample_size_bits: SAMPLE_SIZE_BITS,
            channel_count: CHANNEL_COUNT,
            encoding: AudioEncoding::Base64,
            voice_id: None,
        }
    }

    /// 24 kHz synthesized output with the default voice.
    pub fn output() -> Self {
        Self {
            sample_rate_hertz: OUTPUT_SAMPLE_RATE_HZ,
            voice_id: Some(DEFAULT_VOICE_ID.to_string()),
            ..Self::input()
        }
    }

    pub fn with_sample_rate_hertz(mut self, sample_rate_hertz: u32) -> Self {
        self.sample_rate_hertz = sample_rate_hertz;
        self
    }

    pub fn with_voice_id(mut self, voice_id: &str) -> Self {
        self.voice_id = Some(voice_id.to_string());
        self
    }

    pub fn sample_rate_hertz(&self) -> u32 {
        self.sample_rate_hertz
    }

    pub fn sample_size_bits(&self) -> u16 {
        self.sample_size_bits
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn voice_id(&self) -> Option<&str> {
        self.voice_id.as_deref()
    }
}

impl Default for AudioConfiguration {
    fn default() -> Self {
        Self::input()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextConfiguration {
    media_type: TextMediaType,
}

impl TextConfiguration {
    pub fn plain() -> Self {
        Self { media_type: TextMediaType::Plain }
    }

    pub fn json() -> Self {
        Self { media_type: TextMediaType::Json }
    }

    pub fn media_type(&self) -> TextMediaType {
        self.media_type
    }
}

impl Default for TextConfiguration {
    fn default() -> Self {
        Self::plain()
    }
}
