//! Full-duplex connection to the model service.
//!
//! A transport is handed the session's [`OutboundStream`] to pull frames from
//! and returns the stream of inbound chunks. Ending, failing or dropping the
//! outbound stream releases the session.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::tungstenite::Message;

use crate::client::{build_request, Config, ConfigError, OutboundStream};
use crate::types::events::error::{SOURCE_INTERNAL_SERVER, SOURCE_MODEL_STREAM};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExceptionKind {
    ModelStreamError,
    InternalServer,
    Other(String),
}

impl ExceptionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ExceptionKind::ModelStreamError => SOURCE_MODEL_STREAM,
            ExceptionKind::InternalServer => SOURCE_INTERNAL_SERVER,
            ExceptionKind::Other(name) => name,
        }
    }
}

/// Exception reported in-band by the model service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamException {
    pub kind: ExceptionKind,
    pub message: String,
}

impl StreamException {
    pub fn new(kind: ExceptionKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundChunk {
    Bytes(Vec<u8>),
    Exception(StreamException),
}

/// Inbound side of an open stream. An `Err` item is a transport failure and
/// ends processing for the session.
pub type InboundStream = BoxStream<'static, Result<InboundChunk>>;

#[async_trait]
pub trait DuplexTransport: Send + Sync {
    async fn open(&self, session_id: &str, outbound: OutboundStream) -> Result<InboundStream>;
}

/// Websocket transport authenticated with a bearer key.
pub struct WsTransport {
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl WsTransport {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        if config.api_key().expose_secret().is_empty() {
            return Err(ConfigError::MissingVar(crate::client::consts::MODEL_API_KEY.to_string()));
        }
        Ok(Self {
            base_url: config.base_url().to_string(),
            model: config.model().to_string(),
            api_key: SecretString::from(config.api_key().expose_secret().to_string()),
        })
    }
}

#[async_trait]
impl DuplexTransport for WsTransport {
    async fn open(&self, session_id: &str, mut outbound: OutboundStream) -> Result<InboundStream> {
        let request = build_request(&self.base_url, &self.model, &self.api_key, session_id)
            .context("failed to build stream request")?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .with_context(|| format!("failed to connect to {}", self.base_url))?;

        let (mut write, read) = ws_stream.split();

        tokio::spawn(async move {
            loop {
                match outbound.next().await {
                    Ok(Some(frame)) => {
                        let text = match String::from_utf8(frame) {
                            Ok(text) => text,
                            Err(e) => {
                                outbound.fail(e.into());
                                break;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(text)).await {
                            outbound.fail(e.into());
                            break;
                        }
                    }
                    Ok(None) => {
                        if let Err(e) = write.close().await {
                            tracing::debug!("failed to close stream: {}", e);
                        }
                        break;
                    }
                    Err(e) => {
                        tracing::error!("outbound stream failed: {:#}", e);
                        let _ = write.close().await;
                        break;
                    }
                }
            }
        });

        let inbound = stream::unfold(read, |mut read| async move {
            loop {
                match read.next().await {
                    None => return None,
                    Some(Ok(Message::Text(text))) => {
                        return Some((Ok(InboundChunk::Bytes(text.into_bytes())), read))
                    }
                    Some(Ok(Message::Binary(bin))) => {
                        return Some((Ok(InboundChunk::Bytes(bin)), read))
                    }
                    Some(Ok(Message::Close(reason))) => {
                        tracing::info!("connection closed: {:?}", reason);
                        return None;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Some((Err(anyhow::Error::from(e)), read)),
                }
            }
        });

        Ok(inbound.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_rejected() {
        let config = Config::new();
        assert!(matches!(WsTransport::new(&config), Err(ConfigError::MissingVar(_))));

        let config = Config::builder().with_api_key("sk").build();
        assert!(WsTransport::new(&config).is_ok());
    }

    #[test]
    fn exception_kinds_name_their_source() {
        assert_eq!(ExceptionKind::ModelStreamError.as_str(), "modelStreamErrorException");
        assert_eq!(ExceptionKind::Other("throttled".into()).as_str(), "throttled");
    }
}
