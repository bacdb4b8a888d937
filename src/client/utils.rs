use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use crate::client::consts::{AUTHORIZATION_HEADER, SESSION_ID_HEADER};

pub fn build_request(
    base_url: &str,
    model: &str,
    api_key: &SecretString,
    session_id: &str,
) -> tokio_tungstenite::tungstenite::Result<Request> {
    let mut request = format!("{}?model={}", base_url, model).into_client_request()?;
    request.headers_mut()
        .insert(
            AUTHORIZATION_HEADER,
            format!("Bearer {}", api_key.expose_secret()).as_str().parse()?
        );
    request.headers_mut().insert(SESSION_ID_HEADER, session_id.parse()?);
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_bearer_and_session_headers() {
        let key = SecretString::from("sk-test".to_string());
        let request = build_request("wss://example.com/v1/stream", "nova", &key, "s-1").unwrap();
        assert_eq!(request.uri().to_string(), "wss://example.com/v1/stream?model=nova");
        assert_eq!(request.headers()[AUTHORIZATION_HEADER], "Bearer sk-test");
        assert_eq!(request.headers()[SESSION_ID_HEADER], "s-1");
    }
}
