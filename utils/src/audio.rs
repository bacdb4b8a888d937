use base64::Engine;

/// Base64 of raw little-endian PCM bytes as they arrive from the operator.
pub fn encode_bytes(pcm: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(pcm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_encode_as_standard_base64() {
        assert_eq!(encode_bytes(&[0, 1, 2, 3]), "AAECAw==");
        assert_eq!(encode_bytes(&[]), "");
    }
}
