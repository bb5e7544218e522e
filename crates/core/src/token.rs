//! Job-scoped continuation tokens for the internal self-invocation
//! channel.
//!
//! A continuation token is the hex HMAC-SHA256 of the decimal job id
//! under the shared internal secret. Tokens authorize exactly one job,
//! so a leaked token cannot drive other jobs, and verification is
//! constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::types::DbId;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the continuation token on processor invocations.
pub const CONTINUATION_TOKEN_HEADER: &str = "x-continuation-token";

/// Sign a continuation token for one job.
pub fn continuation_token(secret: &str, job_id: DbId) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(job_id.to_string().as_bytes());
    encode_hex(&mac.finalize().into_bytes())
}

/// Verify a continuation token for one job.
pub fn verify_continuation_token(secret: &str, job_id: DbId, token: &str) -> bool {
    let Some(raw) = decode_hex(token) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(job_id.to_string().as_bytes());
    mac.verify_slice(&raw).is_ok()
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = continuation_token("secret", 42);
        assert!(verify_continuation_token("secret", 42, &token));
    }

    #[test]
    fn test_token_is_job_scoped() {
        let token = continuation_token("secret", 42);
        assert!(!verify_continuation_token("secret", 43, &token));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = continuation_token("secret", 42);
        assert!(!verify_continuation_token("other", 42, &token));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert!(!verify_continuation_token("secret", 42, ""));
        assert!(!verify_continuation_token("secret", 42, "zz-not-hex"));
        assert!(!verify_continuation_token("secret", 42, "abc"));
    }

    #[test]
    fn test_token_is_hex_of_mac_length() {
        let token = continuation_token("secret", 1);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
