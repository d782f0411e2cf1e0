//! Webhook signature algorithm and verification.
//!
//! The data store signs every webhook body with a shared secret:
//!
//! ```text
//! X-Signature: hex(HMAC-SHA256(raw_body, secret))
//! ```
//!
//! Verification is opportunistic. When no secret is configured every body
//! is accepted, and when a secret is configured but the caller did not send
//! a signature the body is also accepted. Only a presented, wrong signature
//! is rejected.

/// Header name carrying the hex HMAC signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid signature")]
    SignatureMismatch,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

/// Result of checking a webhook body against the configured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No secret configured, or no signature presented.
    Skipped,
    /// The presented signature matches the body.
    Verified,
    /// The presented signature does not match the body.
    Rejected,
}

impl Verification {
    /// Whether processing may continue.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Verification::Rejected)
    }
}

/// Compute `hex(HMAC-SHA256(body, secret))`, lowercase.
pub fn sign_body(body: &[u8], secret: &[u8]) -> String {
    let tag = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        body,
    );
    hex::encode(tag.as_ref())
}

/// Verify a presented hex signature against `body`.
///
/// Only lowercase hex is accepted, matching the output of [`sign_body`].
/// The comparison itself is constant-time.
pub fn verify_signature(body: &[u8], signature: &str, secret: &[u8]) -> Result<(), SignatureError> {
    if !signature
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return Err(SignatureError::InvalidHex);
    }
    let tag = hex::decode(signature).map_err(|_| SignatureError::InvalidHex)?;
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        body,
        &tag,
    )?;
    Ok(())
}

/// Classify a webhook body.
///
/// See the module docs for the acceptance policy.
pub fn check(body: &[u8], signature: Option<&str>, secret: Option<&[u8]>) -> Verification {
    // An empty header counts as absent.
    let signature = signature.filter(|s| !s.is_empty());
    match (secret, signature) {
        (None, _) | (Some(_), None) => Verification::Skipped,
        (Some(secret), Some(signature)) => match verify_signature(body, signature, secret) {
            Ok(()) => Verification::Verified,
            Err(_) => Verification::Rejected,
        },
    }
}

/// Returns `true` unless a presented signature fails verification.
pub fn verify(body: &[u8], signature: Option<&str>, secret: Option<&[u8]>) -> bool {
    check(body, signature, secret).is_accepted()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies() -> Vec<Vec<u8>> {
        vec![
            Vec::new(),
            b"{}".to_vec(),
            br#"{"table":"submissions","record":{"status":"accepted"}}"#.to_vec(),
            (0u8..=255).collect(),
            vec![0xff; 4096],
        ]
    }

    fn secrets() -> Vec<Vec<u8>> {
        vec![
            b"s".to_vec(),
            b"webhook-secret".to_vec(),
            vec![0u8; 64],
            (0u8..200).rev().collect(),
        ]
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let sig = sign_body(b"what do ya want for nothing?", b"Jefe");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_no_secret_accepts_anything() {
        for body in bodies() {
            assert!(verify(&body, None, None));
            assert!(verify(&body, Some("garbage"), None));
            assert!(verify(&body, Some(""), None));
            assert_eq!(check(&body, Some("00"), None), Verification::Skipped);
        }
    }

    #[test]
    fn test_signature_accepted_iff_hmac_matches() {
        for secret in secrets() {
            for body in bodies() {
                let good = sign_body(&body, &secret);
                assert_eq!(
                    check(&body, Some(&good), Some(&secret)),
                    Verification::Verified
                );

                let mut flipped = good.clone().into_bytes();
                flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
                let flipped = String::from_utf8(flipped).unwrap();
                assert!(!verify(&body, Some(&flipped), Some(&secret)));

                assert!(!verify(&body, Some(&good[..good.len() - 2]), Some(&secret)));
                assert!(!verify(&body, Some(&good.to_uppercase()), Some(&secret)));
                assert!(!verify(&body, Some("not hex"), Some(&secret)));

                let other = sign_body(&body, b"another-secret");
                assert!(!verify(&body, Some(&other), Some(&secret)));
            }
        }
    }

    #[test]
    fn test_generated_pairs_accept_only_their_hmac() {
        use rand::{Rng, SeedableRng, rngs::StdRng};

        const HEX: &[u8] = b"0123456789abcdef";
        let mut rng = StdRng::seed_from_u64(0x6d65_6c6f);

        for _ in 0..500 {
            let body_len = rng.random_range(0..2048);
            let body: Vec<u8> = (0..body_len).map(|_| rng.random()).collect();
            let secret_len = rng.random_range(1..128);
            let secret: Vec<u8> = (0..secret_len).map(|_| rng.random()).collect();

            let good = sign_body(&body, &secret);
            assert_eq!(
                check(&body, Some(&good), Some(&secret)),
                Verification::Verified
            );

            // One changed hex digit anywhere.
            let mut tampered = good.clone().into_bytes();
            let at = rng.random_range(0..tampered.len());
            let original = tampered[at];
            while tampered[at] == original {
                tampered[at] = HEX[rng.random_range(0..HEX.len())];
            }
            let tampered = String::from_utf8(tampered).unwrap();
            assert_eq!(
                check(&body, Some(&tampered), Some(&secret)),
                Verification::Rejected
            );

            // An arbitrary well-formed candidate.
            let candidate: String = (0..good.len())
                .map(|_| HEX[rng.random_range(0..HEX.len())] as char)
                .collect();
            assert_eq!(
                verify(&body, Some(&candidate), Some(&secret)),
                candidate == good
            );

            // The same body under a different secret.
            let mut other = secret.clone();
            other.push(rng.random());
            assert!(!verify(&body, Some(&sign_body(&body, &other)), Some(&secret)));
        }
    }

    #[test]
    fn test_missing_signature_with_secret_is_skipped() {
        let body = b"{}";
        assert_eq!(check(body, None, Some(b"secret")), Verification::Skipped);
        assert!(verify(body, None, Some(b"secret")));
        assert_eq!(check(body, Some(""), Some(b"secret")), Verification::Skipped);
    }
}
