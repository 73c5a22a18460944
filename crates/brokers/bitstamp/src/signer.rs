//! HMAC-SHA256 request signing.
//!
//! Private calls carry three extra parameters: `key`, `nonce` and
//! `signature`, where the signature is `HMAC-SHA256(secret, nonce + client_id
//! + api_key)` as uppercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::client::Params;
use crate::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

/// Strictly increasing nonce source.
///
/// Seeded from the wall clock in microseconds; if the clock stalls or steps
/// back, the previous nonce plus one is used instead.
#[derive(Debug, Default)]
pub struct NonceGenerator {
    last: AtomicU64,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn clock_micros() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }

    pub fn next(&self) -> u64 {
        let now = Self::clock_micros();
        let next = |last: u64| now.max(last + 1);
        match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last)))
        {
            Ok(prev) | Err(prev) => next(prev),
        }
    }
}

/// Compute the uppercase hex HMAC-SHA256 of `message` keyed by `secret`.
pub fn compute_signature(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take any size");
    mac.update(message.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Signs private requests. Owns the credentials and the nonce counter, and is
/// safe to share between tasks.
pub struct RequestSigner {
    credentials: Credentials,
    nonces: NonceGenerator,
}

impl RequestSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            nonces: NonceGenerator::new(),
        }
    }

    /// Signature for a given nonce.
    pub fn signature(&self, nonce: u64) -> String {
        let message = format!(
            "{}{}{}",
            nonce,
            self.credentials.client_id(),
            self.credentials.api_key()
        );
        compute_signature(self.credentials.api_secret(), &message)
    }

    /// Draw a fresh nonce and merge `key`, `signature` and `nonce` into `params`.
    pub fn sign(&self, params: &mut Params) {
        let nonce = self.nonces.next();
        params.insert("key".to_string(), self.credentials.api_key().to_string());
        params.insert("signature".to_string(), self.signature(nonce));
        params.insert("nonce".to_string(), nonce.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_signature_matches_reference_vector() {
        // RFC 4231, test case 2
        let signature = compute_signature("Jefe", "what do ya want for nothing?");
        assert_eq!(
            signature,
            "5BDCC146BF60754E6A042426089575C75A003F089D2739839DEC58B964EC3843"
        );
    }

    #[test]
    fn test_signature_is_deterministic_and_uppercase() {
        let signer = RequestSigner::new(Credentials::new("42", "my_key", "my_secret"));
        let a = signer.signature(1_600_000_000_000_000);
        let b = signer.signature(1_600_000_000_000_000);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, a.to_uppercase());
        assert_eq!(
            a,
            compute_signature("my_secret", "160000000000000042my_key")
        );
        assert_ne!(a, signer.signature(1_600_000_000_000_001));
    }

    #[test]
    fn test_sign_merges_auth_params() {
        let signer = RequestSigner::new(Credentials::new("42", "my_key", "my_secret"));
        let mut params = Params::new();
        params.insert("amount".to_string(), "0.5".to_string());
        signer.sign(&mut params);

        assert_eq!(params.get("amount").map(String::as_str), Some("0.5"));
        assert_eq!(params.get("key").map(String::as_str), Some("my_key"));
        let nonce: u64 = params["nonce"].parse().unwrap();
        assert_eq!(params["signature"], signer.signature(nonce));
    }

    #[test]
    fn test_nonces_strictly_increase() {
        let nonces = NonceGenerator::new();
        let mut last = nonces.next();
        for _ in 0..10_000 {
            let next = nonces.next();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_nonces_unique_across_threads() {
        let nonces = Arc::new(NonceGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let nonces = nonces.clone();
                std::thread::spawn(move || (0..1_000).map(|_| nonces.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for nonce in handle.join().unwrap() {
                assert!(seen.insert(nonce));
            }
        }
        assert_eq!(seen.len(), 4_000);
    }
}
