//! Shared access signature tokens
//!
//! `SharedAccessSignature sr={resource}&sig={signature}&se={expiry}` where the
//! signature is base64(HMAC-SHA256(key, url_encode(resource) + "\n" + expiry)).

use std::sync::Mutex;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 block size in bytes
const BLOCK_SIZE: usize = 64;
/// SHA-256 digest size in bytes
const DIGEST_SIZE: usize = 32;

/// Compute HMAC-SHA256 per RFC 2104
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; DIGEST_SIZE] {
    // Keys longer than one block are hashed first
    let mut key_block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        key_block[..DIGEST_SIZE].copy_from_slice(&Sha256::digest(key));
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut ipad = [0x36u8; BLOCK_SIZE];
    let mut opad = [0x5cu8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        ipad[i] ^= key_block[i];
        opad[i] ^= key_block[i];
    }

    let inner = Sha256::new()
        .chain_update(ipad)
        .chain_update(message)
        .finalize();
    Sha256::new()
        .chain_update(opad)
        .chain_update(inner)
        .finalize()
        .into()
}

/// Build a SAS token for `resource_uri` valid until `expiry` (unix seconds)
///
/// # Errors
/// The shared access key is not valid base64.
pub fn generate_sas_token(resource_uri: &str, shared_access_key: &str, expiry: i64) -> Result<String> {
    let encoded_uri = urlencoding::encode(resource_uri);
    let string_to_sign = format!("{encoded_uri}\n{expiry}");

    let key = STANDARD.decode(shared_access_key)?;
    let signature = STANDARD.encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    Ok(format!(
        "SharedAccessSignature sr={encoded_uri}&sig={}&se={expiry}",
        urlencoding::encode(&signature)
    ))
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expiry: i64,
}

/// Caches a SAS token and renews it shortly before it expires
#[derive(Debug)]
pub struct SasTokenProvider {
    resource_uri: String,
    shared_access_key: String,
    ttl_secs: i64,
    renew_margin_secs: i64,
    cached: Mutex<Option<CachedToken>>,
}

impl SasTokenProvider {
    /// Default token lifetime: one hour
    pub const DEFAULT_TTL_SECS: i64 = 3600;

    pub fn new(resource_uri: impl Into<String>, shared_access_key: impl Into<String>) -> Self {
        Self {
            resource_uri: resource_uri.into(),
            shared_access_key: shared_access_key.into(),
            ttl_secs: Self::DEFAULT_TTL_SECS,
            renew_margin_secs: Self::DEFAULT_TTL_SECS / 10,
            cached: Mutex::new(None),
        }
    }

    /// Token valid at `now` (unix seconds), generating a new one when needed
    pub fn token_at(&self, now: i64) -> Result<String> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(current) = cached.as_ref() {
            if now + self.renew_margin_secs < current.expiry {
                return Ok(current.token.clone());
            }
        }

        let expiry = now + self.ttl_secs;
        let token = generate_sas_token(&self.resource_uri, &self.shared_access_key, expiry)?;
        *cached = Some(CachedToken {
            token: token.clone(),
            expiry,
        });
        Ok(token)
    }

    /// Token valid now
    pub fn token(&self) -> Result<String> {
        self.token_at(chrono::Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_hmac_sha256_rfc4231_case2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            to_hex(&mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_sha256_long_key_is_hashed() {
        let long_key = [0xaau8; 131];
        let short_key = Sha256::digest(long_key);
        assert_eq!(
            hmac_sha256(&long_key, b"msg"),
            hmac_sha256(&short_key, b"msg")
        );
    }

    #[test]
    fn test_sas_token_shape() {
        let token = generate_sas_token(
            "hub.azure-devices.net/devices/dev1",
            "c2VjcmV0",
            1_700_000_000,
        )
        .unwrap();
        assert!(token.starts_with(
            "SharedAccessSignature sr=hub.azure-devices.net%2Fdevices%2Fdev1&sig="
        ));
        assert!(token.ends_with("&se=1700000000"));
    }

    #[test]
    fn test_sas_token_rejects_bad_key() {
        assert!(generate_sas_token("h/devices/d", "not base64!!", 1).is_err());
    }

    #[test]
    fn test_provider_caches_until_renewal_margin() {
        let provider = SasTokenProvider::new("h/devices/d", "c2VjcmV0");
        let first = provider.token_at(1_000).unwrap();
        assert_eq!(provider.token_at(1_010).unwrap(), first);

        // Inside the renewal margin a new token is minted
        let later = 1_000 + SasTokenProvider::DEFAULT_TTL_SECS - 10;
        assert_ne!(provider.token_at(later).unwrap(), first);
    }
}
