use chrono::{DateTime, Utc};
use hex::ToHex;
use sha2::{Digest, Sha256};

/// Signed URLs stay valid for one hour.
pub const SIGNED_URL_TTL_SECS: i64 = 3600;

/// Mints and checks capability URLs for private documents. The signature is a
/// keyed digest over the storage path and expiry, so a link grants access to
/// exactly one path for a bounded time and nothing is persisted server-side.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl UrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    fn signature(&self, path: &str, exp: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(b"|");
        hasher.update(path.as_bytes());
        hasher.update(b"|");
        hasher.update(exp.to_string().as_bytes());
        hasher.finalize().encode_hex()
    }

    pub fn mint(&self, path: &str, now: DateTime<Utc>) -> String {
        let exp = now.timestamp() + SIGNED_URL_TTL_SECS;
        format!("/documents/{}?exp={}&sig={}", path, exp, self.signature(path, exp))
    }

    pub fn verify(&self, path: &str, exp: i64, sig: &str, now: DateTime<Utc>) -> bool {
        now.timestamp() <= exp && self.signature(path, exp) == sig
    }
}
