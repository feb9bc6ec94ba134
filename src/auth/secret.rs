use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Shared bearer secret for trusted server-to-server callers.
///
/// Only the SHA-256 digest is kept; candidates are hashed and compared in
/// constant time, so neither the content nor the length of the secret leaks
/// through timing.
#[derive(Clone)]
pub struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    /// `None` for an absent or blank secret: the bypass is then disabled.
    pub fn new(secret: Option<&str>) -> Option<Self> {
        let secret = secret?;
        if secret.is_empty() {
            return None;
        }
        Some(Self { digest: Sha256::digest(secret.as_bytes()).into() })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        bool::from(self.digest[..].ct_eq(&candidate[..]))
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}
