//! Anonymous caller identity
//!
//! A caller is a 32-byte random ID signed with HMAC-SHA256 under a
//! process-wide key. The ID is visible to the caller; the signature only
//! prevents forging or mutating it.

mod credential;
mod entropy;

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::errors::{Result, ShortenerError};

pub use credential::{CREDENTIAL_SEPARATOR, CallerIdentity, decode, encode};
pub use entropy::{EntropySource, ThreadRngSource};

type HmacSha256 = Hmac<Sha256>;

/// Length of a freshly issued raw caller ID
pub const RAW_ID_LEN: usize = 32;

/// Caller scope for every storage operation.
///
/// Holds the lowercase hex form of the raw ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        CallerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(id: &str) -> Self {
        CallerId(id.to_string())
    }
}

/// Outcome of authenticating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// A valid credential was presented
    Existing(CallerId),
    /// No credential was presented; a new one must be attached to the response
    Issued {
        caller: CallerId,
        credential: String,
    },
}

impl Authentication {
    pub fn caller(&self) -> &CallerId {
        match self {
            Authentication::Existing(caller) => caller,
            Authentication::Issued { caller, .. } => caller,
        }
    }
}

/// Issues and verifies signed caller identities
#[derive(Clone)]
pub struct IdentityManager {
    mac: HmacSha256,
    entropy: Arc<dyn EntropySource>,
}

impl std::fmt::Debug for IdentityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityManager").finish_non_exhaustive()
    }
}

impl IdentityManager {
    pub fn new(secret_key: &[u8]) -> Result<Self> {
        Self::with_entropy(secret_key, Arc::new(ThreadRngSource))
    }

    pub fn with_entropy(secret_key: &[u8], entropy: Arc<dyn EntropySource>) -> Result<Self> {
        if secret_key.is_empty() {
            return Err(ShortenerError::config("identity secret key is empty"));
        }
        let mac = HmacSha256::new_from_slice(secret_key)
            .map_err(|e| ShortenerError::config(format!("invalid identity key: {}", e)))?;
        Ok(Self { mac, entropy })
    }

    fn sign(&self, raw_id: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(raw_id);
        mac.finalize().into_bytes().to_vec()
    }

    /// Mint a fresh identity from the entropy source
    pub fn issue(&self) -> Result<CallerIdentity> {
        let mut raw_id = vec![0u8; RAW_ID_LEN];
        self.entropy.fill(&mut raw_id).map_err(|e| {
            ShortenerError::random_source(format!("cannot generate caller id: {}", e.message()))
        })?;
        let signature = self.sign(&raw_id);
        Ok(CallerIdentity { raw_id, signature })
    }

    /// Constant-time check that `signature` is the MAC of `raw_id`
    pub fn verify(&self, raw_id: &[u8], signature: &[u8]) -> bool {
        let expected = self.sign(raw_id);
        expected.ct_eq(signature).into()
    }

    pub fn encode(&self, identity: &CallerIdentity) -> String {
        encode(identity)
    }

    pub fn decode(&self, credential: &str) -> Result<CallerIdentity> {
        decode(credential)
    }

    /// Decode and verify a presented credential, or issue one when absent.
    ///
    /// A present but invalid credential is an error and is never replaced.
    pub fn authenticate(&self, credential: Option<&str>) -> Result<Authentication> {
        match credential {
            None => {
                let identity = self.issue()?;
                let caller = CallerId(identity.hex_id());
                debug!("Issued new caller identity {}", caller);
                Ok(Authentication::Issued {
                    caller,
                    credential: self.encode(&identity),
                })
            }
            Some(value) => {
                let identity = self.decode(value)?;
                if !self.verify(&identity.raw_id, &identity.signature) {
                    warn!("Credential signature mismatch for caller {}", identity.hex_id());
                    return Err(ShortenerError::signature_invalid(
                        "credential signature does not match",
                    ));
                }
                Ok(Authentication::Existing(CallerId(identity.hex_id())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&self, _buf: &mut [u8]) -> Result<()> {
            Err(ShortenerError::random_source("device unavailable"))
        }
    }

    fn manager() -> IdentityManager {
        IdentityManager::new(b"test-secret-key").unwrap()
    }

    #[test]
    fn test_issue_shape() {
        let id = manager().issue().unwrap();
        assert_eq!(id.raw_id.len(), RAW_ID_LEN);
        assert_eq!(id.signature.len(), 32);
        assert_eq!(id.hex_id().len(), RAW_ID_LEN * 2);
    }

    #[test]
    fn test_issue_is_random() {
        let m = manager();
        assert_ne!(m.issue().unwrap().raw_id, m.issue().unwrap().raw_id);
    }

    #[test]
    fn test_verify_roundtrip() {
        let m = manager();
        for _ in 0..16 {
            let id = m.issue().unwrap();
            let decoded = m.decode(&m.encode(&id)).unwrap();
            assert!(m.verify(&decoded.raw_id, &decoded.signature));
        }
    }

    #[test]
    fn test_any_byte_flip_fails() {
        let m = manager();
        let id = m.issue().unwrap();

        for i in 0..id.raw_id.len() {
            let mut raw = id.raw_id.clone();
            raw[i] ^= 0x01;
            assert!(!m.verify(&raw, &id.signature), "raw byte {} flip accepted", i);
        }
        for i in 0..id.signature.len() {
            let mut sig = id.signature.clone();
            sig[i] ^= 0x80;
            assert!(!m.verify(&id.raw_id, &sig), "signature byte {} flip accepted", i);
        }
    }

    #[test]
    fn test_truncated_signature_fails() {
        let m = manager();
        let id = m.issue().unwrap();
        assert!(!m.verify(&id.raw_id, &id.signature[..31]));
        assert!(!m.verify(&id.raw_id, &[]));
    }

    #[test]
    fn test_other_key_rejects() {
        let id = manager().issue().unwrap();
        let other = IdentityManager::new(b"another-key").unwrap();
        assert!(!other.verify(&id.raw_id, &id.signature));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            IdentityManager::new(b""),
            Err(ShortenerError::Config(_))
        ));
    }

    #[test]
    fn test_entropy_failure() {
        let m = IdentityManager::with_entropy(b"k", Arc::new(BrokenEntropy)).unwrap();
        assert!(matches!(m.issue(), Err(ShortenerError::RandomSource(_))));
        assert!(matches!(
            m.authenticate(None),
            Err(ShortenerError::RandomSource(_))
        ));
    }

    #[test]
    fn test_authenticate_issues_when_absent() {
        let m = manager();
        let auth = m.authenticate(None).unwrap();
        let Authentication::Issued { caller, credential } = auth else {
            panic!("expected a new identity");
        };
        let again = m.authenticate(Some(&credential)).unwrap();
        assert_eq!(again, Authentication::Existing(caller));
    }

    #[test]
    fn test_authenticate_rejects_forgery() {
        let m = manager();
        let victim = m.issue().unwrap();
        let attacker = m.issue().unwrap();
        let forged = CallerIdentity {
            raw_id: victim.raw_id.clone(),
            signature: attacker.signature.clone(),
        };
        assert!(matches!(
            m.authenticate(Some(&m.encode(&forged))),
            Err(ShortenerError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_authenticate_malformed() {
        let m = manager();
        assert!(matches!(
            m.authenticate(Some("no-separator")),
            Err(ShortenerError::MalformedCredential(_))
        ));
        assert!(matches!(
            m.authenticate(Some("xyz.abc")),
            Err(ShortenerError::CredentialDecode(_))
        ));
    }

    #[test]
    fn test_uppercase_hex_binds_canonical_id() {
        let m = manager();
        let id = m.issue().unwrap();
        let encoded = m.encode(&id);
        let (hex_part, sig_part) = encoded.split_once('.').unwrap();
        let upper = format!("{}.{}", hex_part.to_uppercase(), sig_part);

        let auth = m.authenticate(Some(&upper)).unwrap();
        assert_eq!(auth.caller().as_str(), id.hex_id());
    }
}
