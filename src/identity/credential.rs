//! Credential wire format: `<hex(raw_id)>.<base64url-nopad(signature)>`

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::errors::{Result, ShortenerError};

pub const CREDENTIAL_SEPARATOR: char = '.';

/// A caller's opaque ID together with its MAC
#[derive(Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub raw_id: Vec<u8>,
    pub signature: Vec<u8>,
}

impl CallerIdentity {
    /// Lowercase hex form of the raw ID, the value bound into request scope
    pub fn hex_id(&self) -> String {
        hex::encode(&self.raw_id)
    }
}

// Signatures stay out of logs
impl std::fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("raw_id", &self.hex_id())
            .field("signature", &"<redacted>")
            .finish()
    }
}

pub fn encode(identity: &CallerIdentity) -> String {
    format!(
        "{}{}{}",
        hex::encode(&identity.raw_id),
        CREDENTIAL_SEPARATOR,
        URL_SAFE_NO_PAD.encode(&identity.signature)
    )
}

/// Split and decode a credential. Does not check the signature.
pub fn decode(credential: &str) -> Result<CallerIdentity> {
    let mut parts = credential.split(CREDENTIAL_SEPARATOR);
    let (Some(id_part), Some(sig_part), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ShortenerError::malformed_credential(
            "credential must contain exactly one separator",
        ));
    };

    let raw_id = hex::decode(id_part)
        .map_err(|e| ShortenerError::credential_decode(format!("caller id is not hex: {}", e)))?;
    let signature = URL_SAFE_NO_PAD.decode(sig_part).map_err(|e| {
        ShortenerError::credential_decode(format!("signature is not base64url: {}", e))
    })?;

    Ok(CallerIdentity { raw_id, signature })
}
