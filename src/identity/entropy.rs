//! Randomness used to mint caller IDs

use rand::RngExt;

use crate::errors::Result;

/// Source of cryptographically secure random bytes.
///
/// A failing source aborts identity issuance; it is never retried.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// OS-seeded thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl EntropySource for ThreadRngSource {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        rand::rng().fill(buf);
        Ok(())
    }
}
