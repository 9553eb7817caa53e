//! Short code generation
//!
//! Codes are drawn uniformly from the configured alphabet. The generator
//! never checks for collisions.

use std::iter;

use crate::config::ShortenerConfig;
use crate::errors::{Result, ShortenerError};

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
    domain: String,
}

impl CodeGenerator {
    /// Fails fast on an empty alphabet
    pub fn new(alphabet: &str, length: usize, domain: impl Into<String>) -> Result<Self> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(ShortenerError::config(
                "short code alphabet must contain at least one character",
            ));
        }
        Ok(Self {
            alphabet,
            length,
            domain: domain.into(),
        })
    }

    pub fn from_config(config: &ShortenerConfig) -> Result<Self> {
        Self::new(&config.alphabet, config.length, config.domain.clone())
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// A bare random code of the configured length
    pub fn random_code(&self) -> String {
        iter::repeat_with(|| self.alphabet[rand::random_range(0..self.alphabet.len())])
            .take(self.length)
            .collect()
    }

    /// A full alias: the domain followed by a random code
    pub fn generate(&self) -> String {
        self.alias_for(&self.random_code())
    }

    /// Full alias for a code; identifiers that already carry the domain pass through
    pub fn alias_for(&self, code: &str) -> String {
        if code.starts_with(&self.domain) {
            code.to_string()
        } else {
            format!("{}{}", self.domain, code)
        }
    }
}
