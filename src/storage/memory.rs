//! Volatile storage backend
//!
//! Keeps every caller's aliases in one map behind a single mutex. Nothing
//! survives a restart and there is no delete path.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{ShortenedUrl, Storage};
use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    urls: Mutex<HashMap<CallerId, Vec<ShortenedUrl>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_url(&self, caller: &CallerId, short_url: &str, original_url: &str) -> Result<()> {
        debug!(
            "Saving alias for caller {}: {} -> {}",
            caller, short_url, original_url
        );
        let entry = ShortenedUrl::new(short_url, original_url);
        self.urls.lock().entry(caller.clone()).or_default().push(entry);
        Ok(())
    }

    async fn urls_by_user(&self, caller: &CallerId) -> Result<Vec<ShortenedUrl>> {
        Ok(self.urls.lock().get(caller).cloned().unwrap_or_default())
    }

    async fn resolve_original(&self, caller: &CallerId, short_url: &str) -> Result<String> {
        let urls = self.urls.lock();
        urls.get(caller)
            .and_then(|list| list.iter().find(|u| u.short_url == short_url))
            .map(|u| u.original_url.clone())
            .ok_or_else(|| {
                ShortenerError::not_found(format!(
                    "alias {} not found for caller {}",
                    short_url, caller
                ))
            })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
