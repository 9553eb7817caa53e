//! Retry of transient database failures
//!
//! Only single statements are retried. A failed transaction is surfaced to
//! the caller and rolled back, never replayed.

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// Why a failed statement is worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientCause {
    Connection,
    Deadlock,
    LockTimeout,
    Busy,
    Serialization,
}

impl TransientCause {
    pub fn label(self) -> &'static str {
        match self {
            TransientCause::Connection => "connection unavailable",
            TransientCause::Deadlock => "deadlock",
            TransientCause::LockTimeout => "lock wait timeout",
            TransientCause::Busy => "database busy",
            TransientCause::Serialization => "serialization conflict",
        }
    }
}

/// Driver error codes: MySQL, PostgreSQL SQLSTATE, SQLite primary codes
const CODE_CAUSES: &[(&str, TransientCause)] = &[
    ("1213", TransientCause::Deadlock),
    ("1205", TransientCause::LockTimeout),
    ("40001", TransientCause::Serialization),
    ("40P01", TransientCause::Deadlock),
    ("5", TransientCause::Busy),
    ("6", TransientCause::Busy),
];

/// Fallback when the driver gives no code; matched lowercase
const MESSAGE_CAUSES: &[(&str, TransientCause)] = &[
    ("deadlock", TransientCause::Deadlock),
    ("lock wait timeout", TransientCause::LockTimeout),
    ("database is locked", TransientCause::Busy),
    ("serialization failure", TransientCause::Serialization),
];

/// `None` means the error is permanent and must not be retried
pub fn transient_cause(err: &DbErr) -> Option<TransientCause> {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => Some(TransientCause::Connection),
        DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime_cause(runtime),
        _ => None,
    }
}

fn runtime_cause(err: &RuntimeErr) -> Option<TransientCause> {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            let code = sqlx_err
                .as_database_error()
                .and_then(|db_err| db_err.code());
            match code {
                Some(code) => {
                    let code: &str = &code;
                    lookup(CODE_CAUSES, |known| known == code)
                }
                None => cause_from_message(&sqlx_err.to_string()),
            }
        }
        RuntimeErr::Internal(msg) => cause_from_message(msg),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn cause_from_message(msg: &str) -> Option<TransientCause> {
    let msg = msg.to_lowercase();
    lookup(MESSAGE_CAUSES, |needle| msg.contains(needle))
}

fn lookup(
    table: &[(&str, TransientCause)],
    matches: impl Fn(&str) -> bool,
) -> Option<TransientCause> {
    table
        .iter()
        .find(|(key, _)| matches(key))
        .map(|(_, cause)| *cause)
}

/// Backoff policy
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `n` (1-based): doubling from the base, capped, plus up to 25% jitter
    fn delay_before(&self, n: u32) -> Duration {
        let doubled = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(n.saturating_sub(1)));
        let capped = doubled.min(self.max_delay_ms);
        let jitter = rand::random_range(0..=capped / 4);
        Duration::from_millis(capped.saturating_add(jitter))
    }

    /// One delay per permitted retry
    fn delays(self) -> impl Iterator<Item = Duration> {
        (1..=self.max_retries).map(move |n| self.delay_before(n))
    }
}

/// Run `operation`, retrying transient failures according to `policy`
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut delays = policy.delays();
    let mut retries = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} succeeded after {} retries", operation_name, retries);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let Some(cause) = transient_cause(&err) else {
            return Err(err);
        };
        let Some(delay) = delays.next() else {
            warn!(
                "{} still failing ({}) after {} retries, giving up",
                operation_name,
                cause.label(),
                retries
            );
            return Err(err);
        };

        retries += 1;
        warn!(
            "{} hit {} ({}); retry {}/{} in {:?}",
            operation_name,
            cause.label(),
            err,
            retries,
            policy.max_retries,
            delay
        );
        sleep(delay).await;
    }
}
