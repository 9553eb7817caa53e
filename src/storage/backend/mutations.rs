//! Write paths of SeaOrmStorage

use sea_orm::{EntityTrait, TransactionTrait, sea_query::OnConflict};
use tracing::{error, info, warn};

use super::converters::{new_active_model, row_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;
use crate::storage::PersistedRow;

use migration::entities::short_url;

/// Batch rows only: a second row for the same original URL is skipped
fn keep_first_original() -> OnConflict {
    OnConflict::column(short_url::Column::OriginalUrl)
        .do_nothing()
        .to_owned()
}

impl SeaOrmStorage {
    /// A single save never drops silently: an original URL that is already
    /// stored, by any caller, comes back as `Conflict`.
    pub(super) async fn insert_one(
        &self,
        caller: &CallerId,
        short: &str,
        original: &str,
    ) -> Result<()> {
        let db = &self.db;

        let inserted = retry::with_retry(
            &format!("save_url({})", short),
            self.retry_policy,
            || async {
                short_url::Entity::insert(new_active_model(caller, None, short, original))
                    .on_conflict(keep_first_original())
                    .exec_without_returning(db)
                    .await
            },
        )
        .await
        .map_err(|e| {
            error!("Saving alias {} for caller {} failed: {}", short, caller, e);
            ShortenerError::database_operation(format!("save alias: {}", e))
        })?;

        if inserted == 0 {
            warn!(
                "Original URL already shortened; alias {} for caller {} rejected",
                short, caller
            );
            return Err(ShortenerError::conflict(format!(
                "original URL already shortened, alias {} not stored",
                short
            )));
        }
        Ok(())
    }

    /// One transaction, one insert per row, committed only if every row succeeds
    pub(super) async fn insert_batch(&self, rows: &[PersistedRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.map_err(|e| {
            ShortenerError::transaction(format!("begin batch insert: {}", e))
        })?;

        for (index, row) in rows.iter().enumerate() {
            short_url::Entity::insert(row_to_active_model(row))
                .on_conflict(keep_first_original())
                .exec_without_returning(&txn)
                .await
                .map_err(|e| {
                    error!(
                        "Batch insert for caller {} failed at row {} ({}): {}",
                        row.caller, index, row.correlation_id, e
                    );
                    ShortenerError::transaction(format!("batch insert row {}: {}", index, e))
                })?;
        }

        txn.commit().await.map_err(|e| {
            ShortenerError::transaction(format!("commit batch insert: {}", e))
        })?;

        info!("Batch inserted {} aliases", rows.len());
        Ok(())
    }
}
