//! Transactional soft delete

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait, sea_query::Expr,
};
use tracing::debug;

use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;
use crate::storage::SoftDeleteTxn;

use migration::entities::short_url;

/// A soft-delete transaction. Dropped without commit, it rolls back.
pub struct SeaOrmDeleteTxn {
    txn: DatabaseTransaction,
}

impl SeaOrmDeleteTxn {
    pub async fn begin(db: &DatabaseConnection) -> Result<Self> {
        let txn = db
            .begin()
            .await
            .map_err(|e| ShortenerError::transaction(format!("begin soft delete: {}", e)))?;
        Ok(Self { txn })
    }
}

#[async_trait]
impl SoftDeleteTxn for SeaOrmDeleteTxn {
    async fn soft_delete(&mut self, caller: &CallerId, short_urls: &[String]) -> Result<u64> {
        if short_urls.is_empty() {
            return Ok(0);
        }

        let result = short_url::Entity::update_many()
            .col_expr(short_url::Column::IsDeleted, Expr::value(true))
            .filter(short_url::Column::UserId.eq(caller.as_str()))
            .filter(short_url::Column::ShortUrl.is_in(short_urls.iter().cloned()))
            .exec(&self.txn)
            .await
            .map_err(|e| ShortenerError::transaction(format!("soft delete chunk: {}", e)))?;

        debug!(
            "Soft-deleted {} of {} aliases for caller {}",
            result.rows_affected,
            short_urls.len(),
            caller
        );
        Ok(result.rows_affected)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.txn
            .commit()
            .await
            .map_err(|e| ShortenerError::transaction(format!("commit soft delete: {}", e)))
    }
}
