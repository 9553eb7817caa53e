//! Read paths of SeaOrmStorage

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::error;

use super::converters::model_to_shortened;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;
use crate::storage::ShortenedUrl;

use migration::entities::short_url;

impl SeaOrmStorage {
    pub(super) async fn list_for_caller(&self, caller: &CallerId) -> Result<Vec<ShortenedUrl>> {
        let db = &self.db;
        let user_id = caller.as_str();

        let models = retry::with_retry(
            &format!("urls_by_user({})", caller),
            self.retry_policy,
            || async {
                short_url::Entity::find()
                    .filter(short_url::Column::UserId.eq(user_id))
                    .filter(short_url::Column::IsDeleted.eq(false))
                    .order_by_asc(short_url::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| {
            error!("Listing aliases for caller {} failed: {}", caller, e);
            ShortenerError::database_operation(format!("list aliases: {}", e))
        })?;

        Ok(models.into_iter().map(model_to_shortened).collect())
    }

    pub(super) async fn find_original(&self, caller: &CallerId, short: &str) -> Result<String> {
        if caller.as_str().is_empty() {
            return Err(ShortenerError::validation("empty caller id"));
        }
        if short.is_empty() {
            return Err(ShortenerError::validation("empty short url"));
        }

        let db = &self.db;
        let user_id = caller.as_str();

        let found = retry::with_retry(
            &format!("resolve_original({})", short),
            self.retry_policy,
            || async {
                short_url::Entity::find()
                    .filter(short_url::Column::UserId.eq(user_id))
                    .filter(short_url::Column::ShortUrl.eq(short))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| {
            error!("Resolving {} for caller {} failed: {}", short, caller, e);
            ShortenerError::database_operation(format!("resolve alias: {}", e))
        })?;

        match found {
            Some(model) if model.is_deleted => Err(ShortenerError::deleted(format!(
                "alias {} was deleted by caller {}",
                short, caller
            ))),
            Some(model) => Ok(model.original_url),
            None => Err(ShortenerError::not_found(format!(
                "alias {} not found for caller {}",
                short, caller
            ))),
        }
    }
}
