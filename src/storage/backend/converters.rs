use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};

use crate::identity::CallerId;
use crate::storage::{PersistedRow, ShortenedUrl};
use migration::entities::short_url;

pub fn model_to_shortened(model: short_url::Model) -> ShortenedUrl {
    ShortenedUrl {
        short_url: model.short_url,
        original_url: model.original_url,
    }
}

/// A fresh, not-deleted row; `id` is assigned by the database
pub fn new_active_model(
    caller: &CallerId,
    correlation_id: Option<String>,
    short_url: &str,
    original_url: &str,
) -> short_url::ActiveModel {
    short_url::ActiveModel {
        id: NotSet,
        user_id: Set(caller.as_str().to_string()),
        correlation_id: Set(correlation_id),
        original_url: Set(original_url.to_string()),
        short_url: Set(short_url.to_string()),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
    }
}

pub fn row_to_active_model(row: &PersistedRow) -> short_url::ActiveModel {
    new_active_model(
        &row.caller,
        Some(row.correlation_id.clone()),
        &row.short_url,
        &row.original_url,
    )
}
