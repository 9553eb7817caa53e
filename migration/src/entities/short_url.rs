use sea_orm::entity::prelude::*;

/// One alias owned by one caller. Rows are never removed, only flagged.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "short_urls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub correlation_id: Option<String>,
    #[sea_orm(column_type = "Text", unique)]
    pub original_url: String,
    pub short_url: String,
    pub is_deleted: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
