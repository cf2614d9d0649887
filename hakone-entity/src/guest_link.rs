use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "guest_links")]
pub struct Model {
    /// Public identifier of the guest link (used in URLs)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Free-text label, empty when the link has none
    pub label: String,

    /// When the guest link was created
    pub created_at: ChronoDateTimeUtc,

    /// When the link stops accepting new uploads
    pub url_expires_at: ChronoDateTimeUtc,

    /// Retention of uploaded files in whole days (NULL = never expire)
    pub file_lifetime_days: Option<i32>,

    /// Per-file byte quota (NULL = unlimited)
    pub max_file_bytes: Option<i64>,

    /// Upload count quota (NULL = unlimited)
    pub max_file_uploads: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
