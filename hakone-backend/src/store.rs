use async_trait::async_trait;
use hakone_entity::guest_link::{self, Entity as GuestLinkEntity};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set, SqlErr};
use thiserror::Error;

use crate::guest_link::{FileLifetime, GuestLink, GuestLinkLabel, MaxFileBytes, MaxFileUploads};
use crate::guest_link_id::GuestLinkId;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("guest link {0} not found")]
    NotFound(GuestLinkId),

    #[error("guest link {0} already exists")]
    AlreadyExists(GuestLinkId),

    #[error("guest link {id} has an invalid stored value: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Persistence operations the guest link service relies on.
///
/// Implementations keep "not found" and "already exists" distinct from
/// other failures; callers decide what those mean.
#[async_trait]
pub trait GuestLinkStore: Send + Sync {
    /// Fails with [`StoreError::AlreadyExists`] if the ID is taken
    async fn insert(&self, link: &GuestLink) -> Result<(), StoreError>;

    async fn get(&self, id: &GuestLinkId) -> Result<GuestLink, StoreError>;

    /// Fails with [`StoreError::NotFound`] if nothing was deleted
    async fn delete(&self, id: &GuestLinkId) -> Result<(), StoreError>;

    /// All guest links, newest first
    async fn list(&self) -> Result<Vec<GuestLink>, StoreError>;
}

/// Guest link store backed by a sea-orm connection
#[derive(Clone)]
pub struct SeaOrmGuestLinkStore {
    db: DatabaseConnection,
}

impl SeaOrmGuestLinkStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GuestLinkStore for SeaOrmGuestLinkStore {
    async fn insert(&self, link: &GuestLink) -> Result<(), StoreError> {
        let model = to_active_model(link)?;

        match GuestLinkEntity::insert(model).exec_without_returning(&self.db).await {
            Ok(_) => {
                tracing::debug!("💾 Stored guest link {}", link.id);
                Ok(())
            }
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(StoreError::AlreadyExists(link.id.clone()))
                }
                _ => Err(StoreError::Database(e)),
            },
        }
    }

    async fn get(&self, id: &GuestLinkId) -> Result<GuestLink, StoreError> {
        let model = GuestLinkEntity::find_by_id(id.as_str())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        from_model(model)
    }

    async fn delete(&self, id: &GuestLinkId) -> Result<(), StoreError> {
        let result = GuestLinkEntity::delete_by_id(id.as_str()).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        tracing::debug!("🗑️  Deleted guest link row {}", id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<GuestLink>, StoreError> {
        GuestLinkEntity::find()
            .order_by_desc(guest_link::Column::CreatedAt)
            .order_by_asc(guest_link::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(from_model)
            .collect()
    }
}

fn to_active_model(link: &GuestLink) -> Result<guest_link::ActiveModel, StoreError> {
    let corrupt = |reason: &str| StoreError::CorruptRecord {
        id: link.id.to_string(),
        reason: reason.to_string(),
    };

    let file_lifetime_days = link
        .file_lifetime
        .as_days()
        .map(i32::try_from)
        .transpose()
        .map_err(|_| corrupt("file lifetime does not fit the days column"))?;
    let max_file_bytes = link
        .max_file_bytes
        .limit()
        .map(i64::try_from)
        .transpose()
        .map_err(|_| corrupt("byte quota does not fit the bytes column"))?;
    let max_file_uploads = link
        .max_file_uploads
        .limit()
        .map(i32::try_from)
        .transpose()
        .map_err(|_| corrupt("upload quota does not fit the uploads column"))?;

    Ok(guest_link::ActiveModel {
        id: Set(link.id.to_string()),
        label: Set(link.label.as_str().to_string()),
        created_at: Set(link.created),
        url_expires_at: Set(link.url_expires),
        file_lifetime_days: Set(file_lifetime_days),
        max_file_bytes: Set(max_file_bytes),
        max_file_uploads: Set(max_file_uploads),
    })
}

fn from_model(model: guest_link::Model) -> Result<GuestLink, StoreError> {
    let corrupt = |reason: &str| StoreError::CorruptRecord {
        id: model.id.clone(),
        reason: reason.to_string(),
    };

    let id = GuestLinkId::parse(&model.id).map_err(|_| corrupt("malformed ID"))?;
    let label =
        GuestLinkLabel::new(model.label.as_str()).ok_or_else(|| corrupt("label too long"))?;

    let file_lifetime = match model.file_lifetime_days {
        None => FileLifetime::Infinite,
        Some(days) => u32::try_from(days)
            .ok()
            .and_then(FileLifetime::in_days)
            .ok_or_else(|| corrupt("invalid file lifetime"))?,
    };
    let max_file_bytes = match model.max_file_bytes {
        None => MaxFileBytes::Unlimited,
        Some(bytes) => u64::try_from(bytes)
            .ok()
            .and_then(MaxFileBytes::bounded)
            .ok_or_else(|| corrupt("invalid byte quota"))?,
    };
    let max_file_uploads = match model.max_file_uploads {
        None => MaxFileUploads::Unlimited,
        Some(count) => u32::try_from(count)
            .ok()
            .and_then(MaxFileUploads::bounded)
            .ok_or_else(|| corrupt("invalid upload quota"))?,
    };

    Ok(GuestLink {
        id,
        label,
        created: model.created_at,
        url_expires: model.url_expires_at,
        file_lifetime,
        max_file_bytes,
        max_file_uploads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;
    use crate::guest_link::NewGuestLink;
    use chrono::{DateTime, Utc};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_link(id: &str) -> GuestLink {
        NewGuestLink {
            label: GuestLinkLabel::new("For my good pal, Maurice").unwrap(),
            url_expires: at("2030-01-02T03:04:25Z"),
            file_lifetime: FileLifetime::in_days(30).unwrap(),
            max_file_bytes: MaxFileBytes::bounded(1_048_576).unwrap(),
            max_file_uploads: MaxFileUploads::bounded(1).unwrap(),
        }
        .into_guest_link(GuestLinkId::parse(id).unwrap(), at("2024-06-01T00:00:00Z"))
    }

    async fn test_store() -> SeaOrmGuestLinkStore {
        SeaOrmGuestLinkStore::new(connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trips() {
        let store = test_store().await;
        let link = sample_link("abcdefgh23456789");

        store.insert(&link).await.unwrap();
        assert_eq!(store.get(&link.id).await.unwrap(), link);
    }

    #[tokio::test]
    async fn test_unlimited_link_round_trips() {
        let store = test_store().await;
        let mut link = sample_link("abcdefgh23456789");
        link.label = GuestLinkLabel::default();
        link.file_lifetime = FileLifetime::Infinite;
        link.max_file_bytes = MaxFileBytes::Unlimited;
        link.max_file_uploads = MaxFileUploads::Unlimited;

        store.insert(&link).await.unwrap();
        assert_eq!(store.get(&link.id).await.unwrap(), link);
    }

    #[tokio::test]
    async fn test_duplicate_insert_reports_already_exists() {
        let store = test_store().await;
        let link = sample_link("abcdefgh23456789");

        store.insert(&link).await.unwrap();
        let err = store.insert(&link).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == link.id));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_reports_not_found() {
        let store = test_store().await;
        let id = GuestLinkId::parse("abcdefgh23456789").unwrap();

        assert!(matches!(
            store.get(&id).await,
            Err(StoreError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_delete_is_strict_about_missing_rows() {
        let store = test_store().await;
        let link = sample_link("abcdefgh23456789");
        store.insert(&link).await.unwrap();

        store.delete(&link.id).await.unwrap();
        assert!(matches!(
            store.delete(&link.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.get(&link.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = test_store().await;
        let mut older = sample_link("aaaaaaaaaaaaaaaa");
        older.created = at("2024-01-01T00:00:00Z");
        let mut newer = sample_link("bbbbbbbbbbbbbbbb");
        newer.created = at("2024-02-01T00:00:00Z");

        store.insert(&older).await.unwrap();
        store.insert(&newer).await.unwrap();

        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|link| link.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let store = test_store().await;
        let row = guest_link::ActiveModel {
            id: Set("abcdefgh23456789".to_string()),
            label: Set(String::new()),
            created_at: Set(at("2024-06-01T00:00:00Z")),
            url_expires_at: Set(at("2030-01-02T03:04:25Z")),
            file_lifetime_days: Set(None),
            max_file_bytes: Set(Some(0)),
            max_file_uploads: Set(None),
        };
        GuestLinkEntity::insert(row)
            .exec_without_returning(&store.db)
            .await
            .unwrap();

        let id = GuestLinkId::parse("abcdefgh23456789").unwrap();
        assert!(matches!(
            store.get(&id).await,
            Err(StoreError::CorruptRecord { .. })
        ));
    }
}
