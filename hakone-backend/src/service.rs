use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::guest_link::{GuestLink, GuestLinkStatus};
use crate::guest_link_id::{GuestLinkId, IdGenerator};
use crate::store::{GuestLinkStore, StoreError};
use crate::validation::parse_guest_link_request;

/// Creates, looks up and deletes guest links.
///
/// Holds no per-request state; clones share the same collaborators.
#[derive(Clone)]
pub struct GuestLinkService {
    store: Arc<dyn GuestLinkStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl GuestLinkService {
    pub fn new(
        store: Arc<dyn GuestLinkStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { store, clock, ids }
    }

    /// Validate a raw creation request and persist the new link
    pub async fn create(&self, body: &[u8]) -> Result<GuestLinkId> {
        let request = parse_guest_link_request(body)
            .inspect_err(|e| tracing::debug!("Rejected guest link request: {}", e))?;

        let link = request.into_guest_link(self.ids.generate(), self.clock.now());
        self.store.insert(&link).await?;

        tracing::info!(
            "🔗 Created guest link {} (expires {}, file lifetime {})",
            link.id,
            link.url_expires,
            link.file_lifetime.to_wire()
        );

        Ok(link.id)
    }

    pub async fn get(&self, raw_id: &str) -> Result<GuestLink> {
        let id = GuestLinkId::parse(raw_id)?;
        tracing::debug!("Looking up guest link {}", id);

        Ok(self.store.get(&id).await?)
    }

    pub async fn list(&self) -> Result<Vec<GuestLink>> {
        Ok(self.store.list().await?)
    }

    /// Delete a guest link. Deleting a link that does not exist is not an
    /// error; only a malformed ID is rejected.
    ///
    /// Files already uploaded through the link are left in place.
    pub async fn delete(&self, raw_id: &str) -> Result<()> {
        let id = GuestLinkId::parse(raw_id)?;

        match self.store.delete(&id).await {
            Ok(()) => {
                tracing::info!("🗑️  Deleted guest link {}", id);
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                tracing::warn!("Guest link {} was already absent, nothing to delete", id);
                Ok(())
            }
            Err(e) => Err(AppError::from(e)),
        }
    }

    /// Lifecycle state of `link` right now
    pub fn status(&self, link: &GuestLink) -> GuestLinkStatus {
        link.status_at(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::connect_in_memory;
    use crate::guest_link::{FileLifetime, MaxFileBytes, MaxFileUploads};
    use crate::guest_link_id::RandomIdGenerator;
    use crate::store::SeaOrmGuestLinkStore;
    use crate::validation::ValidationError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use sea_orm::DbErr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    const NOW: &str = "2024-06-01T12:00:00Z";

    /// Always hands out the same identifier
    struct FixedIdGenerator(&'static str);

    impl IdGenerator for FixedIdGenerator {
        fn generate(&self) -> GuestLinkId {
            GuestLinkId::parse(self.0).unwrap()
        }
    }

    /// Wraps a store and counts how often it is reached
    struct CountingStore {
        inner: SeaOrmGuestLinkStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn touch(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl GuestLinkStore for CountingStore {
        async fn insert(&self, link: &GuestLink) -> std::result::Result<(), StoreError> {
            self.touch();
            self.inner.insert(link).await
        }

        async fn get(&self, id: &GuestLinkId) -> std::result::Result<GuestLink, StoreError> {
            self.touch();
            self.inner.get(id).await
        }

        async fn delete(&self, id: &GuestLinkId) -> std::result::Result<(), StoreError> {
            self.touch();
            self.inner.delete(id).await
        }

        async fn list(&self) -> std::result::Result<Vec<GuestLink>, StoreError> {
            self.touch();
            self.inner.list().await
        }
    }

    /// Rejects every write as if the database were unreachable
    struct UnavailableStore {
        inner: SeaOrmGuestLinkStore,
    }

    fn unavailable() -> StoreError {
        StoreError::Database(DbErr::Custom("connection refused".to_string()))
    }

    #[async_trait]
    impl GuestLinkStore for UnavailableStore {
        async fn insert(&self, _link: &GuestLink) -> std::result::Result<(), StoreError> {
            Err(unavailable())
        }

        async fn get(&self, id: &GuestLinkId) -> std::result::Result<GuestLink, StoreError> {
            self.inner.get(id).await
        }

        async fn delete(&self, _id: &GuestLinkId) -> std::result::Result<(), StoreError> {
            Err(unavailable())
        }

        async fn list(&self) -> std::result::Result<Vec<GuestLink>, StoreError> {
            self.inner.list().await
        }
    }

    async fn unavailable_service() -> GuestLinkService {
        let store = UnavailableStore {
            inner: SeaOrmGuestLinkStore::new(connect_in_memory().await.unwrap()),
        };
        GuestLinkService::new(
            Arc::new(store),
            Arc::new(FixedClock(at(NOW))),
            Arc::new(RandomIdGenerator),
        )
    }

    async fn counting_store() -> Arc<CountingStore> {
        Arc::new(CountingStore {
            inner: SeaOrmGuestLinkStore::new(connect_in_memory().await.unwrap()),
            calls: AtomicUsize::new(0),
        })
    }

    fn service_with(store: Arc<CountingStore>, ids: Arc<dyn IdGenerator>) -> GuestLinkService {
        GuestLinkService::new(store, Arc::new(FixedClock(at(NOW))), ids)
    }

    async fn test_service() -> (GuestLinkService, Arc<CountingStore>) {
        let store = counting_store().await;
        (
            service_with(store.clone(), Arc::new(RandomIdGenerator)),
            store,
        )
    }

    const MINIMAL_REQUEST: &str = r#"{
        "label": null,
        "urlExpirationTime": "2030-01-02T03:04:25Z",
        "fileLifetime": "876000h0m0s",
        "maxFileBytes": null,
        "maxFileUploads": null
    }"#;

    #[tokio::test]
    async fn test_create_assigns_id_and_creation_time() {
        let (service, _) = test_service().await;

        let id = service.create(MINIMAL_REQUEST.as_bytes()).await.unwrap();
        let link = service.get(id.as_str()).await.unwrap();

        assert_eq!(link.id, id);
        assert_eq!(link.created, at(NOW));
        assert!(link.label.is_empty());
        assert_eq!(link.url_expires, at("2030-01-02T03:04:25Z"));
        assert_eq!(link.file_lifetime, FileLifetime::Infinite);
        assert_eq!(link.max_file_bytes, MaxFileBytes::Unlimited);
        assert_eq!(link.max_file_uploads, MaxFileUploads::Unlimited);
    }

    #[tokio::test]
    async fn test_invalid_request_persists_nothing() {
        let (service, store) = test_service().await;

        let err = service
            .create(br#"{"urlExpirationTime": "2030-01-02T03:04:25Z", "fileLifetime": "24h", "maxFileBytes": 0}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.calls(), 0);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_id_collision_is_an_internal_error() {
        let store = counting_store().await;
        let service = service_with(store, Arc::new(FixedIdGenerator("abcdefgh23456789")));

        service.create(MINIMAL_REQUEST.as_bytes()).await.unwrap();
        let err = service.create(MINIMAL_REQUEST.as_bytes()).await.unwrap_err();

        assert!(matches!(err, AppError::IdCollision(_)));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (service, _) = test_service().await;
        let id = service.create(MINIMAL_REQUEST.as_bytes()).await.unwrap();

        service.delete(id.as_str()).await.unwrap();
        service.delete(id.as_str()).await.unwrap();

        assert!(matches!(
            service.get(id.as_str()).await,
            Err(AppError::GuestLinkNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_never_created_link_succeeds() {
        let (service, store) = test_service().await;

        service.delete("abcdefgh23456789").await.unwrap();
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_propagates_store_failure() {
        let service = unavailable_service().await;

        let err = service.delete("abcdefgh23456789").await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(DbErr::Custom(_))));
    }

    #[tokio::test]
    async fn test_create_propagates_store_failure() {
        let service = unavailable_service().await;

        let err = service.create(MINIMAL_REQUEST.as_bytes()).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(DbErr::Custom(_))));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_id_never_reaches_store() {
        let (service, store) = test_service().await;

        let delete_err = service.delete("i-am-an-invalid-link").await.unwrap_err();
        let get_err = service.get("i-am-an-invalid-link").await.unwrap_err();

        for err in [delete_err, get_err] {
            assert!(matches!(
                err,
                AppError::Validation(ValidationError::InvalidGuestLinkId(_))
            ));
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let (service, _) = test_service().await;

        assert!(matches!(
            service.get("abcdefgh23456789").await,
            Err(AppError::GuestLinkNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_status_follows_clock() {
        let store = counting_store().await;
        let service = service_with(store.clone(), Arc::new(RandomIdGenerator));
        let id = service
            .create(br#"{"urlExpirationTime": "2024-06-01T12:00:00Z", "fileLifetime": "24h"}"#)
            .await
            .unwrap();
        let link = service.get(id.as_str()).await.unwrap();

        // Expiring exactly at the clock's instant is already expired
        assert_eq!(service.status(&link), GuestLinkStatus::Expired);

        let earlier = GuestLinkService::new(
            store,
            Arc::new(FixedClock(at("2024-06-01T11:59:59Z"))),
            Arc::new(RandomIdGenerator),
        );
        assert_eq!(earlier.status(&link), GuestLinkStatus::Active);
    }
}
