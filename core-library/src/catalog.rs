//! Permission-aware listing of the device's audio.

use crate::models::Track;
use crate::query::filter_by_title;
use bridge_traits::media::MediaLibrary;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Cached view of the host media library.
///
/// The first call to [`tracks`](Self::tracks) asks for permission and
/// enumerates up to `scan_limit` assets. The result, including an empty result
/// after a denial or an enumeration failure, is kept until
/// [`refresh`](Self::refresh).
pub struct MediaCatalog {
    library: Arc<dyn MediaLibrary>,
    scan_limit: usize,
    cache: Mutex<Option<Arc<Vec<Track>>>>,
}

impl MediaCatalog {
    pub fn new(library: Arc<dyn MediaLibrary>, scan_limit: usize) -> Self {
        Self {
            library,
            scan_limit,
            cache: Mutex::new(None),
        }
    }

    /// All device tracks, in enumeration order.
    pub async fn tracks(&self) -> Arc<Vec<Track>> {
        let mut cache = self.cache.lock().await;
        if let Some(tracks) = cache.as_ref() {
            return Arc::clone(tracks);
        }

        let tracks = Arc::new(self.scan().await);
        *cache = Some(Arc::clone(&tracks));
        tracks
    }

    /// Drop the cache and enumerate again.
    pub async fn refresh(&self) -> Arc<Vec<Track>> {
        let mut cache = self.cache.lock().await;
        let tracks = Arc::new(self.scan().await);
        *cache = Some(Arc::clone(&tracks));
        tracks
    }

    /// Tracks whose title contains `query`, case-insensitive.
    pub async fn search(&self, query: &str) -> Vec<Track> {
        let tracks = self.tracks().await;
        filter_by_title(&tracks, query)
    }

    async fn scan(&self) -> Vec<Track> {
        match self.library.request_permission().await {
            Ok(status) if status.is_granted() => {}
            Ok(_) => {
                info!("Media library permission denied, showing no tracks");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %err, "Media library permission request failed");
                return Vec::new();
            }
        }

        match self.library.list_audio_assets(self.scan_limit).await {
            Ok(assets) => {
                let tracks: Vec<Track> = assets
                    .into_iter()
                    .take(self.scan_limit)
                    .map(Track::from)
                    .collect();
                debug!(count = tracks.len(), "Enumerated device audio");
                tracks
            }
            Err(err) => {
                warn!(error = %err, "Failed to enumerate device audio");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::media::{AudioAsset, PermissionStatus};
    use mockall::mock;

    mock! {
        pub Library {}

        #[async_trait]
        impl MediaLibrary for Library {
            async fn request_permission(&self) -> BridgeResult<PermissionStatus>;
            async fn list_audio_assets(&self, limit: usize) -> BridgeResult<Vec<AudioAsset>>;
        }
    }

    fn assets() -> Vec<AudioAsset> {
        vec![
            AudioAsset::new("Intro.mp3", "u1", 30.0),
            AudioAsset::new("Main Theme.mp3", "u2", 200.0),
            AudioAsset::new("outro.mp3", "u3", 45.0),
        ]
    }

    #[tokio::test]
    async fn test_granted_lists_and_caches() {
        let mut library = MockLibrary::new();
        library
            .expect_request_permission()
            .times(1)
            .returning(|| Ok(PermissionStatus::Granted));
        library
            .expect_list_audio_assets()
            .withf(|limit| *limit == 1000)
            .times(1)
            .returning(|_| Ok(assets()));

        let catalog = MediaCatalog::new(Arc::new(library), 1000);

        let first = catalog.tracks().await;
        let second = catalog.tracks().await;
        assert_eq!(first.len(), 3);
        assert_eq!(first[1].title, "Main Theme.mp3");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_denied_yields_empty_without_listing() {
        let mut library = MockLibrary::new();
        library
            .expect_request_permission()
            .times(1)
            .returning(|| Ok(PermissionStatus::Denied));
        library.expect_list_audio_assets().never();

        let catalog = MediaCatalog::new(Arc::new(library), 1000);
        assert!(catalog.tracks().await.is_empty());
        assert!(catalog.search("intro").await.is_empty());
    }

    #[tokio::test]
    async fn test_enumeration_error_degrades_to_empty() {
        let mut library = MockLibrary::new();
        library
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        library
            .expect_list_audio_assets()
            .returning(|_| Err(BridgeError::OperationFailed("media store busy".to_string())));

        let catalog = MediaCatalog::new(Arc::new(library), 10);
        assert!(catalog.tracks().await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rescans() {
        let mut library = MockLibrary::new();
        library
            .expect_request_permission()
            .times(2)
            .returning(|| Ok(PermissionStatus::Granted));
        library
            .expect_list_audio_assets()
            .times(2)
            .returning(|_| Ok(assets()));

        let catalog = MediaCatalog::new(Arc::new(library), 1000);
        catalog.tracks().await;
        assert_eq!(catalog.refresh().await.len(), 3);
    }

    #[tokio::test]
    async fn test_scan_limit_is_enforced() {
        let mut library = MockLibrary::new();
        library
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        // Hosts may ignore the limit; the catalog truncates regardless.
        library
            .expect_list_audio_assets()
            .returning(|_| Ok(assets()));

        let catalog = MediaCatalog::new(Arc::new(library), 2);
        assert_eq!(catalog.tracks().await.len(), 2);
    }

    #[tokio::test]
    async fn test_search() {
        let mut library = MockLibrary::new();
        library
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        library
            .expect_list_audio_assets()
            .returning(|_| Ok(assets()));

        let catalog = MediaCatalog::new(Arc::new(library), 1000);
        let found = catalog.search("THEME").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uri, "u2");
        assert_eq!(catalog.search("").await.len(), 3);
    }
}
