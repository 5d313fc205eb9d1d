//! Remote background resolution
//!
//! Backgrounds persisted by name carry no file. The target image is found by searching
//! the backend for the name; backgrounds migrated from the legacy protocol may also
//! carry a remote file id, which is tried first and dropped once the backend stops
//! serving it.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::storage::KeyValueStore;

use super::{persist, Background, BackgroundKind};

/// File handle returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: i64,
    pub remote_id: Option<String>,
    pub local_path: Option<PathBuf>,
    /// Downloaded and still present on disk
    pub is_available: bool,
    pub mini_thumbnail: Option<Vec<u8>>,
}

/// Background record as the backend describes it
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBackground {
    pub name: String,
    pub kind: BackgroundKind,
    pub is_vector: bool,
    pub document: Option<RemoteFile>,
    pub thumbnail: Option<RemoteFile>,
}

impl RemoteBackground {
    pub fn into_background(self, account_id: i32) -> Background {
        Background::from_remote(account_id, self.name, self.kind, self.is_vector, self.document)
    }
}

/// Backend operations needed to display remote backgrounds
#[async_trait]
pub trait BackgroundFetcher: Send + Sync {
    /// Look a background up by its content name
    async fn search_background(&self, name: &str) -> Result<RemoteBackground, FetchError>;

    /// Fetch a file by its persistent remote id
    async fn get_remote_file(&self, remote_id: &str) -> Result<RemoteFile, FetchError>;
}

fn needs_remote_image(background: &Background) -> bool {
    matches!(
        background.kind(),
        BackgroundKind::Pattern { .. } | BackgroundKind::Wallpaper { .. }
    ) && !background.name().is_empty()
}

/// Resolve the full-size file of `background`, stored in `usage`.
///
/// A document delivered with the background wins. Otherwise the legacy remote id is
/// tried; if the backend no longer serves it, the id is removed from the slot and the
/// lookup falls back to a search by name.
pub async fn resolve_target(
    fetcher: &dyn BackgroundFetcher,
    store: &dyn KeyValueStore,
    background: &mut Background,
    usage: i32,
) -> Result<RemoteFile, FetchError> {
    if !needs_remote_image(background) {
        return Err(FetchError::NotRemote);
    }
    if let Some(document) = background.document() {
        return Ok(document.clone());
    }

    if let Some(remote_id) = background.legacy_remote_id().map(str::to_string) {
        match fetcher.get_remote_file(&remote_id).await {
            Ok(file) if file.is_available => {
                debug!("Resolved {} through legacy remote id", background.name());
                return Ok(file);
            }
            Ok(_) | Err(_) => {
                warn!(
                    "Legacy remote id of {} is no longer served, searching by name",
                    background.name()
                );
                if let Err(e) =
                    persist::forget_legacy_remote_id(store, background.account_id(), usage)
                {
                    warn!("Failed to drop legacy remote id: {}", e);
                }
                background.set_legacy_remote_id(None);
            }
        }
    }

    let found = fetcher.search_background(background.name()).await?;
    match found.document {
        Some(document) => {
            background.set_document(Some(document.clone()));
            Ok(document)
        }
        None => Err(FetchError::Inaccessible("Document is inaccessible".into())),
    }
}

/// Resolve the preview file of `background` by name
pub async fn resolve_preview(
    fetcher: &dyn BackgroundFetcher,
    background: &Background,
) -> Result<RemoteFile, FetchError> {
    if !needs_remote_image(background) {
        return Err(FetchError::NotRemote);
    }
    let found = fetcher.search_background(background.name()).await?;
    found
        .thumbnail
        .ok_or_else(|| FetchError::Inaccessible("Document preview is inaccessible".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::legacy;
    use crate::storage::MemoryStore;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockFetcher {
        backgrounds: HashMap<String, RemoteBackground>,
        files: HashMap<String, RemoteFile>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BackgroundFetcher for MockFetcher {
        async fn search_background(&self, name: &str) -> Result<RemoteBackground, FetchError> {
            self.calls.lock().push(format!("search:{}", name));
            self.backgrounds
                .get(name)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(name.to_string()))
        }

        async fn get_remote_file(&self, remote_id: &str) -> Result<RemoteFile, FetchError> {
            self.calls.lock().push(format!("file:{}", remote_id));
            self.files
                .get(remote_id)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(remote_id.to_string()))
        }
    }

    fn file(id: i64) -> RemoteFile {
        RemoteFile {
            id,
            is_available: true,
            ..RemoteFile::default()
        }
    }

    fn remote(name: &str, document: Option<RemoteFile>) -> RemoteBackground {
        RemoteBackground {
            name: name.to_string(),
            kind: BackgroundKind::Wallpaper {
                is_blurred: false,
                is_moving: false,
            },
            is_vector: false,
            document,
            thumbnail: Some(file(99)),
        }
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let mut fetcher = MockFetcher::default();
        fetcher
            .backgrounds
            .insert("sky".into(), remote("sky", Some(file(1))));
        let store = MemoryStore::new();
        let mut background = Background::new_unknown(0, "sky");

        let resolved = resolve_target(&fetcher, &store, &mut background, 0)
            .await
            .unwrap();
        assert_eq!(resolved.id, 1);
        assert_eq!(background.document().map(|d| d.id), Some(1));

        // Cached on the background now
        resolve_target(&fetcher, &store, &mut background, 0)
            .await
            .unwrap();
        assert_eq!(fetcher.calls.lock().len(), 1);

        let preview = resolve_preview(&fetcher, &background).await.unwrap();
        assert_eq!(preview.id, 99);
    }

    #[tokio::test]
    async fn test_stale_legacy_remote_id_is_dropped() {
        let cats = legacy::background_for_legacy_wallpaper_id(legacy::ID_CATS_BLUE).unwrap();
        let mut fetcher = MockFetcher::default();
        fetcher
            .backgrounds
            .insert(cats.into(), remote(cats, Some(file(7))));
        fetcher.files.insert(
            "stale".into(),
            RemoteFile {
                is_available: false,
                ..file(3)
            },
        );

        let store = MemoryStore::new();
        let mut background = Background::new_legacy(0, legacy::ID_CATS_BLUE).unwrap();
        background.set_legacy_remote_id(Some("stale".into()));
        persist::save(&store, &background, 1).unwrap();
        assert_eq!(
            store.get_string("wallpaper_dark_remote_id").unwrap(),
            Some("stale".into())
        );

        let resolved = resolve_target(&fetcher, &store, &mut background, 1)
            .await
            .unwrap();
        assert_eq!(resolved.id, 7);
        assert_eq!(background.legacy_remote_id(), None);
        assert_eq!(store.get_string("wallpaper_dark_remote_id").unwrap(), None);
        assert_eq!(
            *fetcher.calls.lock(),
            vec!["file:stale".to_string(), format!("search:{}", cats)]
        );
    }

    #[tokio::test]
    async fn test_live_legacy_remote_id_wins() {
        let mut fetcher = MockFetcher::default();
        fetcher.files.insert("live".into(), file(5));
        let store = MemoryStore::new();
        let mut background = Background::new_legacy(0, legacy::ID_CITY).unwrap();
        background.set_legacy_remote_id(Some("live".into()));

        let resolved = resolve_target(&fetcher, &store, &mut background, 0)
            .await
            .unwrap();
        assert_eq!(resolved.id, 5);
        assert_eq!(background.legacy_remote_id(), Some("live"));
    }

    #[tokio::test]
    async fn test_failures_are_typed() {
        let mut fetcher = MockFetcher::default();
        fetcher.backgrounds.insert("bare".into(), remote("bare", None));
        let store = MemoryStore::new();

        let mut missing = Background::new_unknown(0, "missing");
        assert_eq!(
            resolve_target(&fetcher, &store, &mut missing, 0).await,
            Err(FetchError::NotFound("missing".into()))
        );

        let mut bare = Background::new_unknown(0, "bare");
        assert!(matches!(
            resolve_target(&fetcher, &store, &mut bare, 0).await,
            Err(FetchError::Inaccessible(_))
        ));

        let mut solid = Background::new_solid(0, 0xff000000);
        assert_eq!(
            resolve_target(&fetcher, &store, &mut solid, 0).await,
            Err(FetchError::NotRemote)
        );
    }
}
