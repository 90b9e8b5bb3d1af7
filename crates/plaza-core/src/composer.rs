//! Post composition: draft state and submission.

use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{ObjectStore, RecordId, RecordStore, Table, fields};
use crate::error::Result;
use crate::session::SessionStore;

/// Bucket holding uploaded post images.
const POST_BUCKET: &str = "posts";

/// Fallback extension for attachments without one.
const DEFAULT_EXTENSION: &str = "bin";

/// An image attached to a draft.
///
/// `preview_url` is a local handle derived at attach time so the rendering
/// layer can show the image before upload; it is revoked (dropped) when the
/// image is detached or the draft cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub preview_url: String,
}

/// Ephemeral draft owned by the composing session, never shared.
///
/// Created on user input, destroyed on successful submit or explicit
/// cancel. A failed submit leaves the draft exactly as it was, so the user
/// may retry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPost {
    pub caption: String,
    image: Option<ImageAttachment>,
}

impl DraftPost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an image, deriving a fresh local preview handle.
    pub fn attach_image(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) {
        self.image = Some(ImageAttachment {
            file_name: file_name.into(),
            bytes,
            preview_url: format!("memory://{}", Uuid::new_v4()),
        });
    }

    /// Detaches the image and revokes its preview handle.
    pub fn detach_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Resets the draft for reuse: caption emptied, image detached,
    /// preview revoked.
    pub fn clear(&mut self) {
        self.caption.clear();
        self.image = None;
    }
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The post record was created.
    Published(RecordId),
    /// A precondition was unmet; nothing was sent to the backend.
    Skipped,
}

/// Validates and submits a new post through the backend.
pub struct PostComposer {
    storage: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    session: Arc<SessionStore>,
}

impl PostComposer {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            storage,
            records,
            session,
        }
    }

    /// Submits `draft` as a new post.
    ///
    /// Preconditions (an attached image, a non-empty trimmed caption, an
    /// authenticated session) are the caller's responsibility to gate;
    /// violating one is a no-op (`SubmitOutcome::Skipped`), not an error.
    ///
    /// On success the draft is cleared for reuse. No feed refresh is
    /// triggered; the caller re-loads the feed to observe the new post.
    ///
    /// # Errors
    ///
    /// `Upload` aborts before anything is persisted. `Persist` aborts
    /// after the upload; the stored object is not rolled back (accepted
    /// orphan risk). Either way the draft is preserved unmodified.
    pub async fn submit(&self, draft: &mut DraftPost) -> Result<SubmitOutcome> {
        let Some(user_id) = self.session.user_id().await else {
            return Ok(SubmitOutcome::Skipped);
        };
        let caption = draft.caption.trim().to_string();
        if caption.is_empty() {
            return Ok(SubmitOutcome::Skipped);
        }
        let Some(image) = draft.image() else {
            return Ok(SubmitOutcome::Skipped);
        };

        let key = storage_key(&image.file_name);
        let image_url = self
            .storage
            .upload(POST_BUCKET, &key, image.bytes.clone())
            .await?;

        let record_id = self
            .records
            .insert(
                Table::Posts,
                fields([
                    ("user_id", serde_json::json!(user_id)),
                    ("caption", serde_json::json!(caption)),
                    ("image_url", serde_json::json!(image_url)),
                ]),
            )
            .await?;

        draft.clear();
        tracing::debug!(record_id = %record_id, "post published");
        Ok(SubmitOutcome::Published(record_id))
    }
}

/// Collision-resistant storage key: random token plus the original file
/// extension, lowercased.
fn storage_key(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{}.{}", Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthProvider, Fields, Identity, Record, Select, UserId};
    use crate::error::PlazaError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticAuth {
        identity: Option<Identity>,
    }

    #[async_trait]
    impl AuthProvider for StaticAuth {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<Identity> {
            unimplemented!()
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<Identity> {
            unimplemented!()
        }

        async fn current_identity(&self) -> Result<Option<Identity>> {
            Ok(self.identity.clone())
        }
    }

    struct CountingStorage {
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for CountingStorage {
        async fn upload(&self, bucket: &str, key: &str, _bytes: Vec<u8>) -> Result<String> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://cdn.example.com/{bucket}/{key}"))
        }
    }

    struct RecordingStore {
        inserts: Mutex<Vec<(Table, Fields)>>,
        reject_insert: bool,
    }

    #[async_trait]
    impl RecordStore for RecordingStore {
        async fn insert(&self, table: Table, fields: Fields) -> Result<RecordId> {
            if self.reject_insert {
                return Err(PlazaError::persist("insert rejected"));
            }
            self.inserts.lock().unwrap().push((table, fields));
            Ok(RecordId::new("post-1"))
        }

        async fn delete(&self, _table: Table, _matches: Fields) -> Result<()> {
            unimplemented!()
        }

        async fn select(&self, _query: Select) -> Result<Vec<Record>> {
            unimplemented!()
        }
    }

    async fn composer(
        identity: Option<Identity>,
        reject_insert: bool,
    ) -> (PostComposer, Arc<CountingStorage>, Arc<RecordingStore>) {
        let storage = Arc::new(CountingStorage {
            uploads: AtomicUsize::new(0),
        });
        let records = Arc::new(RecordingStore {
            inserts: Mutex::new(Vec::new()),
            reject_insert,
        });
        let session = Arc::new(SessionStore::new(Arc::new(StaticAuth { identity })));
        session.initialize().await.unwrap();
        (
            PostComposer::new(storage.clone(), records.clone(), session),
            storage,
            records,
        )
    }

    fn viewer() -> Identity {
        Identity::new(UserId::new("u1"), "u1@example.com")
    }

    fn draft_with_image(caption: &str) -> DraftPost {
        let mut draft = DraftPost::new();
        draft.caption = caption.to_string();
        draft.attach_image("holiday.JPG", vec![0xFF, 0xD8, 0xFF]);
        draft
    }

    #[tokio::test]
    async fn test_empty_caption_skips_before_any_backend_call() {
        let (composer, storage, records) = composer(Some(viewer()), false).await;
        let mut draft = draft_with_image("   ");

        let outcome = composer.submit(&mut draft).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
        assert!(records.inserts.lock().unwrap().is_empty());
        assert!(draft.has_image());
    }

    #[tokio::test]
    async fn test_missing_image_skips() {
        let (composer, storage, _records) = composer(Some(viewer()), false).await;
        let mut draft = DraftPost::new();
        draft.caption = "caption".to_string();

        let outcome = composer.submit(&mut draft).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_anonymous_session_skips() {
        let (composer, storage, _records) = composer(None, false).await;
        let mut draft = draft_with_image("caption");

        let outcome = composer.submit(&mut draft).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_submit_clears_draft() {
        let (composer, storage, records) = composer(Some(viewer()), false).await;
        let mut draft = draft_with_image("  first post  ");

        let outcome = composer.submit(&mut draft).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Published(RecordId::new("post-1")));
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 1);
        assert!(draft.caption.is_empty());
        assert!(!draft.has_image());

        let inserts = records.inserts.lock().unwrap();
        let (table, fields) = &inserts[0];
        assert_eq!(*table, Table::Posts);
        assert_eq!(fields["user_id"], serde_json::json!("u1"));
        assert_eq!(fields["caption"], serde_json::json!("first post"));
        let url = fields["image_url"].as_str().unwrap();
        assert!(url.starts_with("https://cdn.example.com/posts/"));
        assert!(url.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_insert_failure_preserves_draft_for_retry() {
        let (composer, storage, _records) = composer(Some(viewer()), true).await;
        let mut draft = draft_with_image("caption");
        let before = draft.clone();

        let err = composer.submit(&mut draft).await.unwrap_err();
        assert!(err.is_persist());
        assert!(err.is_retryable_submit());
        // Upload happened and is not rolled back; the draft is untouched.
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(draft, before);
    }

    #[test]
    fn test_storage_key_keeps_extension() {
        let key = storage_key("holiday.JPG");
        assert!(key.ends_with(".jpg"));
        assert_eq!(key.len(), 36 + 4);

        let bare = storage_key("noextension");
        assert!(bare.ends_with(".bin"));
    }

    #[test]
    fn test_storage_keys_are_collision_resistant() {
        assert_ne!(storage_key("a.png"), storage_key("a.png"));
    }

    #[test]
    fn test_detach_image_revokes_preview() {
        let mut draft = DraftPost::new();
        draft.attach_image("a.png", vec![1, 2, 3]);
        assert!(draft.image().unwrap().preview_url.starts_with("memory://"));
        draft.detach_image();
        assert!(draft.image().is_none());
    }
}
