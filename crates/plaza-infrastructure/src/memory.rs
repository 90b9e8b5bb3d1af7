//! In-memory backend.
//!
//! A complete implementation of the three backend traits backed by process
//! memory, for local development and tests. Behaves like the remote
//! service at the contract level: unique interaction edges, foreign-key
//! checks on edge and comment inserts, newest-first feed ordering, and the
//! same error taxonomy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use plaza_core::backend::{
    AuthProvider, Direction, Fields, Filter, Identity, ObjectStore, Projection, Record, RecordId,
    RecordStore, Select, Table, UserId,
};
use plaza_core::error::{PlazaError, Result};

/// Minimum password length accepted by `sign_up`.
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user_id: UserId,
    email: String,
    password: String,
    username: String,
}

#[derive(Debug, Clone)]
struct StoredPost {
    id: RecordId,
    user_id: UserId,
    caption: String,
    image_url: String,
    created_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredComment {
    post_id: String,
    user_id: String,
    content: String,
}

/// In-memory backend implementing all three collaborator traits.
pub struct MemoryBackend {
    accounts: RwLock<Vec<Account>>,
    /// The identity behind the device's stored credential, if any.
    credential: RwLock<Option<Identity>>,
    posts: RwLock<Vec<StoredPost>>,
    likes: RwLock<HashSet<(String, String)>>,
    saves: RwLock<HashSet<(String, String)>>,
    comments: RwLock<Vec<StoredComment>>,
    objects: RwLock<HashMap<String, Vec<u8>>>,
    seq: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            credential: RwLock::new(None),
            posts: RwLock::new(Vec::new()),
            likes: RwLock::new(HashSet::new()),
            saves: RwLock::new(HashSet::new()),
            comments: RwLock::new(Vec::new()),
            objects: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Registers an account without touching the stored credential.
    /// Returns the identity for use in further seeding.
    pub async fn seed_account(&self, email: &str, password: &str) -> Identity {
        let account = Account {
            user_id: UserId::new(format!("user-{}", Uuid::new_v4())),
            email: email.to_string(),
            password: password.to_string(),
            username: username_of(email),
        };
        let identity = Identity::new(account.user_id.clone(), account.email.clone());
        self.accounts.write().await.push(account);
        identity
    }

    /// Stores a post directly, bypassing upload. Returns its id.
    pub async fn seed_post(&self, author: &Identity, caption: &str, image_url: &str) -> RecordId {
        let id = RecordId::new(Uuid::new_v4().to_string());
        let post = StoredPost {
            id: id.clone(),
            user_id: author.user_id.clone(),
            caption: caption.to_string(),
            image_url: image_url.to_string(),
            created_at: Utc::now(),
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
        };
        self.posts.write().await.push(post);
        id
    }

    /// Stores a like edge directly.
    pub async fn seed_like(&self, post_id: &RecordId, user: &UserId) {
        self.likes
            .write()
            .await
            .insert((post_id.as_str().to_string(), user.as_str().to_string()));
    }

    /// Pretends the device holds a credential for `identity`, so
    /// `current_identity` resolves it on the next initialize.
    pub async fn set_credential(&self, identity: Option<Identity>) {
        *self.credential.write().await = identity;
    }

    async fn username_for(&self, user_id: &UserId) -> Option<String> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|account| &account.user_id == user_id)
            .map(|account| account.username.clone())
    }

    async fn feed_rows(&self, viewer: Option<&UserId>, order: Option<&Direction>) -> Vec<Record> {
        let posts = self.posts.read().await;
        let likes = self.likes.read().await;
        let saves = self.saves.read().await;

        let mut ordered: Vec<&StoredPost> = posts.iter().collect();
        ordered.sort_by_key(|post| post.seq);
        if !matches!(order, Some(Direction::Ascending)) {
            ordered.reverse();
        }

        let mut rows = Vec::with_capacity(ordered.len());
        for post in ordered {
            let post_id = post.id.as_str();
            let like_count = likes.iter().filter(|(p, _)| p == post_id).count() as u64;
            let (viewer_has_liked, viewer_has_saved) = match viewer {
                Some(viewer) => {
                    let edge = (post_id.to_string(), viewer.as_str().to_string());
                    (likes.contains(&edge), saves.contains(&edge))
                }
                None => (false, false),
            };
            let author_username = self
                .username_for(&post.user_id)
                .await
                .unwrap_or_else(|| "unknown".to_string());
            rows.push(object(json!({
                "id": post.id,
                "author_username": author_username,
                "image_url": post.image_url,
                "caption": post.caption,
                "created_at": post.created_at.to_rfc3339(),
                "like_count": like_count,
                "viewer_has_liked": viewer_has_liked,
                "viewer_has_saved": viewer_has_saved,
            })));
        }
        rows
    }

    async fn insert_edge(
        &self,
        edges: &RwLock<HashSet<(String, String)>>,
        fields: &Fields,
    ) -> Result<RecordId> {
        let post_id = required_str(fields, "post_id")?;
        let user_id = required_str(fields, "user_id")?;
        if !self
            .posts
            .read()
            .await
            .iter()
            .any(|post| post.id.as_str() == post_id)
        {
            return Err(PlazaError::persist(format!(
                "foreign key violation: no post '{post_id}'"
            )));
        }
        let mut edges = edges.write().await;
        if !edges.insert((post_id.clone(), user_id)) {
            return Err(PlazaError::persist(format!(
                "duplicate edge on post '{post_id}'"
            )));
        }
        Ok(RecordId::new(Uuid::new_v4().to_string()))
    }

    async fn delete_edges(
        &self,
        edges: &RwLock<HashSet<(String, String)>>,
        matches: &Fields,
    ) -> Result<()> {
        let post_id = optional_str(matches, "post_id");
        let user_id = optional_str(matches, "user_id");
        edges.write().await.retain(|(p, u)| {
            let hit = post_id.as_deref().is_none_or(|want| want == p.as_str())
                && user_id.as_deref().is_none_or(|want| want == u.as_str());
            !hit
        });
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .iter()
            .find(|account| account.email == email)
            .ok_or_else(|| PlazaError::auth("invalid login credentials"))?;
        if account.password != password {
            return Err(PlazaError::auth("invalid login credentials"));
        }
        let identity = Identity::new(account.user_id.clone(), account.email.clone());
        drop(accounts);
        *self.credential.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(PlazaError::auth(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        {
            let accounts = self.accounts.read().await;
            if accounts.iter().any(|account| account.email == email) {
                return Err(PlazaError::auth("email already registered"));
            }
        }
        let identity = self.seed_account(email, password).await;
        *self.credential.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn current_identity(&self) -> Result<Option<Identity>> {
        Ok(self.credential.read().await.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(PlazaError::upload("empty object rejected"));
        }
        let path = format!("{bucket}/{key}");
        self.objects.write().await.insert(path.clone(), bytes);
        Ok(format!("memory://{path}"))
    }
}

#[async_trait]
impl RecordStore for MemoryBackend {
    async fn insert(&self, table: Table, fields: Fields) -> Result<RecordId> {
        match table {
            Table::Posts => {
                let user_id = UserId::new(required_str(&fields, "user_id")?);
                if self.username_for(&user_id).await.is_none() {
                    return Err(PlazaError::persist(format!(
                        "foreign key violation: no user '{user_id}'"
                    )));
                }
                let id = RecordId::new(Uuid::new_v4().to_string());
                let post = StoredPost {
                    id: id.clone(),
                    user_id,
                    caption: required_str(&fields, "caption")?,
                    image_url: required_str(&fields, "image_url")?,
                    created_at: Utc::now(),
                    seq: self.seq.fetch_add(1, Ordering::SeqCst),
                };
                self.posts.write().await.push(post);
                Ok(id)
            }
            Table::Likes => self.insert_edge(&self.likes, &fields).await,
            Table::SavedPosts => self.insert_edge(&self.saves, &fields).await,
            Table::Comments => {
                let comment = StoredComment {
                    post_id: required_str(&fields, "post_id")?,
                    user_id: required_str(&fields, "user_id")?,
                    content: required_str(&fields, "content")?,
                };
                if !self
                    .posts
                    .read()
                    .await
                    .iter()
                    .any(|post| post.id.as_str() == comment.post_id)
                {
                    return Err(PlazaError::persist(format!(
                        "foreign key violation: no post '{}'",
                        comment.post_id
                    )));
                }
                self.comments.write().await.push(comment);
                Ok(RecordId::new(Uuid::new_v4().to_string()))
            }
        }
    }

    async fn delete(&self, table: Table, matches: Fields) -> Result<()> {
        match table {
            Table::Likes => self.delete_edges(&self.likes, &matches).await,
            Table::SavedPosts => self.delete_edges(&self.saves, &matches).await,
            Table::Posts => {
                let id = optional_str(&matches, "id");
                self.posts.write().await.retain(|post| {
                    let hit = id.as_deref().is_none_or(|want| want == post.id.as_str());
                    !hit
                });
                Ok(())
            }
            Table::Comments => {
                let post_id = optional_str(&matches, "post_id");
                self.comments.write().await.retain(|comment| {
                    let hit = post_id
                        .as_deref()
                        .is_none_or(|want| want == comment.post_id.as_str());
                    !hit
                });
                Ok(())
            }
        }
    }

    async fn select(&self, query: Select) -> Result<Vec<Record>> {
        match &query.projection {
            Projection::FeedView { viewer } => {
                if query.table != Table::Posts {
                    return Err(PlazaError::query(format!(
                        "feed view is not defined on '{}'",
                        query.table
                    )));
                }
                let direction = query.order.as_ref().map(|order| order.direction);
                Ok(self.feed_rows(viewer.as_ref(), direction.as_ref()).await)
            }
            Projection::All => {
                let rows = match query.table {
                    Table::Posts => {
                        let posts = self.posts.read().await;
                        posts
                            .iter()
                            .map(|post| {
                                object(json!({
                                    "id": post.id,
                                    "user_id": post.user_id,
                                    "caption": post.caption,
                                    "image_url": post.image_url,
                                    "created_at": post.created_at.to_rfc3339(),
                                }))
                            })
                            .collect()
                    }
                    Table::Likes => edge_rows(&self.likes).await,
                    Table::SavedPosts => edge_rows(&self.saves).await,
                    Table::Comments => {
                        let comments = self.comments.read().await;
                        comments
                            .iter()
                            .map(|comment| {
                                object(json!({
                                    "post_id": comment.post_id,
                                    "user_id": comment.user_id,
                                    "content": comment.content,
                                }))
                            })
                            .collect()
                    }
                };
                Ok(apply_filters(rows, &query.filters))
            }
        }
    }
}

async fn edge_rows(edges: &RwLock<HashSet<(String, String)>>) -> Vec<Record> {
    edges
        .read()
        .await
        .iter()
        .map(|(post_id, user_id)| {
            object(json!({
                "post_id": post_id,
                "user_id": user_id,
            }))
        })
        .collect()
}

fn apply_filters(rows: Vec<Record>, filters: &[Filter]) -> Vec<Record> {
    rows.into_iter()
        .filter(|row| {
            filters.iter().all(|filter| match filter {
                Filter::Eq { column, value } => row.get(column) == Some(value),
            })
        })
        .collect()
}

fn object(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("json! object literal"),
    }
}

fn username_of(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

fn required_str(fields: &Fields, column: &str) -> Result<String> {
    fields
        .get(column)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PlazaError::persist(format!("missing column '{column}'")))
}

fn optional_str(fields: &Fields, column: &str) -> Option<String> {
    fields
        .get(column)
        .and_then(Value::as_str)
        .map(str::to_string)
}
