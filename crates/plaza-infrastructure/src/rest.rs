//! REST backend.
//!
//! Implements the three backend traits against a Supabase-shaped HTTP
//! service: GoTrue auth endpoints, object storage, and PostgREST tables.
//! The feed view lives remotely as a stored procedure
//! (`/rest/v1/rpc/feed_view`) taking the viewer as a structured JSON
//! argument, so no identifier is ever spliced into query text.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::RwLock;

use plaza_core::backend::{
    AuthProvider, Direction, Fields, Filter, Identity, ObjectStore, Projection, Record, RecordId,
    RecordStore, Select, Table, UserId,
};
use plaza_core::error::{PlazaError, Result};

use crate::config::BackendConfig;

/// Transport-level request timeout. The core enforces no timeout of its
/// own; this belongs to the collaborator.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Remote implementation of the backend collaborator.
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
    /// Bearer token once a credential session exists.
    access_token: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl ApiErrorBody {
    fn detail(self) -> Option<String> {
        self.message.or(self.msg).or(self.error_description)
    }
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| PlazaError::config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: sanitize_base_url(&config.base_url),
            api_key: config.api_key.clone(),
            access_token: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The bearer sent with data-plane requests: the user's token when
    /// signed in, the anon key otherwise.
    async fn bearer(&self) -> String {
        self.access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    async fn authenticate(&self, path: &str, email: &str, password: &str) -> Result<Identity> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| PlazaError::auth(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PlazaError::auth(error_message(response).await));
        }
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|err| PlazaError::auth(err.to_string()))?;
        *self.access_token.write().await = Some(auth.access_token);
        Ok(Identity::new(UserId::new(auth.user.id), auth.user.email))
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        self.authenticate("/auth/v1/token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        self.authenticate("/auth/v1/signup", email, password).await
    }

    async fn current_identity(&self) -> Result<Option<Identity>> {
        let token = match self.access_token.read().await.clone() {
            Some(token) => token,
            None => return Ok(None),
        };
        let response = self
            .client
            .get(self.endpoint("/auth/v1/user"))
            .header("apikey", &self.api_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|err| PlazaError::query(err.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let user: AuthUser = response
                    .json()
                    .await
                    .map_err(|err| PlazaError::query(err.to_string()))?;
                Ok(Some(Identity::new(UserId::new(user.id), user.email)))
            }
            _ => Err(PlazaError::query(error_message(response).await)),
        }
    }
}

#[async_trait]
impl ObjectStore for RestBackend {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint(&format!("/storage/v1/object/{bucket}/{key}")))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .body(bytes)
            .send()
            .await
            .map_err(|err| PlazaError::upload(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PlazaError::upload(error_message(response).await));
        }
        Ok(self.endpoint(&format!("/storage/v1/object/public/{bucket}/{key}")))
    }
}

#[async_trait]
impl RecordStore for RestBackend {
    async fn insert(&self, table: Table, fields: Fields) -> Result<RecordId> {
        let response = self
            .client
            .post(self.endpoint(&format!("/rest/v1/{}", table.as_ref())))
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer().await)
            .json(&Value::Object(fields))
            .send()
            .await
            .map_err(|err| PlazaError::persist(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PlazaError::persist(error_message(response).await));
        }
        let rows: Vec<Record> = response
            .json()
            .await
            .map_err(|err| PlazaError::persist(err.to_string()))?;
        let id = rows
            .first()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if id.is_empty() {
            // Edge tables have a composite key and return no id column.
            tracing::debug!(table = %table, "insert returned no id column");
        }
        Ok(RecordId::new(id))
    }

    async fn delete(&self, table: Table, matches: Fields) -> Result<()> {
        let params: Vec<(String, String)> = matches
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", scalar(value))))
            .collect();
        let response = self
            .client
            .delete(self.endpoint(&format!("/rest/v1/{}", table.as_ref())))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .query(&params)
            .send()
            .await
            .map_err(|err| PlazaError::persist(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PlazaError::persist(error_message(response).await));
        }
        Ok(())
    }

    async fn select(&self, query: Select) -> Result<Vec<Record>> {
        let response = match &query.projection {
            Projection::FeedView { viewer } => {
                if query.table != Table::Posts {
                    return Err(PlazaError::query(format!(
                        "feed view is not defined on '{}'",
                        query.table
                    )));
                }
                self.client
                    .post(self.endpoint("/rest/v1/rpc/feed_view"))
                    .header("apikey", &self.api_key)
                    .bearer_auth(self.bearer().await)
                    .json(&json!({ "viewer": viewer }))
                    .send()
                    .await
            }
            Projection::All => {
                let mut params: Vec<(String, String)> =
                    vec![("select".to_string(), "*".to_string())];
                for filter in &query.filters {
                    let Filter::Eq { column, value } = filter;
                    params.push((column.clone(), format!("eq.{}", scalar(value))));
                }
                if let Some(order) = &query.order {
                    let direction = match order.direction {
                        Direction::Ascending => "asc",
                        Direction::Descending => "desc",
                    };
                    params.push(("order".to_string(), format!("{}.{direction}", order.column)));
                }
                self.client
                    .get(self.endpoint(&format!("/rest/v1/{}", query.table.as_ref())))
                    .header("apikey", &self.api_key)
                    .bearer_auth(self.bearer().await)
                    .query(&params)
                    .send()
                    .await
            }
        }
        .map_err(|err| PlazaError::query(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PlazaError::query(error_message(response).await));
        }
        response
            .json()
            .await
            .map_err(|err| PlazaError::query(err.to_string()))
    }
}

/// Renders a filter value as its scalar form for a query parameter.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let detail = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(ApiErrorBody::detail);
    match detail {
        Some(detail) => format!("{detail} (HTTP {status})"),
        None => format!("HTTP {status}"),
    }
}

fn sanitize_base_url(base: &str) -> String {
    let mut base = base.to_string();
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("https://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_base_url() {
        assert_eq!(
            sanitize_base_url("https://plaza.example.com/"),
            "https://plaza.example.com"
        );
        assert_eq!(
            sanitize_base_url("plaza.example.com"),
            "https://plaza.example.com"
        );
    }

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(scalar(&json!("u1")), "u1");
        assert_eq!(scalar(&json!(3)), "3");
    }

    #[test]
    fn test_error_body_detail_priority() {
        let body = ApiErrorBody {
            message: Some("first".to_string()),
            msg: Some("second".to_string()),
            error_description: None,
        };
        assert_eq!(body.detail().as_deref(), Some("first"));
    }
}
