//! REST Backend Client
//!
//! HTTP client for the hosted identity (`/auth/v1`) and data (`/rest/v1`)
//! APIs. Calls are made once; failures are returned to the caller, never
//! retried here.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{Backend, BackendError, BackendResult, Filter, Select, SessionStore};
use crate::session::{Session, SignUpRequest, SignUpResponse, User};

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project URL (e.g., "https://xyzcompany.supabase.co")
    pub url: String,
    /// Public anonymous key sent with every request
    pub anon_key: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            request_timeout_ms: 10_000,
        }
    }
}

/// HTTPS implementation of [`Backend`]
pub struct RestBackend {
    client: Client,
    config: BackendConfig,
    session: RwLock<Option<Session>>,
    store: Arc<dyn SessionStore>,
}

impl RestBackend {
    /// Create a client, picking up any session the store already holds
    pub fn new(config: BackendConfig, store: Arc<dyn SessionStore>) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let session = store.load().unwrap_or_else(|e| {
            tracing::warn!("Could not load stored session: {}", e);
            None
        });

        Ok(Self {
            client,
            config,
            session: RwLock::new(session),
            store,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url(), endpoint)
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url(), table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url(), table, query)
        }
    }

    /// Access token of the current session, or the anonymous key
    async fn bearer(&self) -> String {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer().await)
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(&self, builder: RequestBuilder, auth_endpoint: bool) -> BackendResult<Response> {
        let response = builder.send().await.map_err(BackendError::from_transport)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response, auth_endpoint).await)
        }
    }

    async fn set_session(&self, session: Option<Session>) {
        let persisted = match &session {
            Some(s) => self.store.save(s),
            None => self.store.clear(),
        };
        if let Err(e) = persisted {
            tracing::warn!("Could not persist session: {}", e);
        }
        *self.session.write().await = session;
    }

    /// Trade a refresh token for a fresh session
    pub async fn refresh_session(&self, refresh_token: &str) -> BackendResult<Session> {
        let url = self.auth_url("token");
        tracing::debug!("POST {} (refresh)", url);

        let builder = self
            .client
            .post(&url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }));

        let response = self.send(builder, true).await?;
        let token: TokenResponse = response.json().await.map_err(BackendError::from_transport)?;
        let session = token.into_session();
        self.set_session(Some(session.clone())).await;
        Ok(session)
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let url = self.auth_url("token");
        tracing::debug!("POST {} (password)", url);

        let builder = self
            .client
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }));

        let response = self.send(builder, true).await?;
        let token: TokenResponse = response.json().await.map_err(BackendError::from_transport)?;
        let session = token.into_session();
        self.set_session(Some(session.clone())).await;

        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> BackendResult<SignUpResponse> {
        let url = self.auth_url("signup");
        tracing::debug!("POST {}", url);

        let builder = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(request);

        let response = self.send(builder, true).await?;
        let body: Value = response.json().await.map_err(BackendError::from_transport)?;

        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)?;
            let session = token.into_session();
            self.set_session(Some(session.clone())).await;
            return Ok(SignUpResponse {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        // Confirmation pending: the body is the user, sometimes wrapped
        let user_value = body.get("user").cloned().unwrap_or(body);
        let user = serde_json::from_value::<User>(user_value).ok();
        Ok(SignUpResponse {
            user,
            session: None,
        })
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let had_session = self.session.read().await.is_some();
        let result = if had_session {
            let url = self.auth_url("logout");
            tracing::debug!("POST {}", url);
            let builder = self.authorized(self.client.post(&url)).await;
            self.send(builder, true).await.map(|_| ())
        } else {
            Ok(())
        };

        // The local session goes away even if the service call failed
        self.set_session(None).await;
        result
    }

    async fn session(&self) -> BackendResult<Option<Session>> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        match session.refresh_token.as_deref() {
            Some(refresh_token) => match self.refresh_session(refresh_token).await {
                Ok(fresh) => Ok(Some(fresh)),
                Err(e) => {
                    tracing::warn!("Session refresh failed: {}", e);
                    self.set_session(None).await;
                    Ok(None)
                }
            },
            None => {
                self.set_session(None).await;
                Ok(None)
            }
        }
    }

    async fn select(&self, query: &Select) -> BackendResult<Vec<Value>> {
        let url = self.rest_url(&query.table, &query.query_string());
        tracing::debug!("GET {}", url);

        let builder = self.authorized(self.client.get(&url)).await;
        let response = self.send(builder, false).await?;
        rows_from_response(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> BackendResult<Vec<Value>> {
        let url = self.rest_url(table, "");
        tracing::debug!("POST {}", url);

        let builder = self
            .authorized(self.client.post(&url))
            .await
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&row);
        let response = self.send(builder, false).await?;
        rows_from_response(response).await
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> BackendResult<Vec<Value>> {
        let url = self.rest_url(table, &filter.query_pair());
        tracing::debug!("PATCH {}", url);

        let builder = self
            .authorized(self.client.patch(&url))
            .await
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&patch);
        let response = self.send(builder, false).await?;
        rows_from_response(response).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> BackendResult<()> {
        let url = self.rest_url(table, &filter.query_pair());
        tracing::debug!("DELETE {}", url);

        let builder = self.authorized(self.client.delete(&url)).await;
        self.send(builder, false).await?;
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Value) -> BackendResult<Vec<Value>> {
        let url = self.rest_url(table, "");
        tracing::debug!("POST {} (upsert)", url);

        let builder = self
            .authorized(self.client.post(&url))
            .await
            .header("Prefer", PREFER_UPSERT)
            .json(&row);
        let response = self.send(builder, false).await?;
        rows_from_response(response).await
    }
}

// ============================================
// Response handling
// ============================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Representation bodies are arrays; empty bodies mean no rows
async fn rows_from_response(response: Response) -> BackendResult<Vec<Value>> {
    let text = response.text().await.map_err(BackendError::from_transport)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(&text)? {
        Value::Array(rows) => Ok(rows),
        row @ Value::Object(_) => Ok(vec![row]),
        other => Err(BackendError::Decode(format!(
            "expected rows, got {}",
            other
        ))),
    }
}

/// Pull the service's own message out of an error body
fn service_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

async fn error_from_response(response: Response, auth_endpoint: bool) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = service_message(&body, status);

    tracing::warn!(status = status.as_u16(), "Backend call failed: {}", message);

    let is_auth_rejection = matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
    );
    if auth_endpoint && is_auth_rejection {
        BackendError::Auth(message)
    } else {
        BackendError::Api {
            status: status.as_u16(),
            message,
        }
    }
}
