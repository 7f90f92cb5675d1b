use std::future::Future;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{ClientError, Result};
use crate::session::{SessionContext, TokenPair};

#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

/// Exchanges a refresh token at the auth service's refresh endpoint.
pub struct HttpTokenRefresher {
    http: Client,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let response = self
            .http
            .post(&self.url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<TokenPair>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::SessionExpired),
            status => Err(ClientError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// Serializes token refreshes for every request sharing a session.
///
/// When several requests fail with 401 at once, the first one to take the
/// gate performs the refresh; the others wait, then find their stale token
/// already replaced and reuse the new one.
pub struct RefreshCoordinator {
    session: SessionContext,
    refresher: Arc<dyn TokenRefresher>,
    gate: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(session: SessionContext, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            session,
            refresher,
            gate: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Returns an access token newer than `stale_access_token`, refreshing
    /// only if nobody else already did.
    pub async fn refresh(&self, stale_access_token: &str) -> Result<String> {
        let _guard = self.gate.lock().await;

        match self.session.access_token() {
            None => return Err(ClientError::SessionExpired),
            Some(current) if current != stale_access_token => {
                tracing::debug!("Access token already refreshed by a concurrent request");
                return Ok(current);
            }
            Some(_) => {}
        }

        let refresh_token = self
            .session
            .refresh_token()
            .ok_or(ClientError::SessionExpired)?;

        match self.refresher.refresh(&refresh_token).await {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.session.replace(tokens);
                tracing::info!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed, clearing session: {}", e);
                self.session.clear();
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Runs `op` with the current access token. On `Unauthorized` the token is
    /// refreshed and `op` retried exactly once.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let access_token = self
            .session
            .access_token()
            .ok_or(ClientError::NotAuthenticated)?;

        match op(access_token.clone()).await {
            Err(ClientError::Unauthorized) => {
                let fresh = self.refresh(&access_token).await?;
                op(fresh).await
            }
            other => other,
        }
    }
}
