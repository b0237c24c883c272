pub mod dto;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode, header, request::Parts};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::IdentityMode;
use crate::error::AppError;
use crate::state::AppState;

pub use dto::Identity;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the identity behind an incoming request.
///
/// `Ok(None)` means the request is anonymous; `Err` means the provider
/// itself failed and the request cannot be judged either way.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn current_user(&self, headers: &HeaderMap) -> Result<Option<Identity>, AppError>;
}

pub fn resolver_from_mode(mode: &IdentityMode) -> Result<Arc<dyn IdentityResolver>, AppError> {
    let resolver: Arc<dyn IdentityResolver> = match mode {
        IdentityMode::TrustedHeader => Arc::new(TrustedHeaderResolver),
        IdentityMode::Http { session_url, timeout } => {
            Arc::new(HttpIdentityResolver::new(session_url.clone(), *timeout)?)
        }
    };
    Ok(resolver)
}

/// Reads the caller id from `x-user-id`. Only safe behind a gateway that
/// strips the header from client traffic and sets it after authenticating.
pub struct TrustedHeaderResolver;

#[async_trait]
impl IdentityResolver for TrustedHeaderResolver {
    async fn current_user(&self, headers: &HeaderMap) -> Result<Option<Identity>, AppError> {
        let id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        Ok(id.map(|id| Identity {
            id: id.to_string(),
            email: None,
            name: None,
        }))
    }
}

/// Asks an external session service who the caller is, forwarding the
/// caller's credentials untouched.
pub struct HttpIdentityResolver {
    client: Client,
    session_url: String,
}

impl HttpIdentityResolver {
    pub fn new(session_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Identity(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, session_url })
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn current_user(&self, headers: &HeaderMap) -> Result<Option<Identity>, AppError> {
        let mut request = self.client.get(&self.session_url);
        let mut has_credentials = false;
        for name in [header::AUTHORIZATION, header::COOKIE] {
            if let Some(value) = headers.get(&name).and_then(|v| v.to_str().ok()) {
                request = request.header(name.as_str(), value);
                has_credentials = true;
            }
        }

        if !has_credentials {
            return Ok(None);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        if status == StatusCode::UNAUTHORIZED.as_u16() || status == StatusCode::FORBIDDEN.as_u16() {
            debug!("identity provider rejected credentials ({})", status);
            return Ok(None);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("identity provider returned {}: {}", status, body);
            return Err(AppError::Identity(format!(
                "session endpoint returned {}",
                status
            )));
        }

        let session: dto::SessionResponse = response.json().await?;
        Ok(session.user.filter(|user| !user.id.is_empty()))
    }
}

/// Extractor for handlers that require a signed-in caller.
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .identity
            .current_user(&parts.headers)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
