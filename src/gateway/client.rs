//! HTTP client for the portal backend.
//!
//! Every authenticated call attaches the bearer token passed in by the
//! caller; the client itself holds no credential state. Token ownership
//! stays with the session store.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::error::{extract_detail, GatewayError};
use crate::catalog::{AccessGrant, ApplicationDescriptor};
use crate::session::UserProfile;

/// Successful login payload: the issued bearer token plus the profile of
/// the user it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

/// Account creation request body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Stateless request layer for the portal backend.
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a gateway client for the given backend base URL.
    ///
    /// Timeouts are mandatory: every outbound call runs against a bounded
    /// connect and request deadline.
    pub fn new(
        base_url: &str,
        connect_timeout_secs: u64,
        request_timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Exchange credentials for a bearer token and user profile.
    ///
    /// Credentials are sent exactly once; a rejected login is never
    /// retried automatically.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, GatewayError> {
        tracing::debug!(username = %username, "Authenticating against backend");
        self.post_public("/login", &LoginRequest { username, password })
            .await
    }

    /// Create a new account.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, GatewayError> {
        tracing::debug!(username = %request.username, "Registering new account");
        self.post_public("/register", request).await
    }

    /// Verify a bearer token and fetch the profile it belongs to.
    ///
    /// Any failure means "verification failed" to the caller; the cause
    /// does not matter because the recovery is always a re-login.
    pub async fn who_am_i(&self, token: &str) -> Result<UserProfile, GatewayError> {
        tracing::debug!(token_len = token.len(), "Verifying session token");
        self.get_authed("/me", token).await
    }

    /// Fetch the application catalog snapshot.
    pub async fn list_applications(
        &self,
        token: &str,
    ) -> Result<Vec<ApplicationDescriptor>, GatewayError> {
        tracing::debug!("Fetching application catalog");
        self.get_authed("/applications", token).await
    }

    /// Request a short-lived access grant for one portal application.
    pub async fn request_access_token(
        &self,
        token: &str,
        application_id: &str,
    ) -> Result<AccessGrant, GatewayError> {
        tracing::debug!(application_id = %application_id, "Requesting access grant");
        let path = format!("/applications/{}/access-token", application_id);
        self.post_authed(&path, token, &serde_json::json!({})).await
    }

    /// Unauthenticated POST; 4xx responses with a backend detail become
    /// `Rejected` so the message can be shown inline.
    async fn post_public<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response, false).await);
        }

        Ok(response.json().await?)
    }

    /// Authenticated GET with the uniform bearer header.
    async fn get_authed<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response, true).await);
        }

        Ok(response.json().await?)
    }

    /// Authenticated POST with the uniform bearer header.
    async fn post_authed<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", token))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response, true).await);
        }

        Ok(response.json().await?)
    }

    /// Normalize a non-success response into the error taxonomy.
    ///
    /// On authenticated calls a 401 is always `Unauthorized`; on public
    /// calls a 400/401 carrying a backend detail is `Rejected` so login
    /// and registration failures surface the backend's own message.
    async fn map_error(response: reqwest::Response, authed: bool) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if authed && status == StatusCode::UNAUTHORIZED {
            return GatewayError::Unauthorized;
        }

        if let Some(detail) = extract_detail(&body) {
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
                return GatewayError::Rejected { message: detail };
            }
            return GatewayError::Backend {
                status: status.as_u16(),
                message: detail,
            };
        }

        let mut message = body;
        message.truncate(200);
        GatewayError::Backend {
            status: status.as_u16(),
            message,
        }
    }
}
