// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider client (Firebase Authentication).
//!
//! Handles:
//! - Google sign-in with an ID token obtained by the UI
//! - Email/password sign-in and account creation
//! - Display name updates

use crate::config::Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Stable unique user ID
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Token for follow-up calls on behalf of this user
    pub id_token: String,
}

/// Interactive sign-in and profile updates.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a Google ID token for a session.
    async fn sign_in_with_google(&self, google_id_token: &str) -> Result<IdentityRecord>;

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<IdentityRecord>;

    async fn create_account(&self, email: &str, password: &str) -> Result<IdentityRecord>;

    /// Set the display name; returns the updated record.
    async fn update_display_name(
        &self,
        user: &IdentityRecord,
        display_name: &str,
    ) -> Result<IdentityRecord>;
}

/// Firebase Authentication over the Identity Toolkit REST API.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

/// Common shape of the sign-in / sign-up / update responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuthClient {
    /// Create a client for the project's Web API key.
    ///
    /// Uses the Auth emulator when `auth_emulator_host` is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client error: {}", e)))?;

        let base_url = match &config.auth_emulator_host {
            Some(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            None => IDENTITY_TOOLKIT_URL.to_string(),
        };

        Ok(Self {
            http,
            base_url,
            api_key: config.firebase_api_key.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.base_url, method)
    }

    async fn post<B: Serialize + Sync>(&self, method: &str, body: &B) -> Result<AuthResponse> {
        let response = self
            .http
            .post(self.endpoint(method))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::RemoteOperationFailed(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json(&self, response: reqwest::Response) -> Result<AuthResponse> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // Identity Toolkit reports the reason as an upper-case code.
            let reason = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);

            tracing::warn!(status = %status, reason = %reason, "Identity provider rejected request");
            return Err(AppError::RemoteOperationFailed(format!(
                "HTTP {}: {}",
                status, reason
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::RemoteOperationFailed(format!("JSON parse error: {}", e)))
    }
}

impl AuthResponse {
    fn into_record(self, fallback_token: Option<&str>) -> Result<IdentityRecord> {
        let id_token = self
            .id_token
            .or_else(|| fallback_token.map(str::to_string))
            .ok_or_else(|| {
                AppError::RemoteOperationFailed("Identity response without token".to_string())
            })?;

        Ok(IdentityRecord {
            uid: self.local_id,
            email: self.email.filter(|e| !e.is_empty()),
            display_name: self.display_name.filter(|n| !n.is_empty()),
            id_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_in_with_google(&self, google_id_token: &str) -> Result<IdentityRecord> {
        let body = IdpRequest {
            post_body: format!("id_token={}&providerId=google.com", google_id_token),
            request_uri: "http://localhost",
            return_idp_credential: true,
            return_secure_token: true,
        };
        self.post("signInWithIdp", &body).await?.into_record(None)
    }

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<IdentityRecord> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post("signInWithPassword", &body)
            .await?
            .into_record(None)
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<IdentityRecord> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post("signUp", &body).await?.into_record(None)
    }

    async fn update_display_name(
        &self,
        user: &IdentityRecord,
        display_name: &str,
    ) -> Result<IdentityRecord> {
        let body = UpdateRequest {
            id_token: &user.id_token,
            display_name,
            return_secure_token: true,
        };
        self.post("update", &body)
            .await?
            .into_record(Some(&user.id_token))
    }
}
