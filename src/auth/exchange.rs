//! Login and refresh calls against the auth endpoints.
//!
//! Both operations write through to the [`CredentialStore`] on
//! success. Refresh never errors: any failure on that path resolves to
//! [`RefreshOutcome::Unavailable`] and the caller forces
//! re-authentication instead of surfacing a raw transport error.

use anyhow::{Context, Result};
use reqwest::header;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, RequestDescriptor};

use super::store::{CredentialKind, CredentialStore};

/// Login endpoint path
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Refresh endpoint path
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Credentials returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Outcome of a refresh attempt.
///
/// `Unavailable` is a normal result, not an error: it tells the caller
/// that no new access credential can be obtained and the user must
/// authenticate again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(String),
    Unavailable,
}

/// Token fields extracted from an exchange response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPayload {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenPayload {
    /// Extract `access_token`/`refresh_token` from a response body.
    ///
    /// The auth service returns the fields either flat or nested one
    /// level under `data`. Any other shape yields absent values rather
    /// than an error.
    pub fn parse(json: &Value) -> Self {
        let data = json.get("data").filter(|d| d.is_object()).unwrap_or(json);
        Self {
            access: data
                .get("access_token")
                .and_then(Value::as_str)
                .map(str::to_owned),
            refresh: data
                .get("refresh_token")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

/// Exchange email/password for a credential pair.
///
/// Blank input, a rejected exchange, and a response with no usable
/// access value all surface as [`ApiError::InvalidCredentials`]; the
/// first of those fails before any network call. On success both
/// credentials are written to the store.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<TokenPair> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(ApiError::InvalidCredentials.into());
    }

    let body = serde_json::json!({ "email": email, "password": password });
    let desc = RequestDescriptor::post().json(body).skip_auth_redirect();
    let response = client.request(LOGIN_PATH, desc).await?;

    if !response.status().is_success() {
        debug!(status = %response.status(), "Login rejected");
        return Err(ApiError::InvalidCredentials.into());
    }

    let json: Value = response
        .json()
        .await
        .context("Failed to parse login response")?;
    let payload = TokenPayload::parse(&json);
    let Some(access) = payload.access else {
        debug!("Login response carried no access token");
        return Err(ApiError::InvalidCredentials.into());
    };

    let store = client.store();
    store.set(CredentialKind::Access, &access)?;
    if let Some(ref refresh) = payload.refresh {
        store.set(CredentialKind::Refresh, refresh)?;
    }

    Ok(TokenPair {
        access_token: access,
        refresh_token: payload.refresh,
    })
}

/// Trade the stored refresh credential for a new access credential.
///
/// Returns `Unavailable` when no refresh credential is stored or when
/// the exchange fails for any reason (transport error, non-success
/// status, missing access value). The new access credential is written
/// to the store before being returned.
pub async fn refresh_access_token(client: &ApiClient) -> RefreshOutcome {
    let Some(refresh) = client.store().get(CredentialKind::Refresh) else {
        return RefreshOutcome::Unavailable;
    };

    let auth_value = match ApiClient::bearer_value(&refresh) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Stored refresh credential is not header-safe");
            return RefreshOutcome::Unavailable;
        }
    };

    let body = serde_json::json!({ "refresh_token": refresh });
    let desc = RequestDescriptor::post()
        .header(header::AUTHORIZATION, auth_value)
        .json(body);

    // Single-shot send: going back through the retry policy would make
    // the refresh call re-entrant
    let response = match client.send_once(REFRESH_PATH, &desc).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Refresh request failed");
            return RefreshOutcome::Unavailable;
        }
    };

    if !response.status().is_success() {
        debug!(status = %response.status(), "Refresh rejected");
        return RefreshOutcome::Unavailable;
    }

    let json: Value = match response.json().await {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to parse refresh response");
            return RefreshOutcome::Unavailable;
        }
    };

    let Some(access) = TokenPayload::parse(&json).access else {
        debug!("Refresh response carried no access token");
        return RefreshOutcome::Unavailable;
    };

    persist_refreshed(client.store(), &access);
    RefreshOutcome::Refreshed(access)
}

/// Clear the stored session.
pub fn logout(store: &CredentialStore) -> Result<()> {
    store.clear()
}

fn persist_refreshed(store: &CredentialStore, access: &str) {
    // The in-memory credential is still valid for this process even if
    // the write to disk fails
    if let Err(e) = store.set(CredentialKind::Access, access) {
        warn!(error = %e, "Failed to persist refreshed access credential");
    }
}
