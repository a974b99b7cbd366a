//! Authenticated request client for the dashboard API.
//!
//! Wraps every outbound call with bearer credential injection and the
//! expiry policy: a 401 triggers at most one credential refresh and at
//! most one retry of the original call, after which the store is
//! cleared and the user is sent back to the login route.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::exchange::{self, RefreshOutcome};
use crate::auth::store::{CredentialKind, CredentialStore};
use crate::login::SESSION_EXPIRED_PARAM;
use crate::routes::{Navigator, Route};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything needed to issue one API call.
///
/// `skip_auth_redirect` hands a 401 straight back to the caller
/// instead of running the refresh/redirect policy; the login and
/// refresh calls themselves use it to avoid redirect loops.
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    method: Method,
    headers: HeaderMap,
    body: Option<Value>,
    skip_auth_redirect: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Set an explicit header. Explicit headers win over the injected
    /// bearer credential, which is how the refresh call carries the
    /// refresh token instead of the expired access token.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body. Content-Type defaults to `application/json`
    /// unless an explicit one was set.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Return a 401 to the caller unchanged instead of refreshing and
    /// redirecting.
    pub fn skip_auth_redirect(mut self) -> Self {
        self.skip_auth_redirect = true;
        self
    }
}

/// API client for the shelfbot backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a new API client against `base_url`, reading credentials
    /// from `store` and performing forced redirects through `navigator`.
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            navigator,
        })
    }

    /// The credential store this client reads and the exchange writes.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Issue an API call with the expiry policy applied.
    ///
    /// The call is attempted once; on a 401 (and unless the descriptor
    /// opts out) the exchange refreshes the access credential and the
    /// original call is re-issued exactly once. A 401 that survives the
    /// retry, or a refresh that yields nothing, clears the store and
    /// forces navigation to the login route. The response is returned
    /// to the caller in every case that does not fail at the transport
    /// level, so at most one refresh and one retry happen per
    /// invocation regardless of how many calls are in flight.
    pub async fn request(&self, path: &str, desc: RequestDescriptor) -> Result<Response> {
        let first = self.execute(path, &desc).await?;
        if first.status() != StatusCode::UNAUTHORIZED || desc.skip_auth_redirect {
            return Ok(first);
        }

        if let RefreshOutcome::Refreshed(_) = exchange::refresh_access_token(self).await {
            let retry = self.execute(path, &desc).await?;
            if retry.status() == StatusCode::UNAUTHORIZED {
                // Retried once already; no second attempt
                self.force_login_redirect();
            }
            return Ok(retry);
        }

        self.force_login_redirect();
        Ok(first)
    }

    /// Fetch `path` and decode the JSON response body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(path, RequestDescriptor::get()).await?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    /// POST a JSON body to `path` and decode the JSON response body.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let desc = RequestDescriptor::post().json(serde_json::to_value(body)?);
        let response = self.request(path, desc).await?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    /// Single-shot send for the exchange: the refresh call must not
    /// re-enter the retry policy, both to keep the futures finitely
    /// sized and because a failed refresh is already terminal.
    pub(crate) async fn send_once(&self, path: &str, desc: &RequestDescriptor) -> Result<Response> {
        self.execute(path, desc).await
    }

    /// Issue the call exactly once: bearer injection, default JSON
    /// content type, no retry policy.
    async fn execute(&self, path: &str, desc: &RequestDescriptor) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = desc.headers.clone();
        if let Some(token) = self.store.get(CredentialKind::Access) {
            if !headers.contains_key(header::AUTHORIZATION) {
                headers.insert(header::AUTHORIZATION, Self::bearer_value(&token)?);
            }
        }

        let mut request = self.http.request(desc.method.clone(), &url).headers(headers);
        if let Some(ref body) = desc.body {
            // reqwest only inserts Content-Type when none is present
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::Network)
            .with_context(|| format!("Failed to send {} request to {}", desc.method, url))?;
        Ok(response)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    pub(crate) fn bearer_value(token: &str) -> Result<HeaderValue, ApiError> {
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(ApiError::Header)
    }

    /// Clear the session and send the user back to the login screen
    /// with the one-time session-expired notice.
    fn force_login_redirect(&self) {
        warn!("Access credential expired and refresh unavailable, forcing login redirect");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential store during forced logout");
        }
        let location = format!("{}?{}=1", Route::Login.path(), SESSION_EXPIRED_PARAM);
        debug!(location = %location, "Forced redirect");
        self.navigator.navigate(&location);
    }
}
