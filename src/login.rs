//! Login screen support: the one-time session-expired notice and
//! credential form validation.
//!
//! Validation runs before any network call and reports the first
//! failure only, matching what the form surfaces inline.

use thiserror::Error;

/// Query parameter appended by a forced logout redirect
pub const SESSION_EXPIRED_PARAM: &str = "session_expired";

/// Notice shown once after the session-expired parameter is consumed
pub const SESSION_EXPIRED_NOTICE: &str = "Session expired - please log in again.";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("Email is required")]
    EmailRequired,

    #[error("Enter a valid email address")]
    EmailInvalid,

    #[error("Password is required")]
    PasswordRequired,
}

/// A validated credential form, ready to hand to the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Validate raw form input, reporting the first failure.
    pub fn validate(email: &str, password: &str) -> Result<Self, FormError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(FormError::EmailRequired);
        }
        if !looks_like_email(email) {
            return Err(FormError::EmailInvalid);
        }
        if password.trim().is_empty() {
            return Err(FormError::PasswordRequired);
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

/// Plausibility check only: a non-empty local part and a dotted domain.
/// The exchange endpoint is the real authority on the address.
fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Detect and consume the session-expired marker from a query string.
///
/// Returns whether the notice should be shown plus the query with the
/// marker removed, so the caller can rewrite the URL and keep the
/// notice one-time. Accepts the query with or without a leading `?`.
pub fn take_session_expired(query: &str) -> (bool, String) {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut expired = false;
    let remaining: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((*pair, ""));
            if key == SESSION_EXPIRED_PARAM {
                expired = expired || value == "1";
                false
            } else {
                true
            }
        })
        .collect();
    (expired, remaining.join("&"))
}
