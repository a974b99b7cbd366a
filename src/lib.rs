//! Client core for the shelfbot dashboard.
//!
//! This crate holds the parts of the dashboard shell with a real
//! contract: the credential store, the login/refresh exchange, the
//! authenticated request client with single-retry-after-refresh
//! semantics, and the route guard predicates. Rendering and navigation
//! transitions belong to the view layer, which consumes these pieces.

pub mod api;
pub mod auth;
pub mod config;
pub mod login;
pub mod routes;

pub use api::{ApiClient, ApiError, RequestDescriptor};
pub use auth::{
    login as auth_login, refresh_access_token, CredentialKind, CredentialStore, RefreshOutcome,
    TokenPair,
};
pub use config::Config;
pub use login::{take_session_expired, FormError, LoginForm};
pub use routes::{guard_protected, guard_public_only, GuardDecision, Navigator, Route};
