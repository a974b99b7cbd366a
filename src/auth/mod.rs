//! Authentication module: credential persistence and the token exchange.
//!
//! This module provides:
//! - `CredentialStore`: durable access/refresh credential pair, shared
//!   by the request client and the route guards
//! - `exchange`: the login and refresh calls against the auth endpoints
//!
//! The store is the single source of truth for authentication state;
//! every component reads it fresh instead of caching its own copy.

pub mod exchange;
pub mod store;

pub use exchange::{login, logout, refresh_access_token, RefreshOutcome, TokenPair, TokenPayload};
pub use store::{CredentialKind, CredentialStore};
