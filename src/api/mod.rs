//! REST API client module for the shelfbot backend.
//!
//! This module provides the `ApiClient` for authenticated calls
//! against the dashboard API. An expired access credential (401) is
//! handled transparently: one refresh attempt, one retry of the
//! original call, and a forced redirect to the login route when
//! neither helps.
//!
//! The API uses bearer token authentication obtained through the
//! `/api/v1/auth` endpoints.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestDescriptor};
pub use error::ApiError;
