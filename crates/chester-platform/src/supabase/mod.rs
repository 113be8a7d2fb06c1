//! Adapters for a Supabase-style backend: PostgREST tables under
//! `/rest/v1` and GoTrue password auth under `/auth/v1`.
//!
//! The gateway and the auth adapter share one `SupabaseClient`, so the
//! access token obtained at sign-in authorizes every table request.

pub(crate) mod client;
pub(crate) mod auth;
mod rest;
pub(crate) mod query;

pub use client::{AuthSession, SupabaseClient};
pub use auth::SupabaseAuth;
pub use rest::SupabaseGateway;
