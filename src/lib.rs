//! bosun — an operator console for provisioning and managing compute
//! instances against a Cloudzy-style provisioning API.
//!
//! The binary serves a small web UI (axum + askama). Provisioning runs
//! through a stateless multi-step wizard: every choice the operator has
//! made so far travels in the URL query string, so any step can be
//! reloaded, bookmarked, or reached with the browser's back button
//! without server-side wizard state.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod templates;
pub mod upstream;
pub mod viewmodel;
pub mod wizard;
