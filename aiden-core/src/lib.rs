//! # Aiden Core
//!
//! Backend core for Aiden, a consent-gated OSINT exposure scanner with
//! phishing-awareness simulations for organisations.
//!
//! - [`orchestration`]: scan job queue, worker pool and the per-scan state
//!   machine (`pending -> running -> finished | error`).
//! - [`result_store`]: findings and generated emails, encrypted at rest with
//!   AES-256-GCM ([`crypto::PayloadCipher`]).
//! - [`external`]: HTTP clients for the OSINT collector and the content
//!   generator, with response schemas validated on ingress.
//! - [`services`]: organisations, admins and bearer sessions, employees and
//!   their cached OSINT, consent records.
//! - [`database`]: repository ports with PostgreSQL and in-memory adapters.

#![allow(missing_docs)]

/// Versioned API route definitions shared by the server and its tests
pub mod api_routes;

/// Request and response payloads of the HTTP API
pub mod api_types;

pub mod crypto;

/// Repository ports and their adapters
pub mod database;

pub mod error;

/// Collector and generator clients
pub mod external;

pub mod freshness;

/// Scan orchestration: queue, workers and lifecycle
pub mod orchestration;

pub mod ranking;

pub mod result_store;

/// Domain services behind the authenticated API
pub mod services;

pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AidenError, Result};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
