//! pharmagate - hospital staff gateway for a clinical registry
//!
//! Staff authenticate against pharmagate, which proxies patient records to
//! the external clinical registry. Clinical notes that create an encounter
//! are checked for drug interactions; high-risk verdicts are written to an
//! append-only audit trail.
//!
//! ## Services
//!
//! - **Auth**: staff login, JWT sessions, role permissions
//! - **Registry**: HTTP client for the clinical registry
//! - **Safety**: interaction filter, risk classifier, check orchestrator, audit
//! - **Routes**: patient proxy, AI action router, incident read access

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod registry;
pub mod routes;
pub mod safety;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, serve, AppState};
pub use types::{GatewayError, Result};
