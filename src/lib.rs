pub mod access; // Permission-gated access checks
pub mod api; // HTTP API router
pub mod auth; // Passwords, sessions, caller identity
pub mod config;
pub mod db;
pub mod invites; // Invite issuance & redemption
pub mod models;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from RUST_LOG, falling back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
