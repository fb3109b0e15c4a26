//! API middleware: bearer-token authentication.
//!
//! Runs before every protected handler and injects the resolved
//! [`Caller`](crate::auth::Caller) into request extensions.

pub mod auth;
