// ABOUTME: Library root for relevo - exposes public modules for testing.
// ABOUTME: The main binary is in main.rs.

pub mod commands;
pub mod error;
pub mod health;
pub mod manifest;
pub mod output;
pub mod proxy;
pub mod rollout;
pub mod runtime;
pub mod types;
