//! Gatekeeper - Entitlement Backend Library
//!
//! Decides whether a user may perform an operation on a user- or group-owned
//! resource, and runs the owner-approval workflow for operations a developer
//! cannot perform unilaterally.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
