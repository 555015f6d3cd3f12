//! Shared types, errors, and configuration for ProjeXtPal.
//!
//! This crate provides common types used across all other crates:
//! - The role hierarchy and health color palette
//! - Time filter / window types for analytics
//! - Application-wide error taxonomy
//! - JWT auth types and configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use types::{HealthColor, HealthColors, Role, TimeFilter, TimeWindow};
