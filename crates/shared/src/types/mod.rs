//! Shared domain types used across crates.

pub mod health;
pub mod role;
pub mod window;

pub use health::{HealthColor, HealthColors};
pub use role::Role;
pub use window::{TimeFilter, TimeWindow};
