//! Boundary clients for external providers.

pub mod billing;
pub mod llm;
