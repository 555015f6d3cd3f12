//! Core business logic for ProjeXtPal.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, scoring rules, and calculations live here.
//!
//! # Modules
//!
//! - `policy` - Role hierarchy and tenant access policy
//! - `analytics` - Metric collectors, insight synthesis, and the analysis orchestrator
//! - `forecast` - Monthly cash-flow forecasting
//! - `billing` - Subscription lifecycle state machine
//! - `progress` - Task progress from subtask completion
//! - `auth` - Password hashing
//! - `llm` - LLM client abstraction
//! - `storage` - Project document file store

pub mod analytics;
pub mod auth;
pub mod billing;
pub mod forecast;
pub mod llm;
pub mod policy;
pub mod progress;
pub mod storage;
