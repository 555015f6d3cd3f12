//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Every query is company-scoped unless the caller is a
//! superadmin.

pub mod company;
pub mod expense;
pub mod project;
pub mod snapshot;
pub mod subscription;
pub mod task;
pub mod team;
pub mod time_entry;
pub mod user;

pub use company::CompanyRepository;
pub use expense::ExpenseRepository;
pub use project::ProjectRepository;
pub use snapshot::SnapshotRepository;
pub use subscription::SubscriptionRepository;
pub use task::TaskRepository;
pub use team::TeamRepository;
pub use time_entry::{TimeEntryError, TimeEntryRepository};
pub use user::UserRepository;
