//! Acquisition engine: discovery, triage, and budget tracking for library
//! book purchasing.
//!
//! Candidates come from a JSON catalog API and an XML recommendation feed,
//! fetched through a chain of relays with fixed-backoff retries. They are
//! normalized into [`Book`](book::Book) records, filtered, and triaged on a
//! three-column [`WorkflowBoard`](workflow::WorkflowBoard). Confirmed books
//! are priced against per-category allocations by
//! [`calculate_budget_status`](budget::calculate_budget_status).

pub mod book;
pub mod budget;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod service;
pub mod sources;
pub mod store;
pub mod workflow;

pub use book::{Book, WorkflowStage};
pub use budget::{calculate_budget_status, match_category, BudgetSettings, BudgetStatus};
pub use error::{AcquisitionError, AcquisitionResult, FetchFailure};
pub use service::AcquisitionService;
pub use workflow::WorkflowBoard;
