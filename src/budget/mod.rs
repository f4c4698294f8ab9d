//! Acquisition budget allocation.
//!
//! This module reports how much of a period's budget the confirmed books
//! consume, per category allocation and overall.
//!
//! # Overview
//!
//! - **BudgetSettings**: total amount, period, and percentage allocations
//! - **match_category**: heuristic mapping from a book's category path to an allocation
//! - **calculate_budget_status**: per-allocation and total spend with alert levels
//!
//! # Example
//!
//! ```ignore
//! use acquisition_engine::budget::{calculate_budget_status, BudgetSettings};
//!
//! let settings = BudgetSettings::default();
//! let status = calculate_budget_status(&board.confirmed, &settings);
//!
//! for alert in status.alerts() {
//!     println!("{} at {:.1}%", alert.name, alert.usage_percentage);
//! }
//! ```

mod matcher;
mod settings;
mod status;

pub use matcher::{match_category, SynonymRule, SYNONYM_RULES, UNKNOWN_CATEGORY_ID};
pub use settings::{BudgetSettings, CategoryAllocation, OTHER_ALLOCATION_ID};
pub use status::{
    calculate_budget_status, AlertLevel, BudgetStatus, CategoryStatus, DANGER_THRESHOLD_PERCENT,
    WARNING_THRESHOLD_PERCENT,
};
