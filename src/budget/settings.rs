//! Budget settings and category allocations.

use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Id of the catch-all allocation.
pub const OTHER_ALLOCATION_ID: &str = "other";

/// A named percentage share of the total budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub id: String,
    /// Display name; also the primary substring matched against book categories.
    pub name: String,
    /// Share of the total budget, 0-100 (fractions allowed).
    pub percentage: f64,
}

impl CategoryAllocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, percentage: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            percentage,
        }
    }

    /// Whether this is the catch-all bucket for unmatched books.
    pub fn is_catch_all(&self) -> bool {
        self.id == OTHER_ALLOCATION_ID || self.name == OTHER_ALLOCATION_ID
    }

    /// `floor(total_budget * percentage / 100)`, computed for this entry alone.
    pub fn allocated_amount(&self, total_budget: u64) -> i64 {
        (total_budget as f64 * self.percentage / 100.0).floor() as i64
    }
}

/// Budget for one acquisition period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSettings {
    pub total_budget: u64,
    /// Informational only.
    pub start_date: NaiveDate,
    /// Informational only.
    pub end_date: NaiveDate,
    /// Allocations in display order.
    pub allocations: Vec<CategoryAllocation>,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            total_budget: 10_000_000,
            start_date: today,
            end_date: today
                .checked_add_months(Months::new(12))
                .unwrap_or(today),
            allocations: vec![
                CategoryAllocation::new("lit", "문학", 30.0),
                CategoryAllocation::new("soc", "사회과학", 20.0),
                CategoryAllocation::new("sci", "자연과학", 15.0),
                CategoryAllocation::new("art", "예술", 10.0),
                CategoryAllocation::new("tech", "기술/컴퓨터", 10.0),
                CategoryAllocation::new("child", "아동/청소년", 10.0),
                CategoryAllocation::new(OTHER_ALLOCATION_ID, "기타", 5.0),
            ],
        }
    }
}

impl BudgetSettings {
    /// Settings with the given total and no allocations.
    pub fn new(total_budget: u64) -> Self {
        Self {
            total_budget,
            allocations: Vec::new(),
            ..Self::default()
        }
    }

    /// Append an allocation.
    pub fn with_allocation(mut self, allocation: CategoryAllocation) -> Self {
        self.allocations.push(allocation);
        self
    }

    /// Set the total budget.
    pub fn with_total_budget(mut self, total_budget: u64) -> Self {
        self.total_budget = total_budget;
        self
    }

    /// Set the informational period.
    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Sum of all allocation percentages.
    pub fn allocation_total(&self) -> f64 {
        self.allocations.iter().map(|a| a.percentage).sum()
    }

    /// Whether allocations add up to exactly 100%.
    ///
    /// Settings editors should enforce this; the status engine does not.
    pub fn is_balanced(&self) -> bool {
        (self.allocation_total() - 100.0).abs() < 1e-9
    }
}
