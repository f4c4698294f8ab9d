//! Budget usage computation over confirmed acquisitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::matcher::match_category;
use super::settings::BudgetSettings;
use crate::book::Book;

/// Usage percentage at which an allocation turns to warning.
pub const WARNING_THRESHOLD_PERCENT: f64 = 80.0;
/// Usage percentage at which an allocation turns to danger.
pub const DANGER_THRESHOLD_PERCENT: f64 = 100.0;

/// Alert level for a usage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Under 80%
    Safe,
    /// 80% up to (not including) 100%
    Warning,
    /// 100% or more
    Danger,
}

impl AlertLevel {
    pub fn from_usage(usage_percentage: f64) -> Self {
        if usage_percentage >= DANGER_THRESHOLD_PERCENT {
            AlertLevel::Danger
        } else if usage_percentage >= WARNING_THRESHOLD_PERCENT {
            AlertLevel::Warning
        } else {
            AlertLevel::Safe
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            AlertLevel::Safe => "SAFE",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Danger => "DANGER",
        }
    }
}

/// Spend against one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatus {
    pub id: String,
    pub name: String,
    pub allocated_amount: i64,
    pub used_amount: i64,
    pub book_count: usize,
    /// May be negative when overspent.
    pub remaining_amount: i64,
    /// 0 when nothing was allocated.
    pub usage_percentage: f64,
    pub is_exceeded: bool,
    pub alert_level: AlertLevel,
}

/// Whole-budget usage snapshot, recomputed from scratch on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub total_budget: u64,
    pub total_used: i64,
    pub total_remaining: i64,
    pub total_usage_percentage: f64,
    pub is_total_exceeded: bool,
    pub alert_level: AlertLevel,
    /// One entry per allocation, in allocation order.
    pub category_statuses: Vec<CategoryStatus>,
}

impl BudgetStatus {
    /// Look up a category entry by allocation id.
    pub fn category(&self, id: &str) -> Option<&CategoryStatus> {
        self.category_statuses.iter().find(|c| c.id == id)
    }

    /// Allocations that have reached warning or danger.
    pub fn alerts(&self) -> impl Iterator<Item = &CategoryStatus> {
        self.category_statuses
            .iter()
            .filter(|c| c.alert_level != AlertLevel::Safe)
    }

    /// Format as a human-readable markdown summary.
    pub fn format(&self) -> String {
        let mut output = String::from("## Acquisition Budget\n\n");

        output.push_str(&format!(
            "**Total**: {}/{} ({:.1}%) [{}]\n",
            self.total_used,
            self.total_budget,
            self.total_usage_percentage,
            self.alert_level.as_label()
        ));
        output.push_str(&format!("**Remaining**: {}\n", self.total_remaining));

        if self.is_total_exceeded {
            output.push_str("\n**Total budget exceeded.**\n");
        }

        if !self.category_statuses.is_empty() {
            output.push_str("\n| Category | Books | Used | Allocated | Usage | Status |\n");
            output.push_str("|---|---:|---:|---:|---:|---|\n");
            for category in &self.category_statuses {
                output.push_str(&format!(
                    "| {} | {} | {} | {} | {:.1}% | {} |\n",
                    category.name,
                    category.book_count,
                    category.used_amount,
                    category.allocated_amount,
                    category.usage_percentage,
                    category.alert_level.as_label()
                ));
            }
        }

        output
    }
}

fn usage_percentage(used: i64, allocated: i64) -> f64 {
    if allocated > 0 {
        (used as f64 * 100.0) / allocated as f64
    } else {
        0.0
    }
}

/// Compute spend per allocation and overall from the confirmed books.
///
/// Every book is matched to exactly one allocation id and its sale price is
/// added there. A book whose id has no entry (only possible with no
/// allocations) still counts toward the total. Order of `confirmed` does
/// not affect the result.
pub fn calculate_budget_status(confirmed: &[Book], settings: &BudgetSettings) -> BudgetStatus {
    let mut used_by_id: HashMap<&str, (i64, usize)> = HashMap::new();
    let mut total_used: i64 = 0;

    for book in confirmed {
        let id = match_category(book.category_name.as_deref(), &settings.allocations);
        let entry = used_by_id.entry(id).or_insert((0, 0));
        entry.0 += book.price_sales;
        entry.1 += 1;
        total_used += book.price_sales;
    }

    let mut seen: Vec<&str> = Vec::with_capacity(settings.allocations.len());
    let category_statuses = settings
        .allocations
        .iter()
        .map(|allocation| {
            let allocated_amount = allocation.allocated_amount(settings.total_budget);
            // a repeated id only gets the usage once, on its first entry
            let (used_amount, book_count) = if seen.contains(&allocation.id.as_str()) {
                (0, 0)
            } else {
                seen.push(allocation.id.as_str());
                used_by_id
                    .get(allocation.id.as_str())
                    .copied()
                    .unwrap_or((0, 0))
            };
            let usage = usage_percentage(used_amount, allocated_amount);
            CategoryStatus {
                id: allocation.id.clone(),
                name: allocation.name.clone(),
                allocated_amount,
                used_amount,
                book_count,
                remaining_amount: allocated_amount - used_amount,
                usage_percentage: usage,
                is_exceeded: used_amount > allocated_amount,
                alert_level: AlertLevel::from_usage(usage),
            }
        })
        .collect();

    let total_budget = settings.total_budget as i64;
    let total_usage_percentage = usage_percentage(total_used, total_budget);

    BudgetStatus {
        total_budget: settings.total_budget,
        total_used,
        total_remaining: total_budget - total_used,
        total_usage_percentage,
        is_total_exceeded: total_used > total_budget,
        alert_level: AlertLevel::from_usage(total_usage_percentage),
        category_statuses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::CategoryAllocation;

    fn book(id: &str, category: Option<&str>, price: i64) -> Book {
        let mut book = Book::new(id, id).with_price_sales(price);
        if let Some(category) = category {
            book = book.with_category(category);
        }
        book
    }

    #[test]
    fn test_alert_level_thresholds() {
        assert_eq!(AlertLevel::from_usage(0.0), AlertLevel::Safe);
        assert_eq!(AlertLevel::from_usage(79.9), AlertLevel::Safe);
        assert_eq!(AlertLevel::from_usage(80.0), AlertLevel::Warning);
        assert_eq!(AlertLevel::from_usage(99.99), AlertLevel::Warning);
        assert_eq!(AlertLevel::from_usage(100.0), AlertLevel::Danger);
        assert_eq!(AlertLevel::from_usage(300.0), AlertLevel::Danger);
    }

    #[test]
    fn test_literature_at_thirty_percent() {
        let settings = BudgetSettings::new(1_000_000)
            .with_allocation(CategoryAllocation::new("lit", "문학", 10.0))
            .with_allocation(CategoryAllocation::new("other", "기타", 90.0));
        let confirmed = vec![book("b1", Some("국내도서>소설/시/희곡>한국소설"), 30_000)];

        let status = calculate_budget_status(&confirmed, &settings);
        let lit = status.category("lit").unwrap();
        assert_eq!(lit.allocated_amount, 100_000);
        assert_eq!(lit.used_amount, 30_000);
        assert_eq!(lit.book_count, 1);
        assert_eq!(lit.remaining_amount, 70_000);
        assert_eq!(lit.usage_percentage, 30.0);
        assert_eq!(lit.alert_level, AlertLevel::Safe);
        assert!(!lit.is_exceeded);
        assert_eq!(status.total_used, 30_000);
        assert_eq!(status.total_usage_percentage, 3.0);
    }

    #[test]
    fn test_single_allocation_takes_unrecognized_category() {
        let settings =
            BudgetSettings::new(1_000_000).with_allocation(CategoryAllocation::new("lit", "문학", 100.0));
        let confirmed = vec![book("b1", Some("Domestic>Fiction"), 300_000)];

        let status = calculate_budget_status(&confirmed, &settings);
        assert_eq!(status.total_used, 300_000);
        assert_eq!(status.total_usage_percentage, 30.0);
        assert_eq!(status.alert_level, AlertLevel::Safe);
        assert!(!status.is_total_exceeded);
        let lit = status.category("lit").unwrap();
        assert_eq!(lit.name, "문학");
        assert_eq!(lit.allocated_amount, 1_000_000);
        assert_eq!(lit.used_amount, 300_000);
        assert_eq!(lit.book_count, 1);
        assert!(!lit.is_exceeded);
    }

    #[test]
    fn test_single_small_allocation_overspent_threefold() {
        let settings =
            BudgetSettings::new(1_000_000).with_allocation(CategoryAllocation::new("lit", "문학", 10.0));
        let confirmed = vec![book("b1", Some("Domestic>Fiction"), 300_000)];

        let status = calculate_budget_status(&confirmed, &settings);
        let lit = status.category("lit").unwrap();
        assert_eq!(lit.allocated_amount, 100_000);
        assert_eq!(lit.used_amount, 300_000);
        assert_eq!(lit.usage_percentage, 300.0);
        assert!(lit.is_exceeded);
        assert_eq!(lit.alert_level, AlertLevel::Danger);
        assert_eq!(status.total_usage_percentage, 30.0);
        assert_eq!(status.alert_level, AlertLevel::Safe);
    }

    #[test]
    fn test_overspent_allocation() {
        let settings = BudgetSettings::new(100_000)
            .with_allocation(CategoryAllocation::new("lit", "문학", 10.0))
            .with_allocation(CategoryAllocation::new("other", "기타", 90.0));
        let confirmed = vec![book("b1", Some("국내도서>소설"), 30_000)];

        let status = calculate_budget_status(&confirmed, &settings);
        let lit = status.category("lit").unwrap();
        assert_eq!(lit.allocated_amount, 10_000);
        assert_eq!(lit.usage_percentage, 300.0);
        assert_eq!(lit.remaining_amount, -20_000);
        assert!(lit.is_exceeded);
        assert_eq!(lit.alert_level, AlertLevel::Danger);
        assert_eq!(status.alerts().count(), 1);
    }

    #[test]
    fn test_zero_budget() {
        let settings = BudgetSettings::new(0)
            .with_allocation(CategoryAllocation::new("lit", "문학", 50.0))
            .with_allocation(CategoryAllocation::new("other", "기타", 50.0));
        let confirmed = vec![book("b1", Some("국내도서>소설"), 12_000)];

        let status = calculate_budget_status(&confirmed, &settings);
        assert_eq!(status.total_usage_percentage, 0.0);
        assert!(status.is_total_exceeded);
        assert_eq!(status.total_remaining, -12_000);
        let lit = status.category("lit").unwrap();
        assert_eq!(lit.usage_percentage, 0.0);
        assert!(lit.is_exceeded);
        assert_eq!(lit.alert_level, AlertLevel::Safe);
    }

    #[test]
    fn test_every_allocation_reported_in_order() {
        let settings = BudgetSettings::default().with_total_budget(1_000_000);
        let status = calculate_budget_status(&[], &settings);
        let ids: Vec<&str> = status.category_statuses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["lit", "soc", "sci", "art", "tech", "child", "other"]);
        assert!(status.category_statuses.iter().all(|c| c.used_amount == 0));
        assert_eq!(status.alert_level, AlertLevel::Safe);
    }

    #[test]
    fn test_order_independent() {
        let settings = BudgetSettings::default().with_total_budget(500_000);
        let mut confirmed = vec![
            book("a", Some("국내도서>경제경영"), 18_000),
            book("b", Some("국내도서>컴퓨터/모바일>IT 전문서"), 32_000),
            book("c", None, 9_000),
            book("d", Some("국내도서>에세이"), 14_000),
        ];
        let forward = calculate_budget_status(&confirmed, &settings);
        confirmed.reverse();
        let backward = calculate_budget_status(&confirmed, &settings);
        assert_eq!(forward, backward);
        assert_eq!(forward.category("other").unwrap().used_amount, 9_000);
        assert_eq!(forward.category("soc").unwrap().used_amount, 18_000);
        assert_eq!(forward.category("tech").unwrap().book_count, 1);
    }

    #[test]
    fn test_unmatched_counts_toward_total_only() {
        let settings = BudgetSettings::new(10_000);
        let confirmed = vec![book("a", Some("국내도서>요리"), 4_000)];
        let status = calculate_budget_status(&confirmed, &settings);
        assert!(status.category_statuses.is_empty());
        assert_eq!(status.total_used, 4_000);
        assert_eq!(status.total_usage_percentage, 40.0);
    }

    #[test]
    fn test_format_summary() {
        let settings = BudgetSettings::new(100_000)
            .with_allocation(CategoryAllocation::new("lit", "문학", 10.0))
            .with_allocation(CategoryAllocation::new("other", "기타", 90.0));
        let confirmed = vec![book("b1", Some("국내도서>소설"), 30_000)];
        let text = calculate_budget_status(&confirmed, &settings).format();

        assert!(text.contains("## Acquisition Budget"));
        assert!(text.contains("**Total**: 30000/100000 (30.0%) [SAFE]"));
        assert!(text.contains("| 문학 | 1 | 30000 | 10000 | 300.0% | DANGER |"));
        assert!(!text.contains("exceeded"));
    }
}
