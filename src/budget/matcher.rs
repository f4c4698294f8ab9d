//! Category matching heuristic.
//!
//! Maps a book's free-text category to one allocation bucket. This is
//! approximate: substring and synonym rules, first hit wins, in allocation
//! order. Mismatches are expected and are not bugs.

use super::settings::CategoryAllocation;

/// Returned when there is no allocation at all to fall back on.
pub const UNKNOWN_CATEGORY_ID: &str = "unknown";

/// Extra keywords that also route a book to an allocation with a given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynonymRule {
    /// Exact allocation name the rule applies to.
    pub allocation_name: &'static str,
    /// Category substrings that count as a match.
    pub keywords: &'static [&'static str],
}

impl SynonymRule {
    fn matches(&self, allocation: &CategoryAllocation, category: &str) -> bool {
        allocation.name == self.allocation_name
            && self.keywords.iter().any(|k| category.contains(k))
    }
}

/// Synonym rules, checked after the plain name substring test.
pub const SYNONYM_RULES: &[SynonymRule] = &[
    // literature: novels, essays, poetry
    SynonymRule {
        allocation_name: "문학",
        keywords: &["소설", "에세이", "시"],
    },
    // tech/computing: engineering, IT
    SynonymRule {
        allocation_name: "기술/컴퓨터",
        keywords: &["공학", "IT"],
    },
    // social science: economics, management, politics
    SynonymRule {
        allocation_name: "사회과학",
        keywords: &["경제", "경영", "정치"],
    },
];

/// Resolve a category name to an allocation id. Never fails.
///
/// Walks allocations in order, skipping the catch-all, and returns the
/// first whose name is a substring of `category_name` or whose synonym
/// rule fires. Otherwise falls back to the catch-all, then the first
/// allocation, then [`UNKNOWN_CATEGORY_ID`].
pub fn match_category<'a>(category_name: Option<&str>, allocations: &'a [CategoryAllocation]) -> &'a str {
    if let Some(category) = category_name.filter(|c| !c.is_empty()) {
        for allocation in allocations.iter().filter(|a| !a.is_catch_all()) {
            if category.contains(allocation.name.as_str()) {
                return &allocation.id;
            }
            if SYNONYM_RULES.iter().any(|rule| rule.matches(allocation, category)) {
                return &allocation.id;
            }
        }
    }

    fallback_id(allocations)
}

fn fallback_id(allocations: &[CategoryAllocation]) -> &str {
    allocations
        .iter()
        .find(|a| a.is_catch_all())
        .or_else(|| allocations.first())
        .map(|a| a.id.as_str())
        .unwrap_or(UNKNOWN_CATEGORY_ID)
}
