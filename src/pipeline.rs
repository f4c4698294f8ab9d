//! Merge & filter steps applied between the adapters and the discovery feed.
//!
//! Genre exclusion and recency filtering are source-specific and run inside
//! the catalog adapter. Deduplication runs when two catalog lists are merged.
//! Triage exclusion runs last, on the caller's side, because only the caller
//! knows which ids are already in review or confirmed.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate};

use crate::book::Book;

/// Category substring marking comics; such books are never offered.
pub const COMIC_MARKER: &str = "만화";

/// Search results older than this many days are dropped.
pub const RECENCY_WINDOW_DAYS: i64 = 365;

/// Drop books whose category contains `marker`. Books without a category stay.
pub fn exclude_genre(books: Vec<Book>, marker: &str) -> Vec<Book> {
    books
        .into_iter()
        .filter(|book| {
            book.category_name
                .as_deref()
                .map(|c| !c.contains(marker))
                .unwrap_or(true)
        })
        .collect()
}

/// Merge lists, keeping one record per id.
///
/// A later record replaces an earlier one with the same id, but the merged
/// list keeps the position where the id first appeared.
pub fn merge_last_seen(lists: Vec<Vec<Book>>) -> Vec<Book> {
    let mut merged: Vec<Book> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for book in lists.into_iter().flatten() {
        match positions.get(&book.id) {
            Some(&idx) => merged[idx] = book,
            None => {
                positions.insert(book.id.clone(), merged.len());
                merged.push(book);
            }
        }
    }

    merged
}

/// Drop books already in review or confirmed.
pub fn exclude_triaged(books: Vec<Book>, triaged_ids: &HashSet<String>) -> Vec<Book> {
    books
        .into_iter()
        .filter(|book| !triaged_ids.contains(&book.id))
        .collect()
}

/// Parse a free-form publication date.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY-MM` and `YYYY`.
/// Partial dates resolve to the first day of the period.
pub fn parse_pub_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    if let Some((year, month)) = raw.split_once('-') {
        if year.len() == 4 && (1..=2).contains(&month.len()) {
            let (year, month) = (year.parse().ok()?, month.parse().ok()?);
            return NaiveDate::from_ymd_opt(year, month, 1);
        }
    }
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::from_ymd_opt(raw.parse().ok()?, 1, 1);
    }
    None
}

/// Whether a publication date falls inside the recency window ending `today`.
///
/// An empty date is absent and fails; a non-empty date that cannot be
/// parsed passes, so odd formats never hide a real new release.
pub fn is_recent(pub_date: &str, today: NaiveDate) -> bool {
    if pub_date.trim().is_empty() {
        return false;
    }
    match parse_pub_date(pub_date) {
        Some(date) => date >= today - Duration::days(RECENCY_WINDOW_DAYS),
        None => true,
    }
}

/// Keep only books inside the recency window.
pub fn filter_recent(books: Vec<Book>, today: NaiveDate) -> Vec<Book> {
    books
        .into_iter()
        .filter(|book| is_recent(&book.pub_date, today))
        .collect()
}
