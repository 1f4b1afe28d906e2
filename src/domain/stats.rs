//! Aggregate statistics over a collection of entries

use crate::domain::JournalEntry;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct JournalStats {
    pub entry_count: usize,
    pub total_words: usize,
    /// Distinct calendar days (UTC) with at least one entry
    pub journaled_days: usize,
    /// Months that contain entries, formatted `YYYY-MM`, newest first
    pub months: Vec<String>,
    /// Mean effective pleasantness, `None` for an empty journal
    pub average_pleasantness: Option<f64>,
}

impl JournalStats {
    pub fn compute(entries: &[JournalEntry]) -> Self {
        let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date.date_naive()).collect();
        let months: BTreeSet<String> = entries.iter().map(month_key).collect();

        let average_pleasantness = if entries.is_empty() {
            None
        } else {
            let sum: f64 = entries.iter().map(|e| e.effective_pleasantness()).sum();
            Some(sum / entries.len() as f64)
        };

        JournalStats {
            entry_count: entries.len(),
            total_words: entries.iter().map(|e| e.word_count()).sum(),
            journaled_days: days.len(),
            months: months.into_iter().rev().collect(),
            average_pleasantness,
        }
    }
}

/// Month grouping key for an entry (`YYYY-MM`)
pub fn month_key(entry: &JournalEntry) -> String {
    entry.date.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry_on(y: i32, m: u32, d: u32, content: &str) -> JournalEntry {
        let mut entry = JournalEntry::new("t", content);
        entry.date = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        entry
    }

    #[test]
    fn test_empty_stats() {
        let stats = JournalStats::compute(&[]);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.journaled_days, 0);
        assert!(stats.months.is_empty());
        assert_eq!(stats.average_pleasantness, None);
    }

    #[test]
    fn test_stats_counts() {
        let entries = vec![
            entry_on(2025, 1, 17, "one two"),
            entry_on(2025, 1, 17, "three"),
            entry_on(2024, 12, 2, "four five six"),
        ];
        let stats = JournalStats::compute(&entries);
        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.total_words, 6);
        assert_eq!(stats.journaled_days, 2);
        assert_eq!(stats.months, vec!["2025-01", "2024-12"]);
        assert_eq!(stats.average_pleasantness, Some(0.5));
    }
}
