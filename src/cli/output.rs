//! Output formatting utilities

use crate::application::{ImportReport, RelocateReport};
use crate::domain::emotions::EMOTION_CATEGORIES;
use crate::domain::{JournalEntry, JournalStats};

/// Characters of the id shown in listings
const SHORT_ID_LEN: usize = 8;

pub fn short_id(entry: &JournalEntry) -> String {
    entry.id().to_string()[..SHORT_ID_LEN].to_string()
}

/// Format a list of entries for display
pub fn format_entry_list(entries: &[JournalEntry]) -> String {
    if entries.is_empty() {
        return "No entries found".to_string();
    }

    let mut output = String::new();
    for entry in entries {
        let pin = if entry.is_pinned { "* " } else { "" };
        let title = if entry.title.trim().is_empty() {
            "(untitled)"
        } else {
            entry.title.as_str()
        };
        output.push_str(&format!(
            "{}  {}  {}{}  ({} words)\n",
            short_id(entry),
            entry.date.format("%Y-%m-%d"),
            pin,
            title,
            entry.word_count()
        ));
    }
    output
}

/// Format one entry with all of its metadata
pub fn format_entry_detail(entry: &JournalEntry) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n", entry.title));
    output.push_str(&format!("id: {}\n", entry.id()));
    output.push_str(&format!("date: {}\n", entry.date.to_rfc3339()));
    if entry.is_pinned {
        output.push_str("pinned: yes\n");
    }
    if !entry.emotions.is_empty() {
        output.push_str(&format!("emotions: {}\n", entry.emotions.join(", ")));
    }
    output.push_str(&format!(
        "pleasantness: {:.2}{}\n",
        entry.effective_pleasantness(),
        if entry.pleasantness().is_none() {
            " (from emotions)"
        } else {
            ""
        }
    ));
    if !entry.tags.is_empty() {
        output.push_str(&format!("tags: {}\n", entry.tags.join(", ")));
    }
    if !entry.attachments.is_empty() {
        output.push_str(&format!("attachments: {}\n", entry.attachments.len()));
    }
    output.push_str(&format!("words: {}\n\n", entry.word_count()));

    match entry.rich_payload() {
        Some(rich) => output.push_str(rich.as_str()),
        None => output.push_str(entry.content()),
    }
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

pub fn format_stats(stats: &JournalStats) -> String {
    let mut output = format!(
        "entries: {}\nwords: {}\ndays journaled: {}\n",
        stats.entry_count, stats.total_words, stats.journaled_days
    );
    if let Some(avg) = stats.average_pleasantness {
        output.push_str(&format!("average pleasantness: {:.2}\n", avg));
    }
    if !stats.months.is_empty() {
        output.push_str(&format!("months: {}\n", stats.months.join(", ")));
    }
    output
}

pub fn format_import_report(report: &ImportReport) -> String {
    format!(
        "Imported {} of {} entries ({} duplicates skipped, {} failed)",
        report.imported, report.scanned, report.skipped_duplicates, report.failed
    )
}

pub fn format_relocate_report(report: &RelocateReport) -> String {
    format!(
        "Moved journal to {} ({} files copied, {} already present). \
        The old folder {} was left in place.",
        report.to.display(),
        report.copied,
        report.skipped_existing,
        report.from.display()
    )
}

/// Format the emotion table, one category per line
pub fn format_emotions() -> String {
    let mut output = String::new();
    for category in EMOTION_CATEGORIES {
        output.push_str(&format!(
            "{} ({:.2}): {}\n",
            category.name,
            category.valence,
            category.emotions.join(", ")
        ));
    }
    output
}
