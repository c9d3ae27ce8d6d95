//! Conversion history
//!
//! Newest-first list of past conversions, held only in memory. Identifiers
//! are unique within the list.

use chrono::Utc;

use crate::artifacts::ArtifactRef;

/// Status label for a successful conversion.
pub const STATUS_COMPLETED: &str = "Completed";

/// Date label given to entries created in this session.
pub const DATE_JUST_NOW: &str = "Just now";

/// Placeholder entries shown before the user has converted anything.
const SEED_ENTRIES: [(&str, &str, &str); 6] = [
    ("1", "Thesis_Final_Draft.docx", "Just now"),
    ("2", "Chapter_1_Rev2.pdf", "2 hours ago"),
    ("3", "Abstract_Indo.docx", "Yesterday"),
    ("4", "Proposal_Skripsi.pdf", "2 days ago"),
    ("5", "Journal_Article_v1.docx", "3 days ago"),
    ("6", "Essay_Pancasila.pdf", "Last week"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    /// Coarse relative label, e.g. "Just now" or "2 days ago".
    pub date: String,
    pub status: String,
    pub artifact: Option<ArtifactRef>,
}

impl HistoryEntry {
    /// Entry for a conversion that just finished.
    pub fn completed(id: String, title: impl Into<String>, artifact: ArtifactRef) -> Self {
        Self {
            id,
            title: title.into(),
            date: DATE_JUST_NOW.to_string(),
            status: STATUS_COMPLETED.to_string(),
            artifact: Some(artifact),
        }
    }

    pub fn download_name(&self) -> String {
        format!("humanized_{}", self.title)
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History pre-filled with the placeholder entries.
    pub fn seeded() -> Self {
        let entries = SEED_ENTRIES
            .iter()
            .map(|(id, title, date)| HistoryEntry {
                id: id.to_string(),
                title: title.to_string(),
                date: date.to_string(),
                status: STATUS_COMPLETED.to_string(),
                artifact: None,
            })
            .collect();
        Self { entries }
    }

    /// Time-derived identifier not yet used by any entry.
    pub fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.contains(&candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Insert at the front. Refused (returns false) if the id is taken.
    pub fn prepend(&mut self, entry: HistoryEntry) -> bool {
        if self.contains(&entry.id) {
            return false;
        }
        self.entries.insert(0, entry);
        true
    }

    /// Remove the entry with `id`, if present.
    pub fn remove(&mut self, id: &str) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Drop every entry, returning what was removed.
    pub fn clear(&mut self) -> Vec<HistoryEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Entries whose title contains `query`, ignoring case. Order is kept.
    pub fn filter(&self, query: &str) -> Vec<&HistoryEntry> {
        if query.is_empty() {
            return self.entries.iter().collect();
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Filtered entries, cut to `limit` unless `show_all` is set.
    pub fn preview(&self, query: &str, show_all: bool, limit: usize) -> Vec<&HistoryEntry> {
        let mut matches = self.filter(query);
        if !show_all {
            matches.truncate(limit);
        }
        matches
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
