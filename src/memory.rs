//! Episodic memory store for a single agent
//!
//! Append-only record of past observations and trade outcomes. Retrieval
//! ranks entries by recency decay + normalized importance + a partner
//! match bonus. This is a linear scan per retrieval, which is fine because
//! per-agent memory volume is bounded by the simulation tick count.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Default hourly decay factor for memory recency
pub const DEFAULT_DECAY_FACTOR: f64 = 0.99;

/// One remembered observation or outcome
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    /// Free text, e.g. "Bought 5 Wood from Old_Tom for $25.00"
    pub content: String,
    /// 1-10 scale
    pub importance: u8,
    pub created_at: DateTime<Utc>,
    /// Open key-value map, e.g. {"partner": "Old_Tom"}
    pub metadata: HashMap<String, String>,
}

/// Append-only memory stream. Entries are never edited or deleted.
#[derive(Debug)]
pub struct MemoryStream {
    entries: Vec<MemoryEntry>,
    /// How fast memories fade, per hour elapsed
    decay_factor: f64,
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_FACTOR)
    }
}

impl MemoryStream {
    pub fn new(decay_factor: f64) -> Self {
        Self {
            entries: Vec::new(),
            decay_factor,
        }
    }

    pub fn add(&mut self, content: impl Into<String>, importance: u8) {
        self.add_with_metadata(content, importance, HashMap::new());
    }

    pub fn add_with_metadata(
        &mut self,
        content: impl Into<String>,
        importance: u8,
        metadata: HashMap<String, String>,
    ) {
        self.entries.push(MemoryEntry {
            content: content.into(),
            importance,
            created_at: Utc::now(),
            metadata,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view of every entry, in insertion order
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Rank all entries and return the top `limit` content strings.
    ///
    /// Score per entry: `decay^hours_elapsed + importance/10 + 1.0` if
    /// `partner` matches the entry's recorded partner metadata. Ties keep
    /// insertion order (the sort is stable), so older memories win ties.
    pub fn retrieve_relevant(&self, partner: Option<&str>, limit: usize) -> Vec<String> {
        let now = Utc::now();

        let mut scored: Vec<(f64, &MemoryEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let hours_passed =
                    (now - entry.created_at).num_milliseconds() as f64 / 3_600_000.0;
                let recency = self.decay_factor.powf(hours_passed.max(0.0));
                let importance = f64::from(entry.importance) / 10.0;
                let relevance = match (partner, entry.metadata.get("partner")) {
                    (Some(name), Some(recorded)) if name == recorded => 1.0,
                    _ => 0.0,
                };
                (recency + importance + relevance, entry)
            })
            .collect();

        // Stable descending sort — equal scores retain insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry.content.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner_meta(name: &str) -> HashMap<String, String> {
        HashMap::from([("partner".to_string(), name.to_string())])
    }

    #[test]
    fn test_higher_importance_ranks_first() {
        let mut memory = MemoryStream::default();
        memory.add("observed the market", 1);
        memory.add("big trade with Mark", 7);

        let top = memory.retrieve_relevant(None, 1);
        assert_eq!(top, vec!["big trade with Mark".to_string()]);
    }

    #[test]
    fn test_partner_bonus_outweighs_importance() {
        let mut memory = MemoryStream::default();
        memory.add("unrelated but important", 7);
        memory.add_with_metadata("sold wood to Ann", 3, partner_meta("Ann"));

        // importance gap is 0.4, partner bonus is 1.0
        let top = memory.retrieve_relevant(Some("Ann"), 1);
        assert_eq!(top, vec!["sold wood to Ann".to_string()]);
    }

    #[test]
    fn test_tie_break_keeps_insertion_order() {
        let mut memory = MemoryStream::default();
        memory.add("first", 5);
        memory.add("second", 5);
        memory.add("third", 5);

        let ranked = memory.retrieve_relevant(None, 3);
        assert_eq!(ranked, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_limit_truncates() {
        let mut memory = MemoryStream::default();
        for i in 0..5 {
            memory.add(format!("entry {i}"), 5);
        }
        assert_eq!(memory.retrieve_relevant(None, 2).len(), 2);
    }

    #[test]
    fn test_entries_are_append_only() {
        let mut memory = MemoryStream::default();
        memory.add("a", 1);
        memory.add("b", 2);
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.entries()[0].content, "a");
    }
}
