use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Normalized URLs already alerted on for one identifier
pub type SeenSet = BTreeSet<String>;

/// The persisted ledger: identifier → normalized URLs already alerted on
///
/// Ordered collections keep the on-disk file stable between runs so it
/// diffs cleanly and stays easy to inspect by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenState {
    /// Seen sets keyed by identifier
    #[serde(default)]
    pub seen: BTreeMap<String, SeenSet>,

    /// When the ledger was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SeenState {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the seen set for an identifier, if it has one
    pub fn seen_set(&self, identifier: &str) -> Option<&SeenSet> {
        self.seen.get(identifier)
    }

    /// Returns true if the identifier has a ledger entry
    pub fn has_entry(&self, identifier: &str) -> bool {
        self.seen.contains_key(identifier)
    }

    /// Returns true if the URL is recorded for the identifier
    pub fn contains(&self, identifier: &str, normalized_url: &str) -> bool {
        self.seen
            .get(identifier)
            .is_some_and(|set| set.contains(normalized_url))
    }

    /// Number of identifiers in the ledger
    pub fn identifier_count(&self) -> usize {
        self.seen.len()
    }

    /// Total number of recorded URLs across identifiers
    pub fn url_count(&self) -> usize {
        self.seen.values().map(BTreeSet::len).sum()
    }

    /// Adds URLs to an identifier's seen set, creating the entry if needed
    pub(crate) fn extend<I>(&mut self, identifier: &str, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.seen
            .entry(identifier.to_string())
            .or_default()
            .extend(urls);
    }

    /// Replaces an identifier's entry with the one from `previous`
    ///
    /// Used to decline committing a run's update for that identifier.
    pub(crate) fn restore_from(&mut self, previous: &SeenState, identifier: &str) {
        match previous.seen.get(identifier) {
            Some(set) => {
                self.seen.insert(identifier.to_string(), set.clone());
            }
            None => {
                self.seen.remove(identifier);
            }
        }
    }

    /// Stamps the ledger with the current time
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
