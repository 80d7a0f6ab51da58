//! Diff engine: decides which search results are new for an identifier
//!
//! The ledger is passed in by value and handed back updated, so the whole
//! dedup protocol can be exercised without touching the filesystem.

use crate::state::{BaselinePolicy, SeenSet, SeenState};
use crate::url::normalize_url;
use std::collections::BTreeSet;

/// Result of diffing one identifier's search results against the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Normalized URLs not previously seen, sorted
    pub new_urls: Vec<String>,

    /// Ledger with the identifier's seen set replaced by `known ∪ candidates`
    pub state: SeenState,

    /// True if the identifier had no ledger entry before this run
    pub baseline: bool,
}

/// Computes the newly seen URLs for `identifier` and the updated ledger
///
/// Every raw result is normalized and deduplicated. URLs already in the
/// identifier's seen set are dropped; the rest are reported as new unless
/// this is a baseline run under [`BaselinePolicy::Seed`]. The seen set grows
/// to the union of what was known and everything returned this run. An
/// empty result list leaves the ledger untouched.
///
/// # Examples
///
/// ```
/// use vin_watch::{compute_new, BaselinePolicy, SeenState};
///
/// let results = ["http://a.com/x?utm_source=fb", "http://a.com/x"];
/// let first = compute_new("1HGCM82633A004352", &results, SeenState::new(), BaselinePolicy::Alert);
/// assert_eq!(first.new_urls, vec!["http://a.com/x"]);
///
/// let second = compute_new("1HGCM82633A004352", &results, first.state, BaselinePolicy::Alert);
/// assert!(second.new_urls.is_empty());
/// ```
pub fn compute_new<S: AsRef<str>>(
    identifier: &str,
    raw_results: &[S],
    state: SeenState,
    policy: BaselinePolicy,
) -> DiffOutcome {
    let mut state = state;
    let baseline = !state.has_entry(identifier);

    let candidates: BTreeSet<String> = raw_results
        .iter()
        .map(|raw| normalize_url(raw.as_ref()))
        .filter(|url| !url.is_empty())
        .collect();

    if candidates.is_empty() {
        return DiffOutcome {
            new_urls: Vec::new(),
            state,
            baseline,
        };
    }

    let empty = SeenSet::new();
    let known = state.seen_set(identifier).unwrap_or(&empty);

    // BTreeSet iteration is already sorted
    let new_urls: Vec<String> = if baseline && !policy.alerts_on_baseline() {
        tracing::info!(
            "Seeding {} baseline URLs for {} without alerting",
            candidates.len(),
            identifier
        );
        Vec::new()
    } else {
        candidates.difference(known).cloned().collect()
    };

    state.extend(identifier, candidates);

    DiffOutcome {
        new_urls,
        state,
        baseline,
    }
}
