//! State module for the seen-URL ledger
//!
//! # Components
//!
//! - `SeenState`: maps each identifier to the normalized URLs already alerted on
//! - `BaselinePolicy`: what to do with results for an identifier seen for the first time

mod baseline;
mod seen_state;

// Re-export main types
pub use baseline::BaselinePolicy;
pub use seen_state::{SeenSet, SeenState};
