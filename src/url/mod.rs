//! URL handling module for vin-watch
//!
//! Search results for the same listing often differ only by tracking
//! parameters, casing, or a trailing slash. This module reduces a raw result
//! URL to the canonical key used for duplicate suppression.

mod normalize;

pub use normalize::{is_tracking_param, normalize_url};
