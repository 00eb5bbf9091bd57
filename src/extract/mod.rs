//! Link extraction module
//!
//! This module turns raw markup into a deduplicated, ordered set of absolute,
//! same-site, content-bearing URLs. It is a pure function of its inputs: no
//! network access, and malformed fragments degrade to skipped candidates
//! rather than errors.

mod extractor;
mod normalize;
mod origin;

pub use extractor::extract;
pub use normalize::normalize_candidate;
pub use origin::{is_denylisted_asset, same_site};
