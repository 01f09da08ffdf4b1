//! Freshness policies for markers and spec activity.
//!
//! Two named policies, kept separate so each is independently testable:
//!
//! - `MissingMeansUnmet` ([`is_fresh`]): a missing marker never satisfies a
//!   freshness check. Applied to all marker reads (fail-closed).
//! - `UnknownMeansSkip` lives in `io::evidence`: an unrecognized project
//!   runtime silently skips the test run rather than failing.

use std::time::{Duration, SystemTime};

/// `MissingMeansUnmet`: true iff the record exists and `(now - created_at) < ttl`.
///
/// A `created_at` in the future (clock skew) counts as age zero, i.e. fresh.
pub fn is_fresh(created_at: Option<SystemTime>, now: SystemTime, ttl: Duration) -> bool {
    match created_at {
        None => false,
        Some(t) => now.duration_since(t).unwrap_or(Duration::ZERO) < ttl,
    }
}

/// Bootstrap arming rule: block a fresh session unless the newest spec
/// artifact was modified within the spec TTL.
pub fn should_arm_block(
    newest_spec_mtime: Option<SystemTime>,
    now: SystemTime,
    spec_ttl: Duration,
) -> bool {
    !is_fresh(newest_spec_mtime, now, spec_ttl)
}
