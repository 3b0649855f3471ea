//! Condition set maintenance
//!
//! Conditions are keyed by `type`. Merging a condition replaces the entry of
//! the same type; its `lastTransitionTime` only moves when `status` changes.

use chrono::{DateTime, Utc};
use crds::Condition;

/// Reason substituted for live conditions that report none
pub const UNKNOWN_REASON: &str = "Unknown";

/// Merge `condition` into `conditions`, stamping transition times with `now`.
///
/// Returns true when the set changed.
pub fn set_status_condition(conditions: &mut Vec<Condition>, mut condition: Condition, now: DateTime<Utc>) -> bool {
    if condition.reason.is_empty() {
        condition.reason = UNKNOWN_REASON.to_string();
    }

    let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition.r#type) else {
        if condition.last_transition_time.is_none() {
            condition.last_transition_time = Some(now);
        }
        conditions.push(condition);
        return true;
    };

    let mut changed = false;
    if existing.status != condition.status {
        existing.status = condition.status;
        existing.last_transition_time = Some(condition.last_transition_time.unwrap_or(now));
        changed = true;
    }
    if existing.reason != condition.reason {
        existing.reason = condition.reason;
        changed = true;
    }
    if existing.message != condition.message {
        existing.message = condition.message;
        changed = true;
    }
    if existing.observed_generation != condition.observed_generation {
        existing.observed_generation = condition.observed_generation;
        changed = true;
    }
    changed
}
