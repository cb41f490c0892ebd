//! Earned-badge ledger.
//!
//! One entry per rule that has ever matched, in first-earned order.
//! Entries are never deleted; re-fires are gated by the rule's update
//! period (at most once while that window's timestamp is unchanged) and
//! by the rule's optional lifetime max.

use chrono::{DateTime, Utc};
use emblem_types::{EarnedBadge, Rule};

/// Record a rule match, subject to the period gate and max cap.
///
/// `period_last` is the `last_timestamp` of the rule's update-period
/// window. Returns a snapshot of the entry when the count actually moved.
pub fn record_if_matched(
    earned: &mut Vec<EarnedBadge>,
    rule: &Rule,
    period_last: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<EarnedBadge> {
    match earned.iter_mut().find(|entry| entry.id == rule.id) {
        None => {
            let entry = EarnedBadge {
                id: rule.id.clone(),
                count: 1,
                last_earned: now,
            };
            earned.push(entry.clone());
            Some(entry)
        }
        Some(entry) => {
            // The window has not advanced since this rule last fired.
            if period_last <= entry.last_earned {
                return None;
            }
            // Cap reached, permanently.
            if let Some(max) = rule.max
                && entry.count >= max
            {
                return None;
            }
            entry.count += 1;
            entry.last_earned = now;
            Some(entry.clone())
        }
    }
}

/// All entries earned at or after `instant`, in ledger order.
pub fn since(earned: &[EarnedBadge], instant: DateTime<Utc>) -> Vec<EarnedBadge> {
    earned
        .iter()
        .filter(|entry| entry.last_earned >= instant)
        .cloned()
        .collect()
}

pub fn has_earned(earned: &[EarnedBadge], id: &str) -> bool {
    earned.iter().any(|entry| entry.id == id)
}

pub fn badge_count(earned: &[EarnedBadge], id: &str) -> i64 {
    earned
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| i64::from(entry.count))
        .unwrap_or(0)
}
