//! Adapter between engine state and the injected condition evaluator.
//!
//! The expression language itself is an external capability: the host
//! supplies anything implementing [`ConditionEvaluator`]. The engine hands
//! it the condition text plus an [`EvalContext`] exposing property lookup
//! and two read-only ledger callbacks. The evaluator must not mutate
//! engine state; everything the context exposes is re-entrant reads only.

use emblem_types::{EarnedBadge, PropertyMap, PropertyValue};
use thiserror::Error;

/// Prefix routing condition identifiers to system properties.
const SYSTEM_PREFIX: &str = "system.";

/// Failure inside the injected evaluator for one rule's condition.
///
/// Aborts only that rule's check for the current pass; evaluation of
/// subsequent rules continues.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("condition parse error: {0}")]
    Parse(String),
    #[error("condition evaluation error: {0}")]
    Eval(String),
}

/// Read-only view of engine state handed to the condition evaluator.
pub struct EvalContext<'a> {
    props: &'a PropertyMap,
    system: &'a PropertyMap,
    earned: &'a [EarnedBadge],
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(
        props: &'a PropertyMap,
        system: &'a PropertyMap,
        earned: &'a [EarnedBadge],
    ) -> Self {
        Self {
            props,
            system,
            earned,
        }
    }

    /// Look up a property by condition identifier. A `system.` prefix
    /// reads the system map; anything else reads user props.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        match name.strip_prefix(SYSTEM_PREFIX) {
            Some(system_name) => self.system.get(system_name),
            None => self.props.get(name),
        }
    }

    /// Whether the given rule id has ever been earned.
    pub fn has_earned_badge(&self, id: &str) -> bool {
        self.earned.iter().any(|entry| entry.id == id)
    }

    /// Cumulative earned count for the given rule id, 0 when never earned.
    pub fn badge_count(&self, id: &str) -> i64 {
        self.earned
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| i64::from(entry.count))
            .unwrap_or(0)
    }
}

/// Boolean-condition evaluator capability, injected by the host.
pub trait ConditionEvaluator {
    fn evaluate(&self, condition: &str, ctx: &EvalContext<'_>) -> Result<bool, EvalError>;
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&str, &EvalContext<'_>) -> Result<bool, EvalError>,
{
    fn evaluate(&self, condition: &str, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self(condition, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn context_routes_system_prefix() {
        let mut props = PropertyMap::new();
        props.insert("score".into(), PropertyValue::Number(5.0));
        let mut system = PropertyMap::new();
        system.insert("isNewDay".into(), PropertyValue::Bool(true));

        let ctx = EvalContext::new(&props, &system, &[]);
        assert_eq!(ctx.get("score"), Some(&PropertyValue::Number(5.0)));
        assert_eq!(ctx.get("system.isNewDay"), Some(&PropertyValue::Bool(true)));
        assert_eq!(ctx.get("isNewDay"), None);
        assert_eq!(ctx.get("system.score"), None);
    }

    #[test]
    fn ledger_lookups_default_when_absent() {
        let earned = [EarnedBadge {
            id: "b01".into(),
            count: 3,
            last_earned: DateTime::UNIX_EPOCH,
        }];
        let props = PropertyMap::new();
        let system = PropertyMap::new();

        let ctx = EvalContext::new(&props, &system, &earned);
        assert!(ctx.has_earned_badge("b01"));
        assert_eq!(ctx.badge_count("b01"), 3);
        assert!(!ctx.has_earned_badge("b02"));
        assert_eq!(ctx.badge_count("b02"), 0);
    }
}
