//! Persisted engine state.
//!
//! The host owns serialization timing and format; every type here is a
//! plain serde structure. Loading is forward-compatible: unknown fields are
//! ignored and missing containers default to empty.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rule::Period;
use crate::value::PropertyValue;

/// Property name to value mapping, used for both user and system properties.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// One tracked window: the current bucket key and the UTC instant the key
/// last changed (or the counter was last advanced).
///
/// `last_timestamp` only moves forward, and moves exactly when `key`
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodWindow {
    pub key: String,
    pub last_timestamp: DateTime<Utc>,
}

/// Ledger record for one rule that has matched at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    /// The rule id.
    pub id: String,
    /// Cumulative match count, at least 1. Never decreases.
    pub count: u32,
    /// UTC instant of the most recent match.
    pub last_earned: DateTime<Utc>,
}

/// The full persisted snapshot of one engine instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeState {
    /// Host-owned properties, mutated only by explicit value operations.
    #[serde(default)]
    pub props: PropertyMap,

    /// Engine-owned properties: rollover flags, lifetime counters,
    /// lifecycle status, calendar context. Exposed to rule conditions
    /// under the `system.` prefix.
    #[serde(default)]
    pub system_props: PropertyMap,

    #[serde(default)]
    pub periods: BTreeMap<Period, PeriodWindow>,

    /// One entry per rule that has ever matched, in first-earned order.
    /// Entries are never deleted.
    #[serde(default)]
    pub earned: Vec<EarnedBadge>,

    /// Caller-named timestamp cursors into the earned timeline. No effect
    /// on evaluation.
    #[serde(default)]
    pub bookmarks: BTreeMap<String, DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_loads_with_default_containers() {
        let state: BadgeState = serde_json::from_str("{}").unwrap();
        assert!(state.props.is_empty());
        assert!(state.periods.is_empty());
        assert!(state.earned.is_empty());
        assert!(state.bookmarks.is_empty());
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let json = r#"{"props":{"a":1},"futureField":{"x":true}}"#;
        let state: BadgeState = serde_json::from_str(json).unwrap();
        assert_eq!(state.props["a"], PropertyValue::Number(1.0));
    }

    #[test]
    fn persisted_shape_uses_camel_case_and_iso_timestamps() {
        let mut state = BadgeState::default();
        state.system_props.insert("isNewDay".into(), true.into());
        state.periods.insert(
            Period::Day,
            PeriodWindow {
                key: "2022-07-16".into(),
                last_timestamp: DateTime::UNIX_EPOCH,
            },
        );
        state.earned.push(EarnedBadge {
            id: "b01".into(),
            count: 1,
            last_earned: DateTime::UNIX_EPOCH,
        });

        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("systemProps").is_some());
        assert_eq!(json["periods"]["DAY"]["key"], "2022-07-16");
        assert_eq!(
            json["earned"][0]["lastEarned"],
            serde_json::json!("1970-01-01T00:00:00Z")
        );

        let back: BadgeState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
