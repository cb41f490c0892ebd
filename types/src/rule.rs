//! Badge rule definitions and period names.

use serde::{Deserialize, Serialize};

/// A named rolling time or counter window.
///
/// Calendar periods roll over when their formatted key changes; counter
/// periods (session/game) advance when the host starts a new instance;
/// `Global` never rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Global,
    Session,
    Game,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// Calendar periods in rollover-check order, coarsest first.
    pub const CALENDAR: [Period; 5] = [
        Period::Year,
        Period::Month,
        Period::Week,
        Period::Day,
        Period::Hour,
    ];

    pub fn is_calendar(self) -> bool {
        Self::CALENDAR.contains(&self)
    }

    pub fn is_counter(self) -> bool {
        matches!(self, Period::Session | Period::Game)
    }
}

/// Why a game ended. `NewStart` marks the implicit close performed when
/// `start_game` is called while a game is still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEndReason {
    Win,
    Lose,
    Cancel,
    NewStart,
}

/// A declarative badge rule.
///
/// Rules are host-supplied, immutable for the lifetime of an engine, and
/// evaluated in declared order. `condition` is a boolean expression over
/// user properties and `system.*` properties, evaluated by the injected
/// condition evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique id; also the earned-badge id in the ledger.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Inactive rules are skipped entirely during evaluation.
    pub active: bool,

    /// Lifetime cap on the earned count. Once reached, the rule never
    /// fires again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,

    /// The window gating how often this rule may re-fire: at most once
    /// while the window's timestamp is unchanged.
    pub update_period: Period,

    pub condition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_parses_from_camel_case_json() {
        let json = r#"{
            "id": "b01",
            "description": "first game",
            "active": true,
            "updatePeriod": "GAME",
            "condition": "gameCount == 1"
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();

        assert_eq!(rule.id, "b01");
        assert_eq!(rule.update_period, Period::Game);
        assert_eq!(rule.max, None);
        assert!(rule.active);
    }

    #[test]
    fn period_names_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&Period::Global).unwrap(), "\"GLOBAL\"");
        assert_eq!(serde_json::to_string(&Period::Week).unwrap(), "\"WEEK\"");
        let p: Period = serde_json::from_str("\"SESSION\"").unwrap();
        assert_eq!(p, Period::Session);
    }

    #[test]
    fn calendar_and_counter_split_is_disjoint() {
        for p in Period::CALENDAR {
            assert!(p.is_calendar());
            assert!(!p.is_counter());
        }
        assert!(Period::Session.is_counter());
        assert!(Period::Game.is_counter());
        assert!(!Period::Global.is_calendar());
        assert!(!Period::Global.is_counter());
    }
}
