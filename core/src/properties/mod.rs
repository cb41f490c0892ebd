//! Property storage helpers and system property names.
//!
//! Two disjoint maps share one value type: user `props` (mutated only by
//! the host's value operations) and `system_props` (mutated only by the
//! engine during lifecycle transitions and evaluation passes). Rule
//! conditions see the latter under the `system.` prefix.

use emblem_types::{PropertyMap, PropertyValue};

/// System property names, as they appear in persisted state and in rule
/// conditions (`system.<name>`).
pub mod sys {
    // Calendar rollover flags, true only on the pass that detected the roll.
    pub const IS_NEW_YEAR: &str = "isNewYear";
    pub const IS_NEW_MONTH: &str = "isNewMonth";
    pub const IS_NEW_WEEK: &str = "isNewWeek";
    pub const IS_NEW_DAY: &str = "isNewDay";
    pub const IS_NEW_HOUR: &str = "isNewHour";

    // Lifecycle flags and status strings.
    pub const IS_NEW_SESSION: &str = "isNewSession";
    pub const IS_NEW_GAME: &str = "isNewGame";
    pub const IS_SESSION_ENDED: &str = "isSessionEnded";
    pub const IS_GAME_ENDED: &str = "isGameEnded";
    pub const SESSION_STATUS: &str = "sessionStatus";
    pub const GAME_STATUS: &str = "gameStatus";

    // Lifetime counters.
    pub const SESSION_COUNT: &str = "sessionCount";
    pub const GAME_COUNT: &str = "gameCount";
    pub const SESSION_END_COUNT: &str = "sessionEndCount";
    pub const GAME_END_COUNT: &str = "gameEndCount";
    pub const GAME_WIN_COUNT: &str = "gameWinCount";
    pub const GAME_LOSE_COUNT: &str = "gameLoseCount";
    pub const GAME_CANCEL_COUNT: &str = "gameCancelCount";

    // Calendar context, rewritten on every evaluation pass.
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const WEEK_DAY: &str = "weekDay";
    pub const IS_WEEK_DAY: &str = "isWeekDay";
}

/// Numeric view of a possibly-missing property: missing resolves to 0.0,
/// non-numeric values coerce per [`PropertyValue::as_number`].
pub fn coerce_number(value: Option<&PropertyValue>) -> f64 {
    value.map(PropertyValue::as_number).unwrap_or(0.0)
}

/// Apply a numeric delta to a property, converting its type to numeric if
/// needed. Returns the new value.
pub fn add_to(props: &mut PropertyMap, name: &str, delta: f64) -> f64 {
    let next = coerce_number(props.get(name)) + delta;
    props.insert(name.to_string(), PropertyValue::Number(next));
    next
}
