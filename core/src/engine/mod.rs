//! Lifecycle controller.
//!
//! Owns the whole engine state and orchestrates every host-facing
//! operation: value mutations, session/game transitions, evaluation
//! passes, and notification hooks. Data flows one direction per call:
//! property mutation, period refresh, rule pass, ledger update,
//! notifications, then the newly-earned badges back to the caller.
//!
//! Single-threaded and synchronous throughout; hosts needing concurrent
//! access serialize calls externally.


use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use emblem_types::{
    BadgeState, EarnedBadge, GameEndReason, Period, PeriodWindow, PropertyMap, PropertyValue, Rule,
};

use crate::clock::Clock;
use crate::eval::{ConditionEvaluator, EvalContext};
use crate::ledger;
use crate::periods::{self, RolloverFlags};
use crate::properties::{self, sys};

/// Read-only view of properties handed to lifecycle hooks.
pub struct PropsSnapshot<'a> {
    pub props: &'a PropertyMap,
    pub system: &'a PropertyMap,
}

type EarnedHook = Box<dyn FnMut(&EarnedBadge)>;
type PeriodHook = Box<dyn FnMut(&RolloverFlags)>;
type LifecycleHook = Box<dyn FnMut(PropsSnapshot<'_>)>;

/// Host-settable notification callbacks. All optional, all synchronous,
/// all receive read-only data; write re-entry into the engine is not
/// supported (hooks hold no engine reference).
#[derive(Default)]
struct Hooks {
    on_badge_earned: Option<EarnedHook>,
    on_new_time_period: Option<PeriodHook>,
    on_session_start: Option<LifecycleHook>,
    on_session_end: Option<LifecycleHook>,
    on_game_start: Option<LifecycleHook>,
    on_game_end: Option<LifecycleHook>,
}

/// Per-axis lifecycle status, mirrored into system props as a string so
/// it survives a state round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AxisStatus {
    #[default]
    None,
    Started,
    InProgress,
    Ended,
}

impl AxisStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Started => "started",
            Self::InProgress => "inProgress",
            Self::Ended => "ended",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "started" => Self::Started,
            "inProgress" => Self::InProgress,
            "ended" => Self::Ended,
            _ => Self::None,
        }
    }
}

/// The two independent lifecycle axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Session,
    Game,
}

impl Axis {
    fn period(self) -> Period {
        match self {
            Self::Session => Period::Session,
            Self::Game => Period::Game,
        }
    }

    fn is_new_prop(self) -> &'static str {
        match self {
            Self::Session => sys::IS_NEW_SESSION,
            Self::Game => sys::IS_NEW_GAME,
        }
    }

    fn is_ended_prop(self) -> &'static str {
        match self {
            Self::Session => sys::IS_SESSION_ENDED,
            Self::Game => sys::IS_GAME_ENDED,
        }
    }

    fn status_prop(self) -> &'static str {
        match self {
            Self::Session => sys::SESSION_STATUS,
            Self::Game => sys::GAME_STATUS,
        }
    }

    fn count_prop(self) -> &'static str {
        match self {
            Self::Session => sys::SESSION_COUNT,
            Self::Game => sys::GAME_COUNT,
        }
    }

    fn end_count_prop(self) -> &'static str {
        match self {
            Self::Session => sys::SESSION_END_COUNT,
            Self::Game => sys::GAME_END_COUNT,
        }
    }
}

/// The badge engine: period tracker, property store, earning ledger and
/// lifecycle state machine behind one host-facing surface.
///
/// Construction takes the immutable rule set plus the two injected
/// capabilities: a [`Clock`] (owning the host's time zone) and a
/// [`ConditionEvaluator`].
pub struct BadgeEngine {
    rules: Vec<Rule>,
    state: BadgeState,
    clock: Box<dyn Clock>,
    evaluator: Box<dyn ConditionEvaluator>,
    hooks: Hooks,
}

impl BadgeEngine {
    pub fn new(
        rules: Vec<Rule>,
        clock: impl Clock + 'static,
        evaluator: impl ConditionEvaluator + 'static,
    ) -> Self {
        // Rule ids must stay unique for the ledger's lifetime; keep the
        // first occurrence and drop later duplicates.
        let mut unique: Vec<Rule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if unique.iter().any(|existing| existing.id == rule.id) {
                tracing::warn!(rule = %rule.id, "duplicate rule id dropped");
                continue;
            }
            unique.push(rule);
        }

        let mut state = BadgeState::default();
        periods::ensure_initialized(&mut state.periods);

        Self {
            rules: unique,
            state,
            clock: Box::new(clock),
            evaluator: Box::new(evaluator),
            hooks: Hooks::default(),
        }
    }

    // ── Hooks ────────────────────────────────────────────────────────────

    pub fn on_badge_earned(&mut self, hook: impl FnMut(&EarnedBadge) + 'static) {
        self.hooks.on_badge_earned = Some(Box::new(hook));
    }

    pub fn on_new_time_period(&mut self, hook: impl FnMut(&RolloverFlags) + 'static) {
        self.hooks.on_new_time_period = Some(Box::new(hook));
    }

    pub fn on_session_start(&mut self, hook: impl FnMut(PropsSnapshot<'_>) + 'static) {
        self.hooks.on_session_start = Some(Box::new(hook));
    }

    pub fn on_session_end(&mut self, hook: impl FnMut(PropsSnapshot<'_>) + 'static) {
        self.hooks.on_session_end = Some(Box::new(hook));
    }

    pub fn on_game_start(&mut self, hook: impl FnMut(PropsSnapshot<'_>) + 'static) {
        self.hooks.on_game_start = Some(Box::new(hook));
    }

    pub fn on_game_end(&mut self, hook: impl FnMut(PropsSnapshot<'_>) + 'static) {
        self.hooks.on_game_end = Some(Box::new(hook));
    }

    // ── State ────────────────────────────────────────────────────────────

    /// Replace the engine state with a host-loaded snapshot. Missing
    /// period windows are re-initialized; everything else is taken as-is.
    pub fn load_state(&mut self, state: BadgeState) {
        self.state = state;
        periods::ensure_initialized(&mut self.state.periods);
    }

    /// Snapshot the full persisted state.
    pub fn to_state(&self) -> BadgeState {
        self.state.clone()
    }

    /// The rule set, in declared (evaluation) order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    // ── Value operations ─────────────────────────────────────────────────

    /// Stored value for a user property, or `default` when absent.
    pub fn get_value(&self, name: &str, default: impl Into<PropertyValue>) -> PropertyValue {
        self.state
            .props
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Overwrite a user property, then run an evaluation pass.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Vec<EarnedBadge> {
        self.set_value_deferred(name, value);
        self.evaluate()
    }

    /// Overwrite a user property without evaluating, for atomic
    /// multi-property updates ahead of one pass.
    pub fn set_value_deferred(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.state.props.insert(name.to_string(), value.into());
    }

    /// Add a numeric delta (coercing non-numbers to 0 first), then run an
    /// evaluation pass.
    pub fn add_value(&mut self, name: &str, delta: f64) -> Vec<EarnedBadge> {
        self.add_value_deferred(name, delta);
        self.evaluate()
    }

    pub fn add_value_deferred(&mut self, name: &str, delta: f64) {
        properties::add_to(&mut self.state.props, name, delta);
    }

    /// Subtract a numeric delta, then run an evaluation pass.
    pub fn subtract_value(&mut self, name: &str, delta: f64) -> Vec<EarnedBadge> {
        self.subtract_value_deferred(name, delta);
        self.evaluate()
    }

    pub fn subtract_value_deferred(&mut self, name: &str, delta: f64) {
        properties::add_to(&mut self.state.props, name, -delta);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub fn start_session(&mut self) -> Vec<EarnedBadge> {
        self.start_axis(Axis::Session)
    }

    pub fn end_session(&mut self) -> Vec<EarnedBadge> {
        self.end_axis(Axis::Session, None)
    }

    pub fn start_game(&mut self) -> Vec<EarnedBadge> {
        self.start_axis(Axis::Game)
    }

    pub fn end_game(&mut self, reason: GameEndReason) -> Vec<EarnedBadge> {
        self.end_axis(Axis::Game, Some(reason))
    }

    /// Run one evaluation pass: refresh period windows (notifying on a
    /// calendar rollover), rewrite calendar system props, then check every
    /// active rule in declared order. Idempotent when neither properties
    /// nor time buckets changed.
    pub fn evaluate(&mut self) -> Vec<EarnedBadge> {
        let now_utc = self.refresh_periods();
        self.run_rules(now_utc)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Badges earned within the current window of `period`
    /// (`Period::Global` returns everything ever earned).
    pub fn earned_badges(&self, period: Period) -> Vec<EarnedBadge> {
        let window_start = self
            .state
            .periods
            .get(&period)
            .map(|window| window.last_timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH);
        ledger::since(&self.state.earned, window_start)
    }

    /// Badges earned at or after `instant`, in ledger order.
    pub fn earned_badges_since(&self, instant: DateTime<Utc>) -> Vec<EarnedBadge> {
        ledger::since(&self.state.earned, instant)
    }

    /// Store the current UTC instant under a caller-chosen cursor name.
    pub fn set_bookmark(&mut self, name: &str) {
        let now = self.clock.now_utc();
        self.state.bookmarks.insert(name.to_string(), now);
    }

    /// Badges earned since the named bookmark; an unset bookmark reads as
    /// the epoch, returning everything.
    pub fn earned_badges_since_bookmark(&self, name: &str) -> Vec<EarnedBadge> {
        let since = self
            .state
            .bookmarks
            .get(name)
            .copied()
            .unwrap_or(DateTime::UNIX_EPOCH);
        ledger::since(&self.state.earned, since)
    }

    pub fn clear_bookmark(&mut self, name: &str) {
        self.state.bookmarks.remove(name);
    }

    pub fn has_earned_badge(&self, id: &str) -> bool {
        ledger::has_earned(&self.state.earned, id)
    }

    pub fn badge_count(&self, id: &str) -> i64 {
        ledger::badge_count(&self.state.earned, id)
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn start_axis(&mut self, axis: Axis) -> Vec<EarnedBadge> {
        let mut newly = Vec::new();

        // Exactly one open instance per axis: auto-close the prior one.
        if self.status(axis) == AxisStatus::InProgress {
            let reason = match axis {
                Axis::Game => Some(GameEndReason::NewStart),
                Axis::Session => None,
            };
            newly.extend(self.end_axis(axis, reason));
        }

        let now_utc = self.refresh_periods();

        self.set_sys(axis.is_new_prop(), true);
        self.set_sys(axis.is_ended_prop(), false);
        self.set_status(axis, AxisStatus::Started);

        let count = periods::advance_counter(&mut self.state.periods, axis.period(), now_utc);
        self.set_sys(axis.count_prop(), count);
        tracing::debug!(axis = ?axis, count, "axis started");

        match axis {
            Axis::Session => fire_lifecycle(&mut self.hooks.on_session_start, &self.state),
            Axis::Game => fire_lifecycle(&mut self.hooks.on_game_start, &self.state),
        }

        newly.extend(self.run_rules(now_utc));

        self.set_sys(axis.is_new_prop(), false);
        self.set_status(axis, AxisStatus::InProgress);

        newly
    }

    fn end_axis(&mut self, axis: Axis, reason: Option<GameEndReason>) -> Vec<EarnedBadge> {
        self.set_sys(axis.is_ended_prop(), true);
        self.set_status(axis, AxisStatus::Ended);

        self.bump_sys(axis.end_count_prop());
        match reason {
            Some(GameEndReason::Win) => self.bump_sys(sys::GAME_WIN_COUNT),
            Some(GameEndReason::Lose) => self.bump_sys(sys::GAME_LOSE_COUNT),
            Some(GameEndReason::Cancel) => self.bump_sys(sys::GAME_CANCEL_COUNT),
            Some(GameEndReason::NewStart) | None => {}
        }
        tracing::debug!(axis = ?axis, reason = ?reason, "axis ended");

        match axis {
            Axis::Session => fire_lifecycle(&mut self.hooks.on_session_end, &self.state),
            Axis::Game => fire_lifecycle(&mut self.hooks.on_game_end, &self.state),
        }

        self.evaluate()
    }

    /// Refresh calendar windows from the clock, rewrite calendar system
    /// props, and fire `on_new_time_period` at most once. Returns the UTC
    /// instant of the reading, which stamps everything in this pass.
    fn refresh_periods(&mut self) -> DateTime<Utc> {
        let now_local = self.clock.now();
        let now_utc = now_local.with_timezone(&Utc);

        let flags = periods::refresh(&mut self.state.periods, now_local, now_utc);
        self.write_calendar_props(now_local, &flags);

        if flags.any() {
            tracing::debug!(?flags, "calendar period rolled over");
            if let Some(hook) = self.hooks.on_new_time_period.as_mut() {
                hook(&flags);
            }
        }

        now_utc
    }

    /// Check every active rule in declared order against the current
    /// context. Evaluator failures skip only the offending rule.
    fn run_rules(&mut self, now_utc: DateTime<Utc>) -> Vec<EarnedBadge> {
        let mut newly = Vec::new();
        let Self {
            rules,
            state,
            evaluator,
            hooks,
            ..
        } = self;

        for rule in rules.iter().filter(|rule| rule.active) {
            let matched = {
                let ctx = EvalContext::new(&state.props, &state.system_props, &state.earned);
                match evaluator.evaluate(&rule.condition, &ctx) {
                    Ok(matched) => matched,
                    Err(error) => {
                        tracing::error!(rule = %rule.id, %error, "rule condition failed to evaluate");
                        continue;
                    }
                }
            };
            if !matched {
                continue;
            }

            let period_last = window_timestamp(&state.periods, rule.update_period);
            if let Some(entry) = ledger::record_if_matched(&mut state.earned, rule, period_last, now_utc)
            {
                tracing::info!(badge = %entry.id, count = entry.count, "badge earned");
                if let Some(hook) = hooks.on_badge_earned.as_mut() {
                    hook(&entry);
                }
                newly.push(entry);
            }
        }

        newly
    }

    fn write_calendar_props(&mut self, now_local: DateTime<FixedOffset>, flags: &RolloverFlags) {
        self.set_sys(sys::IS_NEW_YEAR, flags.is_new_year);
        self.set_sys(sys::IS_NEW_MONTH, flags.is_new_month);
        self.set_sys(sys::IS_NEW_WEEK, flags.is_new_week);
        self.set_sys(sys::IS_NEW_DAY, flags.is_new_day);
        self.set_sys(sys::IS_NEW_HOUR, flags.is_new_hour);

        self.set_sys(sys::DATE, now_local.format("%Y-%m-%d").to_string());
        self.set_sys(sys::TIME, now_local.format("%H:%M").to_string());
        let weekday = periods::iso_weekday(now_local);
        self.set_sys(sys::WEEK_DAY, i64::from(weekday));
        self.set_sys(sys::IS_WEEK_DAY, weekday <= 5);
    }

    fn status(&self, axis: Axis) -> AxisStatus {
        match self.state.system_props.get(axis.status_prop()) {
            Some(PropertyValue::Text(s)) => AxisStatus::parse(s),
            _ => AxisStatus::None,
        }
    }

    fn set_status(&mut self, axis: Axis, status: AxisStatus) {
        self.set_sys(axis.status_prop(), status.as_str());
    }

    fn set_sys(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.state
            .system_props
            .insert(name.to_string(), value.into());
    }

    fn bump_sys(&mut self, name: &str) {
        properties::add_to(&mut self.state.system_props, name, 1.0);
    }
}

fn window_timestamp(
    periods: &BTreeMap<Period, PeriodWindow>,
    period: Period,
) -> DateTime<Utc> {
    periods
        .get(&period)
        .map(|window| window.last_timestamp)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn fire_lifecycle(hook: &mut Option<LifecycleHook>, state: &BadgeState) {
    if let Some(hook) = hook.as_mut() {
        hook(PropsSnapshot {
            props: &state.props,
            system: &state.system_props,
        });
    }
}
