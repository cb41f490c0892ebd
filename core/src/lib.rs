pub mod clock;
pub mod engine;
pub mod eval;
pub mod ledger;
pub mod periods;
pub mod properties;

// Re-exports for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{BadgeEngine, PropsSnapshot};
pub use eval::{ConditionEvaluator, EvalContext, EvalError};
pub use periods::RolloverFlags;

pub use emblem_types::{
    BadgeState, EarnedBadge, GameEndReason, Period, PeriodWindow, PropertyMap, PropertyValue, Rule,
};
