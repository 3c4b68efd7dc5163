mod conditional_rule;
mod feature_maxspeed;
mod maxspeed;
mod speed_in_units;
mod speed_macro;
mod speed_units;

pub use conditional_rule::ConditionalRule;
pub use feature_maxspeed::{ConditionalMaxspeed, FeatureMaxspeed};
pub use maxspeed::{Direction, Maxspeed};
pub use speed_in_units::{
    is_numeric_speed, SpeedInUnits, INVALID_SPEED, NONE_MAXSPEED, WALK_MAXSPEED,
};
pub use speed_macro::SpeedMacro;
pub use speed_units::SpeedUnits;
