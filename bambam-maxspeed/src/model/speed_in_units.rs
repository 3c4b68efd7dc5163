use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uom::si::{f64::Velocity, velocity::kilometer_per_hour};

use crate::model::SpeedUnits;

/// magnitude meaning "no speed data".
pub const INVALID_SPEED: u16 = u16::MAX;
/// magnitude meaning "no legal speed limit", e.g. an unrestricted motorway.
pub const NONE_MAXSPEED: u16 = u16::MAX - 1;
/// magnitude meaning "walking pace". does not depend on the unit system.
pub const WALK_MAXSPEED: u16 = u16::MAX - 2;

/// a speed limit magnitude tagged with the unit system it was posted in.
///
/// the three sentinel magnitudes ([`INVALID_SPEED`], [`NONE_MAXSPEED`],
/// [`WALK_MAXSPEED`]) carry no unit, so equality ignores `units` for them:
///
/// ```
/// # use bambam_maxspeed::model::{SpeedInUnits, SpeedUnits, NONE_MAXSPEED};
/// let a = SpeedInUnits::new(NONE_MAXSPEED, SpeedUnits::Metric);
/// let b = SpeedInUnits::new(NONE_MAXSPEED, SpeedUnits::Imperial);
/// assert_eq!(a, b);
/// assert_ne!(
///     SpeedInUnits::new(30, SpeedUnits::Metric),
///     SpeedInUnits::new(30, SpeedUnits::Imperial)
/// );
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SpeedInUnits {
    pub speed: u16,
    pub units: SpeedUnits,
}

impl SpeedInUnits {
    pub fn new(speed: u16, units: SpeedUnits) -> SpeedInUnits {
        SpeedInUnits { speed, units }
    }

    pub fn invalid() -> SpeedInUnits {
        SpeedInUnits::new(INVALID_SPEED, SpeedUnits::Metric)
    }

    pub fn none() -> SpeedInUnits {
        SpeedInUnits::new(NONE_MAXSPEED, SpeedUnits::Metric)
    }

    pub fn walk() -> SpeedInUnits {
        SpeedInUnits::new(WALK_MAXSPEED, SpeedUnits::Metric)
    }

    pub fn is_valid(&self) -> bool {
        self.speed != INVALID_SPEED
    }

    /// true if this is an actual posted value rather than one of the sentinels.
    pub fn is_numeric(&self) -> bool {
        is_numeric_speed(self.speed)
    }

    /// two speeds may share a record if their units agree or if either
    /// one is a sentinel.
    pub fn units_match(&self, other: &SpeedInUnits) -> bool {
        self.units == other.units || !self.is_numeric() || !other.is_numeric()
    }

    /// this speed as a uom [Velocity]. sentinels have no velocity.
    pub fn to_velocity(&self) -> Option<Velocity> {
        if self.is_numeric() {
            Some(self.units.to_uom(self.speed as f64))
        } else {
            None
        }
    }

    pub fn speed_kmph(&self) -> Option<f64> {
        self.to_velocity().map(|v| v.get::<kilometer_per_hour>())
    }
}

pub fn is_numeric_speed(speed: u16) -> bool {
    speed != INVALID_SPEED && speed != NONE_MAXSPEED && speed != WALK_MAXSPEED
}

impl Default for SpeedInUnits {
    fn default() -> Self {
        SpeedInUnits::invalid()
    }
}

impl PartialEq for SpeedInUnits {
    fn eq(&self, other: &Self) -> bool {
        self.speed == other.speed && (self.units == other.units || !self.is_numeric())
    }
}

impl Eq for SpeedInUnits {}

impl Display for SpeedInUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.speed {
            INVALID_SPEED => write!(f, "invalid"),
            NONE_MAXSPEED => write!(f, "none"),
            WALK_MAXSPEED => write!(f, "walk"),
            speed => write!(f, "{speed} {}", self.units.abbreviation()),
        }
    }
}
