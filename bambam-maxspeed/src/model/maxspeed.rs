use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    error::MaxspeedError,
    model::{SpeedInUnits, SpeedUnits, INVALID_SPEED},
};

/// direction of travel along a feature, relative to its digitized geometry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// the speed limits of a single feature. when `backward` is
/// [`INVALID_SPEED`] the `forward` limit applies in both directions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Maxspeed {
    pub units: SpeedUnits,
    pub forward: u16,
    pub backward: u16,
}

impl Maxspeed {
    pub fn new(units: SpeedUnits, forward: u16, backward: u16) -> Maxspeed {
        Maxspeed {
            units,
            forward,
            backward,
        }
    }

    /// a limit that applies to both directions of travel.
    pub fn forward_only(units: SpeedUnits, forward: u16) -> Maxspeed {
        Maxspeed::new(units, forward, INVALID_SPEED)
    }

    /// builds a record from a pair of speeds, each in its own units.
    ///
    /// the record takes the units of the forward speed if it is numeric, else
    /// those of the backward speed if numeric, else metric (sentinels carry no
    /// unit). fails when both speeds are numeric and disagree on units.
    pub fn from_speeds(
        feature_id: u32,
        forward: SpeedInUnits,
        backward: SpeedInUnits,
    ) -> Result<Maxspeed, MaxspeedError> {
        if !forward.units_match(&backward) {
            return Err(MaxspeedError::UnitsMismatch {
                feature_id,
                message: format!("forward {forward} and backward {backward}"),
            });
        }
        let units = if forward.is_numeric() {
            forward.units
        } else if backward.is_numeric() {
            backward.units
        } else {
            SpeedUnits::Metric
        };
        Ok(Maxspeed::new(units, forward.speed, backward.speed))
    }

    pub fn is_valid(&self) -> bool {
        self.forward != INVALID_SPEED
    }

    pub fn is_bidirectional(&self) -> bool {
        self.is_valid() && self.backward != INVALID_SPEED
    }

    pub fn forward_speed(&self) -> SpeedInUnits {
        SpeedInUnits::new(self.forward, self.units)
    }

    pub fn backward_speed(&self) -> SpeedInUnits {
        SpeedInUnits::new(self.backward, self.units)
    }

    /// the limit that applies when travelling in `direction`.
    pub fn speed_in_units(&self, direction: Direction) -> SpeedInUnits {
        match direction {
            Direction::Backward if self.is_bidirectional() => self.backward_speed(),
            _ => self.forward_speed(),
        }
    }

    pub fn speed_kmph(&self, direction: Direction) -> Option<f64> {
        self.speed_in_units(direction).speed_kmph()
    }
}

impl Default for Maxspeed {
    fn default() -> Self {
        Maxspeed::new(SpeedUnits::Metric, INVALID_SPEED, INVALID_SPEED)
    }
}

impl PartialEq for Maxspeed {
    fn eq(&self, other: &Self) -> bool {
        self.forward_speed() == other.forward_speed()
            && self.backward_speed() == other.backward_speed()
    }
}

impl Eq for Maxspeed {}

impl Display for Maxspeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_bidirectional() {
            write!(f, "{} / {}", self.forward_speed(), self.backward_speed())
        } else {
            write!(f, "{}", self.forward_speed())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NONE_MAXSPEED, WALK_MAXSPEED};

    #[test]
    fn test_default_is_invalid() {
        let m = Maxspeed::default();
        assert!(!m.is_valid());
        assert!(!m.is_bidirectional());
        assert_eq!(m.speed_kmph(Direction::Forward), None);
    }

    #[test]
    fn test_backward_falls_back_to_forward() {
        let m = Maxspeed::forward_only(SpeedUnits::Metric, 50);
        assert_eq!(
            m.speed_in_units(Direction::Backward),
            SpeedInUnits::new(50, SpeedUnits::Metric)
        );
        let m = Maxspeed::new(SpeedUnits::Metric, 50, 30);
        assert_eq!(
            m.speed_in_units(Direction::Backward),
            SpeedInUnits::new(30, SpeedUnits::Metric)
        );
    }

    #[test]
    fn test_from_speeds_unit_priority() {
        let forward = SpeedInUnits::new(NONE_MAXSPEED, SpeedUnits::Metric);
        let backward = SpeedInUnits::new(40, SpeedUnits::Imperial);
        let m = Maxspeed::from_speeds(1, forward, backward).unwrap();
        assert_eq!(m.units, SpeedUnits::Imperial);

        let m = Maxspeed::from_speeds(1, SpeedInUnits::walk(), SpeedInUnits::none()).unwrap();
        assert_eq!(m.units, SpeedUnits::Metric);
        assert_eq!(m.forward, WALK_MAXSPEED);
        assert_eq!(m.backward, NONE_MAXSPEED);
    }

    #[test]
    fn test_from_speeds_rejects_mixed_units() {
        let forward = SpeedInUnits::new(30, SpeedUnits::Metric);
        let backward = SpeedInUnits::new(40, SpeedUnits::Imperial);
        let result = Maxspeed::from_speeds(9, forward, backward);
        assert!(matches!(
            result,
            Err(MaxspeedError::UnitsMismatch { feature_id: 9, .. })
        ));
    }

    #[test]
    fn test_equality_ignores_units_of_sentinels() {
        let a = Maxspeed::new(SpeedUnits::Imperial, NONE_MAXSPEED, INVALID_SPEED);
        let b = Maxspeed::new(SpeedUnits::Metric, NONE_MAXSPEED, INVALID_SPEED);
        assert_eq!(a, b);
        let c = Maxspeed::new(SpeedUnits::Imperial, 30, NONE_MAXSPEED);
        let d = Maxspeed::new(SpeedUnits::Metric, 30, NONE_MAXSPEED);
        assert_ne!(c, d);
    }
}
