use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uom::si::{
    f64::Velocity,
    velocity::{kilometer_per_hour, mile_per_hour},
};

/// unit system a posted speed limit is expressed in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnits {
    /// kilometers per hour
    #[default]
    #[serde(alias = "Metric", alias = "km/h")]
    Metric,
    /// miles per hour
    #[serde(alias = "Imperial", alias = "mph")]
    Imperial,
}

impl SpeedUnits {
    pub fn to_uom(&self, value: f64) -> Velocity {
        match self {
            SpeedUnits::Metric => Velocity::new::<kilometer_per_hour>(value),
            SpeedUnits::Imperial => Velocity::new::<mile_per_hour>(value),
        }
    }

    /// abbreviation used when printing a speed in these units.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            SpeedUnits::Metric => "km/h",
            SpeedUnits::Imperial => "mph",
        }
    }
}

impl Display for SpeedUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedUnits::Metric => write!(f, "metric"),
            SpeedUnits::Imperial => write!(f, "imperial"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_uom_converts_mph() {
        let v = SpeedUnits::Imperial.to_uom(60.0);
        let kmph = v.get::<kilometer_per_hour>();
        assert!((kmph - 96.56064).abs() < 1e-6);
    }

    #[test]
    fn test_deserialize_aliases() {
        let a: SpeedUnits = serde_json::from_str(r#""metric""#).unwrap();
        let b: SpeedUnits = serde_json::from_str(r#""Imperial""#).unwrap();
        let c: SpeedUnits = serde_json::from_str(r#""mph""#).unwrap();
        assert_eq!(a, SpeedUnits::Metric);
        assert_eq!(b, SpeedUnits::Imperial);
        assert_eq!(c, SpeedUnits::Imperial);
    }
}
