use serde::{Deserialize, Serialize};

use crate::{
    error::MaxspeedError,
    model::{ConditionalRule, Maxspeed, SpeedInUnits, SpeedUnits},
};

/// a speed limit that only applies while `rule` holds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConditionalMaxspeed {
    pub speed: SpeedInUnits,
    pub rule: ConditionalRule,
}

/// speed limits for a single feature, as produced for one map build.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeatureMaxspeed {
    pub feature_id: u32,
    pub maxspeed: Maxspeed,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub conditional: Option<ConditionalMaxspeed>,
}

impl FeatureMaxspeed {
    pub fn new(feature_id: u32, maxspeed: Maxspeed) -> FeatureMaxspeed {
        FeatureMaxspeed {
            feature_id,
            maxspeed,
            conditional: None,
        }
    }

    pub fn forward_only(feature_id: u32, units: SpeedUnits, forward: u16) -> FeatureMaxspeed {
        FeatureMaxspeed::new(feature_id, Maxspeed::forward_only(units, forward))
    }

    pub fn bidirectional(
        feature_id: u32,
        units: SpeedUnits,
        forward: u16,
        backward: u16,
    ) -> FeatureMaxspeed {
        FeatureMaxspeed::new(feature_id, Maxspeed::new(units, forward, backward))
    }

    pub fn with_conditional(mut self, speed: SpeedInUnits, rule: ConditionalRule) -> Self {
        self.conditional = Some(ConditionalMaxspeed { speed, rule });
        self
    }

    pub fn is_bidirectional(&self) -> bool {
        self.maxspeed.is_bidirectional()
    }

    /// confirms the conditional override, if any, is expressed in the same
    /// units as the record.
    pub fn validate_units(&self) -> Result<(), MaxspeedError> {
        if let Some(conditional) = &self.conditional {
            let forward = self.maxspeed.forward_speed();
            if !conditional.speed.units_match(&forward) {
                return Err(MaxspeedError::UnitsMismatch {
                    feature_id: self.feature_id,
                    message: format!(
                        "conditional speed {} does not match forward speed {forward}",
                        conditional.speed
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_feature_id() {
        let mut records = [
            FeatureMaxspeed::forward_only(9, SpeedUnits::Metric, 50),
            FeatureMaxspeed::bidirectional(2, SpeedUnits::Metric, 60, 40),
            FeatureMaxspeed::forward_only(5, SpeedUnits::Imperial, 25),
        ];
        records.sort_by_key(|r| r.feature_id);
        let ids: Vec<u32> = records.iter().map(|r| r.feature_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_conditional_units_must_match() {
        let rule = ConditionalRule::parse("Mo-Fr 07:00-09:00");
        let ok = FeatureMaxspeed::forward_only(1, SpeedUnits::Metric, 50)
            .with_conditional(SpeedInUnits::new(30, SpeedUnits::Metric), rule.clone());
        assert!(ok.validate_units().is_ok());

        let bad = FeatureMaxspeed::forward_only(1, SpeedUnits::Metric, 50)
            .with_conditional(SpeedInUnits::new(20, SpeedUnits::Imperial), rule);
        assert!(matches!(
            bad.validate_units(),
            Err(MaxspeedError::UnitsMismatch { feature_id: 1, .. })
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_rule_token() {
        let record = FeatureMaxspeed::forward_only(3, SpeedUnits::Metric, 50).with_conditional(
            SpeedInUnits::new(30, SpeedUnits::Metric),
            ConditionalRule::parse("sunset"),
        );
        let json = serde_json::to_string(&record).unwrap();
        let decoded: FeatureMaxspeed = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }
}
