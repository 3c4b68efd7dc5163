use serde::{Deserialize, Serialize};

use crate::{
    error::MaxspeedError,
    model::{
        ConditionalRule, FeatureMaxspeed, Maxspeed, SpeedInUnits, SpeedUnits, NONE_MAXSPEED,
        WALK_MAXSPEED,
    },
};

/// one producer row of a maxspeed CSV file.
///
/// speeds are positive integers in `units` or one of the tokens `none` and
/// `walk`. an empty `backward` column marks a forward-only feature.
/// `conditional` and `conditional_hours` hold a conditional speed and the
/// time rule it applies under.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MaxspeedCsvRow {
    pub feature_id: u32,
    #[serde(default)]
    pub units: SpeedUnits,
    pub forward: String,
    #[serde(default)]
    pub backward: Option<String>,
    #[serde(default)]
    pub conditional: Option<String>,
    #[serde(default)]
    pub conditional_hours: Option<String>,
}

/// parses a single speed column.
pub fn parse_speed_token(token: &str) -> Result<u16, MaxspeedError> {
    let trimmed = token.trim();
    match trimmed.to_lowercase().as_str() {
        "none" => Ok(NONE_MAXSPEED),
        "walk" => Ok(WALK_MAXSPEED),
        other => {
            let speed = other
                .parse::<u16>()
                .map_err(|e| MaxspeedError::InvalidSpeed(format!("'{trimmed}': {e}")))?;
            if speed == 0 || speed >= WALK_MAXSPEED {
                return Err(MaxspeedError::InvalidSpeed(format!(
                    "'{trimmed}' is outside of the numeric speed range"
                )));
            }
            Ok(speed)
        }
    }
}

fn non_empty(column: &Option<String>) -> Option<&str> {
    column.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl TryFrom<MaxspeedCsvRow> for FeatureMaxspeed {
    type Error = MaxspeedError;

    fn try_from(row: MaxspeedCsvRow) -> Result<Self, Self::Error> {
        let forward = parse_speed_token(&row.forward)?;
        let maxspeed = match non_empty(&row.backward) {
            Some(backward) => Maxspeed::new(row.units, forward, parse_speed_token(backward)?),
            None => Maxspeed::forward_only(row.units, forward),
        };
        let record = FeatureMaxspeed::new(row.feature_id, maxspeed);
        match (non_empty(&row.conditional), non_empty(&row.conditional_hours)) {
            (None, None) => Ok(record),
            (Some(speed), Some(hours)) => {
                let speed = SpeedInUnits::new(parse_speed_token(speed)?, row.units);
                Ok(record.with_conditional(speed, ConditionalRule::parse(hours)))
            }
            (Some(_), None) => Err(MaxspeedError::InvalidUserInput(format!(
                "feature {} has a conditional speed without conditional_hours",
                row.feature_id
            ))),
            (None, Some(_)) => Err(MaxspeedError::InvalidUserInput(format!(
                "feature {} has conditional_hours without a conditional speed",
                row.feature_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INVALID_SPEED;

    fn read_rows(contents: &str) -> Vec<MaxspeedCsvRow> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(contents.as_bytes())
            .into_deserialize::<MaxspeedCsvRow>()
            .collect::<Result<Vec<_>, _>>()
            .expect("rows should deserialize")
    }

    #[test]
    fn test_speed_tokens() {
        assert_eq!(parse_speed_token("50").unwrap(), 50);
        assert_eq!(parse_speed_token(" 130 ").unwrap(), 130);
        assert_eq!(parse_speed_token("none").unwrap(), NONE_MAXSPEED);
        assert_eq!(parse_speed_token("Walk").unwrap(), WALK_MAXSPEED);
        assert!(matches!(
            parse_speed_token("fast"),
            Err(MaxspeedError::InvalidSpeed(_))
        ));
        assert!(parse_speed_token("0").is_err());
        assert!(parse_speed_token("-5").is_err());
        assert!(parse_speed_token(&INVALID_SPEED.to_string()).is_err());
    }

    #[test]
    fn test_rows_from_csv() {
        let contents = "\
feature_id,units,forward,backward,conditional,conditional_hours
1,metric,50,,,
2,imperial,30,none,,
3,metric,none,,,
4,metric,50,,30,Mo-Fr 07:00-09:00
";
        let records = read_rows(contents)
            .into_iter()
            .map(FeatureMaxspeed::try_from)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(records[0].maxspeed, Maxspeed::forward_only(SpeedUnits::Metric, 50));
        assert!(!records[0].is_bidirectional());

        assert_eq!(records[1].maxspeed.units, SpeedUnits::Imperial);
        assert_eq!(records[1].maxspeed.backward, NONE_MAXSPEED);
        assert!(records[1].is_bidirectional());

        assert_eq!(records[2].maxspeed.forward, NONE_MAXSPEED);

        let conditional = records[3].conditional.as_ref().expect("conditional speed");
        assert_eq!(conditional.speed, SpeedInUnits::new(30, SpeedUnits::Metric));
        assert!(conditional.rule.is_opening_hours());
    }

    #[test]
    fn test_conditional_requires_hours() {
        let row = MaxspeedCsvRow {
            feature_id: 8,
            units: SpeedUnits::Metric,
            forward: String::from("50"),
            backward: None,
            conditional: Some(String::from("30")),
            conditional_hours: None,
        };
        assert!(matches!(
            FeatureMaxspeed::try_from(row),
            Err(MaxspeedError::InvalidUserInput(_))
        ));
    }
}
