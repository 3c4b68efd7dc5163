use std::fmt::Display;

use opening_hours_syntax::rules::OpeningHoursExpression;
use serde::{Deserialize, Serialize};

/// the time rule attached to a conditional speed limit, such as the
/// `Mo-Fr 07:00-09:00` of `maxspeed:conditional=30 @ (Mo-Fr 07:00-09:00)`.
///
/// this value is an opaque token for maxspeed storage: it is carried and
/// returned verbatim and evaluated elsewhere. rules that fail to parse as
/// OSM opening hours are kept in the `Unexpected` variant so no input is lost.
///
/// <https://wiki.openstreetmap.org/wiki/Conditional_restrictions>
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum ConditionalRule {
    #[serde(with = "opening_hours_codec")]
    Osm(OpeningHoursExpression),
    Unexpected(String),
}

impl ConditionalRule {
    /// wraps a raw rule, keeping it as an opening hours expression when it parses.
    pub fn parse(rule: &str) -> ConditionalRule {
        match opening_hours_syntax::parse(rule) {
            Ok(expression) => ConditionalRule::Osm(expression),
            Err(e) => {
                log::debug!("conditional rule '{rule}' is not an opening hours expression: {e}");
                ConditionalRule::Unexpected(rule.to_string())
            }
        }
    }

    pub fn is_opening_hours(&self) -> bool {
        matches!(self, ConditionalRule::Osm(_))
    }
}

impl Display for ConditionalRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionalRule::Osm(expression) => write!(f, "{expression}"),
            ConditionalRule::Unexpected(rule) => write!(f, "{rule}"),
        }
    }
}

impl PartialEq for ConditionalRule {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

mod opening_hours_codec {
    use opening_hours_syntax::rules::OpeningHoursExpression;
    use serde::Deserialize;
    pub fn serialize<S>(t: &OpeningHoursExpression, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.serialize_str(&t.to_string())
    }
    pub fn deserialize<'de, D>(d: D) -> Result<OpeningHoursExpression, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        opening_hours_syntax::parse(&s).map_err(serde::de::Error::custom)
    }
}
