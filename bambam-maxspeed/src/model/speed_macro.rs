use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// one-byte persisted code for a quantized speed limit.
///
/// codes are stable identifiers written into map files. the meaning of an
/// assigned code never changes, new codes are only appended to the table in
/// [`crate::codec::MaxspeedConverter`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SpeedMacro(pub u8);

impl SpeedMacro {
    pub const UNDEFINED: SpeedMacro = SpeedMacro(0);
    pub const NONE: SpeedMacro = SpeedMacro(1);
    pub const WALK: SpeedMacro = SpeedMacro(2);

    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn is_undefined(&self) -> bool {
        *self == SpeedMacro::UNDEFINED
    }
}

impl Default for SpeedMacro {
    fn default() -> Self {
        SpeedMacro::UNDEFINED
    }
}

impl From<u8> for SpeedMacro {
    fn from(value: u8) -> Self {
        SpeedMacro(value)
    }
}

impl Display for SpeedMacro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            SpeedMacro::UNDEFINED => write!(f, "undefined"),
            SpeedMacro::NONE => write!(f, "none"),
            SpeedMacro::WALK => write!(f, "walk"),
            SpeedMacro(code) => write!(f, "macro({code})"),
        }
    }
}
