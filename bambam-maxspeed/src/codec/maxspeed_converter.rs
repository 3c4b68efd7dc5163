use std::{collections::HashMap, sync::LazyLock};

use crate::model::{
    SpeedInUnits, SpeedMacro, SpeedUnits, INVALID_SPEED, NONE_MAXSPEED, WALK_MAXSPEED,
};

/// macro codes for km/h values observed in map data. append only.
const METRIC_MACROS: &[(u8, u16)] = &[
    (10, 1), (11, 2), (12, 3), (13, 4), (14, 5), (15, 6), (16, 7), (17, 8), (18, 9), (19, 10),
    (20, 11), (21, 12), (22, 13), (23, 14), (24, 15), (25, 16), (26, 18), (27, 20), (28, 22),
    (29, 24), (30, 25), (31, 28), (32, 30), (33, 32), (34, 35), (35, 36), (36, 39), (37, 40),
    (38, 45), (39, 50), (40, 55), (41, 56), (42, 60), (43, 64), (44, 65), (45, 70), (46, 72),
    (47, 75), (48, 80), (49, 82), (50, 85), (51, 89), (52, 90), (53, 93), (54, 95), (55, 96),
    (56, 100), (57, 104), (58, 105), (59, 106), (60, 110), (61, 112), (62, 115), (63, 120),
    (64, 125), (65, 127), (66, 130), (67, 135), (68, 140), (69, 141), (70, 145), (71, 150),
    (72, 155), (73, 160), (74, 165), (75, 170), (76, 177), (77, 180), (78, 185), (79, 190),
    (80, 193), (81, 195), (82, 200), (83, 201), (84, 210), (85, 217), (86, 220), (87, 230),
    (88, 240), (89, 250), (90, 260), (91, 270), (92, 275), (93, 280), (94, 285), (95, 300),
    (96, 305), (97, 310), (98, 320), (99, 350), (100, 380),
];

/// macro codes for mph values observed in map data. append only.
const IMPERIAL_MACROS: &[(u8, u16)] = &[
    (110, 3), (111, 4), (112, 5), (113, 6), (114, 7), (115, 8), (116, 9), (117, 10), (118, 12),
    (119, 13), (120, 14), (121, 15), (122, 17), (123, 18), (124, 19), (125, 20), (126, 24),
    (127, 25), (128, 30), (129, 35), (130, 40), (131, 45), (132, 50), (133, 55), (134, 59),
    (135, 60), (136, 65), (137, 70), (138, 75), (139, 79), (140, 80), (141, 85), (142, 90),
    (143, 95), (144, 100), (145, 105), (146, 110), (147, 115), (148, 120), (149, 125),
];

static CONVERTER: LazyLock<MaxspeedConverter> = LazyLock::new(MaxspeedConverter::new);

/// the process-wide converter. it is built on first use and never mutated
/// afterward, so it may be shared freely between threads.
pub fn maxspeed_converter() -> &'static MaxspeedConverter {
    &CONVERTER
}

/// bidirectional table between speeds and their one-byte [SpeedMacro] codes.
#[derive(Debug, Clone)]
pub struct MaxspeedConverter {
    macro_to_speed: Vec<SpeedInUnits>,
    speed_to_macro: HashMap<(u16, SpeedUnits), SpeedMacro>,
    metric: Vec<(u16, SpeedMacro)>,
    imperial: Vec<(u16, SpeedMacro)>,
}

impl MaxspeedConverter {
    /// builds the table. prefer [maxspeed_converter] over building a new one.
    pub fn new() -> MaxspeedConverter {
        let mut macro_to_speed = vec![SpeedInUnits::invalid(); u8::MAX as usize + 1];
        let mut speed_to_macro = HashMap::new();

        // sentinels are stored under metric, lookups special-case them
        let sentinels = [
            (SpeedMacro::NONE, NONE_MAXSPEED),
            (SpeedMacro::WALK, WALK_MAXSPEED),
        ];
        for (m, speed) in sentinels {
            macro_to_speed[m.code() as usize] = SpeedInUnits::new(speed, SpeedUnits::Metric);
            speed_to_macro.insert((speed, SpeedUnits::Metric), m);
        }

        let tables = [
            (SpeedUnits::Metric, METRIC_MACROS),
            (SpeedUnits::Imperial, IMPERIAL_MACROS),
        ];
        for (units, table) in tables {
            for (code, speed) in table.iter() {
                macro_to_speed[*code as usize] = SpeedInUnits::new(*speed, units);
                speed_to_macro.insert((*speed, units), SpeedMacro(*code));
            }
        }

        let metric = METRIC_MACROS
            .iter()
            .map(|(code, speed)| (*speed, SpeedMacro(*code)))
            .collect();
        let imperial = IMPERIAL_MACROS
            .iter()
            .map(|(code, speed)| (*speed, SpeedMacro(*code)))
            .collect();

        MaxspeedConverter {
            macro_to_speed,
            speed_to_macro,
            metric,
            imperial,
        }
    }

    /// decodes a macro. undefined codes decode to an invalid metric speed.
    pub fn macro_to_speed(&self, speed_macro: SpeedMacro) -> SpeedInUnits {
        self.macro_to_speed
            .get(speed_macro.code() as usize)
            .copied()
            .unwrap_or_default()
    }

    /// encodes a speed, or returns [SpeedMacro::UNDEFINED] when no macro
    /// exists for this exact value. `none` and `walk` match in either unit system.
    pub fn speed_to_macro(&self, speed: &SpeedInUnits) -> SpeedMacro {
        match speed.speed {
            INVALID_SPEED => SpeedMacro::UNDEFINED,
            NONE_MAXSPEED => SpeedMacro::NONE,
            WALK_MAXSPEED => SpeedMacro::WALK,
            value => self
                .speed_to_macro
                .get(&(value, speed.units))
                .copied()
                .unwrap_or(SpeedMacro::UNDEFINED),
        }
    }

    pub fn is_valid_macro(&self, code: u8) -> bool {
        self.macro_to_speed(SpeedMacro(code)).is_valid()
    }

    /// the macro of the tabulated value nearest to `speed` in the same units.
    /// ties go to the faster value, speeds past either end of the table clamp
    /// to it. sentinels encode as in [MaxspeedConverter::speed_to_macro].
    pub fn closest_valid_macro(&self, speed: &SpeedInUnits) -> SpeedMacro {
        if !speed.is_numeric() {
            return self.speed_to_macro(speed);
        }
        let table = match speed.units {
            SpeedUnits::Metric => &self.metric,
            SpeedUnits::Imperial => &self.imperial,
        };
        match table.binary_search_by_key(&speed.speed, |(value, _)| *value) {
            Ok(idx) => table[idx].1,
            Err(idx) => {
                let below = idx.checked_sub(1).and_then(|i| table.get(i));
                let above = table.get(idx);
                match (below, above) {
                    (Some((lo, lo_macro)), Some((hi, hi_macro))) => {
                        if speed.speed - lo < hi - speed.speed {
                            *lo_macro
                        } else {
                            *hi_macro
                        }
                    }
                    (Some((_, m)), None) | (None, Some((_, m))) => *m,
                    (None, None) => SpeedMacro::UNDEFINED,
                }
            }
        }
    }

    /// every defined macro alongside its speed, in code order.
    pub fn valid_macros(&self) -> impl Iterator<Item = (SpeedMacro, SpeedInUnits)> + '_ {
        self.macro_to_speed
            .iter()
            .enumerate()
            .filter(|(_, speed)| speed.is_valid())
            .map(|(code, speed)| (SpeedMacro(code as u8), *speed))
    }
}

impl Default for MaxspeedConverter {
    fn default() -> Self {
        MaxspeedConverter::new()
    }
}
