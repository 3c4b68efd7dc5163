use serde::{Deserialize, Serialize};

use crate::{
    error::MaxspeedError,
    serialize::{load_maxspeeds, SectionHeader},
    store::MaxspeedsStats,
};

/// layout and contents of a stored maxspeed section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub section_bytes: usize,
    pub header: SectionHeader,
    pub forward_ids_bytes: u32,
    pub forward_codes_bytes: u32,
    pub stats: MaxspeedsStats,
}

impl SectionSummary {
    pub fn from_section(region: &[u8]) -> Result<SectionSummary, MaxspeedError> {
        let store = load_maxspeeds(region)?;
        let header = SectionHeader::read(&mut &region[..])?;
        Ok(SectionSummary {
            section_bytes: region.len(),
            header,
            forward_ids_bytes: header.forward_offset,
            forward_codes_bytes: header.bidirectional_offset - header.forward_offset,
            stats: store.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{FeatureMaxspeed, SpeedUnits},
        serialize::MaxspeedsSerializer,
    };

    #[test]
    fn test_summary_of_mixed_section() {
        let records = vec![
            FeatureMaxspeed::forward_only(10, SpeedUnits::Metric, 50),
            FeatureMaxspeed::forward_only(20, SpeedUnits::Metric, 60),
            FeatureMaxspeed::forward_only(30, SpeedUnits::Imperial, 30),
            FeatureMaxspeed::bidirectional(40, SpeedUnits::Metric, 60, 40),
        ];
        let (bytes, _) = MaxspeedsSerializer::default()
            .serialize_to_vec(&records)
            .unwrap();
        let summary = SectionSummary::from_section(&bytes).unwrap();
        assert_eq!(summary.section_bytes, bytes.len());
        assert_eq!(summary.forward_codes_bytes, 3);
        assert_eq!(summary.stats.forward_only_count, 3);
        assert_eq!(summary.stats.bidirectional_count, 1);
        assert_eq!(summary.stats.forward_universe, 31);
        assert_eq!(summary.header.bidirectional_count, 1);
    }
}
