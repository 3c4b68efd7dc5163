use byteorder::ReadBytesExt;

use crate::{
    codec::maxspeed_converter,
    error::MaxspeedError,
    model::{FeatureMaxspeed, Maxspeed, SpeedMacro},
    serialize::{varint::ReadVarint, SectionHeader, HEADER_SIZE},
    store::{EliasFanoView, Maxspeeds},
};

/// maps a maxspeed section into a queryable [Maxspeeds].
///
/// the forward-only tier is used in place: the returned store borrows
/// `region` and reads ids and macro bytes straight from it. bidirectional
/// entries are decoded here. a macro byte in either tier that is not a valid
/// macro fails the load with [MaxspeedError::InvalidMacro].
pub fn load_maxspeeds(region: &[u8]) -> Result<Maxspeeds<'_>, MaxspeedError> {
    let mut cursor = region;
    let header = SectionHeader::read(&mut cursor)?;
    let body = &region[HEADER_SIZE..];

    let forward_offset = header.forward_offset as usize;
    let bidirectional_offset = header.bidirectional_offset as usize;
    if body.len() < bidirectional_offset {
        return Err(MaxspeedError::CorruptSection(format!(
            "section body has {} bytes but the bidirectional tier starts at {bidirectional_offset}",
            body.len()
        )));
    }

    let (forward_ids, forward_codes) = if header.has_forward_tier() {
        let ids = EliasFanoView::from_bytes(&body[..forward_offset])?;
        let codes = &body[forward_offset..bidirectional_offset];
        if codes.len() != ids.len() {
            return Err(MaxspeedError::CorruptSection(format!(
                "forward tier has {} ids but {} speed codes",
                ids.len(),
                codes.len()
            )));
        }
        let converter = maxspeed_converter();
        for (feature_id, code) in ids.iter().zip(codes.iter()) {
            if !converter.is_valid_macro(*code) {
                return Err(MaxspeedError::InvalidMacro {
                    feature_id,
                    code: *code,
                });
            }
        }
        (ids, codes)
    } else {
        (EliasFanoView::empty(), &body[..0])
    };

    let bidirectional = read_bidirectional(
        &body[bidirectional_offset..],
        header.bidirectional_count as usize,
    )?;
    log::debug!(
        "loaded maxspeed section: {} forward-only, {} bidirectional",
        forward_ids.len(),
        bidirectional.len()
    );
    Ok(Maxspeeds::from_parts(forward_ids, forward_codes, bidirectional))
}

fn read_bidirectional(
    mut tier: &[u8],
    count: usize,
) -> Result<Vec<FeatureMaxspeed>, MaxspeedError> {
    let converter = maxspeed_converter();
    // each entry takes at least three bytes
    let mut records = Vec::with_capacity(count.min(tier.len() / 3));
    let mut feature_id: u32 = 0;
    for index in 0..count {
        let delta = tier.read_varint()?;
        feature_id = feature_id.checked_add(delta).ok_or_else(|| {
            MaxspeedError::CorruptSection(format!(
                "bidirectional entry {index} overflows the feature id range"
            ))
        })?;
        if index > 0 && delta == 0 {
            return Err(MaxspeedError::DuplicateFeature(feature_id));
        }
        let forward = read_macro(&mut tier, feature_id)?;
        let backward = read_macro(&mut tier, feature_id)?;
        let maxspeed = Maxspeed::from_speeds(
            feature_id,
            converter.macro_to_speed(forward),
            converter.macro_to_speed(backward),
        )?;
        records.push(FeatureMaxspeed::new(feature_id, maxspeed));
    }
    Ok(records)
}

fn read_macro(tier: &mut &[u8], feature_id: u32) -> Result<SpeedMacro, MaxspeedError> {
    let code = tier.read_u8().map_err(|e| {
        MaxspeedError::CorruptSection(format!(
            "truncated bidirectional entry for feature {feature_id}: {e}"
        ))
    })?;
    if !maxspeed_converter().is_valid_macro(code) {
        return Err(MaxspeedError::InvalidMacro { feature_id, code });
    }
    Ok(SpeedMacro(code))
}
