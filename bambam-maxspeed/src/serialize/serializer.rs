use std::io::{Cursor, Seek, SeekFrom, Write};

use byteorder::WriteBytesExt;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    codec::maxspeed_converter,
    error::MaxspeedError,
    model::{FeatureMaxspeed, SpeedMacro},
    serialize::{varint::WriteVarint, SectionHeader, HEADER_SIZE},
    store::EliasFanoBuilder,
};

pub const DEFAULT_BIDIRECTIONAL_WARNING_THRESHOLD: usize = 10_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SerializerConfig {
    /// log a warning when more than this many bidirectional records are written.
    #[serde(default = "default_bidirectional_warning_threshold")]
    pub bidirectional_warning_threshold: usize,
}

fn default_bidirectional_warning_threshold() -> usize {
    DEFAULT_BIDIRECTIONAL_WARNING_THRESHOLD
}

impl Default for SerializerConfig {
    fn default() -> Self {
        SerializerConfig {
            bidirectional_warning_threshold: DEFAULT_BIDIRECTIONAL_WARNING_THRESHOLD,
        }
    }
}

/// outcome of writing one maxspeed section.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeSummary {
    pub forward_only_count: usize,
    pub bidirectional_count: usize,
    /// features left out because a speed has no macro.
    pub dropped_feature_ids: Vec<u32>,
    /// records carrying a conditional speed. the section has no field for
    /// conditional speeds, so none of these overrides are written.
    #[serde(default)]
    pub conditional_count: usize,
    /// total section size including the header.
    pub section_bytes: u64,
}

impl SerializeSummary {
    pub fn dropped_count(&self) -> usize {
        self.dropped_feature_ids.len()
    }
}

/// writes per-feature speed limits as a maxspeed section.
#[derive(Debug, Clone, Default)]
pub struct MaxspeedsSerializer {
    config: SerializerConfig,
}

struct BidirectionalEntry {
    feature_id: u32,
    forward: SpeedMacro,
    backward: SpeedMacro,
}

impl MaxspeedsSerializer {
    pub fn new(config: SerializerConfig) -> MaxspeedsSerializer {
        MaxspeedsSerializer { config }
    }

    /// writes `records` at the current position of `writer`.
    ///
    /// # Invariants
    /// `records` must be sorted by feature id with no feature repeated, and
    /// each conditional speed must use the units of its record. violations are
    /// producer bugs and fail the whole section.
    ///
    /// records with a speed that has no macro are left out. their ids are
    /// reported in the returned [SerializeSummary]. conditional speeds are not
    /// written, only counted.
    pub fn serialize<W: Write + Seek>(
        &self,
        records: &[FeatureMaxspeed],
        writer: &mut W,
    ) -> Result<SerializeSummary, MaxspeedError> {
        validate_records(records)?;
        let converter = maxspeed_converter();

        let mut summary = SerializeSummary::default();
        let mut forward_only: Vec<(u32, SpeedMacro)> = vec![];
        let mut bidirectional: Vec<BidirectionalEntry> = vec![];
        for record in records {
            if record.conditional.is_some() {
                summary.conditional_count += 1;
            }
            let forward = converter.speed_to_macro(&record.maxspeed.forward_speed());
            if record.is_bidirectional() {
                let backward = converter.speed_to_macro(&record.maxspeed.backward_speed());
                if forward.is_undefined() || backward.is_undefined() {
                    log::warn!(
                        "dropping feature {}: no speed macro for {}",
                        record.feature_id,
                        record.maxspeed
                    );
                    summary.dropped_feature_ids.push(record.feature_id);
                    continue;
                }
                bidirectional.push(BidirectionalEntry {
                    feature_id: record.feature_id,
                    forward,
                    backward,
                });
            } else {
                if forward.is_undefined() {
                    log::warn!(
                        "dropping feature {}: no speed macro for {}",
                        record.feature_id,
                        record.maxspeed
                    );
                    summary.dropped_feature_ids.push(record.feature_id);
                    continue;
                }
                forward_only.push((record.feature_id, forward));
            }
        }

        let start = writer.stream_position()?;
        SectionHeader::default().write(writer)?;

        let (forward_offset, bidirectional_offset) = write_forward_tier(&forward_only, writer)?;
        write_bidirectional_tier(&bidirectional, writer)?;

        let end = writer.stream_position()?;
        let bidirectional_count = to_u32(bidirectional.len(), "bidirectional count")?;
        let header = SectionHeader::new(forward_offset, bidirectional_offset, bidirectional_count);
        writer.seek(SeekFrom::Start(start))?;
        header.write(writer)?;
        writer.seek(SeekFrom::Start(end))?;

        if bidirectional.len() > self.config.bidirectional_warning_threshold {
            log::warn!(
                "maxspeed section holds {} bidirectional records, more than the expected {}",
                bidirectional.len(),
                self.config.bidirectional_warning_threshold
            );
        }

        summary.forward_only_count = forward_only.len();
        summary.bidirectional_count = bidirectional.len();
        summary.section_bytes = end - start;
        if summary.conditional_count > 0 {
            log::debug!(
                "{} conditional speeds were not written, the maxspeed section does not store them",
                summary.conditional_count
            );
        }
        log::debug!(
            "wrote maxspeed section: {} forward-only ({} bytes), {} bidirectional, {} dropped, {} bytes total",
            summary.forward_only_count,
            bidirectional_offset,
            summary.bidirectional_count,
            summary.dropped_count(),
            summary.section_bytes
        );
        Ok(summary)
    }

    /// serializes into a fresh buffer.
    pub fn serialize_to_vec(
        &self,
        records: &[FeatureMaxspeed],
    ) -> Result<(Vec<u8>, SerializeSummary), MaxspeedError> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE + records.len()));
        let summary = self.serialize(records, &mut cursor)?;
        Ok((cursor.into_inner(), summary))
    }
}

/// checks the producer contract: strictly increasing ids, matching units.
fn validate_records(records: &[FeatureMaxspeed]) -> Result<(), MaxspeedError> {
    for (previous, current) in records.iter().tuple_windows() {
        if previous.feature_id == current.feature_id {
            return Err(MaxspeedError::DuplicateFeature(current.feature_id));
        }
        if previous.feature_id > current.feature_id {
            return Err(MaxspeedError::UnsortedRecords {
                previous: previous.feature_id,
                current: current.feature_id,
            });
        }
    }
    records.iter().try_for_each(|r| r.validate_units())
}

/// writes the Elias-Fano id set followed by one macro byte per id. returns the
/// end offsets of both regions, relative to the end of the header.
fn write_forward_tier<W: Write>(
    forward_only: &[(u32, SpeedMacro)],
    writer: &mut W,
) -> Result<(u32, u32), MaxspeedError> {
    let Some((max_id, _)) = forward_only.last() else {
        return Ok((0, 0));
    };
    let universe = *max_id as u64 + 1;
    let mut ids = EliasFanoBuilder::with_capacity(universe, forward_only.len());
    for (feature_id, _) in forward_only {
        ids.push(*feature_id)?;
    }
    let id_bytes = ids.freeze()?;
    writer.write_all(&id_bytes)?;
    for (_, code) in forward_only {
        writer.write_u8(code.code())?;
    }
    let forward_offset = to_u32(id_bytes.len(), "forward tier offset")?;
    let bidirectional_offset =
        to_u32(id_bytes.len() + forward_only.len(), "bidirectional tier offset")?;
    Ok((forward_offset, bidirectional_offset))
}

fn write_bidirectional_tier<W: Write>(
    entries: &[BidirectionalEntry],
    writer: &mut W,
) -> Result<(), MaxspeedError> {
    let mut previous = 0;
    for entry in entries {
        writer.write_varint(entry.feature_id - previous)?;
        writer.write_u8(entry.forward.code())?;
        writer.write_u8(entry.backward.code())?;
        previous = entry.feature_id;
    }
    Ok(())
}

fn to_u32(value: usize, what: &str) -> Result<u32, MaxspeedError> {
    u32::try_from(value)
        .map_err(|_| MaxspeedError::InternalError(format!("{what} {value} does not fit in u32")))
}
