use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use kdam::tqdm;

use crate::{
    app::{MaxspeedBuildConfig, MaxspeedCsvRow},
    codec::maxspeed_converter,
    error::MaxspeedError,
    model::{FeatureMaxspeed, Maxspeed, SpeedInUnits, SpeedUnits},
    serialize::{MaxspeedsSerializer, SerializeSummary},
};

/// builds a maxspeed section file from a producer CSV.
pub fn run_build(
    input: &Path,
    output: &Path,
    config: &MaxspeedBuildConfig,
) -> Result<SerializeSummary, MaxspeedError> {
    let mut records = read_records(input)?;
    records.sort_by_key(|r| r.feature_id);
    if config.round_to_closest_macro {
        records = records.into_iter().map(round_to_closest_macro).collect();
    }

    let file = File::create(output).map_err(|e| MaxspeedError::WriteError {
        path: output.to_owned(),
        message: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);
    let serializer = MaxspeedsSerializer::new(config.serializer.clone());
    let summary = serializer.serialize(&records, &mut writer)?;
    writer.flush().map_err(|e| MaxspeedError::WriteError {
        path: output.to_owned(),
        message: e.to_string(),
    })?;
    log::info!(
        "wrote {} bytes to '{}': {} forward-only, {} bidirectional, {} dropped",
        summary.section_bytes,
        output.display(),
        summary.forward_only_count,
        summary.bidirectional_count,
        summary.dropped_count()
    );

    if config.write_summary {
        let summary_path = output.with_extension("summary.json");
        let json = serde_json::to_vec_pretty(&summary).map_err(|e| {
            MaxspeedError::InternalError(format!("failure serializing build summary: {e}"))
        })?;
        std::fs::write(&summary_path, json).map_err(|e| MaxspeedError::WriteError {
            path: summary_path.clone(),
            message: e.to_string(),
        })?;
        log::info!("wrote build summary to '{}'", summary_path.display());
    }
    Ok(summary)
}

/// reads every row of a producer CSV, in file order.
pub fn read_records(input: &Path) -> Result<Vec<FeatureMaxspeed>, MaxspeedError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(input)
        .map_err(|e| MaxspeedError::ReadError {
            path: input.to_owned(),
            message: e.to_string(),
        })?;
    let rows = tqdm!(
        reader.into_deserialize::<MaxspeedCsvRow>(),
        desc = "read maxspeed rows"
    );
    let mut records = vec![];
    for row in rows {
        let row = row.map_err(|e| MaxspeedError::ReadError {
            path: input.to_owned(),
            message: format!("failure reading maxspeed row: {e}"),
        })?;
        records.push(FeatureMaxspeed::try_from(row)?);
    }
    eprintln!();
    Ok(records)
}

/// snaps every speed of `record` to the nearest speed with a macro.
pub fn round_to_closest_macro(record: FeatureMaxspeed) -> FeatureMaxspeed {
    let units = record.maxspeed.units;
    let maxspeed = Maxspeed::new(
        units,
        round_speed(record.maxspeed.forward, units),
        round_speed(record.maxspeed.backward, units),
    );
    let conditional = record.conditional.map(|mut c| {
        c.speed = SpeedInUnits::new(round_speed(c.speed.speed, c.speed.units), c.speed.units);
        c
    });
    FeatureMaxspeed {
        maxspeed,
        conditional,
        ..record
    }
}

fn round_speed(speed: u16, units: SpeedUnits) -> u16 {
    let converter = maxspeed_converter();
    let speed_macro = converter.closest_valid_macro(&SpeedInUnits::new(speed, units));
    let rounded = converter.macro_to_speed(speed_macro);
    if rounded.is_valid() {
        rounded.speed
    } else {
        speed
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        model::{INVALID_SPEED, NONE_MAXSPEED},
        serialize::load_maxspeeds,
    };

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bambam-maxspeed-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("test invariant failed: cannot create temp dir");
        dir
    }

    #[test]
    fn test_rounding_keeps_sentinels() {
        let record = FeatureMaxspeed::bidirectional(1, SpeedUnits::Metric, 17, NONE_MAXSPEED);
        let rounded = round_to_closest_macro(record);
        assert_eq!(rounded.maxspeed.forward, 18);
        assert_eq!(rounded.maxspeed.backward, NONE_MAXSPEED);

        let record = FeatureMaxspeed::forward_only(2, SpeedUnits::Imperial, 200);
        let rounded = round_to_closest_macro(record);
        assert_eq!(rounded.maxspeed.forward, 125);
        assert_eq!(rounded.maxspeed.backward, INVALID_SPEED);
    }

    #[test]
    fn test_build_from_unsorted_csv() {
        let dir = scratch_dir("build");
        let input = dir.join("maxspeeds.csv");
        let output = dir.join("maxspeeds.bin");
        std::fs::write(
            &input,
            "\
feature_id,units,forward,backward,conditional,conditional_hours
9,metric,50,,,
2,imperial,30,25,,
5,metric,17,,,
4,metric,walk,,,
",
        )
        .unwrap();

        let config = MaxspeedBuildConfig {
            write_summary: true,
            ..Default::default()
        };
        let summary = run_build(&input, &output, &config).unwrap();
        assert_eq!(summary.dropped_feature_ids, vec![5]);
        assert!(output.with_extension("summary.json").exists());

        let bytes = std::fs::read(&output).unwrap();
        let store = load_maxspeeds(&bytes).unwrap();
        assert_eq!(store.get(9), Maxspeed::forward_only(SpeedUnits::Metric, 50));
        assert_eq!(store.get(2), Maxspeed::new(SpeedUnits::Imperial, 30, 25));
        assert_eq!(store.get(5), Maxspeed::default());
        assert!(store.has_forward_only(4));

        let rounded = MaxspeedBuildConfig {
            round_to_closest_macro: true,
            ..Default::default()
        };
        let summary = run_build(&input, &output, &rounded).unwrap();
        assert!(summary.dropped_feature_ids.is_empty());
        let bytes = std::fs::read(&output).unwrap();
        let store = load_maxspeeds(&bytes).unwrap();
        assert_eq!(store.get(5).forward, 18);

        std::fs::remove_dir_all(&dir).unwrap_or_default();
    }

    #[test]
    fn test_duplicate_rows_fail_build() {
        let dir = scratch_dir("duplicate");
        let input = dir.join("maxspeeds.csv");
        let output = dir.join("maxspeeds.bin");
        std::fs::write(
            &input,
            "feature_id,units,forward,backward,conditional,conditional_hours\n3,metric,50,,,\n3,metric,60,,,\n",
        )
        .unwrap();
        let result = run_build(&input, &output, &MaxspeedBuildConfig::default());
        assert!(matches!(result, Err(MaxspeedError::DuplicateFeature(3))));
        std::fs::remove_dir_all(&dir).unwrap_or_default();
    }

    #[test]
    fn test_missing_input_is_read_error() {
        let result = read_records(Path::new("/nonexistent/maxspeeds.csv"));
        assert!(matches!(result, Err(MaxspeedError::ReadError { .. })));
    }
}
