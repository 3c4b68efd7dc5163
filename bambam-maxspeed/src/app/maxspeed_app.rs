use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::{
    app::{run_build, MaxspeedBuildConfig, SectionSummary},
    error::MaxspeedError,
    model::Direction,
    serialize::load_maxspeeds,
};

/// Command line tool for building and inspecting compact per-feature speed limit sections
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct MaxspeedApp {
    #[command(subcommand)]
    pub op: MaxspeedOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum MaxspeedOperation {
    /// build a maxspeed section from a CSV of feature speed limits
    Build {
        /// CSV file with columns feature_id,units,forward,backward,conditional,conditional_hours
        #[arg(short, long)]
        input: String,

        /// file to write the maxspeed section to
        #[arg(short, long)]
        output: String,

        /// TOML file with build options. if not provided, defaults are used.
        #[arg(short, long)]
        configuration_file: Option<String>,
    },
    /// print the speed limits of features in a maxspeed section as JSON lines
    Query {
        #[arg(short, long)]
        section: String,

        #[arg(short, long = "feature-id", required = true, num_args = 1..)]
        feature_ids: Vec<u32>,
    },
    /// print the layout and entry counts of a maxspeed section as JSON
    Summary {
        #[arg(short, long)]
        section: String,
    },
}

impl MaxspeedOperation {
    pub fn run(&self) -> Result<(), MaxspeedError> {
        match self {
            MaxspeedOperation::Build {
                input,
                output,
                configuration_file,
            } => {
                let config = match configuration_file {
                    Some(f) => MaxspeedBuildConfig::from_file(Path::new(f))?,
                    None => MaxspeedBuildConfig::default(),
                };
                run_build(Path::new(input), Path::new(output), &config)?;
                Ok(())
            }
            MaxspeedOperation::Query {
                section,
                feature_ids,
            } => {
                let bytes = read_section(Path::new(section))?;
                let store = load_maxspeeds(&bytes)?;
                for feature_id in feature_ids.iter() {
                    let maxspeed = store.get(*feature_id);
                    let row = serde_json::json!({
                        "feature_id": feature_id,
                        "maxspeed": maxspeed,
                        "valid": maxspeed.is_valid(),
                        "forward_kmph": maxspeed.speed_kmph(Direction::Forward),
                        "backward_kmph": maxspeed.speed_kmph(Direction::Backward),
                    });
                    println!("{row}");
                }
                Ok(())
            }
            MaxspeedOperation::Summary { section } => {
                let bytes = read_section(Path::new(section))?;
                let summary = SectionSummary::from_section(&bytes)?;
                let json = serde_json::to_string_pretty(&summary).map_err(|e| {
                    MaxspeedError::InternalError(format!("failure serializing summary: {e}"))
                })?;
                println!("{json}");
                Ok(())
            }
        }
    }
}

fn read_section(path: &Path) -> Result<Vec<u8>, MaxspeedError> {
    std::fs::read(path).map_err(|e| MaxspeedError::ReadError {
        path: PathBuf::from(path),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_arguments() {
        let app = MaxspeedApp::try_parse_from([
            "bambam-maxspeed",
            "query",
            "--section",
            "maxspeeds.bin",
            "--feature-id",
            "3",
            "17",
        ])
        .unwrap();
        match app.op {
            MaxspeedOperation::Query {
                section,
                feature_ids,
            } => {
                assert_eq!(section, "maxspeeds.bin");
                assert_eq!(feature_ids, vec![3, 17]);
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_build_configuration_is_optional() {
        let app = MaxspeedApp::try_parse_from([
            "bambam-maxspeed",
            "build",
            "-i",
            "maxspeeds.csv",
            "-o",
            "maxspeeds.bin",
        ])
        .unwrap();
        assert!(matches!(
            app.op,
            MaxspeedOperation::Build {
                configuration_file: None,
                ..
            }
        ));
    }
}
