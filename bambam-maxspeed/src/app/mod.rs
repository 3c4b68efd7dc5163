mod build;
mod config;
mod csv_row;
mod maxspeed_app;
mod section_summary;

pub use build::{read_records, round_to_closest_macro, run_build};
pub use config::MaxspeedBuildConfig;
pub use csv_row::{parse_speed_token, MaxspeedCsvRow};
pub use maxspeed_app::{MaxspeedApp, MaxspeedOperation};
pub use section_summary::SectionSummary;
