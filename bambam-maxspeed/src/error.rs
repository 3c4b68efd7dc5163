use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum MaxspeedError {
    #[error("Invalid input: {0}")]
    InvalidUserInput(String),
    #[error("records must be sorted by feature id, found {current} after {previous}")]
    UnsortedRecords { previous: u32, current: u32 },
    #[error("feature id {0} appears more than once")]
    DuplicateFeature(u32),
    #[error("feature {feature_id} mixes speed units: {message}")]
    UnitsMismatch { feature_id: u32, message: String },
    #[error("unable to parse speed value: {0}")]
    InvalidSpeed(String),
    #[error("unsupported maxspeed section version {found}, expected {expected}")]
    VersionMismatch { expected: u16, found: u16 },
    #[error("feature {feature_id} has stored speed macro {code} which is not a valid macro")]
    InvalidMacro { feature_id: u32, code: u8 },
    #[error("maxspeed section is corrupt: {0}")]
    CorruptSection(String),
    #[error("I/O failure while encoding maxspeed section: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error reading from '{path}': {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("{0}")]
    InternalError(String),
}
