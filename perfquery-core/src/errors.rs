use thiserror::Error;

pub type Result<T> = std::result::Result<T, PerfQueryError>;

#[derive(Debug, Error)]
pub enum PerfQueryError {
    #[error("invalid max samples: {0}")]
    InvalidMaxSamples(String),

    #[error("max samples out of range: {0}")]
    MaxSamplesOutOfRange(String),

    #[error("invalid sample interval: {0}")]
    InvalidInterval(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid profile configuration: {0}")]
    InvalidConfig(String),

    #[error("unable to read the configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse the configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
