use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    InvalidConfig(#[from] serde_yml::Error),
    #[error("Invalid hex value: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
    #[error("{0} needs an --input file")]
    MissingInput(String),
    #[error("{0}")]
    Engine(#[from] libmicropay::MicropayError),
}
