//! Error types for CAT transactions

use ft991_protocol::{ConfigError, DecodeError, EncodeError, LookupError};
use thiserror::Error;

/// Errors surfaced by [`CatLink`](crate::CatLink) and [`Ft991`](crate::Ft991)
#[derive(Debug, Error)]
pub enum CatError {
    /// Command code is not in the catalog
    #[error("command {0:?} not supported")]
    CommandNotFound(String),

    /// Menu index is not in the catalog
    #[error("menu function {0:03} not found")]
    MenuFunctionNotFound(u16),

    /// Caller-supplied value rejected before any I/O
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Value could not be encoded for the wire
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Radio payload could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Command or menu table is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The radio answered `?;`
    #[error("radio rejected {command}: {raw:?}")]
    Protocol { command: String, raw: String },

    /// The answer matched neither a value frame nor the error marker.
    /// Usually means the link is out of step with the radio.
    #[error("malformed response to {command}: {raw:?}")]
    MalformedResponse { command: String, raw: String },

    /// A read got no answer within the settle window
    #[error("no response to {command}")]
    NoResponse { command: String },

    /// Antenna tuner still tuning after the last poll
    #[error("tuner still tuning after {polls} polls")]
    TuneIncomplete { polls: u32 },

    /// No channel attached
    #[error("link is not open")]
    NotOpen,

    /// Channel I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
}

impl CatError {
    /// Whether the error suggests the link lost sync with the radio.
    /// Callers may drain the channel and retry idempotent reads.
    pub fn is_desync(&self) -> bool {
        matches!(self, CatError::MalformedResponse { .. })
    }
}

impl From<LookupError> for CatError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::CommandNotFound(code) => CatError::CommandNotFound(code),
            LookupError::MenuFunctionNotFound(index) => CatError::MenuFunctionNotFound(index),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatError>;
