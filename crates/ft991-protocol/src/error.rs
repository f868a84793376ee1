//! Error types for FT-991A CAT encoding, decoding and table loading

use thiserror::Error;

/// A command or menu table row violates a load-time invariant.
///
/// These are data-integrity failures in the tables the catalog is built
/// from. A process holding a bad table cannot talk to the radio safely, so
/// callers treat this as fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Command code is not exactly two ASCII letters/digits
    #[error("invalid command code {code:?}: must be exactly 2 ASCII letters or digits")]
    InvalidCommandCode { code: String },

    /// The same command code appears twice
    #[error("duplicate command code {0}")]
    DuplicateCommand(String),

    /// The same menu index appears twice
    #[error("duplicate menu function {0:03}")]
    DuplicateMenuFunction(u16),

    /// A row could not be parsed
    #[error("line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// A logical value cannot be put on the wire.
///
/// Every variant is detected before any byte is written to the radio.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Frequency needs more than 9 decimal digits
    #[error("frequency {hz} Hz exceeds the 9-digit maximum")]
    FrequencyRange { hz: u64 },

    /// Frequency text ends in a character that is not a unit suffix
    #[error("unknown frequency unit suffix {0:?}")]
    UnknownSuffix(char),

    /// Frequency text magnitude is not a decimal number
    #[error("invalid frequency {0:?}")]
    InvalidFrequency(String),

    /// Logical value has no wire representation
    #[error("unsupported {field} value: {value}")]
    UnsupportedValue { field: &'static str, value: String },

    /// Menu index is not in the catalog
    #[error("menu function {0:03} not found")]
    MenuFunctionNotFound(u16),

    /// Menu parameter is wider than the function's digit width
    #[error("menu function {index:03} takes {width} digit(s), got {param:?}")]
    MenuParameterTooWide {
        index: u16,
        width: usize,
        param: String,
    },

    /// Parameter contains characters outside the CAT payload alphabet
    #[error("invalid parameter {0:?}")]
    InvalidParameter(String),
}

/// A wire field cannot be turned back into a logical value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frequency field is not exactly 9 decimal digits
    #[error("invalid frequency field {0:?}")]
    InvalidFrequency(String),

    /// Memory channel record is the wrong length or carries an unknown code
    #[error("malformed memory channel record: {0}")]
    MalformedRecord(String),

    /// Generic numeric payload could not be parsed
    #[error("invalid {field} payload {payload:?}")]
    InvalidPayload {
        field: &'static str,
        payload: String,
    },
}

/// A registry lookup missed.
///
/// Recoverable: the caller asked for something the catalog does not know.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No command with this code
    #[error("command {0:?} not supported")]
    CommandNotFound(String),

    /// No menu function with this index
    #[error("menu function {0:03} not found")]
    MenuFunctionNotFound(u16),
}
