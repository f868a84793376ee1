//! FT-991A CAT protocol
//!
//! Pure, I/O-free building blocks for talking to a Yaesu FT-991A over its
//! ASCII CAT interface:
//!
//! - **Command registry**: which two-character codes exist and whether each
//!   can be set, read, and answers
//! - **Menu registry**: the `EX` menu functions and their payload widths
//! - **Field codecs**: 9-digit frequencies, the 38-character memory channel
//!   record, menu parameters
//! - **Framing**: request encoding and a strict response parser
//!
//! Transport and timing live in `ft991-link`.
//!
//! # Example
//!
//! ```rust
//! use ft991_protocol::{encode_request, parse_response, Catalog, Parameter, Response};
//!
//! let catalog = Catalog::ft991a().unwrap();
//! let fa = catalog.command("fa").unwrap().code();
//!
//! let param = Parameter::from(ft991_protocol::encode_frequency("14.25M").unwrap());
//! assert_eq!(encode_request(fa, Some(&param)).unwrap(), b"FA014250000;");
//!
//! assert_eq!(
//!     parse_response(fa, b"FA014250000;"),
//!     Response::Value("014250000".into())
//! );
//! ```

pub mod catalog;
pub mod command;
pub mod error;
pub mod frame;
pub mod frequency;
pub mod memory;
pub mod menu;
pub mod types;

pub use catalog::{parse_command_table, parse_menu_table, Catalog};
pub use command::{CommandCode, CommandRegistry, CommandSpec};
pub use error::{ConfigError, DecodeError, EncodeError, LookupError};
pub use frame::{encode_request, is_payload_byte, parse_response, Parameter, Response, ERROR_MARKER, TERMINATOR};
pub use frequency::{decode_frequency, encode_frequency, Frequency, FrequencyInput, MAX_FREQUENCY_HZ};
pub use memory::{
    ChannelKind, CtcssState, MemoryChannel, MemoryChannelRead, Mode, RepeaterShift, MAX_MEMORY_CHANNEL,
};
pub use menu::{MenuFunction, MenuRegistry};
pub use types::{Band, BandSelector, TunerAction, TunerState, TxState, Vfo};
