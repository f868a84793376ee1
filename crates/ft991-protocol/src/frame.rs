//! Wire framing
//!
//! Requests are `<CODE><PARAMETER>;`. Answers echo the two-character code,
//! followed by a payload from a restricted alphabet and the same
//! terminator. The radio signals a rejected command with the bare error
//! marker `?;`.
//!
//! ```text
//! request:   FA014250000;     AG0;      MT001;
//! answer:    FA014250000;     AG0123;   ?;
//! ```

use std::fmt;

use crate::command::CommandCode;
use crate::error::EncodeError;

/// CAT message terminator
pub const TERMINATOR: u8 = b';';

/// Answer sent by the radio when it rejects a command
pub const ERROR_MARKER: &[u8] = b"?;";

/// Whether a byte may appear in a request parameter or answer payload
pub fn is_payload_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b' ')
}

/// A request parameter: text or an unsigned integer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parameter {
    Text(String),
    Number(u64),
}

impl Parameter {
    /// Render the parameter for the wire, rejecting bytes outside the
    /// payload alphabet (a stray `;` would split the request in two)
    pub fn to_wire(&self) -> Result<String, EncodeError> {
        match self {
            Parameter::Number(n) => Ok(n.to_string()),
            Parameter::Text(s) => {
                if s.bytes().all(is_payload_byte) {
                    Ok(s.clone())
                } else {
                    Err(EncodeError::InvalidParameter(s.clone()))
                }
            }
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Text(s) => f.write_str(s),
            Parameter::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Parameter {
    fn from(s: &str) -> Self {
        Parameter::Text(s.to_string())
    }
}

impl From<String> for Parameter {
    fn from(s: String) -> Self {
        Parameter::Text(s)
    }
}

impl From<u64> for Parameter {
    fn from(n: u64) -> Self {
        Parameter::Number(n)
    }
}

impl From<u32> for Parameter {
    fn from(n: u32) -> Self {
        Parameter::Number(n.into())
    }
}

impl From<u16> for Parameter {
    fn from(n: u16) -> Self {
        Parameter::Number(n.into())
    }
}

impl From<u8> for Parameter {
    fn from(n: u8) -> Self {
        Parameter::Number(n.into())
    }
}

/// Build the wire bytes for a request
pub fn encode_request(code: CommandCode, parameter: Option<&Parameter>) -> Result<Vec<u8>, EncodeError> {
    let param = parameter.map(Parameter::to_wire).transpose()?;
    let param = param.as_deref().unwrap_or("");
    let mut buf = Vec::with_capacity(3 + param.len());
    buf.extend_from_slice(code.as_bytes());
    buf.extend_from_slice(param.as_bytes());
    buf.push(TERMINATOR);
    Ok(buf)
}

/// Classification of the bytes the radio sent back for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `<CODE><payload>;` with a non-empty payload
    Value(String),
    /// `<CODE>;` - echo with no payload
    Acknowledged,
    /// `?;` - the radio rejected the command
    Rejected,
    /// Anything else: wrong code, missing terminator, stray bytes or
    /// several frames run together
    Malformed,
}

/// Parse the bytes read after sending `code`.
///
/// The whole buffer must be exactly one frame. Trailing bytes after the
/// first terminator mean more than one answer was in flight, which is
/// reported as [`Response::Malformed`] rather than guessed around.
pub fn parse_response(code: CommandCode, raw: &[u8]) -> Response {
    if raw.starts_with(ERROR_MARKER) {
        return Response::Rejected;
    }

    let Some((&TERMINATOR, body)) = raw.split_last() else {
        return Response::Malformed;
    };
    let Some(payload) = body.strip_prefix(code.as_bytes().as_slice()) else {
        return Response::Malformed;
    };
    if !payload.iter().copied().all(is_payload_byte) {
        return Response::Malformed;
    }

    if payload.is_empty() {
        Response::Acknowledged
    } else {
        // Payload bytes are all ASCII
        Response::Value(String::from_utf8_lossy(payload).into_owned())
    }
}
