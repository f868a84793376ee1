//! Frequency codec
//!
//! Frequencies travel as exactly nine zero-padded decimal digits of hertz
//! (`FA014250000;`). Callers may supply either a hertz count or text with a
//! unit suffix (`"14.25M"`, `"3500k"`).

use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, EncodeError};

/// Width of a frequency field on the wire
pub const FREQUENCY_DIGITS: usize = 9;

/// Largest frequency representable in [`FREQUENCY_DIGITS`] digits
pub const MAX_FREQUENCY_HZ: u64 = 999_999_999;

/// Recognized unit suffixes and their power-of-ten scale
const SUFFIXES: &[(char, u32)] = &[('k', 3), ('M', 6)];

/// A frequency in hertz, guaranteed to fit the 9-digit wire field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frequency(u64);

impl Frequency {
    /// A frequency in hertz; fails above [`MAX_FREQUENCY_HZ`]
    pub fn from_hz(hz: u64) -> Result<Self, EncodeError> {
        if hz > MAX_FREQUENCY_HZ {
            return Err(EncodeError::FrequencyRange { hz });
        }
        Ok(Self(hz))
    }

    /// Parse suffixed text such as `"14.25M"` or `"3500k"`.
    ///
    /// The magnitude is scaled with exact decimal arithmetic; digits finer
    /// than 1 Hz are truncated.
    pub fn parse(text: &str) -> Result<Self, EncodeError> {
        let suffix = text
            .chars()
            .last()
            .ok_or_else(|| EncodeError::InvalidFrequency(text.to_string()))?;
        let exponent = SUFFIXES
            .iter()
            .find(|(c, _)| *c == suffix)
            .map(|(_, e)| *e)
            .ok_or(EncodeError::UnknownSuffix(suffix))?;
        let magnitude = &text[..text.len() - suffix.len_utf8()];
        let hz = scale_decimal(magnitude, exponent)
            .ok_or_else(|| EncodeError::InvalidFrequency(text.to_string()))?;
        Self::from_hz(hz)
    }

    /// Value in hertz
    pub fn hz(self) -> u64 {
        self.0
    }

    /// The 9-digit wire field
    pub fn encode(self) -> String {
        format!("{:0width$}", self.0, width = FREQUENCY_DIGITS)
    }

    /// Parse a 9-digit wire field
    pub fn decode(field: &str) -> Result<Self, DecodeError> {
        if field.len() != FREQUENCY_DIGITS || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::InvalidFrequency(field.to_string()));
        }
        field
            .parse::<u64>()
            .map(Self)
            .map_err(|_| DecodeError::InvalidFrequency(field.to_string()))
    }
}

impl FromStr for Frequency {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<u64> for Frequency {
    type Error = EncodeError;

    fn try_from(hz: u64) -> Result<Self, Self::Error> {
        Self::from_hz(hz)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06} MHz", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

/// Caller-facing frequency: raw hertz or suffixed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrequencyInput {
    Hz(u64),
    Text(String),
}

impl FrequencyInput {
    /// Validate and convert to a [`Frequency`]
    pub fn resolve(&self) -> Result<Frequency, EncodeError> {
        match self {
            FrequencyInput::Hz(hz) => Frequency::from_hz(*hz),
            FrequencyInput::Text(text) => Frequency::parse(text),
        }
    }
}

impl From<u64> for FrequencyInput {
    fn from(hz: u64) -> Self {
        FrequencyInput::Hz(hz)
    }
}

impl From<u32> for FrequencyInput {
    fn from(hz: u32) -> Self {
        FrequencyInput::Hz(hz.into())
    }
}

impl From<&str> for FrequencyInput {
    fn from(text: &str) -> Self {
        FrequencyInput::Text(text.to_string())
    }
}

impl From<String> for FrequencyInput {
    fn from(text: String) -> Self {
        FrequencyInput::Text(text)
    }
}

impl From<Frequency> for FrequencyInput {
    fn from(freq: Frequency) -> Self {
        FrequencyInput::Hz(freq.hz())
    }
}

/// Encode hertz or suffixed text as the 9-digit wire field
pub fn encode_frequency(input: impl Into<FrequencyInput>) -> Result<String, EncodeError> {
    input.into().resolve().map(Frequency::encode)
}

/// Decode a 9-digit wire field to hertz
pub fn decode_frequency(field: &str) -> Result<u64, DecodeError> {
    Frequency::decode(field).map(Frequency::hz)
}

/// `"14.25"` scaled by 10^6 -> 14_250_000. `None` on bad digits; saturates
/// on overflow so the range check reports it.
fn scale_decimal(magnitude: &str, exponent: u32) -> Option<u64> {
    let (int_part, frac_part) = match magnitude.split_once('.') {
        Some((i, f)) => (i, f),
        None => (magnitude, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let scale = 10u64.pow(exponent);
    let mut hz: u64 = 0;
    for b in int_part.bytes() {
        hz = hz.saturating_mul(10).saturating_add(u64::from(b - b'0'));
    }
    hz = hz.saturating_mul(scale);

    let mut place = scale;
    for b in frac_part.bytes() {
        place /= 10;
        if place == 0 {
            break;
        }
        hz = hz.saturating_add(u64::from(b - b'0') * place);
    }
    Some(hz)
}
