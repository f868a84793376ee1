//! Small value types used by the radio operations

use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, EncodeError};

/// One of the two VFOs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vfo {
    A,
    B,
}

impl Vfo {
    /// Command that sets or reads this VFO's frequency
    pub fn command(self) -> &'static str {
        match self {
            Vfo::A => "FA",
            Vfo::B => "FB",
        }
    }
}

/// Antenna tuner control (`AC`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunerAction {
    Off,
    On,
    /// Start a tuning cycle
    Tune,
}

impl TunerAction {
    /// `AC` parameter: `000`, `001` or `002`
    pub fn parameter(self) -> &'static str {
        match self {
            TunerAction::Off => "000",
            TunerAction::On => "001",
            TunerAction::Tune => "002",
        }
    }
}

/// Tuner state as reported by `AC;`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TunerState {
    Off,
    On,
    Tuning,
}

impl TunerState {
    /// Decode the 3-character `AC` answer. The last digit carries the state.
    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidPayload {
            field: "tuner",
            payload: payload.to_string(),
        };
        if payload.len() != 3 || !payload.starts_with("00") {
            return Err(invalid());
        }
        match &payload[2..] {
            "0" => Ok(TunerState::Off),
            "1" => Ok(TunerState::On),
            "2" => Ok(TunerState::Tuning),
            _ => Err(invalid()),
        }
    }
}

/// Transmit state as reported by `TX;`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TxState {
    Off,
    /// Keyed over CAT
    On,
    /// Keyed from the radio's own PTT
    RadioPtt,
}

impl TxState {
    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        match payload {
            "0" => Ok(TxState::Off),
            "1" => Ok(TxState::On),
            "2" => Ok(TxState::RadioPtt),
            _ => Err(DecodeError::InvalidPayload {
                field: "tx",
                payload: payload.to_string(),
            }),
        }
    }

    pub fn code(self) -> char {
        match self {
            TxState::Off => '0',
            TxState::On => '1',
            TxState::RadioPtt => '2',
        }
    }

    pub fn is_transmitting(self) -> bool {
        !matches!(self, TxState::Off)
    }
}

/// A band selectable with `BS`.
///
/// Each band has a numeric code and one or more names accepted when
/// selecting by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Band {
    number: u8,
    names: &'static [&'static str],
}

const BANDS: &[Band] = &[
    Band { number: 0, names: &["1.8", "160m"] },
    Band { number: 1, names: &["3.5", "80m"] },
    Band { number: 3, names: &["7", "40m"] },
    Band { number: 4, names: &["10", "30m"] },
    Band { number: 5, names: &["14", "20m"] },
    Band { number: 6, names: &["18", "17m"] },
    Band { number: 7, names: &["21", "15m"] },
    Band { number: 8, names: &["24.5", "24", "12m"] },
    Band { number: 9, names: &["28", "10m"] },
    Band { number: 10, names: &["50", "6m"] },
    Band { number: 11, names: &["GEN"] },
    Band { number: 12, names: &["MW"] },
    Band { number: 14, names: &["AIR"] },
    Band { number: 15, names: &["144", "2m"] },
    Band { number: 16, names: &["430", "432", "70cm"] },
];

impl Band {
    /// Every selectable band in code order
    pub fn all() -> &'static [Band] {
        BANDS
    }

    /// Band by its `BS` number
    pub fn from_number(number: u8) -> Result<Self, EncodeError> {
        BANDS
            .iter()
            .copied()
            .find(|b| b.number == number)
            .ok_or_else(|| EncodeError::UnsupportedValue {
                field: "band",
                value: number.to_string(),
            })
    }

    /// Case-insensitive lookup by any of the band's names
    pub fn from_name(name: &str) -> Result<Self, EncodeError> {
        BANDS
            .iter()
            .copied()
            .find(|b| b.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
            .ok_or_else(|| EncodeError::UnsupportedValue {
                field: "band",
                value: name.to_string(),
            })
    }

    /// `BS` band number
    pub fn number(self) -> u8 {
        self.number
    }

    /// Names this band is selectable by
    pub fn names(self) -> &'static [&'static str] {
        self.names
    }

    /// `BS` parameter: two-digit band code
    pub fn parameter(self) -> String {
        format!("{:02}", self.number)
    }
}

impl FromStr for Band {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.names.last().copied().unwrap_or("?"))
    }
}

/// Band selection by numeric code or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandSelector {
    Number(u8),
    Name(String),
}

impl BandSelector {
    /// Find the band this selector names
    pub fn resolve(&self) -> Result<Band, EncodeError> {
        match self {
            BandSelector::Number(n) => Band::from_number(*n),
            BandSelector::Name(name) => Band::from_name(name),
        }
    }
}

impl From<u8> for BandSelector {
    fn from(n: u8) -> Self {
        BandSelector::Number(n)
    }
}

impl From<&str> for BandSelector {
    fn from(name: &str) -> Self {
        BandSelector::Name(name.to_string())
    }
}

impl From<String> for BandSelector {
    fn from(name: String) -> Self {
        BandSelector::Name(name)
    }
}

impl From<Band> for BandSelector {
    fn from(band: Band) -> Self {
        BandSelector::Number(band.number)
    }
}

/// Parse an all-digit decimal payload such as the `SM0` meter reading.
/// Callers check the field width first.
pub fn decode_decimal(field: &'static str, payload: &str) -> Result<u16, DecodeError> {
    if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidPayload {
            field,
            payload: payload.to_string(),
        });
    }
    payload.parse().map_err(|_| DecodeError::InvalidPayload {
        field,
        payload: payload.to_string(),
    })
}
