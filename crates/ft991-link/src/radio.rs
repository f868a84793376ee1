//! Typed FT-991A operations
//!
//! Each method validates its arguments, runs one or more transactions and
//! decodes the answer. Callers never see raw wire text.

use std::ops::RangeInclusive;
use std::sync::Arc;

use ft991_protocol::types::decode_decimal;
use ft991_protocol::{
    BandSelector, Catalog, DecodeError, Frequency, FrequencyInput, MemoryChannel,
    MemoryChannelRead, Parameter, TunerAction, TunerState, TxState, Vfo, MAX_MEMORY_CHANNEL,
};
use tokio_serial::SerialStream;
use tracing::{debug, info};

use crate::channel::{open_serial, CatChannel};
use crate::config::{LinkConfig, PowerOnConfig, SerialConfig, TuneWait};
use crate::engine::{CatLink, TransactionOutcome};
use crate::error::{CatError, Result};

/// Identification string the FT-991A returns for `ID;`
pub const FT991A_ID: &str = "0670";

/// Highest squelch level accepted by `SQ`
pub const MAX_SQUELCH: u8 = 100;

/// Manual notch level range in Hz
pub const NOTCH_LEVEL_HZ: RangeInclusive<u16> = 10..=3200;

/// Width of the numeric field in `AG`, `BP`, `SM` and `SQ` answers
const LEVEL_DIGITS: usize = 3;

/// Typed operations for one FT-991A
pub struct Ft991<T> {
    link: CatLink<T>,
    power_on: PowerOnConfig,
}

impl Ft991<SerialStream> {
    /// Open the radio on a serial port
    pub fn connect(serial: &SerialConfig, config: LinkConfig, catalog: Arc<Catalog>) -> Result<Self> {
        let stream = open_serial(serial)?;
        Ok(Self::new(CatLink::with_channel(catalog, config, stream)))
    }
}

impl<T: CatChannel> Ft991<T> {
    /// Wrap a link, using the default power-on gap
    pub fn new(link: CatLink<T>) -> Self {
        Self {
            link,
            power_on: PowerOnConfig::default(),
        }
    }

    /// Use a different power-on sequence
    pub fn with_power_on(mut self, power_on: PowerOnConfig) -> Self {
        self.power_on = power_on;
        self
    }

    /// The underlying transaction engine
    pub fn link(&self) -> &CatLink<T> {
        &self.link
    }

    /// Mutable access to the engine, for raw transactions
    pub fn link_mut(&mut self) -> &mut CatLink<T> {
        &mut self.link
    }

    /// Give back the engine
    pub fn into_link(self) -> CatLink<T> {
        self.link
    }

    /// Close the CAT channel
    pub async fn close(&mut self) -> Result<()> {
        self.link.close().await
    }

    // ---- VFO ----

    /// Copy VFO-A to VFO-B (`AB`)
    pub async fn vfo_a_to_b(&mut self) -> Result<()> {
        self.set("AB", None).await
    }

    /// Copy VFO-B to VFO-A (`BA`)
    pub async fn vfo_b_to_a(&mut self) -> Result<()> {
        self.set("BA", None).await
    }

    /// Tune a VFO. Accepts hertz or suffixed text such as `"14.25M"`.
    pub async fn set_frequency(&mut self, vfo: Vfo, frequency: impl Into<FrequencyInput>) -> Result<()> {
        let frequency = frequency.into().resolve()?;
        debug!("Setting VFO {:?} to {}", vfo, frequency);
        self.set(vfo.command(), Some(frequency.encode().into())).await
    }

    /// Current frequency of a VFO
    pub async fn read_frequency(&mut self, vfo: Vfo) -> Result<Frequency> {
        let payload = self.read(vfo.command(), None).await?;
        Ok(Frequency::decode(&payload)?)
    }

    // ---- Antenna tuner ----

    /// Switch the antenna tuner off or on, or start a tuning cycle (`AC`)
    pub async fn antenna_tuner(&mut self, action: TunerAction) -> Result<()> {
        self.set("AC", Some(action.parameter().into())).await
    }

    /// Start a tuning cycle and poll until the tuner reports it finished
    pub async fn tune(&mut self, wait: TuneWait) -> Result<TunerState> {
        self.antenna_tuner(TunerAction::Tune).await?;
        for _ in 0..wait.max_polls {
            tokio::time::sleep(wait.poll_interval()).await;
            let state = self.read_antenna_tuner().await?;
            if state != TunerState::Tuning {
                info!("Antenna tuner finished: {:?}", state);
                return Ok(state);
            }
        }
        Err(CatError::TuneIncomplete {
            polls: wait.max_polls,
        })
    }

    /// Current tuner state
    pub async fn read_antenna_tuner(&mut self) -> Result<TunerState> {
        let payload = self.read("AC", None).await?;
        Ok(TunerState::decode(&payload)?)
    }

    // ---- Audio and filters ----

    /// AF gain, 0..=255 (`AG0nnn`)
    pub async fn set_af_gain(&mut self, gain: u8) -> Result<()> {
        self.set("AG", Some(format!("0{gain:03}").into())).await
    }

    /// Current AF gain
    pub async fn read_af_gain(&mut self) -> Result<u8> {
        let payload = self.read("AG", Some("0".into())).await?;
        let gain = decode_after_prefix("af gain", &payload, "0", LEVEL_DIGITS)?;
        narrow("af gain", &payload, gain)
    }

    /// Digital notch filter (`BC`)
    pub async fn set_auto_notch(&mut self, on: bool) -> Result<()> {
        self.set("BC", Some(format!("0{}", flag(on)).into())).await
    }

    /// Whether the digital notch filter is on
    pub async fn read_auto_notch(&mut self) -> Result<bool> {
        let payload = self.read("BC", Some("0".into())).await?;
        decode_flag("auto notch", &payload, "0")
    }

    /// CW break-in (`BI`)
    pub async fn set_break_in(&mut self, on: bool) -> Result<()> {
        self.set("BI", Some(flag(on).to_string().into())).await
    }

    /// Whether CW break-in is on
    pub async fn read_break_in(&mut self) -> Result<bool> {
        let payload = self.read("BI", None).await?;
        decode_flag("break-in", &payload, "")
    }

    /// Manual notch on or off (`BP00`)
    pub async fn set_manual_notch(&mut self, on: bool) -> Result<()> {
        self.set("BP", Some(format!("00{:03}", u8::from(on)).into())).await
    }

    /// Whether the manual notch is on
    pub async fn read_manual_notch(&mut self) -> Result<bool> {
        let payload = self.read("BP", Some("00".into())).await?;
        let state = decode_after_prefix("manual notch", &payload, "00", LEVEL_DIGITS)?;
        match state {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(invalid_payload("manual notch", &payload)),
        }
    }

    /// Manual notch frequency in Hz, 10..=3200 in 10 Hz steps
    pub async fn set_manual_notch_level(&mut self, hz: u16) -> Result<()> {
        if !NOTCH_LEVEL_HZ.contains(&hz) || hz % 10 != 0 {
            return Err(CatError::InvalidParameter(format!(
                "notch level must be 10..=3200 Hz in 10 Hz steps, got {hz}"
            )));
        }
        self.set("BP", Some(format!("01{:03}", hz / 10).into())).await
    }

    /// Manual notch frequency in Hz
    pub async fn read_manual_notch_level(&mut self) -> Result<u16> {
        let payload = self.read("BP", Some("01".into())).await?;
        let steps = decode_after_prefix("manual notch level", &payload, "01", LEVEL_DIGITS)?;
        steps
            .checked_mul(10)
            .filter(|hz| NOTCH_LEVEL_HZ.contains(hz))
            .ok_or_else(|| invalid_payload("manual notch level", &payload))
    }

    // ---- Band ----

    /// Step to the next band (`BU0`)
    pub async fn band_up(&mut self) -> Result<()> {
        self.set("BU", Some("0".into())).await
    }

    /// Step to the previous band (`BD0`)
    pub async fn band_down(&mut self) -> Result<()> {
        self.set("BD", Some("0".into())).await
    }

    /// Select a band by number (`5`) or name (`"20m"`, `"14"`)
    pub async fn set_band(&mut self, band: impl Into<BandSelector>) -> Result<()> {
        let band = band.into().resolve()?;
        debug!("Selecting band {} ({})", band.number(), band);
        self.set("BS", Some(band.parameter().into())).await
    }

    /// Whether the squelch is open (`BY`)
    pub async fn is_busy(&mut self) -> Result<bool> {
        let payload = self.read("BY", None).await?;
        match payload.chars().next() {
            Some('0') => Ok(false),
            Some('1') => Ok(true),
            _ => Err(invalid_payload("busy", &payload)),
        }
    }

    // ---- Menu ----

    /// Current value of menu function `index`, without the index prefix
    pub async fn read_menu(&mut self, index: u16) -> Result<String> {
        let function = self.link.catalog().menu_function(index)?;
        let param = function.read_parameter();
        let payload = self.read("EX", Some(param.clone().into())).await?;
        payload
            .strip_prefix(param.as_str())
            .map(str::to_string)
            .ok_or_else(|| malformed("EX", &payload))
    }

    /// Set menu function `index`, padding `value` to the function's width
    pub async fn write_menu(&mut self, index: u16, value: impl Into<Parameter>) -> Result<()> {
        let function = self.link.catalog().menu_function(index)?;
        let param = function.format_parameter(&value.into())?;
        self.set("EX", Some(param.into())).await
    }

    // ---- Memory ----

    /// Store a memory channel (`MT`)
    pub async fn write_memory_channel(&mut self, record: &MemoryChannel) -> Result<()> {
        let payload = record.encode()?;
        debug!("Writing memory channel {:03} ({})", record.channel, record.tag);
        self.set("MT", Some(payload.into())).await
    }

    /// Read one memory channel. The radio answers `?;` for an empty
    /// channel, which becomes [`MemoryChannelRead::Empty`].
    pub async fn read_memory_channel(&mut self, channel: u8) -> Result<MemoryChannelRead> {
        check_channel(channel)?;
        let command = self.link.catalog().command("MT")?.code();
        let outcome = self
            .link
            .transact_read("MT", Some(format!("{channel:03}").into()))
            .await?;
        let payload = match outcome {
            TransactionOutcome::Rejected { .. } => {
                debug!("Memory channel {:03} is empty", channel);
                return Ok(MemoryChannelRead::Empty { channel });
            }
            other => other.into_value(command)?,
        };
        let record = MemoryChannel::decode(&payload)?;
        if record.channel != channel {
            return Err(malformed("MT", &payload));
        }
        Ok(MemoryChannelRead::Stored(record))
    }

    /// Read a run of memory channels in order
    pub async fn read_memory_channels(
        &mut self,
        channels: RangeInclusive<u8>,
    ) -> Result<Vec<MemoryChannelRead>> {
        check_channel(*channels.end())?;
        let mut reads = Vec::with_capacity(channels.clone().count());
        for channel in channels {
            reads.push(self.read_memory_channel(channel).await?);
        }
        Ok(reads)
    }

    // ---- Power ----

    /// Wake the CAT port, wait the configured gap, then switch on
    pub async fn power_on(&mut self) -> Result<()> {
        self.link.wake().await?;
        tokio::time::sleep(self.power_on.gap()).await;
        self.set("PS", Some("1".into())).await?;
        info!("Radio powered on");
        Ok(())
    }

    /// Switch the radio off (`PS0`)
    pub async fn power_off(&mut self) -> Result<()> {
        self.set("PS", Some("0".into())).await?;
        info!("Radio powered off");
        Ok(())
    }

    /// Whether the radio reports itself powered on
    pub async fn read_power(&mut self) -> Result<bool> {
        let payload = self.read("PS", None).await?;
        decode_flag("power", &payload, "")
    }

    // ---- Meters and squelch ----

    /// S-meter reading, 0..=255
    pub async fn read_s_meter(&mut self) -> Result<u8> {
        let payload = self.read("SM", Some("0".into())).await?;
        let level = decode_after_prefix("s-meter", &payload, "0", LEVEL_DIGITS)?;
        narrow("s-meter", &payload, level)
    }

    /// Squelch level, 0..=100
    pub async fn set_squelch(&mut self, level: u8) -> Result<()> {
        if level > MAX_SQUELCH {
            return Err(CatError::InvalidParameter(format!(
                "squelch must be 0..={MAX_SQUELCH}, got {level}"
            )));
        }
        self.set("SQ", Some(format!("0{level:03}").into())).await
    }

    /// Current squelch level
    pub async fn read_squelch(&mut self) -> Result<u8> {
        let payload = self.read("SQ", Some("0".into())).await?;
        let level = decode_after_prefix("squelch", &payload, "0", LEVEL_DIGITS)?;
        narrow("squelch", &payload, level)
    }

    // ---- Transmit ----

    /// Transmit state, including PTT keyed at the radio
    pub async fn read_tx(&mut self) -> Result<TxState> {
        let payload = self.read("TX", None).await?;
        Ok(TxState::decode(&payload)?)
    }

    /// Key the transmitter over CAT
    pub async fn tx_on(&mut self) -> Result<()> {
        self.set("TX", Some("1".into())).await
    }

    /// Unkey the transmitter
    pub async fn tx_off(&mut self) -> Result<()> {
        self.set("TX", Some("0".into())).await
    }

    // ---- Identification ----

    /// Identification string (`ID`)
    pub async fn read_id(&mut self) -> Result<String> {
        self.read("ID", None).await
    }

    /// Whether the radio identifies as an FT-991A
    pub async fn is_ft991a(&mut self) -> Result<bool> {
        Ok(self.read_id().await? == FT991A_ID)
    }

    /// Send a complete request (`"FA;"`) and return the classified outcome
    pub async fn raw(&mut self, request: &str) -> Result<TransactionOutcome> {
        self.link.transact_raw(request).await
    }

    async fn set(&mut self, code: &str, parameter: Option<Parameter>) -> Result<()> {
        self.link.request(code, parameter).await.map(drop)
    }

    async fn read(&mut self, code: &str, parameter: Option<Parameter>) -> Result<String> {
        self.link.query(code, parameter).await
    }
}

fn flag(on: bool) -> char {
    if on {
        '1'
    } else {
        '0'
    }
}

fn check_channel(channel: u8) -> Result<()> {
    if channel > MAX_MEMORY_CHANNEL {
        return Err(CatError::InvalidParameter(format!(
            "memory channel must be 0..={MAX_MEMORY_CHANNEL}, got {channel}"
        )));
    }
    Ok(())
}

fn invalid_payload(field: &'static str, payload: &str) -> CatError {
    CatError::Decode(DecodeError::InvalidPayload {
        field,
        payload: payload.to_string(),
    })
}

fn malformed(command: &str, payload: &str) -> CatError {
    CatError::MalformedResponse {
        command: command.to_string(),
        raw: format!("{command}{payload};"),
    }
}

/// Strip a fixed sub-command prefix (`"0"` in `AG0123`) and parse the
/// remaining `digits`-wide decimal field
fn decode_after_prefix(
    field: &'static str,
    payload: &str,
    prefix: &str,
    digits: usize,
) -> Result<u16> {
    let value = payload
        .strip_prefix(prefix)
        .filter(|value| value.len() == digits)
        .ok_or_else(|| invalid_payload(field, payload))?;
    Ok(decode_decimal(field, value)?)
}

fn decode_flag(field: &'static str, payload: &str, prefix: &str) -> Result<bool> {
    match payload.strip_prefix(prefix) {
        Some("0") => Ok(false),
        Some("1") => Ok(true),
        _ => Err(invalid_payload(field, payload)),
    }
}

fn narrow(field: &'static str, payload: &str, value: u16) -> Result<u8> {
    u8::try_from(value).map_err(|_| invalid_payload(field, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_after_prefix() {
        assert_eq!(decode_after_prefix("af gain", "0123", "0", 3).unwrap(), 123);
        assert_eq!(decode_after_prefix("notch", "01150", "01", 3).unwrap(), 150);
        assert!(decode_after_prefix("af gain", "1123", "0", 3).is_err());
        assert!(decode_after_prefix("af gain", "0", "0", 3).is_err());
    }

    #[test]
    fn test_decode_after_prefix_requires_exact_width() {
        assert!(decode_after_prefix("af gain", "012", "0", 3).is_err());
        assert!(decode_after_prefix("squelch", "05", "0", 3).is_err());
        assert!(decode_after_prefix("notch", "016554", "01", 3).is_err());
        assert!(decode_after_prefix("notch", "0199999", "01", 3).is_err());
    }

    #[test]
    fn test_decode_flag() {
        assert!(decode_flag("dnf", "01", "0").unwrap());
        assert!(!decode_flag("power", "0", "").unwrap());
        assert!(decode_flag("power", "2", "").is_err());
        assert!(decode_flag("power", "10", "").is_err());
    }

    #[test]
    fn test_narrow() {
        assert_eq!(narrow("s-meter", "0255", 255).unwrap(), 255);
        assert!(narrow("s-meter", "0256", 256).is_err());
    }

    #[test]
    fn test_channel_bounds() {
        assert!(check_channel(MAX_MEMORY_CHANNEL).is_ok());
        assert!(matches!(check_channel(118), Err(CatError::InvalidParameter(_))));
    }
}
