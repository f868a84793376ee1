//! Virtual FT-991A
//!
//! Parses CAT requests and answers them the way the radio does: reads get
//! `<CODE><payload>;`, sets are silent, and anything the radio would refuse
//! gets `?;`. Answers are queued and collected with [`take_output`].
//!
//! [`take_output`]: VirtualFt991::take_output

use std::collections::{BTreeMap, VecDeque};

use ft991_protocol::{
    Band, ConfigError, Frequency, MemoryChannel, MenuRegistry, TunerState, TxState, ERROR_MARKER,
    MAX_MEMORY_CHANNEL, TERMINATOR,
};
use ft991_protocol::frequency::FREQUENCY_DIGITS;
use tracing::{debug, trace};

/// Identification the radio reports for `ID;`
pub const RADIO_ID: &str = "0670";

/// Number of `AC;` reads a tuning cycle lasts by default
const DEFAULT_TUNE_READS: u32 = 2;

/// Simulated FT-991A state
#[derive(Debug, Clone)]
pub struct VirtualFt991 {
    menu_registry: MenuRegistry,
    power: bool,
    /// A request arrived while powered off; the next `PS1` is honoured
    woken: bool,
    vfo_a: u64,
    vfo_b: u64,
    af_gain: u8,
    squelch: u8,
    s_meter: u8,
    busy: bool,
    auto_notch: bool,
    break_in: bool,
    manual_notch: bool,
    /// Manual notch position in 10 Hz units
    notch_level: u16,
    band: u8,
    tuner: TunerState,
    tune_reads: u32,
    tune_reads_left: u32,
    tx: TxState,
    menu: BTreeMap<u16, String>,
    memory: Vec<Option<MemoryChannel>>,
    input: Vec<u8>,
    pending_output: VecDeque<Vec<u8>>,
    muted_answers: u32,
    injected: VecDeque<Vec<u8>>,
}

impl VirtualFt991 {
    /// A powered-on radio using `menu_registry` for `EX` widths
    pub fn new(menu_registry: MenuRegistry) -> Self {
        Self {
            menu_registry,
            power: true,
            woken: false,
            vfo_a: 14_250_000,
            vfo_b: 7_074_000,
            af_gain: 50,
            squelch: 0,
            s_meter: 0,
            busy: false,
            auto_notch: false,
            break_in: false,
            manual_notch: false,
            notch_level: 150,
            band: 5,
            tuner: TunerState::Off,
            tune_reads: DEFAULT_TUNE_READS,
            tune_reads_left: 0,
            tx: TxState::Off,
            menu: BTreeMap::new(),
            memory: vec![None; usize::from(MAX_MEMORY_CHANNEL) + 1],
            input: Vec::new(),
            pending_output: VecDeque::new(),
            muted_answers: 0,
            injected: VecDeque::new(),
        }
    }

    /// A radio with the built-in FT-991A menu
    pub fn ft991a() -> Result<Self, ConfigError> {
        Ok(Self::new(MenuRegistry::ft991a()?))
    }

    /// Feed bytes received from the controller. Complete requests are
    /// handled immediately; a trailing partial request is kept.
    pub fn process_bytes(&mut self, data: &[u8]) {
        self.input.extend_from_slice(data);
        while let Some(end) = self.input.iter().position(|&b| b == TERMINATOR) {
            let frame: Vec<u8> = self.input.drain(..=end).collect();
            self.process_frame(&frame[..end]);
        }
    }

    fn process_frame(&mut self, frame: &[u8]) {
        trace!("Virtual FT-991A received {:?}", String::from_utf8_lossy(frame));
        let answer = self.handle(frame);

        if let Some(reply) = self.injected.pop_front() {
            debug!("Virtual FT-991A sending injected reply {:?}", String::from_utf8_lossy(&reply));
            self.pending_output.push_back(reply);
            return;
        }
        let Some(answer) = answer else {
            return;
        };
        if self.muted_answers > 0 {
            self.muted_answers -= 1;
            debug!("Virtual FT-991A muted answer {:?}", String::from_utf8_lossy(&answer));
            return;
        }
        self.pending_output.push_back(answer);
    }

    /// Answer for one request body (without terminator); `None` means silence
    fn handle(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        if !self.power {
            return self.handle_powered_off(frame);
        }
        let Ok(text) = std::str::from_utf8(frame) else {
            return reject();
        };
        if text.len() < 2 || !text.is_char_boundary(2) {
            return reject();
        }
        let (code, param) = text.split_at(2);

        match code {
            "AB" if param.is_empty() => {
                self.vfo_b = self.vfo_a;
                None
            }
            "BA" if param.is_empty() => {
                self.vfo_a = self.vfo_b;
                None
            }
            "FA" | "FB" => self.handle_vfo(code, param),
            "AC" => self.handle_tuner(param),
            "AG" => match param {
                "0" => answer("AG", format!("0{:03}", self.af_gain)),
                _ => match parse_prefixed(param, "0", 3, 255) {
                    Some(gain) => {
                        self.af_gain = gain;
                        None
                    }
                    None => reject(),
                },
            },
            "BC" => match param {
                "0" => answer("BC", format!("0{}", flag(self.auto_notch))),
                "00" | "01" => {
                    self.auto_notch = param == "01";
                    None
                }
                _ => reject(),
            },
            "BD" | "BU" if param == "0" => {
                self.step_band(code == "BU");
                None
            }
            "BI" => match param {
                "" => answer("BI", flag(self.break_in).to_string()),
                "0" | "1" => {
                    self.break_in = param == "1";
                    None
                }
                _ => reject(),
            },
            "BP" => self.handle_notch(param),
            "BS" => match parse_prefixed(param, "", 2, u8::MAX).map(Band::from_number) {
                Some(Ok(band)) => {
                    self.band = band.number();
                    None
                }
                _ => reject(),
            },
            "BY" if param.is_empty() => answer("BY", format!("{}0", flag(self.busy))),
            "EX" => self.handle_menu(param),
            "ID" if param.is_empty() => answer("ID", RADIO_ID.to_string()),
            "MT" => self.handle_memory(param),
            "PS" => match param {
                "" => answer("PS", "1".to_string()),
                "0" => {
                    debug!("Virtual FT-991A powering off");
                    self.power = false;
                    self.woken = false;
                    None
                }
                "1" => None,
                _ => reject(),
            },
            "SM" if param == "0" => answer("SM", format!("0{:03}", self.s_meter)),
            "SQ" => match param {
                "0" => answer("SQ", format!("0{:03}", self.squelch)),
                _ => match parse_prefixed(param, "0", 3, 100) {
                    Some(level) => {
                        self.squelch = level;
                        None
                    }
                    None => reject(),
                },
            },
            "TX" => match param {
                "" => answer("TX", self.tx.code().to_string()),
                "0" => {
                    self.tx = TxState::Off;
                    None
                }
                "1" => {
                    self.tx = TxState::On;
                    None
                }
                _ => reject(),
            },
            _ => reject(),
        }
    }

    fn handle_powered_off(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        if frame == b"PS1" && self.woken {
            debug!("Virtual FT-991A powering on");
            self.power = true;
        }
        self.woken = true;
        None
    }

    fn handle_vfo(&mut self, code: &str, param: &str) -> Option<Vec<u8>> {
        if param.is_empty() {
            let hz = if code == "FA" { self.vfo_a } else { self.vfo_b };
            return answer(code, format!("{hz:0width$}", width = FREQUENCY_DIGITS));
        }
        let Ok(freq) = Frequency::decode(param) else {
            return reject();
        };
        if code == "FA" {
            self.vfo_a = freq.hz();
        } else {
            self.vfo_b = freq.hz();
        }
        None
    }

    fn handle_tuner(&mut self, param: &str) -> Option<Vec<u8>> {
        match param {
            "" => {
                if self.tuner == TunerState::Tuning {
                    self.tune_reads_left = self.tune_reads_left.saturating_sub(1);
                    let state = self.tuner;
                    if self.tune_reads_left == 0 {
                        self.tuner = TunerState::On;
                    }
                    return answer("AC", tuner_payload(state));
                }
                answer("AC", tuner_payload(self.tuner))
            }
            "000" => {
                self.tuner = TunerState::Off;
                None
            }
            "001" => {
                self.tuner = TunerState::On;
                None
            }
            "002" => {
                self.tuner = TunerState::Tuning;
                self.tune_reads_left = self.tune_reads;
                None
            }
            _ => reject(),
        }
    }

    fn handle_notch(&mut self, param: &str) -> Option<Vec<u8>> {
        match param {
            "00" => answer("BP", format!("00{:03}", u8::from(self.manual_notch))),
            "01" => answer("BP", format!("01{:03}", self.notch_level)),
            _ if param.starts_with("00") => {
                match parse_prefixed(param, "00", 3, 1) {
                    Some(state) => {
                        self.manual_notch = state == 1;
                        None
                    }
                    None => reject(),
                }
            }
            _ => match parse_prefixed(param, "01", 3, 320).filter(|level| *level > 0) {
                Some(level) => {
                    self.notch_level = level;
                    None
                }
                None => reject(),
            },
        }
    }

    fn handle_menu(&mut self, param: &str) -> Option<Vec<u8>> {
        if param.len() < 3 {
            return reject();
        }
        let (index_text, value) = param.split_at(3);
        let Ok(index) = index_text.parse::<u16>() else {
            return reject();
        };
        let Ok(function) = self.menu_registry.lookup(index) else {
            return reject();
        };
        let width = function.width();

        if value.is_empty() {
            let current = self
                .menu
                .get(&index)
                .cloned()
                .unwrap_or_else(|| "0".repeat(width));
            return answer("EX", format!("{index_text}{current}"));
        }
        let digits = value.strip_prefix(&['+', '-'][..]).unwrap_or(value);
        if width == 0 || value.len() != width || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return reject();
        }
        self.menu.insert(index, value.to_string());
        None
    }

    fn handle_memory(&mut self, param: &str) -> Option<Vec<u8>> {
        if param.len() == 3 {
            let stored = parse_prefixed(param, "", 3, MAX_MEMORY_CHANNEL)
                .and_then(|channel| self.memory[usize::from(channel)].as_ref())
                .and_then(|record| record.encode().ok());
            return match stored {
                Some(record) => answer("MT", record),
                None => reject(),
            };
        }
        match MemoryChannel::decode(param) {
            Ok(record) => {
                debug!("Virtual FT-991A stored memory channel {:03}", record.channel);
                let slot = usize::from(record.channel);
                self.memory[slot] = Some(record);
                None
            }
            Err(_) => reject(),
        }
    }

    fn step_band(&mut self, up: bool) {
        let bands = Band::all();
        let pos = bands.iter().position(|b| b.number() == self.band).unwrap_or(0);
        let next = if up {
            (pos + 1) % bands.len()
        } else {
            (pos + bands.len() - 1) % bands.len()
        };
        self.band = bands[next].number();
    }

    // ---- Output ----

    /// Take the next queued answer
    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.pending_output.pop_front()
    }

    pub fn has_output(&self) -> bool {
        !self.pending_output.is_empty()
    }

    // ---- Fault injection ----

    /// Swallow the next `count` answers
    pub fn mute_answers(&mut self, count: u32) {
        self.muted_answers = count;
    }

    /// Reply to the next request with `reply` instead of the normal answer
    pub fn inject_reply(&mut self, reply: impl Into<Vec<u8>>) {
        self.injected.push_back(reply.into());
    }

    /// Number of `AC;` reads a tuning cycle lasts
    pub fn set_tune_reads(&mut self, reads: u32) {
        self.tune_reads = reads.max(1);
    }

    // ---- State ----

    pub fn is_powered(&self) -> bool {
        self.power
    }

    pub fn set_power(&mut self, on: bool) {
        self.power = on;
        self.woken = false;
    }

    pub fn vfo_a_hz(&self) -> u64 {
        self.vfo_a
    }

    pub fn vfo_b_hz(&self) -> u64 {
        self.vfo_b
    }

    pub fn af_gain(&self) -> u8 {
        self.af_gain
    }

    pub fn squelch(&self) -> u8 {
        self.squelch
    }

    pub fn set_s_meter(&mut self, level: u8) {
        self.s_meter = level;
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn auto_notch(&self) -> bool {
        self.auto_notch
    }

    pub fn break_in(&self) -> bool {
        self.break_in
    }

    pub fn manual_notch(&self) -> bool {
        self.manual_notch
    }

    /// Manual notch position in Hz
    pub fn notch_level_hz(&self) -> u16 {
        self.notch_level * 10
    }

    pub fn band(&self) -> u8 {
        self.band
    }

    pub fn tuner(&self) -> TunerState {
        self.tuner
    }

    pub fn tx(&self) -> TxState {
        self.tx
    }

    /// Simulate the operator keying the microphone
    pub fn set_radio_ptt(&mut self, keyed: bool) {
        self.tx = if keyed { TxState::RadioPtt } else { TxState::Off };
    }

    pub fn menu_value(&self, index: u16) -> Option<&str> {
        self.menu.get(&index).map(String::as_str)
    }

    pub fn memory(&self, channel: u8) -> Option<&MemoryChannel> {
        self.memory.get(usize::from(channel))?.as_ref()
    }

    /// Store a record directly, bypassing the wire
    pub fn store_memory(&mut self, record: MemoryChannel) {
        if let Some(slot) = self.memory.get_mut(usize::from(record.channel)) {
            *slot = Some(record);
        }
    }
}

fn answer(code: &str, payload: String) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(code.len() + payload.len() + 1);
    out.extend_from_slice(code.as_bytes());
    out.extend_from_slice(payload.as_bytes());
    out.push(TERMINATOR);
    Some(out)
}

fn reject() -> Option<Vec<u8>> {
    Some(ERROR_MARKER.to_vec())
}

fn flag(on: bool) -> char {
    if on {
        '1'
    } else {
        '0'
    }
}

fn tuner_payload(state: TunerState) -> String {
    let digit = match state {
        TunerState::Off => '0',
        TunerState::On => '1',
        TunerState::Tuning => '2',
    };
    format!("00{digit}")
}

/// `"0123"` with prefix `"0"` and 3 digits -> 123, if within `max`
fn parse_prefixed<T>(param: &str, prefix: &str, digits: usize, max: T) -> Option<T>
where
    T: std::str::FromStr + PartialOrd,
{
    let value = param.strip_prefix(prefix)?;
    if value.len() != digits || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<T>().ok().filter(|v| *v <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ft991_protocol::{Mode, RepeaterShift};

    fn radio() -> VirtualFt991 {
        VirtualFt991::ft991a().unwrap()
    }

    fn exchange(radio: &mut VirtualFt991, request: &[u8]) -> Option<Vec<u8>> {
        radio.process_bytes(request);
        radio.take_output()
    }

    #[test]
    fn test_read_and_set_vfo() {
        let mut radio = radio();
        assert_eq!(exchange(&mut radio, b"FA;").unwrap(), b"FA014250000;");
        assert_eq!(exchange(&mut radio, b"FA007074000;"), None);
        assert_eq!(radio.vfo_a_hz(), 7_074_000);
        assert_eq!(exchange(&mut radio, b"FA7074;").unwrap(), b"?;");
    }

    #[test]
    fn test_vfo_copy() {
        let mut radio = radio();
        exchange(&mut radio, b"AB;");
        assert_eq!(radio.vfo_b_hz(), 14_250_000);
    }

    #[test]
    fn test_unknown_command_rejected() {
        let mut radio = radio();
        assert_eq!(exchange(&mut radio, b"ZZ;").unwrap(), b"?;");
        assert_eq!(exchange(&mut radio, b"X;").unwrap(), b"?;");
    }

    #[test]
    fn test_split_request() {
        let mut radio = radio();
        radio.process_bytes(b"AG");
        assert!(!radio.has_output());
        radio.process_bytes(b"0;");
        assert_eq!(radio.take_output().unwrap(), b"AG0050;");
    }

    #[test]
    fn test_af_gain_range() {
        let mut radio = radio();
        assert_eq!(exchange(&mut radio, b"AG0255;"), None);
        assert_eq!(radio.af_gain(), 255);
        assert_eq!(exchange(&mut radio, b"AG0256;").unwrap(), b"?;");
    }

    #[test]
    fn test_tuning_cycle() {
        let mut radio = radio();
        radio.set_tune_reads(2);
        exchange(&mut radio, b"AC002;");
        assert_eq!(exchange(&mut radio, b"AC;").unwrap(), b"AC002;");
        assert_eq!(exchange(&mut radio, b"AC;").unwrap(), b"AC002;");
        assert_eq!(exchange(&mut radio, b"AC;").unwrap(), b"AC001;");
        assert_eq!(radio.tuner(), TunerState::On);
    }

    #[test]
    fn test_memory_channels() {
        let mut radio = radio();
        assert_eq!(exchange(&mut radio, b"MT005;").unwrap(), b"?;");

        let record = MemoryChannel::new(5, Frequency::from_hz(145_600_000).unwrap(), Mode::Fm)
            .with_shift(RepeaterShift::Minus)
            .with_tag("R0");
        let mut request = b"MT".to_vec();
        request.extend_from_slice(record.encode().unwrap().as_bytes());
        request.push(b';');
        assert_eq!(exchange(&mut radio, &request), None);
        assert_eq!(radio.memory(5), Some(&record));

        let answer = exchange(&mut radio, b"MT005;").unwrap();
        assert_eq!(answer, request);
        assert_eq!(exchange(&mut radio, b"MT118;").unwrap(), b"?;");
    }

    #[test]
    fn test_menu_widths() {
        let mut radio = radio();
        assert_eq!(exchange(&mut radio, b"EX001;").unwrap(), b"EX0010000;");
        assert_eq!(exchange(&mut radio, b"EX0010300;"), None);
        assert_eq!(radio.menu_value(1), Some("0300"));
        assert_eq!(exchange(&mut radio, b"EX001300;").unwrap(), b"?;");
        assert_eq!(exchange(&mut radio, b"EX999;").unwrap(), b"?;");

        assert_eq!(exchange(&mut radio, b"EX035-05;"), None);
        assert_eq!(exchange(&mut radio, b"EX035;").unwrap(), b"EX035-05;");
        assert_eq!(exchange(&mut radio, b"EX0350-5;").unwrap(), b"?;");
    }

    #[test]
    fn test_power_cycle_needs_wake() {
        let mut radio = radio();
        assert_eq!(exchange(&mut radio, b"PS0;"), None);
        assert!(!radio.is_powered());
        assert_eq!(exchange(&mut radio, b"FA;"), None);

        radio.set_power(false);
        exchange(&mut radio, b"PS1;");
        assert!(!radio.is_powered());
        exchange(&mut radio, b"PS1;");
        assert!(radio.is_powered());
    }

    #[test]
    fn test_band_select_and_step() {
        let mut radio = radio();
        assert_eq!(exchange(&mut radio, b"BS16;"), None);
        assert_eq!(radio.band(), 16);
        exchange(&mut radio, b"BU0;");
        assert_eq!(radio.band(), 0);
        exchange(&mut radio, b"BD0;");
        assert_eq!(radio.band(), 16);
        assert_eq!(exchange(&mut radio, b"BS02;").unwrap(), b"?;");
    }

    #[test]
    fn test_mute_and_inject() {
        let mut radio = radio();
        radio.mute_answers(1);
        assert_eq!(exchange(&mut radio, b"FA;"), None);
        assert_eq!(exchange(&mut radio, b"FA;").unwrap(), b"FA014250000;");

        radio.inject_reply(&b"FB007074000;"[..]);
        assert_eq!(exchange(&mut radio, b"FA;").unwrap(), b"FB007074000;");
    }
}
