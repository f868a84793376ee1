//! Menu function registry
//!
//! The `EX` command multiplexes every numbered menu setting behind one
//! command code: `EX<index:3><parameter:width>;`. Each function declares a
//! fixed parameter width; width 0 marks functions that are addressed by
//! index alone.
//!
//! Padding rule: a parameter shorter than the width is left-padded with
//! `'0'` to the width; a parameter longer than the width is rejected. A
//! leading `+` or `-` counts toward the width and stays in front, so `-5`
//! at width 3 becomes `-05`.

use std::collections::BTreeMap;

use crate::error::{ConfigError, EncodeError, LookupError};
use crate::frame::Parameter;

/// Width of the menu index on the wire
pub const MENU_INDEX_DIGITS: usize = 3;

/// One numbered menu setting
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MenuFunction {
    index: u16,
    function: String,
    parameter: String,
    width: usize,
}

impl MenuFunction {
    pub fn new(
        index: u16,
        function: impl Into<String>,
        parameter: impl Into<String>,
        width: usize,
    ) -> Self {
        Self {
            index,
            function: function.into(),
            parameter: parameter.into(),
            width,
        }
    }

    /// Menu number
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Front-panel name of the setting
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Human description of the accepted values
    pub fn parameter_description(&self) -> &str {
        &self.parameter
    }

    /// Parameter digit width; 0 means no payload
    pub fn width(&self) -> usize {
        self.width
    }

    /// `EX` parameter that reads this function: the padded index
    pub fn read_parameter(&self) -> String {
        format!("{:0width$}", self.index, width = MENU_INDEX_DIGITS)
    }

    /// `EX` parameter that writes `value` to this function
    pub fn format_parameter(&self, value: &Parameter) -> Result<String, EncodeError> {
        let value = value.to_wire()?;
        if value.len() > self.width {
            return Err(EncodeError::MenuParameterTooWide {
                index: self.index,
                width: self.width,
                param: value,
            });
        }
        let padded = match value.strip_prefix(&['+', '-'][..]) {
            Some(magnitude) => format!(
                "{}{:0>width$}",
                &value[..1],
                magnitude,
                width = self.width - 1
            ),
            None => format!("{:0>width$}", value, width = self.width),
        };
        Ok(format!("{}{}", self.read_parameter(), padded))
    }
}

/// Immutable index -> [`MenuFunction`] mapping
#[derive(Debug, Clone, Default)]
pub struct MenuRegistry {
    functions: BTreeMap<u16, MenuFunction>,
}

impl MenuRegistry {
    /// Build a registry, rejecting duplicate indices
    pub fn from_functions(
        functions: impl IntoIterator<Item = MenuFunction>,
    ) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for function in functions {
            let index = function.index;
            if map.insert(index, function).is_some() {
                return Err(ConfigError::DuplicateMenuFunction(index));
            }
        }
        Ok(Self { functions: map })
    }

    /// The built-in FT-991A menu
    pub fn ft991a() -> Result<Self, ConfigError> {
        Self::from_functions(
            FT991A_MENU
                .iter()
                .map(|&(index, function, parameter, width)| {
                    MenuFunction::new(index, function, parameter, width)
                }),
        )
    }

    /// Parse a `;`-separated menu table.
    ///
    /// Rows are `index;function;parameter description;digits`, where
    /// digits `-` means no payload. A header row starting with `P1;` is
    /// skipped, as are blank lines.
    pub fn from_table(text: &str) -> Result<Self, ConfigError> {
        let mut functions = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.starts_with("P1;") || line.trim().is_empty() {
                continue;
            }
            let malformed = |reason: String| ConfigError::MalformedRow {
                line: line_no,
                reason,
            };
            let cols: Vec<&str> = line.split(';').map(str::trim).collect();
            if cols.len() != 4 {
                return Err(malformed(format!("expected 4 columns, got {}", cols.len())));
            }
            let index = cols[0]
                .parse::<u16>()
                .map_err(|_| malformed(format!("invalid menu index {:?}", cols[0])))?;
            let width = match cols[3] {
                "-" => 0,
                digits => digits
                    .parse::<usize>()
                    .map_err(|_| malformed(format!("invalid digit width {digits:?}")))?,
            };
            functions.push(MenuFunction::new(index, cols[1], cols[2], width));
        }
        let registry = Self::from_functions(functions)?;
        tracing::debug!("Loaded {} menu functions from table", registry.len());
        Ok(registry)
    }

    /// Look up a menu function by index
    pub fn lookup(&self, index: u16) -> Result<&MenuFunction, LookupError> {
        self.functions
            .get(&index)
            .ok_or(LookupError::MenuFunctionNotFound(index))
    }

    /// `EX` parameter that reads menu `index`
    pub fn read_parameter(&self, index: u16) -> Result<String, EncodeError> {
        self.function(index).map(MenuFunction::read_parameter)
    }

    /// `EX` parameter that writes `value` to menu `index`
    pub fn format_parameter(&self, index: u16, value: &Parameter) -> Result<String, EncodeError> {
        self.function(index)?.format_parameter(value)
    }

    /// Number of menu functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// All functions in index order
    pub fn iter(&self) -> impl Iterator<Item = &MenuFunction> {
        self.functions.values()
    }

    fn function(&self, index: u16) -> Result<&MenuFunction, EncodeError> {
        self.functions
            .get(&index)
            .ok_or(EncodeError::MenuFunctionNotFound(index))
    }
}

/// FT-991A menu: (index, function, parameter, digit width)
const FT991A_MENU: &[(u16, &str, &str, usize)] = &[
    (1, "AGC FAST DELAY", "20 - 4000 (msec)", 4),
    (2, "AGC MID DELAY", "20 - 4000 (msec)", 4),
    (3, "AGC SLOW DELAY", "20 - 4000 (msec)", 4),
    (4, "HOME FUNCTION", "0:SCOPE 1:FUNCTION", 1),
    (5, "MY CALL INDICATION", "0 - 5 (sec)", 1),
    (6, "DISPLAY COLOR", "0:BLUE 1:GRAY 2:GREEN 3:ORANGE 4:PURPLE 5:RED 6:SKY BLUE", 1),
    (7, "DIMMER LED", "1 - 2", 1),
    (8, "DIMMER TFT", "00 - 15", 2),
    (9, "BAR MTR PEAK HOLD", "0:OFF 1:0.5 2:1.0 3:2.0 (sec)", 1),
    (10, "DVS RX OUT LEVEL", "000 - 100", 3),
    (11, "DVS TX OUT LEVEL", "000 - 100", 3),
    (12, "KEYER TYPE", "0:OFF 1:BUG 2:ELEKEY-A 3:ELEKEY-B 4:ELEKEY-Y 5:ACS", 1),
    (13, "KEYER DOT/DASH", "0:NOR 1:REV", 1),
    (14, "CW WEIGHT", "25 - 45", 2),
    (15, "BEACON INTERVAL", "000 - 690 (sec)", 3),
    (16, "NUMBER STYLE", "0:1290 1:AUNO 2:AUNT 3:A2NO 4:A2NT 5:12NO 6:12NT", 1),
    (17, "CONTEST NUMBER", "0000 - 9999", 4),
    (18, "CW MEMORY 1", "0:TEXT 1:MESSAGE", 1),
    (19, "CW MEMORY 2", "0:TEXT 1:MESSAGE", 1),
    (20, "CW MEMORY 3", "0:TEXT 1:MESSAGE", 1),
    (21, "CW MEMORY 4", "0:TEXT 1:MESSAGE", 1),
    (22, "CW MEMORY 5", "0:TEXT 1:MESSAGE", 1),
    (23, "NB WIDTH", "0:1 1:3 2:10 (msec)", 1),
    (24, "NB REJECTION", "0:10 1:30 2:50 (dB)", 1),
    (25, "NB LEVEL", "00 - 10", 2),
    (26, "BEEP LEVEL", "000 - 100", 3),
    (27, "TIME ZONE", "-1200 - +1400", 5),
    (28, "GPS/232C SELECT", "0:GPS1 1:GPS2 2:RS232C", 1),
    (29, "232C RATE", "0:4800 1:9600 2:19200 3:38400 (bps)", 1),
    (30, "232C TOT", "0:10 1:100 2:1000 3:3000 (msec)", 1),
    (31, "CAT RATE", "0:4800 1:9600 2:19200 3:38400 (bps)", 1),
    (32, "CAT TOT", "0:10 1:100 2:1000 3:3000 (msec)", 1),
    (33, "CAT RTS", "0:DISABLE 1:ENABLE", 1),
    (34, "MEM GROUP", "0:DISABLE 1:ENABLE", 1),
    (35, "QUICK SPLIT FREQ", "-20 - +20 (kHz)", 3),
    (36, "TX TOT", "00:OFF 01 - 30 (min)", 2),
    (37, "MIC SCAN", "0:DISABLE 1:ENABLE", 1),
    (38, "MIC SCAN RESUME", "0:PAUSE 1:TIME", 1),
    (39, "REF FREQ ADJ", "-25 - +25", 3),
    (40, "CLAR MODE SELECT", "0:RX 1:TX 2:TRX", 1),
    (41, "AM LCUT FREQ", "00:OFF 01 - 19 (100-1000Hz)", 2),
    (42, "AM LCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (43, "AM HCUT FREQ", "00:OFF 01 - 67 (700-4000Hz)", 2),
    (44, "AM HCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (45, "AM MIC SELECT", "0:MIC 1:REAR", 1),
    (46, "AM OUT LEVEL", "000 - 100", 3),
    (47, "AM PTT SELECT", "0:DAKY 1:RTS 2:DTR", 1),
    (48, "AM PORT SELECT", "0:DATA 1:USB", 1),
    (49, "AM DATA GAIN", "000 - 100", 3),
    (50, "CW LCUT FREQ", "00:OFF 01 - 19 (100-1000Hz)", 2),
    (51, "CW LCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (52, "CW HCUT FREQ", "00:OFF 01 - 67 (700-4000Hz)", 2),
    (53, "CW HCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (54, "CW OUT LEVEL", "000 - 100", 3),
    (55, "CW AUTO MODE", "0:OFF 1:50M 2:ON", 1),
    (56, "CW BK-IN TYPE", "0:SEMI 1:FULL", 1),
    (57, "CW BK-IN DELAY", "0030 - 3000 (msec)", 4),
    (58, "CW WAVE SHAPE", "1:2 2:4 (msec)", 1),
    (59, "CW FREQ DISPLAY", "0:DIRECT FREQ 1:PITCH OFFSET", 1),
    (60, "PC KEYING", "0:OFF 1:DAKY 2:RTS 3:DTR", 1),
    (61, "QSK DELAY TIME", "0:15 1:20 2:25 3:30 (msec)", 1),
    (62, "DATA MODE", "0:PSK 1:OTHERS", 1),
    (63, "PSK TONE", "0:1000 1:1500 2:2000 (Hz)", 1),
    (64, "OTHER DISP (SSB)", "-3000 - +3000 (Hz)", 5),
    (65, "OTHER SHIFT (SSB)", "-3000 - +3000 (Hz)", 5),
    (66, "DATA LCUT FREQ", "00:OFF 01 - 19 (100-1000Hz)", 2),
    (67, "DATA LCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (68, "DATA HCUT FREQ", "00:OFF 01 - 67 (700-4000Hz)", 2),
    (69, "DATA HCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (70, "DATA IN SELECT", "0:MIC 1:REAR", 1),
    (71, "DATA PTT SELECT", "0:DAKY 1:RTS 2:DTR", 1),
    (72, "DATA PORT SELECT", "0:DATA 1:USB", 1),
    (73, "DATA OUT LEVEL", "000 - 100", 3),
    (74, "FM MIC SELECT", "0:MIC 1:REAR", 1),
    (75, "FM OUT LEVEL", "000 - 100", 3),
    (76, "FM PKT PTT SELECT", "0:DAKY 1:RTS 2:DTR", 1),
    (77, "FM PKT PORT SELECT", "0:DATA 1:USB", 1),
    (78, "FM PKT TX GAIN", "000 - 100", 3),
    (79, "FM PKT MODE", "0:1200 1:9600", 1),
    (80, "RPT SHIFT 28MHz", "0000 - 1000 (10kHz)", 4),
    (81, "RPT SHIFT 50MHz", "0000 - 4000 (10kHz)", 4),
    (82, "RPT SHIFT 144MHz", "0000 - 1000 (10kHz)", 4),
    (83, "RPT SHIFT 430MHz", "00000 - 10000 (10kHz)", 5),
    (84, "ARS 144MHz", "0:OFF 1:ON", 1),
    (85, "ARS 430MHz", "0:OFF 1:ON", 1),
    (86, "DCS POLARITY", "0:Tn-Rn 1:Tn-Riv 2:Tiv-Rn 3:Tiv-Riv", 1),
    (87, "RADIO ID", "read only", 0),
    (88, "GM DISPLAY", "0:DISTANCE 1:STRENGTH", 1),
    (89, "DISTANCE", "0:km 1:mile", 1),
    (90, "AMS TX MODE", "0:AUTO 1:MANUAL 2:DN 3:VW 4:ANALOG", 1),
    (91, "STANDBY BEEP", "0:OFF 1:ON", 1),
    (92, "RTTY LCUT FREQ", "00:OFF 01 - 19 (100-1000Hz)", 2),
    (93, "RTTY LCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (94, "RTTY HCUT FREQ", "00:OFF 01 - 67 (700-4000Hz)", 2),
    (95, "RTTY HCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (96, "RTTY SHIFT PORT", "0:SHIFT 1:DTR 2:RTS", 1),
    (97, "RTTY POLARITY-R", "0:NOR 1:REV", 1),
    (98, "RTTY POLARITY-T", "0:NOR 1:REV", 1),
    (99, "RTTY OUT LEVEL", "000 - 100", 3),
    (100, "RTTY SHIFT FREQ", "0:170 1:200 2:425 3:850 (Hz)", 1),
    (101, "RTTY MARK FREQ", "0:1275 1:2125 (Hz)", 1),
    (102, "SSB LCUT FREQ", "00:OFF 01 - 19 (100-1000Hz)", 2),
    (103, "SSB LCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (104, "SSB HCUT FREQ", "00:OFF 01 - 67 (700-4000Hz)", 2),
    (105, "SSB HCUT SLOPE", "0:6dB/oct 1:18dB/oct", 1),
    (106, "SSB MIC SELECT", "0:MIC 1:REAR", 1),
    (107, "SSB OUT LEVEL", "000 - 100", 3),
    (108, "SSB BFO", "0:USB 1:LSB 2:AUTO", 1),
    (109, "SSB PTT SELECT", "0:DAKY 1:RTS 2:DTR", 1),
    (110, "SSB PORT SELECT", "0:DATA 1:USB", 1),
    (111, "SSB TX BPF", "0:100-3000 1:100-2900 2:200-2800 3:300-2700 4:400-2600 (Hz)", 1),
    (112, "APF WIDTH", "0:NARROW 1:MEDIUM 2:WIDE", 1),
    (113, "CONTOUR LEVEL", "-40 - +20", 3),
    (114, "CONTOUR WIDTH", "01 - 11", 2),
    (115, "IF NOTCH WIDTH", "0:NARROW 1:WIDE", 1),
    (116, "SCP START CYCLE", "0:OFF 1:3 2:5 3:10 (sec)", 1),
    (117, "SCP SPAN FREQ", "0:37.5 1:75 2:150 3:375 4:750 (kHz)", 1),
    (118, "SPECTRUM COLOR", "0:BLUE 1:GRAY 2:GREEN 3:ORANGE 4:PURPLE 5:RED 6:SKY BLUE", 1),
    (119, "WATERFALL COLOR", "0:BLUE 1:GRAY 2:GREEN 3:ORANGE 4:PURPLE 5:RED 6:SKY BLUE 7:MULTI", 1),
    (120, "PRMTRC EQ1 FREQ", "00:OFF 01 - 18 (100-700Hz)", 2),
    (121, "PRMTRC EQ1 LEVEL", "-20 - +10", 3),
    (122, "PRMTRC EQ1 BWTH", "01 - 10", 2),
    (123, "PRMTRC EQ2 FREQ", "00:OFF 01 - 09 (700-1500Hz)", 2),
    (124, "PRMTRC EQ2 LEVEL", "-20 - +10", 3),
    (125, "PRMTRC EQ2 BWTH", "01 - 10", 2),
    (126, "PRMTRC EQ3 FREQ", "00:OFF 01 - 18 (1500-3200Hz)", 2),
    (127, "PRMTRC EQ3 LEVEL", "-20 - +10", 3),
    (128, "PRMTRC EQ3 BWTH", "01 - 10", 2),
    (129, "P-PRMTRC EQ1 FREQ", "00:OFF 01 - 18 (100-700Hz)", 2),
    (130, "P-PRMTRC EQ1 LEVEL", "-20 - +10", 3),
    (131, "P-PRMTRC EQ1 BWTH", "01 - 10", 2),
    (132, "P-PRMTRC EQ2 FREQ", "00:OFF 01 - 09 (700-1500Hz)", 2),
    (133, "P-PRMTRC EQ2 LEVEL", "-20 - +10", 3),
    (134, "P-PRMTRC EQ2 BWTH", "01 - 10", 2),
    (135, "P-PRMTRC EQ3 FREQ", "00:OFF 01 - 18 (1500-3200Hz)", 2),
    (136, "P-PRMTRC EQ3 LEVEL", "-20 - +10", 3),
    (137, "P-PRMTRC EQ3 BWTH", "01 - 10", 2),
    (138, "HF TX MAX POWER", "005 - 100", 3),
    (139, "50M TX MAX POWER", "005 - 100", 3),
    (140, "144M TX MAX POWER", "005 - 050", 3),
    (141, "430M TX MAX POWER", "005 - 050", 3),
    (142, "TUNER SELECT", "0:OFF 1:INTERNAL 2:EXTERNAL 3:ATAS 4:LAMP", 1),
    (143, "VOX SELECT", "0:MIC 1:DATA", 1),
    (144, "VOX GAIN", "000 - 100", 3),
    (145, "VOX DELAY", "0030 - 3000 (msec)", 4),
    (146, "ANTI VOX GAIN", "000 - 100", 3),
    (147, "DATA VOX GAIN", "000 - 100", 3),
    (148, "DATA VOX DELAY", "0030 - 3000 (msec)", 4),
    (149, "ANTI DVOX GAIN", "000 - 100", 3),
    (150, "EMERGENCY FREQ TX", "0:DISABLE 1:ENABLE", 1),
    (151, "PRT/WIRES FREQ", "0:MANUAL 1:PRESET", 1),
    (152, "PRESET FREQUENCY", "000000000 - 999999999 (Hz)", 9),
    (153, "SEARCH SETUP", "0:HISTORY 1:ACTIVITY", 1),
    (154, "WIRES DG-ID", "0:AUTO 01 - 99", 2),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> MenuRegistry {
        MenuRegistry::ft991a().unwrap()
    }

    #[test]
    fn test_builtin_menu_covers_all_indices() {
        let menu = menu();
        assert_eq!(menu.len(), 154);
        assert!(menu.iter().map(MenuFunction::index).eq(1..=154));
    }

    #[test]
    fn test_read_parameter_is_padded_index() {
        assert_eq!(menu().read_parameter(13).unwrap(), "013");
        assert_eq!(menu().read_parameter(154).unwrap(), "154");
    }

    #[test]
    fn test_format_exact_width() {
        assert_eq!(
            menu().format_parameter(13, &Parameter::from(1u8)).unwrap(),
            "0131"
        );
        assert_eq!(
            menu().format_parameter(64, &Parameter::from("+1500")).unwrap(),
            "064+1500"
        );
    }

    #[test]
    fn test_format_under_width_is_zero_padded() {
        assert_eq!(
            menu().format_parameter(1, &Parameter::from(20u16)).unwrap(),
            "0010020"
        );
        assert_eq!(
            menu().format_parameter(66, &Parameter::from("0")).unwrap(),
            "06600"
        );
    }

    #[test]
    fn test_format_signed_value_pads_after_sign() {
        assert_eq!(
            menu().format_parameter(35, &Parameter::from("-5")).unwrap(),
            "035-05"
        );
        assert_eq!(
            menu().format_parameter(27, &Parameter::from("+900")).unwrap(),
            "027+0900"
        );
        assert_eq!(
            menu().format_parameter(39, &Parameter::from("-25")).unwrap(),
            "039-25"
        );
        assert!(matches!(
            menu().format_parameter(39, &Parameter::from("-250")),
            Err(EncodeError::MenuParameterTooWide { index: 39, .. })
        ));
    }

    #[test]
    fn test_format_over_width_is_rejected() {
        assert_eq!(
            menu().format_parameter(13, &Parameter::from(10u8)),
            Err(EncodeError::MenuParameterTooWide {
                index: 13,
                width: 1,
                param: "10".into()
            })
        );
    }

    #[test]
    fn test_format_zero_width_takes_no_payload() {
        assert_eq!(
            menu().format_parameter(87, &Parameter::from("")).unwrap(),
            "087"
        );
        assert!(menu().format_parameter(87, &Parameter::from("1")).is_err());
    }

    #[test]
    fn test_unknown_index() {
        assert_eq!(
            menu().format_parameter(155, &Parameter::from(1u8)),
            Err(EncodeError::MenuFunctionNotFound(155))
        );
        assert_eq!(
            menu().lookup(0).unwrap_err(),
            LookupError::MenuFunctionNotFound(0)
        );
    }

    #[test]
    fn test_format_rejects_terminator() {
        assert!(matches!(
            menu().format_parameter(13, &Parameter::from(";")),
            Err(EncodeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_from_table() {
        let table = "P1;FUNCTION;PARAMETER;DIGITS\n\
                     13;KEYER DOT/DASH;0:NOR 1:REV;1\n\
                     87;RADIO ID;read only;-\n";
        let menu = MenuRegistry::from_table(table).unwrap();
        assert_eq!(menu.len(), 2);
        assert_eq!(menu.lookup(87).unwrap().width(), 0);
        assert_eq!(menu.lookup(13).unwrap().function(), "KEYER DOT/DASH");
    }

    #[test]
    fn test_from_table_rejects_negative_width() {
        let table = "13;KEYER DOT/DASH;0:NOR 1:REV;-1\n";
        assert!(matches!(
            MenuRegistry::from_table(table),
            Err(ConfigError::MalformedRow { line: 1, .. })
        ));
    }

    #[test]
    fn test_from_table_rejects_duplicates() {
        let table = "13;A;x;1\n13;B;y;1\n";
        assert_eq!(
            MenuRegistry::from_table(table).unwrap_err(),
            ConfigError::DuplicateMenuFunction(13)
        );
    }
}
