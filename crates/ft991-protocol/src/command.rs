//! Command registry
//!
//! Every CAT message starts with a two-character command code. The registry
//! maps each code the radio understands to its capabilities: whether it can
//! be set, whether it can be read, and whether the radio answers it.
//!
//! The registry is built once from a table (the built-in FT-991A table or a
//! CSV text in the same shape) and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ConfigError, LookupError};

/// Validated two-character command code, always uppercase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandCode([u8; 2]);

impl CommandCode {
    /// Build a code from text, normalizing to uppercase.
    ///
    /// Fails unless the text is exactly two ASCII letters or digits.
    pub fn new(code: &str) -> Result<Self, ConfigError> {
        let bytes = code.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(ConfigError::InvalidCommandCode {
                code: code.to_string(),
            });
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    /// The code as text
    pub fn as_str(&self) -> &str {
        // Only ASCII alphanumerics are ever stored
        std::str::from_utf8(&self.0).unwrap_or("??")
    }

    /// The code as wire bytes
    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability metadata for one command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandSpec {
    #[cfg_attr(feature = "serde", serde(with = "code_serde"))]
    code: CommandCode,
    description: String,
    allow_set: bool,
    allow_read: bool,
    allow_answer: bool,
}

impl CommandSpec {
    /// Build a spec, validating the code
    pub fn new(
        code: &str,
        description: impl Into<String>,
        allow_set: bool,
        allow_read: bool,
        allow_answer: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            code: CommandCode::new(code)?,
            description: description.into(),
            allow_set,
            allow_read,
            allow_answer,
        })
    }

    /// The command code
    pub fn code(&self) -> CommandCode {
        self.code
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The command can change radio state
    pub fn allow_set(&self) -> bool {
        self.allow_set
    }

    /// The command can query radio state
    pub fn allow_read(&self) -> bool {
        self.allow_read
    }

    /// The radio sends an answer for this command
    pub fn allow_answer(&self) -> bool {
        self.allow_answer
    }
}

/// Immutable code -> [`CommandSpec`] mapping
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<CommandCode, CommandSpec>,
}

impl CommandRegistry {
    /// Build a registry, rejecting duplicate codes
    pub fn from_specs(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, ConfigError> {
        let mut commands = HashMap::new();
        for spec in specs {
            let code = spec.code;
            if commands.insert(code, spec).is_some() {
                return Err(ConfigError::DuplicateCommand(code.to_string()));
            }
        }
        Ok(Self { commands })
    }

    /// The built-in FT-991A command table
    pub fn ft991a() -> Result<Self, ConfigError> {
        Self::from_specs(
            FT991A_COMMANDS
                .iter()
                .map(|&(code, description, set, read, answer)| {
                    CommandSpec::new(code, description, set, read, answer)
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    }

    /// Parse a CSV command table.
    ///
    /// Expected header: `command, description, set, read, answer`.
    /// Flags are `0` or `1`. Blank lines are ignored.
    pub fn from_csv(text: &str) -> Result<Self, ConfigError> {
        let mut specs = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if idx == 0 || line.trim().is_empty() {
                continue;
            }
            let cols: Vec<&str> = line.split(',').map(str::trim).collect();
            if cols.len() != 5 {
                return Err(ConfigError::MalformedRow {
                    line: line_no,
                    reason: format!("expected 5 columns, got {}", cols.len()),
                });
            }
            let flag = |col: &str| match col {
                "1" => Ok(true),
                "0" => Ok(false),
                other => Err(ConfigError::MalformedRow {
                    line: line_no,
                    reason: format!("flag must be 0 or 1, got {other:?}"),
                }),
            };
            let spec = CommandSpec::new(cols[0], cols[1], flag(cols[2])?, flag(cols[3])?, flag(cols[4])?)
                .map_err(|e| ConfigError::MalformedRow {
                    line: line_no,
                    reason: e.to_string(),
                })?;
            specs.push(spec);
        }
        let registry = Self::from_specs(specs)?;
        tracing::debug!("Loaded {} commands from table", registry.len());
        Ok(registry)
    }

    /// Look up a command, case-insensitively
    pub fn lookup(&self, code: &str) -> Result<&CommandSpec, LookupError> {
        CommandCode::new(code)
            .ok()
            .and_then(|code| self.commands.get(&code))
            .ok_or_else(|| LookupError::CommandNotFound(code.to_string()))
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the registry has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All commands, sorted by code
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        let mut specs: Vec<_> = self.commands.values().collect();
        specs.sort_by_key(|s| s.code);
        specs.into_iter()
    }
}

#[cfg(feature = "serde")]
mod code_serde {
    use super::CommandCode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(code: &CommandCode, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(code.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<CommandCode, D::Error> {
        let text = String::deserialize(d)?;
        CommandCode::new(&text).map_err(serde::de::Error::custom)
    }
}

/// FT-991A command table: (code, description, set, read, answer)
const FT991A_COMMANDS: &[(&str, &str, bool, bool, bool)] = &[
    ("AB", "VFO-A to VFO-B", true, false, false),
    ("AC", "Antenna Tuner Control", true, true, true),
    ("AG", "AF Gain", true, true, true),
    ("AI", "Auto Information", true, true, true),
    ("AM", "VFO-A to Memory Channel", true, false, false),
    ("BA", "VFO-B to VFO-A", true, false, false),
    ("BC", "Auto Notch", true, true, true),
    ("BD", "Band Down", true, false, false),
    ("BI", "Break-In", true, true, true),
    ("BP", "Manual Notch", true, true, true),
    ("BS", "Band Select", true, false, false),
    ("BU", "Band Up", true, false, false),
    ("BY", "Busy", false, true, true),
    ("CH", "Channel Up/Down", true, false, false),
    ("CN", "CTCSS/DCS Number", true, true, true),
    ("CO", "Contour", true, true, true),
    ("CS", "CW Spot", true, true, true),
    ("CT", "CTCSS", true, true, true),
    ("DA", "Dimmer", true, true, true),
    ("DN", "Mic Down", true, false, false),
    ("DT", "Date And Time", true, true, true),
    ("ED", "Encoder Down", true, false, false),
    ("EK", "Ent Key", true, false, false),
    ("EU", "Encoder Up", true, false, false),
    ("EX", "Menu", true, true, true),
    ("FA", "Frequency VFO-A", true, true, true),
    ("FB", "Frequency VFO-B", true, true, true),
    ("FS", "Fast Step", true, true, true),
    ("FT", "Function TX", true, true, true),
    ("GT", "AGC Function", true, true, true),
    ("ID", "Identification", false, true, true),
    ("IF", "Information", false, true, true),
    ("IS", "IF-Shift", true, true, true),
    ("KM", "Keyer Memory", true, true, true),
    ("KP", "Key Pitch", true, true, true),
    ("KR", "Keyer", true, true, true),
    ("KS", "Key Speed", true, true, true),
    ("KY", "CW Keying", true, false, false),
    ("LK", "Lock", true, true, true),
    ("LM", "Load Message", true, true, true),
    ("MA", "Memory Channel to VFO-A", true, false, false),
    ("MC", "Memory Channel", true, true, true),
    ("MD", "Mode", true, true, true),
    ("MG", "Mic Gain", true, true, true),
    ("ML", "Monitor Level", true, true, true),
    ("MR", "Memory Read", false, true, true),
    ("MS", "Meter Sw", true, true, true),
    ("MT", "Memory Channel Write/Tag", true, true, true),
    ("MW", "Memory Channel Write", true, false, false),
    ("MX", "MOX Set", true, true, true),
    ("NA", "Narrow", true, true, true),
    ("NB", "Noise Blanker", true, true, true),
    ("NL", "Noise Blanker Level", true, true, true),
    ("NR", "Noise Reduction", true, true, true),
    ("OI", "Opposite Band Information", false, true, true),
    ("OS", "Offset (Repeater Shift)", true, true, true),
    ("PA", "Pre-Amp (IPO)", true, true, true),
    ("PB", "Play Back", true, true, true),
    ("PC", "Power Control", true, true, true),
    ("PL", "Speech Processor Level", true, true, true),
    ("PR", "Speech Processor", true, true, true),
    ("PS", "Power Switch", true, true, true),
    ("QI", "QMB Store", true, false, false),
    ("QR", "QMB Recall", true, false, false),
    ("QS", "Quick Split", true, false, false),
    ("RA", "RF Attenuator", true, true, true),
    ("RC", "Clar Clear", true, false, false),
    ("RD", "Clar Down", true, false, false),
    ("RG", "RF Gain", true, true, true),
    ("RI", "Radio Information", false, true, true),
    ("RL", "Noise Reduction Level", true, true, true),
    ("RM", "Read Meter", false, true, true),
    ("RS", "Radio Status", false, true, true),
    ("RT", "Clar", true, true, true),
    ("RU", "Clar Up", true, false, false),
    ("SC", "Scan", true, true, true),
    ("SD", "Semi Break-In Delay Time", true, true, true),
    ("SH", "Width", true, true, true),
    ("SM", "S Meter Reading", false, true, true),
    ("SQ", "Squelch Level", true, true, true),
    ("SV", "Swap VFO", true, false, false),
    ("TS", "TXW", true, true, true),
    ("TX", "TX Set", true, true, true),
    ("UL", "Unlock", false, true, true),
    ("UP", "Mic Up", true, false, false),
    ("VD", "VOX Delay Time", true, true, true),
    ("VG", "VOX Gain", true, true, true),
    ("VM", "[V/M] Key Function", true, false, false),
    ("VX", "VOX", true, true, true),
    ("XT", "TX Clar", true, true, true),
    ("ZI", "Zero In", true, false, false),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_normalized_to_uppercase() {
        let code = CommandCode::new("fa").unwrap();
        assert_eq!(code.as_str(), "FA");
        assert_eq!(code.as_bytes(), b"FA");
    }

    #[test]
    fn test_code_length_must_be_two() {
        assert!(matches!(
            CommandCode::new("FAX"),
            Err(ConfigError::InvalidCommandCode { .. })
        ));
        assert!(CommandCode::new("F").is_err());
        assert!(CommandCode::new("").is_err());
        assert!(CommandCode::new("F;").is_err());
    }

    #[test]
    fn test_builtin_table_loads() {
        let registry = CommandRegistry::ft991a().unwrap();
        assert_eq!(registry.len(), FT991A_COMMANDS.len());
    }

    #[test]
    fn test_lookup_known_command() {
        let registry = CommandRegistry::ft991a().unwrap();
        let ag = registry.lookup("AG").unwrap();
        assert!(ag.allow_set());
        assert!(ag.allow_read());
        assert!(ag.allow_answer());
        assert_eq!(ag.description(), "AF Gain");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::ft991a().unwrap();
        assert_eq!(registry.lookup("fa").unwrap().code().as_str(), "FA");
    }

    #[test]
    fn test_lookup_unknown_command() {
        let registry = CommandRegistry::ft991a().unwrap();
        assert_eq!(
            registry.lookup("ZZ"),
            Err(LookupError::CommandNotFound("ZZ".into()))
        );
        assert!(registry.lookup("FAB").is_err());
    }

    #[test]
    fn test_set_only_command_has_no_answer() {
        let registry = CommandRegistry::ft991a().unwrap();
        let ab = registry.lookup("AB").unwrap();
        assert!(ab.allow_set());
        assert!(!ab.allow_read());
        assert!(!ab.allow_answer());
    }

    #[test]
    fn test_from_csv() {
        let csv = "command, description, set, read, answer\n\
                   ag, Af Gain, 1, 1, 1\n\
                   AB, Vfo-A To Vfo-B, 1, 0, 0\n\n";
        let registry = CommandRegistry::from_csv(csv).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.lookup("AB").unwrap().allow_read());
        assert!(registry.lookup("AG").unwrap().allow_read());
    }

    #[test]
    fn test_from_csv_rejects_bad_code() {
        let csv = "command, description, set, read, answer\nAGC, Agc, 1, 1, 1\n";
        assert!(matches!(
            CommandRegistry::from_csv(csv),
            Err(ConfigError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_from_csv_rejects_bad_flag() {
        let csv = "command, description, set, read, answer\nAG, Af Gain, yes, 1, 1\n";
        assert!(matches!(
            CommandRegistry::from_csv(csv),
            Err(ConfigError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_from_csv_rejects_duplicate() {
        let csv = "command, description, set, read, answer\nAG, A, 1, 1, 1\nag, B, 1, 1, 1\n";
        assert_eq!(
            CommandRegistry::from_csv(csv).unwrap_err(),
            ConfigError::DuplicateCommand("AG".into())
        );
    }

    #[test]
    fn test_iter_is_sorted() {
        let registry = CommandRegistry::ft991a().unwrap();
        let codes: Vec<_> = registry.iter().map(|s| s.code()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }
}
