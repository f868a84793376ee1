//! The command and menu tables a link talks through
//!
//! A [`Catalog`] is built once at startup and handed to every consumer,
//! usually behind an `Arc`. There is no process-wide instance.

use crate::command::{CommandRegistry, CommandSpec};
use crate::error::{ConfigError, EncodeError, LookupError};
use crate::frame::Parameter;
use crate::menu::{MenuFunction, MenuRegistry};

/// Command registry plus menu function registry
#[derive(Debug, Clone)]
pub struct Catalog {
    commands: CommandRegistry,
    menu: MenuRegistry,
}

impl Catalog {
    /// Bundle already-built registries
    pub fn new(commands: CommandRegistry, menu: MenuRegistry) -> Self {
        Self { commands, menu }
    }

    /// Catalog built from the FT-991A tables compiled into this crate
    pub fn ft991a() -> Result<Self, ConfigError> {
        let catalog = Self::new(CommandRegistry::ft991a()?, MenuRegistry::ft991a()?);
        tracing::info!(
            "Loaded FT-991A catalog: {} commands, {} menu functions",
            catalog.commands.len(),
            catalog.menu.len()
        );
        Ok(catalog)
    }

    /// Catalog built from external table text
    pub fn from_tables(command_csv: &str, menu_table: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(
            parse_command_table(command_csv)?,
            parse_menu_table(menu_table)?,
        ))
    }

    /// The command registry
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// The menu function registry
    pub fn menu(&self) -> &MenuRegistry {
        &self.menu
    }

    /// Look up a command code, case-insensitively
    pub fn command(&self, code: &str) -> Result<&CommandSpec, LookupError> {
        self.commands.lookup(code)
    }

    /// Look up a menu function by index
    pub fn menu_function(&self, index: u16) -> Result<&MenuFunction, LookupError> {
        self.menu.lookup(index)
    }

    /// `EX` parameter that writes `value` to menu `index`
    pub fn menu_parameter(&self, index: u16, value: &Parameter) -> Result<String, EncodeError> {
        self.menu.format_parameter(index, value)
    }
}

/// Parse a CSV command table (`command, description, set, read, answer`)
pub fn parse_command_table(text: &str) -> Result<CommandRegistry, ConfigError> {
    CommandRegistry::from_csv(text)
}

/// Parse a `;`-separated menu table (`index;function;parameter;digits`)
pub fn parse_menu_table(text: &str) -> Result<MenuRegistry, ConfigError> {
    MenuRegistry::from_table(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMANDS: &str = "command, description, set, read, answer\n\
                            AG, AF Gain, 1, 1, 1\n\
                            EX, Menu, 1, 1, 1\n\
                            PS, Power Switch, 1, 1, 1\n";

    const MENU: &str = "P1;P2;P3;P4\n\
                        013;BEEP LEVEL;000 - 100;3\n\
                        087;RADIO ID;-;-\n";

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::ft991a().unwrap();
        let ag = catalog.command("ag").unwrap();
        assert!(ag.allow_set() && ag.allow_read());
        assert_eq!(catalog.menu_function(154).unwrap().index(), 154);
        assert!(catalog.menu_function(155).is_err());
    }

    #[test]
    fn test_from_tables() {
        let catalog = Catalog::from_tables(COMMANDS, MENU).unwrap();
        assert_eq!(catalog.commands().len(), 3);
        assert_eq!(catalog.menu().len(), 2);
        assert_eq!(
            catalog.command("FA").unwrap_err(),
            LookupError::CommandNotFound("FA".into())
        );
        assert_eq!(
            catalog.menu_parameter(13, &Parameter::from(7u8)).unwrap(),
            "013007"
        );
        assert_eq!(catalog.menu_parameter(87, &Parameter::from("")).unwrap(), "087");
    }

    #[test]
    fn test_from_tables_propagates_row_errors() {
        let bad = "command, description, set, read, answer\nAGC, AF Gain, 1, 1, 1\n";
        assert!(matches!(
            Catalog::from_tables(bad, MENU),
            Err(ConfigError::MalformedRow { line: 2, .. })
        ));
        let bad_menu = "P1;P2;P3;P4\n013;BEEP LEVEL;000 - 100;-3\n";
        assert!(matches!(
            Catalog::from_tables(COMMANDS, bad_menu),
            Err(ConfigError::MalformedRow { line: 2, .. })
        ));
    }
}
