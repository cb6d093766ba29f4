//! Console command line parsing

use crate::core::error::ConsoleError;

/// Command words offered by tab completion, in help order
pub const COMMAND_WORDS: &[&str] = &[
    "help", "show", "use", "options", "set", "unset", "run", "back", "workspace", "exit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowTarget {
    Modules,
    Options,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Help,
    Show(ShowTarget),
    Use(String),
    Set { name: String, value: String },
    Unset(String),
    Run,
    Back,
    Workspace,
    Exit,
}

impl Command {
    /// Parse one input line.
    ///
    /// The command word is case-insensitive. A `set` value is the rest of the
    /// line split on whitespace and re-joined with single spaces.
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(word) = parts.first() else {
            return Ok(Command::Empty);
        };

        match word.to_lowercase().as_str() {
            "help" | "?" => Ok(Command::Help),
            "show" => match parts.get(1).map(|s| s.to_lowercase()) {
                None => Ok(Command::Show(ShowTarget::Modules)),
                Some(t) if t == "modules" => Ok(Command::Show(ShowTarget::Modules)),
                Some(t) if t == "options" => Ok(Command::Show(ShowTarget::Options)),
                Some(_) => Err(ConsoleError::UnknownShowTarget(parts[1].to_string())),
            },
            "options" => Ok(Command::Show(ShowTarget::Options)),
            "use" => parts
                .get(1)
                .map(|m| Command::Use(m.to_string()))
                .ok_or(ConsoleError::Usage("use <module_name|number>")),
            "set" => {
                if parts.len() < 3 {
                    return Err(ConsoleError::Usage("set <option> <value>"));
                }
                Ok(Command::Set {
                    name: parts[1].to_uppercase(),
                    value: parts[2..].join(" "),
                })
            }
            "unset" => parts
                .get(1)
                .map(|o| Command::Unset(o.to_uppercase()))
                .ok_or(ConsoleError::Usage("unset <option>")),
            "run" => Ok(Command::Run),
            "back" => Ok(Command::Back),
            "workspace" => Ok(Command::Workspace),
            "exit" | "quit" => Ok(Command::Exit),
            _ => Err(ConsoleError::UnknownCommand(word.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   ").unwrap(), Command::Empty);
    }

    #[test]
    fn test_set_joins_value_with_single_spaces() {
        assert_eq!(
            Command::parse("set user_agent  Mozilla/5.0   (X11)").unwrap(),
            Command::Set {
                name: "USER_AGENT".to_string(),
                value: "Mozilla/5.0 (X11)".to_string(),
            }
        );
    }

    #[test]
    fn test_set_needs_a_value() {
        assert!(matches!(
            Command::parse("set TARGET"),
            Err(ConsoleError::Usage(_))
        ));
    }

    #[test]
    fn test_show_variants() {
        assert_eq!(Command::parse("show").unwrap(), Command::Show(ShowTarget::Modules));
        assert_eq!(Command::parse("SHOW Options").unwrap(), Command::Show(ShowTarget::Options));
        assert_eq!(Command::parse("options").unwrap(), Command::Show(ShowTarget::Options));
        assert!(matches!(
            Command::parse("show payloads"),
            Err(ConsoleError::UnknownShowTarget(t)) if t == "payloads"
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            Command::parse("exploit now"),
            Err(ConsoleError::UnknownCommand(c)) if c == "exploit"
        ));
    }

    #[test]
    fn test_use_and_unset_need_arguments() {
        assert!(matches!(Command::parse("use"), Err(ConsoleError::Usage(_))));
        assert!(matches!(Command::parse("unset"), Err(ConsoleError::Usage(_))));
        assert_eq!(Command::parse("use 2").unwrap(), Command::Use("2".to_string()));
    }
}
