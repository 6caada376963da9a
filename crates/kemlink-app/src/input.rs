//! Line-oriented user commands.
//!
//! Every control the console offers is one line of text: a command word,
//! usually a role, then the argument. Parsing is pure so the same grammar
//! serves the console driver, the simulation harness and the fuzzer.
//!
//! Free-text arguments (public key, ciphertext, message, blob) are passed
//! through even when blank; the session owns the validation of those and
//! reports it with its own error taxonomy.

use kemlink_core::{DurationUnit, Role};
use thiserror::Error;

/// Usage lines shown by `help`, as `(syntax, description)`.
pub const USAGE: &[(&str, &str)] = &[
    ("gen", "User A generates a fresh keypair"),
    ("encap <public-key>", "User B encapsulates to A's public key"),
    ("decap <ciphertext>", "User A decapsulates B's ciphertext"),
    ("encrypt <a|b> <message>", "encrypt a message with a role's key"),
    ("decrypt <a|b> <blob>", "decrypt a blob with a role's key"),
    ("expire <a|b> <value> <unit>", "set a role's key lifetime (seconds, minutes, hours)"),
    ("stop <a|b>", "stop a role's countdown, keeping its keys"),
    ("clear <a|b>", "wipe a role's keys and stop its countdown"),
    ("status", "show both roles"),
    ("help", "show this help"),
    ("quit", "exit"),
];

/// A parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate A's keypair.
    Gen,
    /// B encapsulates to a public key.
    Encap {
        /// Public key text, untrimmed.
        public_key: String,
    },
    /// A decapsulates a ciphertext.
    Decap {
        /// Ciphertext text, untrimmed.
        ciphertext: String,
    },
    /// Encrypt a message.
    Encrypt {
        /// Role whose key is used.
        role: Role,
        /// Message text exactly as typed.
        plaintext: String,
    },
    /// Decrypt a blob.
    Decrypt {
        /// Role whose key is used.
        role: Role,
        /// Blob text, untrimmed.
        ciphertext: String,
    },
    /// Configure a role's lifetime.
    Expire {
        /// Role to configure.
        role: Role,
        /// Requested value; clamping happens in the session.
        value: i64,
        /// Unit of `value`.
        unit: DurationUnit,
    },
    /// Stop a role's countdown.
    Stop {
        /// Role to stop.
        role: Role,
    },
    /// Wipe a role's material.
    Clear {
        /// Role to clear.
        role: Role,
    },
    /// Show both roles.
    Status,
    /// Show usage.
    Help,
    /// Exit.
    Quit,
}

/// Reasons a line is not a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Nothing but whitespace.
    #[error("empty input")]
    Empty,

    /// First word is not a known command.
    #[error("unknown command '{name}', type 'help' for a list")]
    UnknownCommand {
        /// Word as typed.
        name: String,
    },

    /// Command needs a role and none was given.
    #[error("'{command}' needs a role (a or b)")]
    MissingRole {
        /// Command word.
        command: &'static str,
    },

    /// Role word is neither `a` nor `b`.
    #[error("unknown role '{input}', expected a or b")]
    UnknownRole {
        /// Word as typed.
        input: String,
    },

    /// A required argument is absent.
    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        /// Command word.
        command: &'static str,
        /// Argument name.
        argument: &'static str,
    },

    /// Lifetime value is not an integer.
    #[error("'{input}' is not a whole number")]
    InvalidNumber {
        /// Word as typed.
        input: String,
    },

    /// Lifetime unit is not recognized.
    #[error("unknown unit '{input}', expected seconds, minutes or hours")]
    UnknownUnit {
        /// Word as typed.
        input: String,
    },
}

impl Command {
    /// Parse one input line.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] if the line is blank, the command is unknown,
    /// or a role, number or unit argument is missing or malformed.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(InputError::Empty);
        }

        let (name, rest) = split_word(line);
        match name.to_ascii_lowercase().as_str() {
            "gen" | "keygen" => Ok(Self::Gen),
            "encap" => Ok(Self::Encap { public_key: rest.to_string() }),
            "decap" => Ok(Self::Decap { ciphertext: rest.to_string() }),
            "encrypt" => {
                let (role, plaintext) = parse_role("encrypt", rest)?;
                Ok(Self::Encrypt { role, plaintext: plaintext.to_string() })
            },
            "decrypt" => {
                let (role, ciphertext) = parse_role("decrypt", rest)?;
                Ok(Self::Decrypt { role, ciphertext: ciphertext.to_string() })
            },
            "expire" => parse_expire(rest),
            "stop" => parse_role("stop", rest).map(|(role, _)| Self::Stop { role }),
            "clear" => parse_role("clear", rest).map(|(role, _)| Self::Clear { role }),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Err(InputError::UnknownCommand { name: name.to_string() }),
        }
    }
}

/// Split off the first whitespace-delimited word.
///
/// The remainder keeps everything after the single separating character.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    input.split_once(char::is_whitespace).unwrap_or((input, ""))
}

fn parse_role<'a>(command: &'static str, rest: &'a str) -> Result<(Role, &'a str), InputError> {
    let (word, rest) = split_word(rest);
    if word.is_empty() {
        return Err(InputError::MissingRole { command });
    }
    let role = Role::parse(word).ok_or_else(|| InputError::UnknownRole { input: word.into() })?;
    Ok((role, rest))
}

fn parse_expire(rest: &str) -> Result<Command, InputError> {
    let (role, rest) = parse_role("expire", rest)?;

    let (value, rest) = split_word(rest);
    if value.is_empty() {
        return Err(InputError::MissingArgument { command: "expire", argument: "value" });
    }
    let value =
        value.parse::<i64>().map_err(|_| InputError::InvalidNumber { input: value.into() })?;

    let (unit, _) = split_word(rest);
    if unit.is_empty() {
        return Err(InputError::MissingArgument { command: "expire", argument: "unit" });
    }
    let unit =
        DurationUnit::parse(unit).ok_or_else(|| InputError::UnknownUnit { input: unit.into() })?;

    Ok(Command::Expire { role, value, unit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(Command::parse("gen"), Ok(Command::Gen));
        assert_eq!(Command::parse("  KEYGEN \n"), Ok(Command::Gen));
        assert_eq!(Command::parse("status"), Ok(Command::Status));
        assert_eq!(Command::parse("?"), Ok(Command::Help));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(Command::parse(""), Err(InputError::Empty));
        assert_eq!(Command::parse(" \t "), Err(InputError::Empty));
    }

    #[test]
    fn handshake_arguments_pass_through_blank() {
        assert_eq!(Command::parse("encap"), Ok(Command::Encap { public_key: String::new() }));
        assert_eq!(
            Command::parse("decap QUJD"),
            Ok(Command::Decap { ciphertext: "QUJD".into() })
        );
    }

    #[test]
    fn message_text_is_kept_verbatim() {
        assert_eq!(
            Command::parse("encrypt A hello  there"),
            Ok(Command::Encrypt { role: Role::A, plaintext: "hello  there".into() })
        );
        assert_eq!(
            Command::parse("encrypt b"),
            Ok(Command::Encrypt { role: Role::B, plaintext: String::new() })
        );
    }

    #[test]
    fn role_errors() {
        assert_eq!(Command::parse("stop"), Err(InputError::MissingRole { command: "stop" }));
        assert_eq!(
            Command::parse("clear c"),
            Err(InputError::UnknownRole { input: "c".into() })
        );
        assert_eq!(Command::parse("clear b"), Ok(Command::Clear { role: Role::B }));
    }

    #[test]
    fn expire_parses_value_and_unit() {
        assert_eq!(
            Command::parse("expire a 10 sec"),
            Ok(Command::Expire { role: Role::A, value: 10, unit: DurationUnit::Seconds })
        );
        assert_eq!(
            Command::parse("expire B -3 Hours"),
            Ok(Command::Expire { role: Role::B, value: -3, unit: DurationUnit::Hours })
        );
    }

    #[test]
    fn expire_errors() {
        assert_eq!(
            Command::parse("expire a"),
            Err(InputError::MissingArgument { command: "expire", argument: "value" })
        );
        assert_eq!(
            Command::parse("expire a ten minutes"),
            Err(InputError::InvalidNumber { input: "ten".into() })
        );
        assert_eq!(
            Command::parse("expire a 10"),
            Err(InputError::MissingArgument { command: "expire", argument: "unit" })
        );
        assert_eq!(
            Command::parse("expire a 10 days"),
            Err(InputError::UnknownUnit { input: "days".into() })
        );
    }

    #[test]
    fn unknown_command_keeps_spelling() {
        assert_eq!(
            Command::parse("Launch now"),
            Err(InputError::UnknownCommand { name: "Launch".into() })
        );
    }
}
