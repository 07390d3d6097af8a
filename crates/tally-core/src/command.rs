//! Parsing of prefixed chat messages into [`Command`]s.

use crate::model::DEFAULT_KIND;
use thiserror::Error;

pub const DEFAULT_PREFIX: &str = "!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        activity: String,
        system: String,
        total: u32,
        kind: String,
    },
    Register {
        activity: String,
        system: String,
        actor: Option<String>,
    },
    Undo {
        activity: String,
        system: String,
        amount: i64,
    },
    Remove {
        activity: String,
        system: String,
    },
    Reset,
    Show,
    Help,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Register { .. } => "register",
            Command::Undo { .. } => "undo",
            Command::Remove { .. } => "remove",
            Command::Reset => "reset",
            Command::Show => "show",
            Command::Help => "help",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("missing argument `{arg}`")]
    MissingArgument {
        command: &'static str,
        arg: &'static str,
    },

    #[error("`{value}` is not a valid value for `{arg}`")]
    InvalidNumber {
        command: &'static str,
        arg: &'static str,
        value: String,
    },

    #[error("unterminated quote")]
    UnterminatedQuote { command: &'static str },
}

impl ParseError {
    /// Usage line for the command the error belongs to, if it was recognized.
    pub fn usage(&self) -> Option<&'static str> {
        match self {
            ParseError::UnknownCommand(_) => None,
            ParseError::MissingArgument { command, .. }
            | ParseError::InvalidNumber { command, .. }
            | ParseError::UnterminatedQuote { command } => usage(command),
        }
    }
}

/// One-line usage for a canonical command name, without the prefix.
pub fn usage(command: &str) -> Option<&'static str> {
    Some(match command {
        "add" => "add <activity> <system> <total> [kind]",
        "register" => "register <activity> <system> [who]",
        "undo" => "undo <activity> <system> [amount]",
        "remove" => "remove <activity> <system>",
        "reset" => "reset",
        "show" => "show",
        "help" => "help",
        _ => return None,
    })
}

/// Map a verb or one of its aliases to the canonical command name.
fn canonical(verb: &str) -> Option<&'static str> {
    Some(match verb {
        "add" | "agregar" => "add",
        "register" | "registrar" => "register",
        "undo" | "deshacer" | "restar" | "desregistrar" => "undo",
        "remove" | "quitar" => "remove",
        "reset" => "reset",
        "show" | "mostrar" => "show",
        "help" | "ayuda" => "help",
        _ => return None,
    })
}

/// Parse `text` as a command.
///
/// Returns `Ok(None)` for messages that are not addressed to the bot: no
/// prefix, or nothing after it. Extra trailing arguments are ignored.
pub fn parse(prefix: &str, text: &str) -> Result<Option<Command>, ParseError> {
    let Some(rest) = text.trim_start().strip_prefix(prefix) else {
        return Ok(None);
    };
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        return Ok(None);
    }

    let verb_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let verb = rest[..verb_end].to_lowercase();
    let name = canonical(&verb).ok_or_else(|| ParseError::UnknownCommand(verb.clone()))?;

    let tokens = tokenize(&rest[verb_end..]).ok_or(ParseError::UnterminatedQuote { command: name })?;
    let mut args = Args {
        command: name,
        tokens: tokens.into_iter(),
    };

    let cmd = match name {
        "add" => Command::Add {
            activity: args.required("activity")?,
            system: args.required("system")?,
            total: args.number("total")?,
            kind: args.optional().unwrap_or_else(|| DEFAULT_KIND.to_string()),
        },
        "register" => Command::Register {
            activity: args.required("activity")?,
            system: args.required("system")?,
            actor: args.optional(),
        },
        "undo" => Command::Undo {
            activity: args.required("activity")?,
            system: args.required("system")?,
            amount: args.optional_number("amount")?.unwrap_or(1),
        },
        "remove" => Command::Remove {
            activity: args.required("activity")?,
            system: args.required("system")?,
        },
        "reset" => Command::Reset,
        "show" => Command::Show,
        _ => Command::Help,
    };
    Ok(Some(cmd))
}

struct Args {
    command: &'static str,
    tokens: std::vec::IntoIter<String>,
}

impl Args {
    fn optional(&mut self) -> Option<String> {
        self.tokens.next()
    }

    fn required(&mut self, arg: &'static str) -> Result<String, ParseError> {
        self.tokens.next().ok_or(ParseError::MissingArgument {
            command: self.command,
            arg,
        })
    }

    fn number<T: std::str::FromStr>(&mut self, arg: &'static str) -> Result<T, ParseError> {
        let raw = self.required(arg)?;
        self.coerce(arg, raw)
    }

    fn optional_number<T: std::str::FromStr>(
        &mut self,
        arg: &'static str,
    ) -> Result<Option<T>, ParseError> {
        match self.tokens.next() {
            Some(raw) => self.coerce(arg, raw).map(Some),
            None => Ok(None),
        }
    }

    fn coerce<T: std::str::FromStr>(&self, arg: &'static str, raw: String) -> Result<T, ParseError> {
        raw.parse().map_err(|_| ParseError::InvalidNumber {
            command: self.command,
            arg,
            value: raw,
        })
    }
}

/// Split on whitespace, keeping double-quoted runs together.
/// Returns `None` when a quote is left open.
fn tokenize(input: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quoted {
        return None;
    }
    if in_token {
        tokens.push(current);
    }
    Some(tokens)
}
