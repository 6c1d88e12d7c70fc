//! Chat command codec.
//!
//! Input format (one chat message -> `Command`):
//!
//! - List:   `/list`
//! - Add:    `/add TICKER VALUE`
//! - Set:    `/set TICKER VALUE`
//! - Remove: `/remove TICKER`
//! - Reset:  `/reset`
//! - Help:   `/help`, `/start`
//!
//! The leading `/` is optional, command words are case-insensitive and a
//! `@botname` suffix (as Telegram sends in group chats) is ignored. The
//! Portuguese names `/listar`, `/adicionar`, `/configurar`, `/remover` and
//! `/continuar` are accepted as aliases. `VALUE` takes either `.` or `,` as
//! decimal separator and must be positive.
//!
//! Anything that is not a known command word maps to `Command::Help`.

use std::fmt;
use std::str::FromStr;

use alert_core::{Command, Ticker, TickerError};
use rust_decimal::Decimal;

/// Which command a message was addressed to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandKind {
    List,
    Add,
    Set,
    Remove,
    Reset,
    Help,
}

impl CommandKind {
    /// Map a command word (without `/` or `@bot`) to its kind.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "list" | "listar" => Some(CommandKind::List),
            "add" | "adicionar" => Some(CommandKind::Add),
            "set" | "configurar" => Some(CommandKind::Set),
            "remove" | "remover" => Some(CommandKind::Remove),
            "reset" | "continuar" => Some(CommandKind::Reset),
            "help" | "start" => Some(CommandKind::Help),
            _ => None,
        }
    }

    /// Canonical command word.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::List => "list",
            CommandKind::Add => "add",
            CommandKind::Set => "set",
            CommandKind::Remove => "remove",
            CommandKind::Reset => "reset",
            CommandKind::Help => "help",
        }
    }
}

/// A recognised command with malformed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Wrong number of arguments.
    ArgumentCount { command: CommandKind, got: usize },
    /// Ticker argument could not be normalised.
    InvalidTicker { command: CommandKind, reason: TickerError },
    /// Limit is not a positive decimal number.
    InvalidLimit { command: CommandKind, raw: String },
}

impl ParseError {
    /// The command whose usage should be shown to the sender.
    pub fn command(&self) -> CommandKind {
        match self {
            ParseError::ArgumentCount { command, .. }
            | ParseError::InvalidTicker { command, .. }
            | ParseError::InvalidLimit { command, .. } => *command,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::ArgumentCount { command, got } => {
                write!(f, "Wrong number of arguments for /{}: got {}", command.as_str(), got)
            }
            ParseError::InvalidTicker { reason, .. } => write!(f, "Invalid ticker: {}", reason),
            ParseError::InvalidLimit { raw, .. } => {
                write!(f, "Invalid limit {:?}: expected a positive number", raw)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one chat message into a `Command`.
///
/// Returns `None` for blank messages (nothing to answer).
pub fn parse_command(text: &str) -> Option<Result<Command, ParseError>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (&head, args) = tokens.split_first()?;

    let word = head.strip_prefix('/').unwrap_or(head);
    let word = word.split_once('@').map_or(word, |(w, _bot)| w);

    let Some(kind) = CommandKind::from_word(word) else {
        return Some(Ok(Command::Help));
    };

    Some(parse_args(kind, args))
}

fn parse_args(kind: CommandKind, args: &[&str]) -> Result<Command, ParseError> {
    match kind {
        CommandKind::List => {
            expect_args(kind, args, 0)?;
            Ok(Command::List)
        }
        CommandKind::Add | CommandKind::Set => {
            expect_args(kind, args, 2)?;
            let ticker = parse_ticker(kind, args[0])?;
            let limit = parse_limit(kind, args[1])?;
            Ok(Command::SetThreshold { ticker, limit })
        }
        CommandKind::Remove => {
            expect_args(kind, args, 1)?;
            let ticker = parse_ticker(kind, args[0])?;
            Ok(Command::Remove { ticker })
        }
        CommandKind::Reset => {
            expect_args(kind, args, 0)?;
            Ok(Command::ResetAlerts)
        }
        // Help ignores trailing words.
        CommandKind::Help => Ok(Command::Help),
    }
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn expect_args(command: CommandKind, args: &[&str], want: usize) -> Result<(), ParseError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(ParseError::ArgumentCount {
            command,
            got: args.len(),
        })
    }
}

fn parse_ticker(command: CommandKind, raw: &str) -> Result<Ticker, ParseError> {
    Ticker::parse(raw).map_err(|reason| ParseError::InvalidTicker { command, reason })
}

fn parse_limit(command: CommandKind, raw: &str) -> Result<Decimal, ParseError> {
    let invalid = || ParseError::InvalidLimit {
        command,
        raw: raw.to_string(),
    };

    let normalised = raw.replace(',', ".");
    let limit = Decimal::from_str(&normalised).map_err(|_| invalid())?;
    if limit <= Decimal::ZERO {
        return Err(invalid());
    }
    Ok(limit)
}
