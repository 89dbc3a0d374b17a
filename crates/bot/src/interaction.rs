//! Inbound interactions (slash commands and button clicks).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pteronest_core::{DomainError, Money, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    Empty,

    #[error("missing command")]
    MissingCommand,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// What the user clicked or typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    SlashCommand { name: String, args: Vec<String> },
    Button { custom_id: String },
}

/// One inbound platform event, already stripped to what the economy needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub user_name: String,
    pub kind: InteractionKind,
}

impl Interaction {
    pub fn slash(user_id: UserId, name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            user_name: user_id.to_string(),
            user_id,
            kind: InteractionKind::SlashCommand {
                name: name.into(),
                args,
            },
        }
    }

    pub fn button(user_id: UserId, custom_id: impl Into<String>) -> Self {
        Self {
            user_name: user_id.to_string(),
            user_id,
            kind: InteractionKind::Button {
                custom_id: custom_id.into(),
            },
        }
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    /// Parse a line of the form `<user_id> <command> [args…]`.
    ///
    /// `/daily` and `daily` are equivalent; `button:<custom_id>` is a click.
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let mut parts = line.split_whitespace();
        let user_id = UserId::new(parts.next().ok_or(ParseError::Empty)?)?;
        let command = parts.next().ok_or(ParseError::MissingCommand)?;

        if let Some(custom_id) = command.strip_prefix("button:") {
            return Ok(Self::button(user_id, custom_id));
        }

        let name = command.trim_start_matches('/').to_ascii_lowercase();
        let args = parts.map(str::to_string).collect();
        Ok(Self::slash(user_id, name, args))
    }

    /// Resolve the interaction to an economy command.
    pub fn command(&self) -> Result<Command, ParseError> {
        match &self.kind {
            InteractionKind::SlashCommand { name, args } => Command::parse(name, args),
            InteractionKind::Button { custom_id } => match custom_id.as_str() {
                "transactions" => Ok(Command::Transactions),
                "balance" => Ok(Command::Balance),
                other => Err(ParseError::UnknownCommand(other.to_string())),
            },
        }
    }
}

/// Economy commands the adapter understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Balance,
    Daily,
    Transactions,
    /// Credit another user's wallet.
    Grant { target: UserId, amount: Money },
    /// Debit another user's wallet.
    Charge { target: UserId, amount: Money },
    Help,
}

impl Command {
    pub fn parse(name: &str, args: &[String]) -> Result<Self, ParseError> {
        match name {
            "balance" => Ok(Command::Balance),
            "daily" => Ok(Command::Daily),
            "transactions" => Ok(Command::Transactions),
            "help" => Ok(Command::Help),
            "grant" => {
                let (target, amount) = target_and_amount(args, "grant <user> <amount>")?;
                Ok(Command::Grant { target, amount })
            }
            "charge" => {
                let (target, amount) = target_and_amount(args, "charge <user> <amount>")?;
                Ok(Command::Charge { target, amount })
            }
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }
}

fn target_and_amount(args: &[String], usage: &'static str) -> Result<(UserId, Money), ParseError> {
    match args {
        [target, amount] => Ok((parse_mention(target)?, amount.parse()?)),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// Accepts a bare id or a mention (`<@123>` / `<@!123>`).
fn parse_mention(raw: &str) -> Result<UserId, DomainError> {
    let id = raw
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|inner| inner.trim_start_matches('!'))
        .unwrap_or(raw);
    UserId::new(id)
}
