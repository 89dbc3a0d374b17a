use std::sync::Arc;

use chrono::{DateTime, Utc};

use pteronest_core::{Money, UserId};
use pteronest_economy::{EconomyError, Transaction, TransactionKind};
use pteronest_infra::{
    Clock, InMemoryTransactionLog, Ledger, LedgerError, MonotonicClock, SystemClock,
    TransactionLog,
};

use crate::config::ReplyConfig;
use crate::interaction::{Command, Interaction, ParseError};
use crate::reply::{Reply, Tone};

pub const TRANSACTIONS_BUTTON_ID: &str = "transactions";

const HELP_TEXT: &str = "`/balance` shows your balance\n\
`/daily` claims your daily reward\n\
`/transactions` lists your recent transactions\n\
`/grant <user> <amount>` credits a user\n\
`/charge <user> <amount>` debits a user";

/// Maps interactions onto a shared [`Ledger`].
///
/// `handle` always produces a reply; ledger failures become error replies.
pub struct CommandHandler<L = InMemoryTransactionLog, C = MonotonicClock<SystemClock>> {
    ledger: Arc<Ledger<L, C>>,
    config: ReplyConfig,
}

impl<L, C> Clone for CommandHandler<L, C> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            config: self.config.clone(),
        }
    }
}

impl<L, C> CommandHandler<L, C>
where
    L: TransactionLog,
    C: Clock,
{
    pub fn new(ledger: Arc<Ledger<L, C>>, config: ReplyConfig) -> Self {
        Self { ledger, config }
    }

    pub fn ledger(&self) -> &Ledger<L, C> {
        &self.ledger
    }

    pub fn handle(&self, interaction: &Interaction) -> Reply {
        let command = match interaction.command() {
            Ok(command) => command,
            Err(e) => return self.parse_failure(interaction, e),
        };

        tracing::debug!(user_id = %interaction.user_id, ?command, "handling interaction");

        let result = match command {
            Command::Balance => Ok(self.balance(interaction)),
            Command::Daily => self.daily(interaction),
            Command::Transactions => self.transactions(interaction),
            Command::Grant { target, amount } => self.grant(&target, amount),
            Command::Charge { target, amount } => self.charge(&target, amount),
            Command::Help => Ok(Reply::new(Tone::Info, "📖 Economy Commands", HELP_TEXT).ephemeral()),
        };

        result.unwrap_or_else(|e| self.failure(interaction, e))
    }

    fn balance(&self, interaction: &Interaction) -> Reply {
        let balance = self.ledger.balance(&interaction.user_id);

        Reply::new(
            Tone::Success,
            "💰 Your Balance",
            format!("**{}**'s current balance", interaction.user_name),
        )
        .field("💳 Current Balance", self.config.format_money(balance), true)
        .field("🆔 User ID", interaction.user_id.as_str(), true)
        .link("Buy Credits", format!("{}/credits", self.config.website_url))
        .action("Transaction History", TRANSACTIONS_BUTTON_ID)
    }

    fn daily(&self, interaction: &Interaction) -> Result<Reply, LedgerError> {
        let user_id = &interaction.user_id;
        let new_balance = self.ledger.claim_daily(user_id)?;
        let amount = self.ledger.policy().amount;

        let next_daily = match self.ledger.next_daily_claim(user_id) {
            Some(at) => format!("Available {}", relative_time(at)),
            None => "Available now".to_string(),
        };

        Ok(Reply::new(
            Tone::Success,
            "🎁 Daily Reward Claimed!",
            format!(
                "You received **{}** as your daily reward!",
                self.config.format_money(amount)
            ),
        )
        .field("💰 New Balance", self.config.format_money(new_balance), true)
        .field("⏰ Next Daily", next_daily, true))
    }

    fn transactions(&self, interaction: &Interaction) -> Result<Reply, LedgerError> {
        let limit = self.config.history_limit;
        let history = self.ledger.recent_transactions(&interaction.user_id, limit)?;

        if history.is_empty() {
            return Ok(Reply::new(
                Tone::Warning,
                "📊 Transaction History",
                "No transactions found for your account.",
            )
            .ephemeral());
        }

        let reply = Reply::new(
            Tone::Info,
            "📊 Recent Transactions",
            format!(
                "Last {limit} transactions for **{}**",
                interaction.user_name
            ),
        )
        .ephemeral();

        Ok(history
            .iter()
            .fold(reply, |reply, tx| {
                let (name, value) = self.history_entry(tx);
                reply.field(name, value, false)
            }))
    }

    fn grant(&self, target: &UserId, amount: Money) -> Result<Reply, LedgerError> {
        let balance = self.ledger.credit(target, amount)?;
        Ok(Reply::new(
            Tone::Success,
            "✅ Credits Granted",
            format!("Added **{}** to <@{target}>", self.config.format_money(amount)),
        )
        .field("💰 New Balance", self.config.format_money(balance), true))
    }

    fn charge(&self, target: &UserId, amount: Money) -> Result<Reply, LedgerError> {
        let balance = self.ledger.debit(target, amount)?;
        Ok(Reply::new(
            Tone::Success,
            "✅ Credits Charged",
            format!("Removed **{}** from <@{target}>", self.config.format_money(amount)),
        )
        .field("💰 New Balance", self.config.format_money(balance), true))
    }

    fn history_entry(&self, tx: &Transaction) -> (String, String) {
        let sign = match tx.kind {
            TransactionKind::Credit => "➕",
            TransactionKind::Debit => "➖",
        };
        (
            format!("{sign} {}", self.config.format_money(tx.amount)),
            format!(
                "{} | Balance: {}",
                relative_time(tx.timestamp),
                self.config.format_money(tx.resulting_balance)
            ),
        )
    }

    fn parse_failure(&self, interaction: &Interaction, error: ParseError) -> Reply {
        tracing::debug!(user_id = %interaction.user_id, %error, "rejected interaction");
        match error {
            ParseError::UnknownCommand(name) => Reply::new(
                Tone::Warning,
                "❓ Unknown Command",
                format!("`{name}` is not an economy command. Try `/help`."),
            )
            .ephemeral(),
            other => Reply::error(other.to_string()),
        }
    }

    fn failure(&self, interaction: &Interaction, error: LedgerError) -> Reply {
        let Some(economy) = error.as_economy() else {
            tracing::error!(user_id = %interaction.user_id, %error, "ledger failure");
            return Reply::error("Something went wrong. Please try again later.");
        };

        tracing::warn!(user_id = %interaction.user_id, error = %economy, "operation rejected");
        match economy {
            EconomyError::InsufficientFunds {
                requested,
                available,
                ..
            } => Reply::error("Insufficient funds.")
                .field("Requested", self.config.format_money(*requested), true)
                .field("Available", self.config.format_money(*available), true),
            EconomyError::CooldownActive { next_claim_at, .. } => Reply::error(format!(
                "You already claimed your daily reward. Next claim {}.",
                relative_time(*next_claim_at)
            )),
            EconomyError::InvalidAmount { .. } => {
                Reply::error("Amount must be greater than zero.")
            }
            EconomyError::BalanceOverflow { .. } | EconomyError::AccountMismatch { .. } => {
                Reply::error("Failed to complete the operation. Please try again later.")
            }
        }
    }
}

/// Relative timestamp marker rendered by the chat client.
fn relative_time(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}
