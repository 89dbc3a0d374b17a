//! Environment-driven configuration.

use chrono::Duration;

use pteronest_core::Money;
use pteronest_economy::{DEFAULT_DAILY_AMOUNT, DailyRewardPolicy};
use pteronest_infra::DEFAULT_HISTORY_LIMIT;
use pteronest_observability::LogFormat;

pub const ENV_DAILY_AMOUNT: &str = "PTERONEST_DAILY_AMOUNT";
pub const ENV_DAILY_COOLDOWN_SECS: &str = "PTERONEST_DAILY_COOLDOWN_SECS";
pub const ENV_HISTORY_LIMIT: &str = "PTERONEST_HISTORY_LIMIT";
pub const ENV_CURRENCY_SYMBOL: &str = "PTERONEST_CURRENCY_SYMBOL";
pub const ENV_WEBSITE_URL: &str = "PTERONEST_WEBSITE_URL";
pub const ENV_LOG_FORMAT: &str = "PTERONEST_LOG_FORMAT";

const DEFAULT_CURRENCY_SYMBOL: &str = "$";
const DEFAULT_WEBSITE_URL: &str = "https://pteronest.com";

/// Presentation settings used when building replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyConfig {
    pub currency_symbol: String,
    pub website_url: String,
    pub history_limit: usize,
}

impl ReplyConfig {
    pub fn format_money(&self, amount: Money) -> String {
        format!("{}{}", self.currency_symbol, amount)
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            website_url: DEFAULT_WEBSITE_URL.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BotConfig {
    pub daily_policy: DailyRewardPolicy,
    pub replies: ReplyConfig,
    pub log_format: LogFormat,
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source. Invalid values fall back
    /// to their default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let amount = parse_or(&lookup, ENV_DAILY_AMOUNT, DEFAULT_DAILY_AMOUNT, |raw| {
            raw.parse::<Money>().ok().filter(|m| m.is_positive())
        });

        let cooldown = parse_or(&lookup, ENV_DAILY_COOLDOWN_SECS, None, |raw| {
            let secs: i64 = raw.parse().ok().filter(|s| *s >= 0)?;
            let cooldown = Duration::try_seconds(secs)?;
            Some((secs > 0).then_some(cooldown))
        });

        let history_limit = parse_or(&lookup, ENV_HISTORY_LIMIT, DEFAULT_HISTORY_LIMIT, |raw| {
            raw.parse::<usize>().ok().filter(|n| *n > 0)
        });

        let currency_symbol = lookup(ENV_CURRENCY_SYMBOL)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string());

        let website_url = lookup(ENV_WEBSITE_URL)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_WEBSITE_URL.to_string());

        Self {
            daily_policy: DailyRewardPolicy::new(amount, cooldown),
            replies: ReplyConfig {
                currency_symbol,
                website_url,
                history_limit,
            },
            log_format: log_format_from_lookup(&lookup),
        }
    }
}

/// Log format alone, so tracing can be set up before the rest of the config
/// is read (and its warnings are visible).
pub fn log_format_from_env() -> LogFormat {
    log_format_from_lookup(&|key: &str| std::env::var(key).ok())
}

fn log_format_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> LogFormat {
    match lookup(ENV_LOG_FORMAT).as_deref().map(str::trim) {
        Some("pretty") | Some("text") => LogFormat::Pretty,
        _ => LogFormat::Json,
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match parse(raw.trim()) {
        Some(value) => value,
        None => {
            tracing::warn!(key, value = %raw, "invalid configuration value; using default");
            default
        }
    }
}
