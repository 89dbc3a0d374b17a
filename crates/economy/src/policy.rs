use chrono::{DateTime, Duration, Utc};

use pteronest_core::Money;

/// Amount paid out by `/daily` unless configured otherwise.
pub const DEFAULT_DAILY_AMOUNT: Money = Money::from_units(10);

/// Daily reward rules.
///
/// With `cooldown: None` every claim succeeds. Setting a cooldown makes early
/// claims fail with `CooldownActive`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DailyRewardPolicy {
    pub amount: Money,
    pub cooldown: Option<Duration>,
}

impl DailyRewardPolicy {
    pub fn new(amount: Money, cooldown: Option<Duration>) -> Self {
        Self { amount, cooldown }
    }

    /// The advertised rule: one claim per 24 hours.
    pub fn once_per_day(amount: Money) -> Self {
        Self::new(amount, Some(Duration::hours(24)))
    }

    /// Earliest instant a claim is accepted again, given the previous claim.
    ///
    /// `None` means "claimable any time".
    pub fn next_claim_at(&self, last_claim: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match (self.cooldown, last_claim) {
            (Some(cooldown), Some(last)) if cooldown > Duration::zero() => last.checked_add_signed(cooldown),
            _ => None,
        }
    }
}

impl Default for DailyRewardPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_AMOUNT, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_policy_has_no_cooldown() {
        let policy = DailyRewardPolicy::default();
        assert_eq!(policy.amount.to_string(), "10.00");
        assert_eq!(policy.next_claim_at(Some(Utc::now())), None);
    }

    #[test]
    fn cooldown_starts_at_last_claim() {
        let policy = DailyRewardPolicy::once_per_day(DEFAULT_DAILY_AMOUNT);
        let last = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();

        assert_eq!(policy.next_claim_at(None), None);
        assert_eq!(
            policy.next_claim_at(Some(last)),
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn zero_cooldown_behaves_like_none() {
        let policy = DailyRewardPolicy::new(DEFAULT_DAILY_AMOUNT, Some(Duration::zero()));
        assert_eq!(policy.next_claim_at(Some(Utc::now())), None);
    }
}
