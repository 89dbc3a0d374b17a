use std::sync::Arc;

use pteronest_bot::{CommandHandler, Interaction, ReplyButton, ReplyConfig, Tone};
use pteronest_core::{Money, UserId};
use pteronest_infra::{Ledger, TransactionLog};

fn handler() -> CommandHandler {
    CommandHandler::new(Arc::new(Ledger::new()), ReplyConfig::default())
}

fn line(handler: &CommandHandler, input: &str) -> pteronest_bot::Reply {
    let interaction = Interaction::parse_line(input).expect("valid input line");
    handler.handle(&interaction)
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

#[test]
fn unseen_user_has_zero_balance_and_no_history() {
    let h = handler();

    let balance = line(&h, "100 /balance");
    assert_eq!(balance.tone, Tone::Success);
    assert_eq!(balance.field_value("💳 Current Balance"), Some("$0.00"));
    assert!(matches!(
        &balance.components[0],
        ReplyButton::Link { url, .. } if url == "https://pteronest.com/credits"
    ));

    let history = line(&h, "100 /transactions");
    assert_eq!(history.tone, Tone::Warning);
    assert_eq!(history.description, "No transactions found for your account.");
    assert!(history.ephemeral);

    // Looking does not create an account.
    assert_eq!(h.ledger().log().total_len().unwrap(), 0);
}

#[test]
fn grant_and_charge_show_up_in_history_newest_first() {
    let h = handler();

    assert_eq!(
        line(&h, "1 /grant <@200> 20").field_value("💰 New Balance"),
        Some("$20.00")
    );
    assert_eq!(
        line(&h, "1 /charge 200 5").field_value("💰 New Balance"),
        Some("$15.00")
    );

    let history = line(&h, "200 button:transactions");
    assert_eq!(history.tone, Tone::Info);
    assert_eq!(
        history.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["➖ $5.00", "➕ $20.00"]
    );
    assert!(history.fields[1].value.starts_with("<t:"));
    assert!(history.fields[1].value.ends_with("| Balance: $20.00"));
}

#[test]
fn overdraft_is_rejected_without_side_effects() {
    let h = handler();
    line(&h, "1 /grant 300 10");

    let reply = line(&h, "1 /charge 300 10.01");
    assert_eq!(reply.tone, Tone::Error);
    assert!(reply.ephemeral);
    assert_eq!(reply.field_value("Available"), Some("$10.00"));

    assert_eq!(h.ledger().balance(&user("300")), Money::from_units(10));
    assert_eq!(h.ledger().recent_transactions(&user("300"), 10).unwrap().len(), 1);
}

#[test]
fn non_positive_amounts_are_rejected() {
    let h = handler();
    let reply = line(&h, "1 /grant 400 0");
    assert_eq!(reply.tone, Tone::Error);
    assert_eq!(h.ledger().balance(&user("400")), Money::ZERO);
}

#[test]
fn daily_can_be_claimed_repeatedly_without_a_cooldown() {
    let h = handler();

    let first = line(&h, "500 /daily");
    let second = line(&h, "500 daily");

    assert_eq!(first.field_value("💰 New Balance"), Some("$10.00"));
    assert_eq!(second.field_value("💰 New Balance"), Some("$20.00"));
    assert_eq!(second.field_value("⏰ Next Daily"), Some("Available now"));
    assert_eq!(h.ledger().verify(&user("500")).unwrap(), Money::from_units(20));
}

#[test]
fn currency_symbol_and_history_limit_are_configurable() {
    let config = ReplyConfig {
        currency_symbol: "€".to_string(),
        history_limit: 2,
        ..ReplyConfig::default()
    };
    let h = CommandHandler::new(Arc::new(Ledger::new()), config);
    for _ in 0..5 {
        line(&h, "600 /daily");
    }

    let history = line(&h, "600 /transactions");
    assert_eq!(history.fields.len(), 2);
    assert!(history.fields[0].value.ends_with("| Balance: €50.00"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_interactions_serialize_per_user() {
    let h = handler();
    let mut tasks = tokio::task::JoinSet::new();

    for _ in 0..200 {
        let h = h.clone();
        tasks.spawn(async move { line(&h, "700 /daily").tone });
    }
    while let Some(tone) = tasks.join_next().await {
        assert_eq!(tone.unwrap(), Tone::Success);
    }

    let u = user("700");
    assert_eq!(h.ledger().balance(&u), Money::from_units(2_000));
    assert_eq!(h.ledger().log().total_len().unwrap(), 200);
    assert_eq!(h.ledger().verify(&u).unwrap(), Money::from_units(2_000));
}
