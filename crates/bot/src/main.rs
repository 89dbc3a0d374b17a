use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;

use pteronest_bot::{BotConfig, CommandHandler, Interaction, Reply, audit, config};
use pteronest_events::{EventBus, InMemoryEventBus};
use pteronest_infra::{
    InMemoryTransactionLog, Ledger, MonotonicClock, PublishingTransactionLog, SystemClock,
    TransactionEnvelope,
};

/// Reads one interaction per stdin line (`<user_id> <command> [args…]`) and
/// writes one JSON reply per line to stdout.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pteronest_observability::init_with(config::log_format_from_env(), "info");

    let config = BotConfig::from_env();
    tracing::info!(
        daily_amount = %config.daily_policy.amount,
        daily_cooldown_secs = config.daily_policy.cooldown.map(|c| c.num_seconds()),
        history_limit = config.replies.history_limit,
        "starting economy adapter"
    );

    let bus = Arc::new(InMemoryEventBus::<TransactionEnvelope>::new());

    // Background subscriber: bus -> audit log
    let auditor = {
        let subscription = bus.subscribe();
        tokio::task::spawn_blocking(move || audit::run(subscription))
    };

    let ledger = Ledger::from_parts(
        PublishingTransactionLog::new(InMemoryTransactionLog::new(), bus),
        MonotonicClock::new(SystemClock),
        config.daily_policy,
    );
    let handler = CommandHandler::new(Arc::new(ledger), config.replies);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut in_flight = JoinSet::new();
    let mut line_no = 0u64;

    loop {
        tokio::select! {
            Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                write_reply(&mut stdout, done.context("interaction task panicked")?).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                let handler = handler.clone();
                in_flight.spawn(async move { (line_no, respond(&handler, &line)) });
            }
        }
    }

    while let Some(done) = in_flight.join_next().await {
        write_reply(&mut stdout, done.context("interaction task panicked")?).await?;
    }

    // Dropping the last ledger handle drops the bus and ends the audit loop.
    drop(handler);
    let recorded = auditor.await.context("audit task panicked")?;
    tracing::info!(recorded, "shutting down");

    Ok(())
}

fn respond<L, C>(handler: &CommandHandler<L, C>, line: &str) -> Reply
where
    L: pteronest_infra::TransactionLog,
    C: pteronest_infra::Clock,
{
    match Interaction::parse_line(line) {
        Ok(interaction) => handler.handle(&interaction),
        Err(e) => {
            tracing::debug!(error = %e, "unparseable input line");
            Reply::error(e.to_string())
        }
    }
}

async fn write_reply(stdout: &mut tokio::io::Stdout, (line, reply): (u64, Reply)) -> anyhow::Result<()> {
    let mut out = serde_json::to_vec(&serde_json::json!({ "line": line, "reply": reply }))
        .context("failed to encode reply")?;
    out.push(b'\n');
    stdout.write_all(&out).await.context("failed to write stdout")?;
    stdout.flush().await.context("failed to flush stdout")?;
    Ok(())
}
