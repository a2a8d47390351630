use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use ticketbot_common::traits::TicketPlatform;
use ticketbot_core::BotConfig;
use ticketbot_core::platforms::discord::DiscordPlatform;
use ticketbot_core::services::{PlatformSession, TicketHandler};
use ticketbot_core::tasks::{
    DeletionScheduler, InMemoryDeletionStore, JsonFileDeletionStore, PendingDeletionStore,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "ticketbot")]
#[command(author, version, about = "Ticketbot - private support tickets for a Discord guild")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Default level for this bot's log output (RUST_LOG still wins)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Don't upsert the guild slash commands on startup
    #[arg(long, default_value = "false")]
    skip_register: bool,

    /// Keep pending deletions in memory only
    #[arg(long, default_value = "false")]
    ephemeral: bool,
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let mut filter = EnvFilter::from_default_env();
    for target in ["ticketbot", "ticketbot_core", "ticketbot_server"] {
        filter = filter.add_directive(
            format!("{target}={level}")
                .parse()
                .with_context(|| format!("invalid log level '{level}'"))?,
        );
    }
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).context("failed to set global subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level)?;
    info!(
        "Ticketbot starting. config={}, skip_register={}, ephemeral={}",
        args.config.display(),
        args.skip_register,
        args.ephemeral
    );

    if let Err(e) = run(args).await {
        error!("Fatal: {e:#}");
        return Err(e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    // 1) Configuration
    let config = Arc::new(
        BotConfig::load(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?,
    );
    info!(
        "Loaded {} ticket categor(ies) for guild {}",
        config.categories.len(),
        config.guild_id
    );

    // 2) Platform session
    let discord = DiscordPlatform::new(&config).context("building Discord client")?;
    let mut gateway = discord.gateway();
    let platform: Arc<dyn TicketPlatform> = Arc::new(discord);
    let session = Arc::new(PlatformSession::new(platform.clone()));

    if args.skip_register {
        info!("`--skip-register` given; leaving guild commands untouched");
    } else {
        session
            .register_commands()
            .await
            .context("registering slash commands")?;
    }

    // 3) Deletion scheduler; re-arm anything a previous run left behind
    let store: Arc<dyn PendingDeletionStore> = if args.ephemeral {
        Arc::new(InMemoryDeletionStore::new())
    } else {
        Arc::new(JsonFileDeletionStore::new(&config.pending_deletions_path))
    };
    let scheduler = Arc::new(DeletionScheduler::new(platform.clone(), store));
    if let Err(e) = scheduler.rearm().await {
        warn!("Could not re-arm pending deletions: {e}");
    }

    let handler = Arc::new(TicketHandler::new(
        session.clone(),
        config.clone(),
        scheduler.clone(),
    ));

    // 4) Gateway
    let (tx, mut rx) = mpsc::unbounded_channel();
    gateway.connect(tx).await.context("connecting to gateway")?;

    // 5) Event loop until Ctrl-C or the gateway goes away
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    warn!("Gateway event stream ended; exiting event loop.");
                    break;
                };
                let handler = handler.clone();
                tokio::spawn(async move {
                    handler.handle(event).await;
                });
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    error!("Ctrl-C handler error: {e}");
                }
                info!("Ctrl-C detected; shutting down...");
                break;
            }
        }
    }

    gateway.disconnect().await;
    scheduler.shutdown();
    Ok(())
}
