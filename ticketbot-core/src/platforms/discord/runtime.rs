use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};

use crate::Error;
use crate::config::BotConfig;
use crate::platforms::ConnectionStatus;
use crate::platforms::discord::convert::parse_id;
use crate::platforms::discord::interaction::translate_interaction;
use crate::services::ticket::TicketEvent;

/// REST side of the Discord integration, scoped to one guild. Implements
/// [`ticketbot_common::traits::TicketPlatform`] (see `api_impl.rs`).
pub struct DiscordPlatform {
    pub(crate) http: Arc<HttpClient>,
    pub(crate) cache: Arc<InMemoryCache>,
    pub(crate) guild_id: Id<GuildMarker>,
    pub(crate) application_id: Id<ApplicationMarker>,
    token: String,
}

impl DiscordPlatform {
    pub fn new(config: &BotConfig) -> Result<Self, Error> {
        if config.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }

        let http = Arc::new(
            ClientBuilder::new()
                .token(config.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );

        let cache = InMemoryCache::builder()
            .resource_types(ResourceType::GUILD | ResourceType::CHANNEL | ResourceType::ROLE)
            .build();

        Ok(Self {
            http,
            cache: Arc::new(cache),
            guild_id: parse_id("guild", &config.guild_id)?,
            application_id: parse_id("application", &config.client_id)?,
            token: config.token.clone(),
        })
    }

    /// A gateway connection sharing this platform's HTTP client and cache.
    pub fn gateway(&self) -> DiscordGateway {
        DiscordGateway {
            token: self.token.clone(),
            http: self.http.clone(),
            cache: self.cache.clone(),
            guild_id: self.guild_id,
            connection_status: ConnectionStatus::Disconnected,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
        }
    }
}

/// Gateway side: runs the shards and forwards ticket interactions.
pub struct DiscordGateway {
    token: String,
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    guild_id: Id<GuildMarker>,
    connection_status: ConnectionStatus,
    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,
}

impl DiscordGateway {
    /// Start the recommended number of shards. Translated interactions go to `tx`.
    pub async fn connect(&mut self, tx: UnboundedSender<TicketEvent>) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordGateway) Already connected => skipping");
            return Ok(());
        }

        let config = Config::new(self.token.clone(), Intents::GUILDS | Intents::GUILD_MEMBERS);
        let shards = gateway::create_recommended(&self.http, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let tx_for_shard = tx.clone();
            let cache_for_shard = self.cache.clone();
            let guild_id = self.guild_id;
            let handle = tokio::spawn(async move {
                shard_runner(shard, tx_for_shard, cache_for_shard, guild_id).await;
            });
            self.shard_tasks.push(handle);
        }

        info!("(DiscordGateway) Started {} shard(s)", self.shard_tasks.len());
        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in self.shard_tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("(DiscordGateway) Shard task ended abnormally: {e}");
            }
        }
        self.shard_senders.clear();
    }
}

/// Reads events off one shard, keeps the cache current and forwards
/// interactions from our guild.
async fn shard_runner(
    mut shard: Shard,
    tx: UnboundedSender<TicketEvent>,
    cache: Arc<InMemoryCache>,
    guild_id: Id<GuildMarker>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };
        cache.update(&event);

        match &event {
            Event::Ready(ready) => {
                info!(
                    "Shard {shard_id} => READY as {} (ID={})",
                    ready.user.name, ready.user.id
                );
            }
            Event::GatewayClose(frame) => {
                debug!("Shard {shard_id} => gateway closed: {frame:?}");
            }
            Event::InteractionCreate(interaction) => {
                if interaction.guild_id != Some(guild_id) {
                    debug!("Shard {shard_id} => ignoring interaction outside guild {guild_id}");
                    continue;
                }
                let Some(ticket_event) = translate_interaction(&interaction.0) else {
                    trace!("Shard {shard_id} => interaction not relevant to tickets");
                    continue;
                };
                if tx.send(ticket_event).is_err() {
                    warn!("Shard {shard_id} => event receiver dropped, stopping");
                    break;
                }
            }
            _ => {
                trace!("Shard {shard_id} => unhandled event: {:?}", event.kind());
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}
