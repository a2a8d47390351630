use std::sync::Arc;

use tracing::info;

use ticketbot_common::models::CommandSpec;
use ticketbot_common::traits::TicketPlatform;

use crate::Error;
use crate::services::ticket::commands::ticket_commands;

/// Process-wide handle on the chat platform, built once at startup and
/// handed to whoever needs to talk to the platform.
pub struct PlatformSession {
    platform: Arc<dyn TicketPlatform>,
    commands: Vec<CommandSpec>,
}

impl PlatformSession {
    pub fn new(platform: Arc<dyn TicketPlatform>) -> Self {
        Self {
            platform,
            commands: ticket_commands(),
        }
    }

    pub fn platform(&self) -> &Arc<dyn TicketPlatform> {
        &self.platform
    }

    /// Upsert this bot's guild commands.
    pub async fn register_commands(&self) -> Result<(), Error> {
        info!("Registering {} guild command(s)...", self.commands.len());
        self.platform.register_commands(&self.commands).await?;
        info!("Guild commands registered");
        Ok(())
    }
}
