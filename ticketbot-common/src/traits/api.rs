// File: ticketbot-common/src/traits/api.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{
    ChannelInfo, CommandSpec, CreateChannelRequest, InteractionRef, MemberInfo, MessageHandle,
    OutgoingMessage, Permission,
};

/// Everything the ticket workflow needs from the chat platform.
///
/// Implementations are scoped to a single guild; ids are the platform's
/// string form of its snowflakes.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait TicketPlatform: Send + Sync {
    /// Upsert the guild's command set. Safe to call on every start.
    async fn register_commands(&self, commands: &[CommandSpec]) -> Result<(), Error>;

    /// `Ok(None)` when the channel does not exist (or is not in this guild).
    async fn fetch_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, Error>;

    async fn list_child_channels(&self, category_id: &str) -> Result<Vec<ChannelInfo>, Error>;

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, Error>;

    /// Fails with `Error::PermissionDenied` or `Error::InvalidParent`.
    async fn create_channel(&self, request: &CreateChannelRequest) -> Result<ChannelInfo, Error>;

    /// Fails with `Error::NotFound` when the channel is already gone.
    async fn delete_channel(&self, channel_id: &str) -> Result<(), Error>;

    /// `Ok(None)` when the role does not exist.
    async fn list_role_members(&self, role_id: &str) -> Result<Option<Vec<MemberInfo>>, Error>;

    /// Members holding a role that grants the Administrator permission.
    async fn list_administrators(&self) -> Result<Vec<MemberInfo>, Error>;

    async fn member_has_permission(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> Result<bool, Error>;

    /// May fail with `Error::Blocked` when the user does not accept DMs.
    async fn send_direct_message(
        &self,
        user_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), Error>;

    /// Reply to an interaction so that only the invoking user sees it.
    async fn reply_private(&self, interaction: &InteractionRef, text: &str) -> Result<(), Error>;
}
