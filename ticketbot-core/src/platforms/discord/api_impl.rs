// File: ticketbot-core/src/platforms/discord/api_impl.rs

use async_trait::async_trait;
use tracing::debug;

use twilight_http::error::Error as HttpError;
use twilight_model::application::command::Command;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::{Embed, Message};
use twilight_model::guild::{Member, Permissions, Role};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, InteractionMarker, RoleMarker, UserMarker};

use ticketbot_common::models::{
    ChannelInfo, CommandSpec, CreateChannelRequest, InteractionRef, MemberInfo, MessageHandle,
    OutgoingMessage, Permission,
};
use ticketbot_common::traits::TicketPlatform;

use crate::Error;
use crate::platforms::discord::convert::{
    self, channel_info, http_status, map_http_error, member_info, parse_id,
};
use crate::platforms::discord::runtime::DiscordPlatform;

/// Page size for guild member listing (Discord's maximum).
const MEMBER_PAGE: u16 = 1000;

fn body_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::Platform(format!("{context}: could not decode response: {err}"))
}

impl DiscordPlatform {
    fn cached_channel(&self, channel_id: Id<ChannelMarker>) -> Option<ChannelInfo> {
        let channel = self.cache.channel(channel_id)?;
        let channel = channel.value();
        (channel.guild_id == Some(self.guild_id)).then(|| channel_info(channel))
    }

    async fn guild_roles(&self) -> Result<Vec<Role>, Error> {
        self.http
            .roles(self.guild_id)
            .await
            .map_err(|e| map_http_error("list roles", e))?
            .models()
            .await
            .map_err(|e| body_error("list roles", e))
    }

    async fn all_members(&self) -> Result<Vec<Member>, Error> {
        let mut members = Vec::new();
        let mut after: Option<Id<UserMarker>> = None;
        loop {
            let mut request = self.http.guild_members(self.guild_id).limit(MEMBER_PAGE);
            if let Some(after) = after {
                request = request.after(after);
            }
            let page = request
                .await
                .map_err(|e| map_http_error("list members", e))?
                .models()
                .await
                .map_err(|e| body_error("list members", e))?;

            let full_page = page.len() >= usize::from(MEMBER_PAGE);
            after = page.last().map(|m| m.user.id);
            members.extend(page);
            if !full_page {
                break;
            }
        }
        debug!("Fetched {} guild member(s)", members.len());
        Ok(members)
    }

    async fn post_message<F>(
        &self,
        channel_id: Id<ChannelMarker>,
        message: &OutgoingMessage,
        map_err: F,
    ) -> Result<Message, Error>
    where
        F: Fn(HttpError) -> Error + Send,
    {
        let embeds: Vec<Embed> = message.embed.iter().map(convert::to_embed).collect();
        let components = convert::to_components(&message.components);

        let mut request = self.http.create_message(channel_id);
        if let Some(content) = &message.content {
            request = request.content(content);
        }
        if !embeds.is_empty() {
            request = request.embeds(&embeds);
        }
        if !components.is_empty() {
            request = request.components(&components);
        }
        request
            .await
            .map_err(map_err)?
            .model()
            .await
            .map_err(|e| body_error("send message", e))
    }
}

#[async_trait]
impl TicketPlatform for DiscordPlatform {
    async fn register_commands(&self, commands: &[CommandSpec]) -> Result<(), Error> {
        let commands: Vec<Command> = commands.iter().map(convert::to_command).collect();
        self.http
            .interaction(self.application_id)
            .set_guild_commands(self.guild_id, &commands)
            .await
            .map_err(|e| map_http_error("register guild commands", e))?;
        Ok(())
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, Error> {
        let id = parse_id::<ChannelMarker>("channel", channel_id)?;
        if let Some(info) = self.cached_channel(id) {
            return Ok(Some(info));
        }

        let channel = match self.http.channel(id).await {
            Ok(response) => response
                .model()
                .await
                .map_err(|e| body_error("fetch channel", e))?,
            Err(e) if matches!(http_status(&e), Some(403 | 404)) => return Ok(None),
            Err(e) => return Err(map_http_error("fetch channel", e)),
        };
        if channel.guild_id != Some(self.guild_id) {
            return Ok(None);
        }
        Ok(Some(channel_info(&channel)))
    }

    async fn list_child_channels(&self, category_id: &str) -> Result<Vec<ChannelInfo>, Error> {
        let parent = parse_id::<ChannelMarker>("category", category_id)?;
        let channels = self
            .http
            .guild_channels(self.guild_id)
            .await
            .map_err(|e| map_http_error("list channels", e))?
            .models()
            .await
            .map_err(|e| body_error("list channels", e))?;
        Ok(channels
            .iter()
            .filter(|c| c.parent_id == Some(parent))
            .map(channel_info)
            .collect())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, Error> {
        let id = parse_id::<ChannelMarker>("channel", channel_id)?;
        let sent = self
            .post_message(id, message, |e| map_http_error("send message", e))
            .await?;
        Ok(MessageHandle {
            channel_id: sent.channel_id.to_string(),
            message_id: sent.id.to_string(),
        })
    }

    async fn create_channel(&self, request: &CreateChannelRequest) -> Result<ChannelInfo, Error> {
        let parent = parse_id::<ChannelMarker>("category", &request.parent_id)?;
        let overwrites = convert::to_overwrites(self.guild_id, &request.permission_overwrites)?;

        let channel = self
            .http
            .create_guild_channel(self.guild_id, &request.name)
            .kind(ChannelType::GuildText)
            .parent_id(parent)
            .permission_overwrites(&overwrites)
            .await
            .map_err(|e| match http_status(&e) {
                Some(400) => Error::InvalidParent(format!(
                    "cannot create '{}' under {}: {e}",
                    request.name, request.parent_id
                )),
                _ => map_http_error("create channel", e),
            })?
            .model()
            .await
            .map_err(|e| body_error("create channel", e))?;
        Ok(channel_info(&channel))
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), Error> {
        let id = parse_id::<ChannelMarker>("channel", channel_id)?;
        self.http
            .delete_channel(id)
            .await
            .map_err(|e| map_http_error("delete channel", e))?;
        Ok(())
    }

    async fn list_role_members(&self, role_id: &str) -> Result<Option<Vec<MemberInfo>>, Error> {
        let role_id = parse_id::<RoleMarker>("role", role_id)?;
        if !self.guild_roles().await?.iter().any(|r| r.id == role_id) {
            return Ok(None);
        }
        let members = self.all_members().await?;
        Ok(Some(
            members
                .iter()
                .filter(|m| !m.user.bot && m.roles.contains(&role_id))
                .map(member_info)
                .collect(),
        ))
    }

    async fn list_administrators(&self) -> Result<Vec<MemberInfo>, Error> {
        let admin_roles: Vec<Id<RoleMarker>> = self
            .guild_roles()
            .await?
            .into_iter()
            .filter(|r| r.permissions.contains(Permissions::ADMINISTRATOR))
            .map(|r| r.id)
            .collect();
        if admin_roles.is_empty() {
            return Ok(Vec::new());
        }
        let members = self.all_members().await?;
        Ok(members
            .iter()
            .filter(|m| !m.user.bot && m.roles.iter().any(|r| admin_roles.contains(r)))
            .map(member_info)
            .collect())
    }

    async fn member_has_permission(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> Result<bool, Error> {
        let user = parse_id::<UserMarker>("user", user_id)?;
        let member = match self.http.guild_member(self.guild_id, user).await {
            Ok(response) => response
                .model()
                .await
                .map_err(|e| body_error("fetch member", e))?,
            Err(e) if http_status(&e) == Some(404) => return Ok(false),
            Err(e) => return Err(map_http_error("fetch member", e)),
        };

        let everyone: Id<RoleMarker> = self.guild_id.cast();
        let granted = self
            .guild_roles()
            .await?
            .iter()
            .filter(|r| r.id == everyone || member.roles.contains(&r.id))
            .fold(Permissions::empty(), |acc, r| acc | r.permissions);

        Ok(granted.contains(Permissions::ADMINISTRATOR)
            || granted.contains(convert::permission_flag(permission)))
    }

    async fn send_direct_message(
        &self,
        user_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), Error> {
        let user = parse_id::<UserMarker>("user", user_id)?;
        let dm_channel = self
            .http
            .create_private_channel(user)
            .await
            .map_err(|e| map_http_error("open DM channel", e))?
            .model()
            .await
            .map_err(|e| body_error("open DM channel", e))?;

        self.post_message(dm_channel.id, message, |e| match http_status(&e) {
            Some(403) => Error::Blocked(format!("user {user_id} does not accept DMs: {e}")),
            _ => map_http_error("send DM", e),
        })
        .await?;
        Ok(())
    }

    async fn reply_private(&self, interaction: &InteractionRef, text: &str) -> Result<(), Error> {
        let interaction_id = parse_id::<InteractionMarker>("interaction", &interaction.id)?;
        self.http
            .interaction(self.application_id)
            .create_response(
                interaction_id,
                &interaction.token,
                &convert::ephemeral_response(text),
            )
            .await
            .map_err(|e| map_http_error("interaction reply", e))?;
        Ok(())
    }
}
