// File: ticketbot-core/tests/test_utils/mod.rs
//
// A recording in-memory platform plus event/config builders shared by the
// integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use ticketbot_common::models::{
    ChannelInfo, ChannelKind, CommandSpec, CreateChannelRequest, InteractionRef, MemberInfo,
    MessageHandle, OutgoingMessage, PendingDeletion, Permission,
};
use ticketbot_common::traits::TicketPlatform;
use ticketbot_core::BotConfig;
use ticketbot_core::Error;
use ticketbot_core::tasks::PendingDeletionStore;
use ticketbot_core::services::ticket::{
    Actor, ButtonPressed, CommandInvoked, CommandOption, CommandOptionValue, SelectionMade,
    TicketEvent,
};

pub const GUILD_ID: &str = "1";
pub const ADMIN_ROLE_ID: &str = "50";
pub const CATEGORY_A: &str = "111";
pub const CATEGORY_B: &str = "222";
pub const SUPPORT_CHANNEL: &str = "300";
pub const VOICE_CHANNEL: &str = "301";

#[derive(Default)]
struct FakeState {
    next_id: u64,
    channels: HashMap<String, ChannelInfo>,
    role_members: HashMap<String, Vec<MemberInfo>>,
    administrators: Vec<MemberInfo>,
    admin_users: HashSet<String>,
    blocked_dms: HashSet<String>,
    registered: Vec<CommandSpec>,
    created: Vec<CreateChannelRequest>,
    deleted: Vec<String>,
    sent: Vec<(String, OutgoingMessage)>,
    dms: Vec<(String, OutgoingMessage)>,
    replies: Vec<(String, String)>,
    reply_times: Vec<Instant>,
    dm_delay: Duration,
    fail_create: bool,
    fail_delete: bool,
    fail_send: bool,
    fail_list: bool,
}

/// Behaves like a small guild: channels live in a map, every outbound call
/// is recorded for assertions.
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<FakeState>>,
}

impl FakePlatform {
    /// A guild with two ticket categories, a text channel and a voice channel.
    pub fn with_guild() -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.next_id = 1000;
            for (id, name, kind) in [
                (CATEGORY_A, "General", ChannelKind::Category),
                (CATEGORY_B, "Billing", ChannelKind::Category),
                (SUPPORT_CHANNEL, "support", ChannelKind::Text),
                (VOICE_CHANNEL, "lounge", ChannelKind::Voice),
            ] {
                state.channels.insert(
                    id.to_string(),
                    ChannelInfo {
                        channel_id: id.to_string(),
                        name: name.to_string(),
                        kind,
                        parent_id: None,
                    },
                );
            }
        }
        fake
    }

    pub fn add_role_member(&self, role_id: &str, user_id: &str, username: &str) {
        self.state
            .lock()
            .unwrap()
            .role_members
            .entry(role_id.to_string())
            .or_default()
            .push(MemberInfo {
                user_id: user_id.to_string(),
                username: username.to_string(),
            });
    }

    pub fn add_administrator(&self, user_id: &str, username: &str) {
        let mut state = self.state.lock().unwrap();
        state.admin_users.insert(user_id.to_string());
        state.administrators.push(MemberInfo {
            user_id: user_id.to_string(),
            username: username.to_string(),
        });
    }

    pub fn block_dms(&self, user_id: &str) {
        self.state.lock().unwrap().blocked_dms.insert(user_id.to_string());
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_delete(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }

    /// Every `send_message` call fails as if the bot could not post there.
    pub fn fail_send(&self) {
        self.state.lock().unwrap().fail_send = true;
    }

    pub fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    /// Each direct message takes `delay` before it is delivered.
    pub fn set_dm_delay(&self, delay: Duration) {
        self.state.lock().unwrap().dm_delay = delay;
    }

    pub fn insert_text_channel(&self, channel_id: &str, name: &str, parent_id: Option<&str>) {
        self.state.lock().unwrap().channels.insert(
            channel_id.to_string(),
            ChannelInfo {
                channel_id: channel_id.to_string(),
                name: name.to_string(),
                kind: ChannelKind::Text,
                parent_id: parent_id.map(str::to_string),
            },
        );
    }

    pub fn channel_exists(&self, channel_id: &str) -> bool {
        self.state.lock().unwrap().channels.contains_key(channel_id)
    }

    pub fn registered(&self) -> Vec<CommandSpec> {
        self.state.lock().unwrap().registered.clone()
    }

    pub fn created(&self) -> Vec<CreateChannelRequest> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn sent(&self) -> Vec<(String, OutgoingMessage)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn dms(&self) -> Vec<(String, OutgoingMessage)> {
        self.state.lock().unwrap().dms.clone()
    }

    /// `(interaction id, text)` pairs in reply order.
    pub fn replies(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().replies.clone()
    }

    /// When each reply arrived, on the tokio clock.
    pub fn reply_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().reply_times.clone()
    }
}

#[async_trait]
impl TicketPlatform for FakePlatform {
    async fn register_commands(&self, commands: &[CommandSpec]) -> Result<(), Error> {
        self.state.lock().unwrap().registered = commands.to_vec();
        Ok(())
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, Error> {
        Ok(self.state.lock().unwrap().channels.get(channel_id).cloned())
    }

    async fn list_child_channels(&self, category_id: &str) -> Result<Vec<ChannelInfo>, Error> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(Error::Platform("503 Service Unavailable".into()));
        }
        Ok(state
            .channels
            .values()
            .filter(|c| c.parent_id.as_deref() == Some(category_id))
            .cloned()
            .collect())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(Error::PermissionDenied("missing Send Messages".into()));
        }
        if !state.channels.contains_key(channel_id) {
            return Err(Error::NotFound(format!("channel {channel_id}")));
        }
        state.sent.push((channel_id.to_string(), message.clone()));
        state.next_id += 1;
        Ok(MessageHandle {
            channel_id: channel_id.to_string(),
            message_id: state.next_id.to_string(),
        })
    }

    async fn create_channel(&self, request: &CreateChannelRequest) -> Result<ChannelInfo, Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(Error::PermissionDenied("missing Manage Channels".into()));
        }
        match state.channels.get(&request.parent_id) {
            Some(parent) if parent.kind == ChannelKind::Category => {}
            _ => return Err(Error::InvalidParent(request.parent_id.clone())),
        }
        state.created.push(request.clone());
        state.next_id += 1;
        let channel = ChannelInfo {
            channel_id: state.next_id.to_string(),
            name: request.name.clone(),
            kind: ChannelKind::Text,
            parent_id: Some(request.parent_id.clone()),
        };
        state.channels.insert(channel.channel_id.clone(), channel.clone());
        Ok(channel)
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            return Err(Error::PermissionDenied("missing Manage Channels".into()));
        }
        if state.channels.remove(channel_id).is_none() {
            return Err(Error::NotFound(format!("channel {channel_id}")));
        }
        state.deleted.push(channel_id.to_string());
        Ok(())
    }

    async fn list_role_members(&self, role_id: &str) -> Result<Option<Vec<MemberInfo>>, Error> {
        Ok(self.state.lock().unwrap().role_members.get(role_id).cloned())
    }

    async fn list_administrators(&self) -> Result<Vec<MemberInfo>, Error> {
        Ok(self.state.lock().unwrap().administrators.clone())
    }

    async fn member_has_permission(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> Result<bool, Error> {
        let state = self.state.lock().unwrap();
        Ok(permission == Permission::Administrator && state.admin_users.contains(user_id))
    }

    async fn send_direct_message(
        &self,
        user_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), Error> {
        let delay = self.state.lock().unwrap().dm_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if state.blocked_dms.contains(user_id) {
            return Err(Error::Blocked(format!("user {user_id}")));
        }
        state.dms.push((user_id.to_string(), message.clone()));
        Ok(())
    }

    async fn reply_private(&self, interaction: &InteractionRef, text: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.replies.push((interaction.id.clone(), text.to_string()));
        state.reply_times.push(Instant::now());
        Ok(())
    }
}

/// A pending-deletion store whose backing storage is unusable.
#[derive(Default)]
pub struct FailingStore;

fn storage_error() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "read-only file system",
    ))
}

#[async_trait]
impl PendingDeletionStore for FailingStore {
    async fn insert(&self, _record: &PendingDeletion) -> Result<(), Error> {
        Err(storage_error())
    }

    async fn get(&self, _channel_id: &str) -> Result<Option<PendingDeletion>, Error> {
        Err(storage_error())
    }

    async fn remove(&self, _channel_id: &str) -> Result<Option<PendingDeletion>, Error> {
        Err(storage_error())
    }

    async fn list(&self) -> Result<Vec<PendingDeletion>, Error> {
        Err(storage_error())
    }
}

/// Two categories ("General", "Billing"), admin role 50, default texts.
pub fn test_config() -> BotConfig {
    let raw = format!(
        r#"{{
            "token": "test-token",
            "clientId": "10",
            "guildId": "{GUILD_ID}",
            "adminRoleId": "{ADMIN_ROLE_ID}",
            "categories": [
                {{ "label": "General", "description": "General questions",
                   "categoryId": "{CATEGORY_A}" }},
                {{ "label": "Billing", "description": "Payments and refunds",
                   "categoryId": "{CATEGORY_B}" }}
            ]
        }}"#
    );
    let config = BotConfig::from_json_str(&raw).unwrap();
    config.validate().unwrap();
    config
}

pub fn interaction(id: &str) -> InteractionRef {
    InteractionRef {
        id: id.to_string(),
        token: format!("token-{id}"),
    }
}

pub fn member(user_id: &str, username: &str) -> Actor {
    Actor {
        user_id: user_id.to_string(),
        username: username.to_string(),
        permissions: Some(vec![Permission::ViewChannel, Permission::SendMessages]),
        role_ids: Vec::new(),
    }
}

pub fn admin(user_id: &str, username: &str) -> Actor {
    Actor {
        user_id: user_id.to_string(),
        username: username.to_string(),
        permissions: Some(vec![Permission::ViewChannel, Permission::Administrator]),
        role_ids: Vec::new(),
    }
}

pub fn setup_event(actor: Actor, channel_id: &str, kind: Option<ChannelKind>) -> TicketEvent {
    TicketEvent::CommandInvoked(CommandInvoked {
        interaction: interaction("i-setup"),
        command_name: "setup-ticket".into(),
        options: vec![CommandOption {
            name: "channel".into(),
            value: CommandOptionValue::Channel {
                channel_id: channel_id.to_string(),
                kind,
            },
        }],
        actor,
    })
}

pub fn selection_event(actor: Actor, value: &str) -> TicketEvent {
    TicketEvent::SelectionMade(SelectionMade {
        interaction: interaction("i-select"),
        menu_id: "ticket-dropdown".into(),
        values: vec![value.to_string()],
        actor,
    })
}

pub fn close_event(actor: Actor, channel_id: &str) -> TicketEvent {
    TicketEvent::ButtonPressed(ButtonPressed {
        interaction: interaction("i-close"),
        button_id: "close-ticket".into(),
        channel_id: channel_id.to_string(),
        channel_kind: Some(ChannelKind::Text),
        actor,
    })
}
