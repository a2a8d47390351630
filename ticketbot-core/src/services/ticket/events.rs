// File: ticketbot-core/src/services/ticket/events.rs
//
// Inbound interactions the ticket handler reacts to, already stripped of
// platform SDK types.

use ticketbot_common::models::{ChannelKind, InteractionRef, Permission};

/// The user behind an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub username: String,
    /// Resolved guild permissions, when the platform sent them with the event.
    pub permissions: Option<Vec<Permission>>,
    pub role_ids: Vec<String>,
}

impl Actor {
    pub fn has_permission(&self, permission: Permission) -> Option<bool> {
        self.permissions.as_ref().map(|perms| perms.contains(&permission))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOptionValue {
    Channel {
        channel_id: String,
        /// `None` when the platform did not resolve the channel.
        kind: Option<ChannelKind>,
    },
    String(String),
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub value: CommandOptionValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvoked {
    pub interaction: InteractionRef,
    pub command_name: String,
    pub options: Vec<CommandOption>,
    pub actor: Actor,
}

impl CommandInvoked {
    pub fn option(&self, name: &str) -> Option<&CommandOptionValue> {
        self.options.iter().find(|o| o.name == name).map(|o| &o.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionMade {
    pub interaction: InteractionRef,
    pub menu_id: String,
    pub values: Vec<String>,
    pub actor: Actor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPressed {
    pub interaction: InteractionRef,
    pub button_id: String,
    pub channel_id: String,
    pub channel_kind: Option<ChannelKind>,
    pub actor: Actor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketEvent {
    CommandInvoked(CommandInvoked),
    SelectionMade(SelectionMade),
    ButtonPressed(ButtonPressed),
}

impl TicketEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TicketEvent::CommandInvoked(_) => "command",
            TicketEvent::SelectionMade(_) => "selection",
            TicketEvent::ButtonPressed(_) => "button",
        }
    }

    pub fn actor(&self) -> &Actor {
        match self {
            TicketEvent::CommandInvoked(e) => &e.actor,
            TicketEvent::SelectionMade(e) => &e.actor,
            TicketEvent::ButtonPressed(e) => &e.actor,
        }
    }
}
