// File: ticketbot-core/src/platforms/discord/interaction.rs
//
// Turns raw gateway interactions into `TicketEvent`s.

use twilight_model::application::interaction::application_command::{
    CommandData, CommandOptionValue as TwilightOptionValue,
};
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::message::component::ComponentType;

use ticketbot_common::models::{ChannelKind, InteractionRef};

use crate::platforms::discord::convert::{channel_kind, from_permissions};
use crate::services::ticket::{
    Actor, ButtonPressed, CommandInvoked, CommandOption, CommandOptionValue, SelectionMade,
    TicketEvent,
};

/// `None` for interaction kinds the ticket flow never handles
/// (pings, autocomplete, modals) or when no user is attached.
pub fn translate_interaction(interaction: &Interaction) -> Option<TicketEvent> {
    let reference = InteractionRef {
        id: interaction.id.to_string(),
        token: interaction.token.clone(),
    };
    let actor = actor_from(interaction)?;

    match interaction.data.as_ref()? {
        InteractionData::ApplicationCommand(data) => {
            Some(TicketEvent::CommandInvoked(CommandInvoked {
                interaction: reference,
                command_name: data.name.clone(),
                options: command_options(data),
                actor,
            }))
        }
        InteractionData::MessageComponent(data) => component_event(
            reference,
            actor,
            &data.custom_id,
            data.component_type,
            &data.values,
            interaction
                .channel
                .as_ref()
                .map(|c| (c.id.to_string(), channel_kind(c.kind))),
        ),
        _ => None,
    }
}

fn actor_from(interaction: &Interaction) -> Option<Actor> {
    let user = interaction.author()?;
    let (permissions, role_ids) = match &interaction.member {
        Some(member) => (
            member.permissions.map(from_permissions),
            member.roles.iter().map(|r| r.to_string()).collect(),
        ),
        None => (None, Vec::new()),
    };
    Some(Actor {
        user_id: user.id.to_string(),
        username: user.name.clone(),
        permissions,
        role_ids,
    })
}

fn command_options(data: &CommandData) -> Vec<CommandOption> {
    data.options
        .iter()
        .map(|option| {
            let value = match &option.value {
                TwilightOptionValue::Channel(id) => CommandOptionValue::Channel {
                    channel_id: id.to_string(),
                    kind: data
                        .resolved
                        .as_ref()
                        .and_then(|r| r.channels.get(id))
                        .map(|c| channel_kind(c.kind)),
                },
                TwilightOptionValue::String(s) => CommandOptionValue::String(s.clone()),
                _ => CommandOptionValue::Unsupported,
            };
            CommandOption {
                name: option.name.clone(),
                value,
            }
        })
        .collect()
}

/// Builds the event for a component interaction. `channel` is the id and kind
/// of the channel holding the message. Buttons without a channel are dropped.
pub fn component_event(
    reference: InteractionRef,
    actor: Actor,
    custom_id: &str,
    component_type: ComponentType,
    values: &[String],
    channel: Option<(String, ChannelKind)>,
) -> Option<TicketEvent> {
    match component_type {
        ComponentType::TextSelectMenu => Some(TicketEvent::SelectionMade(SelectionMade {
            interaction: reference,
            menu_id: custom_id.to_string(),
            values: values.to_vec(),
            actor,
        })),
        ComponentType::Button => {
            let (channel_id, kind) = channel?;
            Some(TicketEvent::ButtonPressed(ButtonPressed {
                interaction: reference,
                button_id: custom_id.to_string(),
                channel_id,
                channel_kind: Some(kind),
                actor,
            }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> InteractionRef {
        InteractionRef {
            id: "900".into(),
            token: "tok".into(),
        }
    }

    fn alice() -> Actor {
        Actor {
            user_id: "100".into(),
            username: "alice".into(),
            permissions: None,
            role_ids: vec![],
        }
    }

    #[test]
    fn select_menu_becomes_selection() {
        let event = component_event(
            reference(),
            alice(),
            "ticket-dropdown",
            ComponentType::TextSelectMenu,
            &["222".to_string()],
            None,
        );
        match event {
            Some(TicketEvent::SelectionMade(sel)) => {
                assert_eq!(sel.menu_id, "ticket-dropdown");
                assert_eq!(sel.values, vec!["222".to_string()]);
                assert_eq!(sel.actor.username, "alice");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn button_carries_channel() {
        let event = component_event(
            reference(),
            alice(),
            "close-ticket",
            ComponentType::Button,
            &[],
            Some(("555".into(), ChannelKind::Text)),
        );
        match event {
            Some(TicketEvent::ButtonPressed(btn)) => {
                assert_eq!(btn.button_id, "close-ticket");
                assert_eq!(btn.channel_id, "555");
                assert_eq!(btn.channel_kind, Some(ChannelKind::Text));
                assert_eq!(btn.interaction.token, "tok");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn button_without_channel_is_dropped() {
        let event = component_event(
            reference(),
            alice(),
            "close-ticket",
            ComponentType::Button,
            &[],
            None,
        );
        assert!(event.is_none());
    }

    #[test]
    fn other_components_are_ignored() {
        let event = component_event(
            reference(),
            alice(),
            "whatever",
            ComponentType::UserSelectMenu,
            &[],
            None,
        );
        assert!(event.is_none());
    }
}
