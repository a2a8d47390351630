// File: ticketbot-core/src/services/ticket/messages.rs

use ticketbot_common::models::{
    ButtonStyle, ComponentSpec, EmbedColor, EmbedSpec, OutgoingMessage, SelectOption,
    TicketCategory,
};

use crate::config::TicketTexts;

pub const TICKET_MENU_ID: &str = "ticket-dropdown";
pub const CLOSE_BUTTON_ID: &str = "close-ticket";

pub fn user_mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

pub fn channel_mention(channel_id: &str) -> String {
    format!("<#{channel_id}>")
}

/// The persistent prompt posted by `setup-ticket`: an explanatory embed plus
/// one select menu offering every configured category.
pub fn category_menu(texts: &TicketTexts, categories: &[TicketCategory]) -> OutgoingMessage {
    let options = categories
        .iter()
        .map(|cat| SelectOption {
            label: cat.label.clone(),
            description: Some(cat.description.clone()).filter(|d| !d.is_empty()),
            value: cat.category_id.clone(),
        })
        .collect();

    OutgoingMessage::embed(EmbedSpec {
        title: Some(texts.embed_title.clone()),
        description: texts.embed_description.clone(),
        color: EmbedColor::Blue,
    })
    .with_component(ComponentSpec::SelectMenu {
        custom_id: TICKET_MENU_ID.to_string(),
        placeholder: Some(texts.dropdown_placeholder.clone()),
        options,
    })
}

/// DM sent to each administrator when a ticket is opened.
pub fn admin_notification(
    opener_id: &str,
    opened_at: &str,
    category_name: &str,
    ticket_channel_id: &str,
) -> OutgoingMessage {
    let description = format!(
        "**Ticket Opened by** - {}\n\
         **Ticket Opened Time** - {opened_at}\n\
         **Ticket Category** - {category_name}\n\
         **Ticket Channel** - {}",
        user_mention(opener_id),
        channel_mention(ticket_channel_id),
    );
    OutgoingMessage::embed(EmbedSpec {
        title: Some("Ticket Created".to_string()),
        description,
        color: EmbedColor::Green,
    })
}

pub fn welcome(texts: &TicketTexts, opener_id: &str) -> OutgoingMessage {
    OutgoingMessage::embed(EmbedSpec {
        title: None,
        description: texts.welcome.replace("{user}", &user_mention(opener_id)),
        color: EmbedColor::Green,
    })
}

pub fn close_controls(texts: &TicketTexts) -> OutgoingMessage {
    OutgoingMessage::default().with_component(ComponentSpec::Button {
        custom_id: CLOSE_BUTTON_ID.to_string(),
        label: texts.close_button_label.clone(),
        style: ButtonStyle::Danger,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<TicketCategory> {
        vec![
            TicketCategory {
                label: "General".into(),
                description: "Anything".into(),
                category_id: "4001".into(),
            },
            TicketCategory {
                label: "Billing".into(),
                description: String::new(),
                category_id: "4002".into(),
            },
        ]
    }

    #[test]
    fn menu_lists_each_category_once() {
        let msg = category_menu(&TicketTexts::default(), &categories());
        assert_eq!(msg.components.len(), 1);
        let ComponentSpec::SelectMenu { custom_id, options, .. } = &msg.components[0] else {
            panic!("expected a select menu");
        };
        assert_eq!(custom_id, TICKET_MENU_ID);
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["General", "Billing"]);
        assert_eq!(options[1].value, "4002");
        assert_eq!(options[1].description, None);
        assert_eq!(msg.embed.unwrap().title.as_deref(), Some("Support Tickets"));
    }

    #[test]
    fn notification_mentions_everything_staff_needs() {
        let msg = admin_notification("11", "2024-01-01 05:30:00", "Billing", "77");
        let text = msg.embed.unwrap().description;
        assert!(text.contains("<@11>"));
        assert!(text.contains("2024-01-01 05:30:00"));
        assert!(text.contains("Billing"));
        assert!(text.contains("<#77>"));
    }

    #[test]
    fn welcome_substitutes_opener() {
        let msg = welcome(&TicketTexts::default(), "11");
        assert!(msg.embed.unwrap().description.starts_with("Hey there <@11>!"));
    }
}
