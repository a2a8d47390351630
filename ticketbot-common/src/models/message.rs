// File: ticketbot-common/src/models/message.rs
//
// Platform-neutral description of what the bot posts. The Discord adapter
// renders these into embeds and message components.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedColor {
    Blue,
    Green,
    Red,
}

impl EmbedColor {
    pub fn rgb(&self) -> u32 {
        match self {
            EmbedColor::Blue => 0x3498DB,
            EmbedColor::Green => 0x57F287,
            EmbedColor::Red => 0xED4245,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSpec {
    pub title: Option<String>,
    pub description: String,
    pub color: EmbedColor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub description: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentSpec {
    SelectMenu {
        custom_id: String,
        placeholder: Option<String>,
        options: Vec<SelectOption>,
    },
    Button {
        custom_id: String,
        label: String,
        style: ButtonStyle,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<EmbedSpec>,
    /// Rendered as a single action row.
    pub components: Vec<ComponentSpec>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: EmbedSpec) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub channel_id: String,
    pub message_id: String,
}
