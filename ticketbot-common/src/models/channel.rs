use serde::{Deserialize, Serialize};

/// The subset of channel kinds the ticket flow cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Text,
    Announcement,
    Thread,
    Voice,
    Stage,
    Category,
    Forum,
    DirectMessage,
    Other,
}

impl ChannelKind {
    /// Guild text channels that can carry the ticket menu.
    pub fn is_text_capable(&self) -> bool {
        matches!(
            self,
            ChannelKind::Text | ChannelKind::Announcement | ChannelKind::Thread
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: String,
    pub username: String,
}

/// Guild permissions the ticket flow grants, denies or checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    ViewChannel,
    SendMessages,
    ReadMessageHistory,
    Administrator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteTarget {
    /// The guild's default role (`@everyone`).
    EveryoneRole,
    Role(String),
    Member(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub target: OverwriteTarget,
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChannelRequest {
    pub name: String,
    pub parent_id: String,
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_guild_text_channels_are_text_capable() {
        assert!(ChannelKind::Text.is_text_capable());
        assert!(ChannelKind::Announcement.is_text_capable());
        assert!(!ChannelKind::Category.is_text_capable());
        assert!(!ChannelKind::Forum.is_text_capable());
        assert!(!ChannelKind::Other.is_text_capable());
        assert!(!ChannelKind::Voice.is_text_capable());
        assert!(!ChannelKind::Stage.is_text_capable());
        assert!(!ChannelKind::DirectMessage.is_text_capable());
    }
}
