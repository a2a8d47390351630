// File: ticketbot-core/src/platforms/discord/convert.rs
//
// Translation between the platform-neutral models and twilight types.

use twilight_http::error::{Error as HttpError, ErrorType};
use twilight_model::application::command::{Command, CommandType};
use twilight_model::channel::message::component::{
    ActionRow, Button, ButtonStyle as TwilightButtonStyle, Component, SelectMenu,
    SelectMenuOption, SelectMenuType,
};
use twilight_model::channel::message::{Embed, MessageFlags};
use twilight_model::channel::permission_overwrite::{
    PermissionOverwrite as TwilightOverwrite, PermissionOverwriteType,
};
use twilight_model::channel::{Channel, ChannelType};
use twilight_model::guild::{Member, Permissions};
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, RoleMarker, UserMarker};
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder};
use twilight_util::builder::embed::EmbedBuilder;

use ticketbot_common::models::{
    ButtonStyle, ChannelInfo, ChannelKind, CommandOptionKind, CommandSpec, ComponentSpec,
    EmbedSpec, MemberInfo, OverwriteTarget, Permission, PermissionOverwrite,
};

use crate::Error;

const ALL_PERMISSIONS: [Permission; 4] = [
    Permission::ViewChannel,
    Permission::SendMessages,
    Permission::ReadMessageHistory,
    Permission::Administrator,
];

/// Parse a snowflake string into a typed id.
pub fn parse_id<T>(what: &str, raw: &str) -> Result<Id<T>, Error> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::Parse(format!("invalid {what} id: '{raw}'")))
}

pub fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::GuildText => ChannelKind::Text,
        ChannelType::GuildAnnouncement => ChannelKind::Announcement,
        ChannelType::AnnouncementThread
        | ChannelType::PublicThread
        | ChannelType::PrivateThread => ChannelKind::Thread,
        ChannelType::GuildVoice => ChannelKind::Voice,
        ChannelType::GuildStageVoice => ChannelKind::Stage,
        ChannelType::GuildCategory => ChannelKind::Category,
        ChannelType::GuildForum | ChannelType::GuildMedia => ChannelKind::Forum,
        ChannelType::Private | ChannelType::Group => ChannelKind::DirectMessage,
        _ => ChannelKind::Other,
    }
}

pub fn channel_info(channel: &Channel) -> ChannelInfo {
    ChannelInfo {
        channel_id: channel.id.to_string(),
        name: channel.name.clone().unwrap_or_default(),
        kind: channel_kind(channel.kind),
        parent_id: channel.parent_id.map(|id| id.to_string()),
    }
}

pub fn member_info(member: &Member) -> MemberInfo {
    MemberInfo {
        user_id: member.user.id.to_string(),
        username: member.user.name.clone(),
    }
}

pub fn permission_flag(permission: Permission) -> Permissions {
    match permission {
        Permission::ViewChannel => Permissions::VIEW_CHANNEL,
        Permission::SendMessages => Permissions::SEND_MESSAGES,
        Permission::ReadMessageHistory => Permissions::READ_MESSAGE_HISTORY,
        Permission::Administrator => Permissions::ADMINISTRATOR,
    }
}

pub fn to_permissions(permissions: &[Permission]) -> Permissions {
    permissions
        .iter()
        .fold(Permissions::empty(), |acc, p| acc | permission_flag(*p))
}

/// The permissions we model that are present in `flags`.
pub fn from_permissions(flags: Permissions) -> Vec<Permission> {
    ALL_PERMISSIONS
        .into_iter()
        .filter(|p| flags.contains(permission_flag(*p)))
        .collect()
}

pub fn to_overwrites(
    guild_id: Id<GuildMarker>,
    overwrites: &[PermissionOverwrite],
) -> Result<Vec<TwilightOverwrite>, Error> {
    overwrites
        .iter()
        .map(|overwrite| {
            let (id, kind) = match &overwrite.target {
                // The @everyone role shares the guild's id.
                OverwriteTarget::EveryoneRole => (guild_id.cast(), PermissionOverwriteType::Role),
                OverwriteTarget::Role(role) => (
                    parse_id::<RoleMarker>("role", role)?.cast(),
                    PermissionOverwriteType::Role,
                ),
                OverwriteTarget::Member(user) => (
                    parse_id::<UserMarker>("user", user)?.cast(),
                    PermissionOverwriteType::Member,
                ),
            };
            Ok(TwilightOverwrite {
                allow: to_permissions(&overwrite.allow),
                deny: to_permissions(&overwrite.deny),
                id,
                kind,
            })
        })
        .collect()
}

pub fn to_embed(spec: &EmbedSpec) -> Embed {
    let mut builder = EmbedBuilder::new()
        .description(spec.description.clone())
        .color(spec.color.rgb());
    if let Some(title) = &spec.title {
        builder = builder.title(title.clone());
    }
    builder.build()
}

fn button_style(style: ButtonStyle) -> TwilightButtonStyle {
    match style {
        ButtonStyle::Primary => TwilightButtonStyle::Primary,
        ButtonStyle::Secondary => TwilightButtonStyle::Secondary,
        ButtonStyle::Success => TwilightButtonStyle::Success,
        ButtonStyle::Danger => TwilightButtonStyle::Danger,
    }
}

fn to_component(spec: &ComponentSpec) -> Component {
    match spec {
        ComponentSpec::SelectMenu {
            custom_id,
            placeholder,
            options,
        } => Component::SelectMenu(SelectMenu {
            channel_types: None,
            custom_id: custom_id.clone(),
            default_values: None,
            disabled: false,
            kind: SelectMenuType::Text,
            max_values: Some(1),
            min_values: Some(1),
            options: Some(
                options
                    .iter()
                    .map(|option| SelectMenuOption {
                        default: false,
                        description: option.description.clone(),
                        emoji: None,
                        label: option.label.clone(),
                        value: option.value.clone(),
                    })
                    .collect(),
            ),
            placeholder: placeholder.clone(),
        }),
        ComponentSpec::Button {
            custom_id,
            label,
            style,
        } => Component::Button(Button {
            custom_id: Some(custom_id.clone()),
            disabled: false,
            emoji: None,
            label: Some(label.clone()),
            style: button_style(*style),
            url: None,
            sku_id: None,
        }),
    }
}

/// All components go into one action row.
pub fn to_components(specs: &[ComponentSpec]) -> Vec<Component> {
    if specs.is_empty() {
        return Vec::new();
    }
    vec![Component::ActionRow(ActionRow {
        components: specs.iter().map(to_component).collect(),
    })]
}

pub fn to_command(spec: &CommandSpec) -> Command {
    let mut builder = CommandBuilder::new(
        spec.name.clone(),
        spec.description.clone(),
        CommandType::ChatInput,
    );
    for option in &spec.options {
        builder = match option.kind {
            CommandOptionKind::Channel => builder.option(
                ChannelBuilder::new(option.name.clone(), option.description.clone())
                    .required(option.required)
                    .channel_types([ChannelType::GuildText, ChannelType::GuildAnnouncement]),
            ),
        };
    }
    if spec.admin_only {
        builder = builder.default_member_permissions(Permissions::ADMINISTRATOR);
    }
    builder.build()
}

pub fn ephemeral_response(text: &str) -> InteractionResponse {
    InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .content(text)
                .flags(MessageFlags::EPHEMERAL)
                .build(),
        ),
    }
}

pub fn http_status(err: &HttpError) -> Option<u16> {
    match err.kind() {
        ErrorType::Response { status, .. } => Some(status.get()),
        _ => None,
    }
}

/// 403 and 404 get their own variants; everything else is a generic platform error.
pub fn map_http_error(context: &str, err: HttpError) -> Error {
    match http_status(&err) {
        Some(403) => Error::PermissionDenied(format!("{context}: {err}")),
        Some(404) => Error::NotFound(format!("{context}: {err}")),
        _ => Error::Platform(format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketbot_common::models::{EmbedColor, SelectOption};
    use twilight_model::id::marker::ChannelMarker;

    #[test]
    fn parses_snowflakes() {
        let id: Id<ChannelMarker> = parse_id("channel", " 42 ").unwrap();
        assert_eq!(id.get(), 42);
        assert!(parse_id::<ChannelMarker>("channel", "0").is_err());
        assert!(parse_id::<ChannelMarker>("channel", "general").is_err());
    }

    #[test]
    fn maps_channel_types() {
        assert_eq!(channel_kind(ChannelType::GuildCategory), ChannelKind::Category);
        assert_eq!(channel_kind(ChannelType::GuildText), ChannelKind::Text);
        assert_eq!(channel_kind(ChannelType::PublicThread), ChannelKind::Thread);
        assert!(!channel_kind(ChannelType::GuildForum).is_text_capable());
    }

    #[test]
    fn permissions_round_trip_through_flags() {
        let flags = to_permissions(&[Permission::ViewChannel, Permission::SendMessages]);
        assert_eq!(flags, Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES);
        assert_eq!(
            from_permissions(Permissions::ADMINISTRATOR),
            vec![Permission::Administrator]
        );
        assert!(from_permissions(Permissions::empty()).is_empty());
    }

    #[test]
    fn everyone_overwrite_uses_guild_id() {
        let guild: Id<GuildMarker> = Id::new(500);
        let overwrites = to_overwrites(
            guild,
            &[
                PermissionOverwrite {
                    target: OverwriteTarget::EveryoneRole,
                    allow: vec![],
                    deny: vec![Permission::ViewChannel],
                },
                PermissionOverwrite {
                    target: OverwriteTarget::Member("77".into()),
                    allow: vec![
                        Permission::ViewChannel,
                        Permission::SendMessages,
                        Permission::ReadMessageHistory,
                    ],
                    deny: vec![],
                },
            ],
        )
        .unwrap();

        assert_eq!(overwrites[0].id.get(), 500);
        assert_eq!(overwrites[0].kind, PermissionOverwriteType::Role);
        assert_eq!(overwrites[0].allow, Permissions::empty());
        assert_eq!(overwrites[0].deny, Permissions::VIEW_CHANNEL);

        assert_eq!(overwrites[1].id.get(), 77);
        assert_eq!(overwrites[1].kind, PermissionOverwriteType::Member);
        assert_eq!(
            overwrites[1].allow,
            Permissions::VIEW_CHANNEL
                | Permissions::SEND_MESSAGES
                | Permissions::READ_MESSAGE_HISTORY
        );
        assert_eq!(overwrites[1].deny, Permissions::empty());
    }

    #[test]
    fn components_share_one_row() {
        let rows = to_components(&[ComponentSpec::SelectMenu {
            custom_id: "menu".into(),
            placeholder: None,
            options: vec![SelectOption {
                label: "General".into(),
                description: None,
                value: "1".into(),
            }],
        }]);
        assert_eq!(rows.len(), 1);
        let Component::ActionRow(row) = &rows[0] else {
            panic!("expected an action row");
        };
        let Component::SelectMenu(menu) = &row.components[0] else {
            panic!("expected a select menu");
        };
        assert_eq!(menu.custom_id, "menu");
        assert_eq!(menu.options.as_ref().map(Vec::len), Some(1));
        assert!(to_components(&[]).is_empty());
    }

    #[test]
    fn embed_carries_color_and_optional_title() {
        let embed = to_embed(&EmbedSpec {
            title: None,
            description: "hello".into(),
            color: EmbedColor::Green,
        });
        assert_eq!(embed.title, None);
        assert_eq!(embed.description.as_deref(), Some("hello"));
        assert_eq!(embed.color, Some(EmbedColor::Green.rgb()));
    }

    #[test]
    fn admin_only_commands_require_administrator() {
        let command = to_command(&crate::services::ticket::commands::ticket_commands()[0]);
        assert_eq!(command.name, "setup-ticket");
        assert_eq!(command.default_member_permissions, Some(Permissions::ADMINISTRATOR));
        assert_eq!(command.options.len(), 1);
        assert!(command.options[0].required.unwrap_or(false));
    }
}
