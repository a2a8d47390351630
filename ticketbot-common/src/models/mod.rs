pub mod channel;
pub mod command;
pub mod message;
pub mod ticket;

pub use channel::{
    ChannelInfo, ChannelKind, CreateChannelRequest, MemberInfo, OverwriteTarget, Permission,
    PermissionOverwrite,
};
pub use command::{CommandOptionKind, CommandOptionSpec, CommandSpec};
pub use message::{
    ButtonStyle, ComponentSpec, EmbedColor, EmbedSpec, MessageHandle, OutgoingMessage,
    SelectOption,
};
pub use ticket::{InteractionRef, PendingDeletion, TicketCategory};
