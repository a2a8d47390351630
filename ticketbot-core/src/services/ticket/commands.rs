use ticketbot_common::models::{CommandOptionKind, CommandOptionSpec, CommandSpec};

pub const SETUP_COMMAND: &str = "setup-ticket";
pub const SETUP_CHANNEL_OPTION: &str = "channel";

/// The guild command set this bot owns.
pub fn ticket_commands() -> Vec<CommandSpec> {
    vec![CommandSpec {
        name: SETUP_COMMAND.to_string(),
        description: "Sets up the ticket system embed message".to_string(),
        options: vec![CommandOptionSpec {
            name: SETUP_CHANNEL_OPTION.to_string(),
            description: "The channel to send the embed message to".to_string(),
            kind: CommandOptionKind::Channel,
            required: true,
        }],
        admin_only: true,
    }]
}
