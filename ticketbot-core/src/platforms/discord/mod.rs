// File: ticketbot-core/src/platforms/discord/mod.rs

pub mod api_impl;
pub mod convert;
pub mod interaction;
pub mod runtime;

pub use runtime::{DiscordGateway, DiscordPlatform};
