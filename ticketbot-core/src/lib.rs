// ticketbot-core/src/lib.rs

pub mod config;
pub mod platforms;
pub mod services;
pub mod tasks;
pub mod utils;

pub use config::BotConfig;
pub use ticketbot_common::error::Error;
