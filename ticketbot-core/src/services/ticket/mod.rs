// File: ticketbot-core/src/services/ticket/mod.rs

pub mod commands;
pub mod events;
pub mod handler;
pub mod messages;
pub mod naming;
pub mod notify;

pub use events::{
    Actor, ButtonPressed, CommandInvoked, CommandOption, CommandOptionValue, SelectionMade,
    TicketEvent,
};
pub use handler::{TicketHandler, TicketOutcome};
pub use notify::NotificationReport;
