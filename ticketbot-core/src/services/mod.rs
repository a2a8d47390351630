// File: ticketbot-core/src/services/mod.rs

pub mod session;
pub mod ticket;

pub use session::PlatformSession;
pub use ticket::{TicketEvent, TicketHandler, TicketOutcome};
