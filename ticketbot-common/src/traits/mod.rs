pub mod api;

pub use api::TicketPlatform;
#[cfg(feature = "mocks")]
pub use api::MockTicketPlatform;
