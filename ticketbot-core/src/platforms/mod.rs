// File: src/platforms/mod.rs

pub mod discord;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}
