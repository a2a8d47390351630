use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A category users can open tickets in. `category_id` is the id of the
/// category channel new tickets are created under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCategory {
    pub label: String,
    pub description: String,
    pub category_id: String,
}

/// A close that has been acknowledged but whose channel deletion has not run yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeletion {
    pub id: Uuid,
    pub channel_id: String,
    pub requested_by: String,
    pub due_at: DateTime<Utc>,
}

impl PendingDeletion {
    pub fn new(channel_id: &str, requested_by: &str, due_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_id: channel_id.to_string(),
            requested_by: requested_by.to_string(),
            due_at,
        }
    }
}

/// Handle used to answer an interaction privately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRef {
    pub id: String,
    pub token: String,
}
