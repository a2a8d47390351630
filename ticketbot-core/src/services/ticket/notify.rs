// File: ticketbot-core/src/services/ticket/notify.rs
//
// Staff notification fan-out for newly opened tickets.

use futures_util::stream::{self, StreamExt};
use tracing::{error, info, warn};

use ticketbot_common::models::{MemberInfo, OutgoingMessage};
use ticketbot_common::traits::TicketPlatform;

use crate::config::AdminAudience;

/// Per-recipient outcome of one notification round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationReport {
    pub delivered: Vec<String>,
    /// `(user_id, reason)`
    pub failed: Vec<(String, String)>,
}

impl NotificationReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Work out who gets notified. Lookup failures are logged and yield nobody.
pub async fn resolve_audience(
    platform: &dyn TicketPlatform,
    audience: AdminAudience,
    admin_role_id: &str,
) -> Vec<MemberInfo> {
    let members = match audience {
        AdminAudience::Role => match platform.list_role_members(admin_role_id).await {
            Ok(Some(members)) => members,
            Ok(None) => {
                error!("Admin role {admin_role_id} not found; no staff will be notified");
                Vec::new()
            }
            Err(e) => {
                error!("Could not list members of admin role {admin_role_id}: {e}");
                Vec::new()
            }
        },
        AdminAudience::Permission => match platform.list_administrators().await {
            Ok(members) => members,
            Err(e) => {
                error!("Could not list administrators: {e}");
                Vec::new()
            }
        },
    };

    let mut seen = std::collections::HashSet::new();
    members
        .into_iter()
        .filter(|m| seen.insert(m.user_id.clone()))
        .collect()
}

/// DM `message` to every recipient, at most `concurrency` at a time.
/// Never fails; the report says who was reached.
pub async fn fan_out(
    platform: &dyn TicketPlatform,
    recipients: &[MemberInfo],
    message: &OutgoingMessage,
    concurrency: usize,
) -> NotificationReport {
    let sends: Vec<_> = recipients
        .iter()
        .map(|member| async move {
            let outcome = platform.send_direct_message(&member.user_id, message).await;
            (member, outcome)
        })
        .collect();
    let results: Vec<(&MemberInfo, Result<(), crate::Error>)> = stream::iter(sends)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = NotificationReport::default();
    for (member, outcome) in results {
        match outcome {
            Ok(()) => report.delivered.push(member.user_id.clone()),
            Err(e) => report
                .failed
                .push((member.user_id.clone(), format!("{} ({e})", member.username))),
        }
    }

    if report.failed.is_empty() {
        info!("Ticket notification delivered to {} staff member(s)", report.delivered.len());
    } else {
        let failures: Vec<String> = report
            .failed
            .iter()
            .map(|(id, reason)| format!("{id}: {reason}"))
            .collect();
        warn!(
            "Ticket notification delivered to {}/{} staff member(s); failed: [{}]",
            report.delivered.len(),
            report.attempted(),
            failures.join(", ")
        );
    }
    report
}
