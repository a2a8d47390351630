// File: ticketbot-core/src/tasks/channel_deletion.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ticketbot_common::models::PendingDeletion;
use ticketbot_common::traits::TicketPlatform;

use crate::Error;
use crate::tasks::deletion_store::PendingDeletionStore;

/// Deletes ticket channels after a grace delay.
///
/// Every scheduled deletion is written to a [`PendingDeletionStore`] before
/// its timer is armed and removed once the delete call has returned, so
/// [`DeletionScheduler::rearm`] can pick up whatever a previous process left
/// behind. If the store cannot be written the timer is armed anyway. A
/// failed delete is logged and not retried.
pub struct DeletionScheduler {
    platform: Arc<dyn TicketPlatform>,
    store: Arc<dyn PendingDeletionStore>,
    armed: Arc<DashMap<String, (Uuid, JoinHandle<()>)>>,
    schedule_lock: Mutex<()>,
}

impl DeletionScheduler {
    pub fn new(platform: Arc<dyn TicketPlatform>, store: Arc<dyn PendingDeletionStore>) -> Self {
        Self {
            platform,
            store,
            armed: Arc::new(DashMap::new()),
            schedule_lock: Mutex::new(()),
        }
    }

    /// Schedule `channel_id` for deletion after `delay`. If a deletion is
    /// already pending for the channel, the existing record is returned and
    /// nothing new is armed.
    pub async fn schedule(
        &self,
        channel_id: &str,
        requested_by: &str,
        delay: Duration,
    ) -> Result<PendingDeletion, Error> {
        let _guard = self.schedule_lock.lock().await;

        match self.store.get(channel_id).await {
            Ok(Some(existing)) if self.is_armed(channel_id) => {
                debug!(
                    "Deletion of channel {channel_id} already pending (due {})",
                    existing.due_at
                );
                return Ok(existing);
            }
            Ok(_) => {}
            Err(e) => warn!("Could not look up pending deletion for channel {channel_id}: {e}"),
        }

        let due_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| Error::Parse(format!("close delay of {delay:?} is out of range")))?;
        let record = PendingDeletion::new(channel_id, requested_by, due_at);
        // An unpersisted deletion still runs, it just won't survive a restart.
        if let Err(e) = self.store.insert(&record).await {
            warn!("Could not persist pending deletion for channel {channel_id}: {e}");
        }
        self.arm(record.clone(), delay);

        info!(
            "Channel {channel_id} scheduled for deletion in {}ms (requested by {requested_by})",
            delay.as_millis()
        );
        Ok(record)
    }

    /// Cancel a pending deletion. Returns `false` if none was pending.
    pub async fn cancel(&self, channel_id: &str) -> Result<bool, Error> {
        let _guard = self.schedule_lock.lock().await;

        let was_armed = match self.armed.remove(channel_id) {
            Some((_, (_, handle))) => {
                handle.abort();
                true
            }
            None => false,
        };
        let was_stored = self.store.remove(channel_id).await?.is_some();
        if was_armed || was_stored {
            info!("Cancelled pending deletion of channel {channel_id}");
        }
        Ok(was_armed || was_stored)
    }

    /// Arm a timer for every stored record that is not armed yet. Records
    /// whose due time has passed fire immediately. Returns how many were armed.
    pub async fn rearm(&self) -> Result<usize, Error> {
        let _guard = self.schedule_lock.lock().await;

        let mut count = 0;
        for record in self.store.list().await? {
            if self.is_armed(&record.channel_id) {
                continue;
            }
            let remaining = (record.due_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            debug!(
                "Re-arming deletion of channel {} ({}ms remaining)",
                record.channel_id,
                remaining.as_millis()
            );
            self.arm(record, remaining);
            count += 1;
        }
        if count > 0 {
            info!("Re-armed {count} pending channel deletion(s)");
        }
        Ok(count)
    }

    pub async fn pending(&self) -> Result<Vec<PendingDeletion>, Error> {
        self.store.list().await
    }

    /// Stop every armed timer but keep the records, so the next process can
    /// re-arm them.
    pub fn shutdown(&self) {
        let channels: Vec<String> = self.armed.iter().map(|e| e.key().clone()).collect();
        for channel_id in channels {
            if let Some((_, (_, handle))) = self.armed.remove(&channel_id) {
                handle.abort();
            }
        }
    }

    fn is_armed(&self, channel_id: &str) -> bool {
        self.armed
            .get(channel_id)
            .map(|entry| !entry.value().1.is_finished())
            .unwrap_or(false)
    }

    fn arm(&self, record: PendingDeletion, delay: Duration) {
        let platform = self.platform.clone();
        let store = self.store.clone();
        let armed = self.armed.clone();
        let record_id = record.id;
        let channel_id = record.channel_id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run_deletion(platform.as_ref(), store.as_ref(), &record).await;
            armed.remove_if(&record.channel_id, |_, (id, _)| *id == record.id);
        });

        if let Some((_, old)) = self.armed.insert(channel_id, (record_id, handle)) {
            old.abort();
        }
    }
}

async fn run_deletion(
    platform: &dyn TicketPlatform,
    store: &dyn PendingDeletionStore,
    record: &PendingDeletion,
) {
    match platform.delete_channel(&record.channel_id).await {
        Ok(()) => info!("Deleted ticket channel {}", record.channel_id),
        Err(Error::NotFound(_)) => {
            info!("Ticket channel {} was already deleted", record.channel_id)
        }
        Err(e) => error!(
            "Failed to delete ticket channel {}: {e}. The channel stays open and needs manual cleanup.",
            record.channel_id
        ),
    }

    if let Err(e) = store.remove(&record.channel_id).await {
        warn!(
            "Could not clear pending deletion record for channel {}: {e}",
            record.channel_id
        );
    }
}
