//! StatusWriter processor.
//!
//! The StatusWriter is responsible for:
//! - Receiving `ReceiptStatusUpdate` from the queue
//! - Writing the status and email id back to the matching receipt
//! - Logging failures without retrying or stopping
//!
//! Write-back is best effort. A receipt that does not exist (yet) is a
//! warning, not an error: SES can report on emails sent outside the
//! receipt flow.

use crate::entities::{ReceiptWriteError, UpdateReceiptEmailStatus};
use crate::events::{ReceiptStatusUpdate, StatusUpdateReceiver};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Storage for receipt email statuses.
#[async_trait]
pub trait ReceiptStatusStore: Send + Sync {
    async fn write_status(&self, update: ReceiptStatusUpdate) -> Result<(), ReceiptWriteError>;
}

#[async_trait]
impl ReceiptStatusStore for DatabaseProcessor {
    async fn write_status(&self, update: ReceiptStatusUpdate) -> Result<(), ReceiptWriteError> {
        self.process(UpdateReceiptEmailStatus {
            campaign_id: update.campaign_id,
            donor_id: update.donor_id,
            email_id: update.email_id,
            status: update.status,
        })
        .await
    }
}

/// Drains the write-back queue into a [`ReceiptStatusStore`].
pub struct StatusWriter {
    store: Arc<dyn ReceiptStatusStore>,
    status_rx: StatusUpdateReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl StatusWriter {
    pub fn new(
        store: Arc<dyn ReceiptStatusStore>,
        status_rx: StatusUpdateReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            status_rx,
            shutdown_rx,
        }
    }

    /// Run until shutdown or until every sender is dropped.
    pub async fn run(mut self) {
        info!("StatusWriter started");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("StatusWriter received shutdown signal");
                        break;
                    }
                }

                update = self.status_rx.recv() => match update {
                    Some(update) => self.write(update).await,
                    None => {
                        info!("ReceiptStatusUpdate channel closed");
                        break;
                    }
                },
            }
        }

        info!("StatusWriter shutdown complete");
    }

    async fn write(&self, update: ReceiptStatusUpdate) {
        debug!(
            campaign_id = %update.campaign_id,
            donor_id = %update.donor_id,
            status = %update.status,
            "Writing receipt status"
        );
        let (campaign_id, donor_id, email_id, status) = (
            update.campaign_id.clone(),
            update.donor_id.clone(),
            update.email_id.clone(),
            update.status,
        );
        match self.store.write_status(update).await {
            Ok(()) => {}
            Err(e @ ReceiptWriteError::NoMatchingReceipt { .. }) => {
                warn!(error = %e, %email_id, %status, "Receipt status not recorded");
            }
            Err(e) => {
                error!(
                    error = %e,
                    %campaign_id,
                    %donor_id,
                    %email_id,
                    %status,
                    "Failed to write receipt status"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::status_update_channel;
    use mailcast_sdk::objects::DeliveryStatus;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<ReceiptStatusUpdate>>,
    }

    #[async_trait]
    impl ReceiptStatusStore for RecordingStore {
        async fn write_status(
            &self,
            update: ReceiptStatusUpdate,
        ) -> Result<(), ReceiptWriteError> {
            let unknown = update.donor_id == "unknown";
            self.writes.lock().unwrap().push(update.clone());
            if unknown {
                return Err(ReceiptWriteError::NoMatchingReceipt {
                    campaign_id: update.campaign_id,
                    donor_id: update.donor_id,
                });
            }
            Ok(())
        }
    }

    fn update(donor: &str, status: DeliveryStatus) -> ReceiptStatusUpdate {
        ReceiptStatusUpdate {
            campaign_id: "c1".into(),
            donor_id: donor.into(),
            email_id: "e1".into(),
            status,
        }
    }

    #[tokio::test]
    async fn test_continues_after_missing_receipt() {
        let store = Arc::new(RecordingStore::default());
        let (tx, rx) = status_update_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let writer = StatusWriter::new(store.clone(), rx, shutdown_rx);

        tx.send(update("unknown", DeliveryStatus::Sent)).await.unwrap();
        tx.send(update("d1", DeliveryStatus::Delivered)).await.unwrap();
        drop(tx);

        writer.run().await;

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1], update("d1", DeliveryStatus::Delivered));
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let store = Arc::new(RecordingStore::default());
        let (_tx, rx) = status_update_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(StatusWriter::new(store.clone(), rx, shutdown_rx).run());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("writer did not stop")
            .unwrap();
        assert!(store.writes.lock().unwrap().is_empty());
    }
}
