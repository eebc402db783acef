use crate::framework::DatabaseProcessor;
use compact_str::CompactString;
use kanau::processor::Processor;
use mailcast_sdk::objects::DeliveryStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiptWriteError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The update matched no receipt row.
    #[error("no receipt for campaign {campaign_id} and donor {donor_id}")]
    NoMatchingReceipt {
        campaign_id: CompactString,
        donor_id: CompactString,
    },
}

#[derive(Debug, Clone)]
/// Record the latest email status and SES message id of one receipt.
pub struct UpdateReceiptEmailStatus {
    pub campaign_id: CompactString,
    pub donor_id: CompactString,
    pub email_id: CompactString,
    pub status: DeliveryStatus,
}

impl Processor<UpdateReceiptEmailStatus> for DatabaseProcessor {
    type Output = ();
    type Error = ReceiptWriteError;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateReceiptEmailStatus")]
    async fn process(&self, cmd: UpdateReceiptEmailStatus) -> Result<(), ReceiptWriteError> {
        let result = sqlx::query(
            r#"
            UPDATE receipts
            SET email_status = $1,
                email_id = $2
            WHERE campaign_id = $3 AND donor_id = $4
            "#,
        )
        .bind(cmd.status.as_str())
        .bind(cmd.email_id.as_str())
        .bind(cmd.campaign_id.as_str())
        .bind(cmd.donor_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ReceiptWriteError::NoMatchingReceipt {
                campaign_id: cmd.campaign_id,
                donor_id: cmd.donor_id,
            });
        }
        Ok(())
    }
}
