//! Event channel factories and handles.

use super::types::ReceiptStatusUpdate;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for ReceiptStatusUpdate events.
pub type StatusUpdateSender = mpsc::Sender<ReceiptStatusUpdate>;
/// Receiver handle for ReceiptStatusUpdate events.
pub type StatusUpdateReceiver = mpsc::Receiver<ReceiptStatusUpdate>;

/// Create a new ReceiptStatusUpdate channel.
///
/// Returns a (sender, receiver) pair. Multiple senders can be cloned from
/// the returned sender; the single receiver belongs to the `StatusWriter`.
pub fn status_update_channel() -> (StatusUpdateSender, StatusUpdateReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
