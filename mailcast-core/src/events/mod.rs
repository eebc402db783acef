//! Event types and channel plumbing.
//!
//! # Event Flow
//!
//! 1. `POST /publish` decodes a notification into a [`NormalizedEvent`]
//!    and publishes it on the campaign's [`ChannelState`](crate::broadcast::ChannelState).
//! 2. The same handler emits a [`ReceiptStatusUpdate`] -> `StatusWriter`,
//!    which writes the status back to the receipts table.
//!
//! The write-back queue is independent of fan-out: a slow database never
//! delays subscribers, and a slow subscriber never delays the database.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, StatusUpdateReceiver, StatusUpdateSender, status_update_channel,
};

pub use types::{NormalizedEvent, ReceiptStatusUpdate};
