//! Background processors.
//!
//! - `StatusWriter`: Receives `ReceiptStatusUpdate`, writes it to the receipts table

pub mod status_writer;

pub use status_writer::{ReceiptStatusStore, StatusWriter};
