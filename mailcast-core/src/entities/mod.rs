pub mod receipts;

pub use receipts::{ReceiptWriteError, UpdateReceiptEmailStatus};
