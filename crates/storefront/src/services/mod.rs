//! Outbound notification services.

pub mod receipts;

pub use receipts::ReceiptClient;
