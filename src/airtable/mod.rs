pub mod client;
pub mod error;
pub mod types;

pub use client::{AirtableClient, MAX_PAGE_SIZE, RecordStore};
pub use error::AirtableError;
pub use types::Record;
