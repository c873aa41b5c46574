pub mod client;
pub mod error;
pub mod extract;

pub use client::{PageClient, PageFetcher};
pub use error::ScraperError;
pub use extract::extract_friend_records;
