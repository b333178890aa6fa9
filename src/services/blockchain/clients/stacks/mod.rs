mod client;
mod feed;

pub use client::{IndexingRetry, StacksClient, StacksClientTrait};
pub use feed::StacksAddressFeed;
