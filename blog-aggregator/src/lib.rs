pub mod types;
pub mod config;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod identity;
pub mod extract;
pub mod filter;
pub mod render;
pub mod existing;
pub mod processor;
pub mod authors;
pub mod aggregator;

pub use types::*;
pub use config::{AggregatorConfig, FeedPolicy, Settings};
pub use traits::FeedSource;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use processor::FeedProcessor;
pub use authors::{AuthorEntry, AuthorIndex};
pub use aggregator::BlogAggregator;
