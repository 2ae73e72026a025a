pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod resolve;
pub mod trust;
pub mod validate;

pub use config::{CrawlConfig, FilterMode};
pub use crawler::{Crawler, DiscoveryCallback};
pub use error::{CrawlError, Result};
pub use trust::{TrustPrompt, TrustState};
