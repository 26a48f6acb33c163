//! Core domain types and the contracts of the rate cascade

pub mod cache;
pub mod config;
pub mod context;
pub mod currency;
pub mod error;
pub mod log;
pub mod provider;
pub mod store;
pub mod validate;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use context::{CallContext, Interrupted};
pub use currency::{Currency, RateSnapshot};
pub use error::{ErrorKind, RateError, ValidationError};
pub use provider::RateProvider;
pub use store::CurrencyStore;
