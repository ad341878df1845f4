//! Typed client and terminal rating desk for a human-in-the-loop rating platform.

pub mod cache;
pub mod client;
pub mod config;
pub mod desk;
pub mod endpoints;
pub mod error;
pub mod evaluation;
pub mod guard;
pub mod media;
pub mod shortcuts;
pub mod store;
pub mod timestamp;

pub use client::ApiClient;
pub use config::Config;
pub use error::{ApiError, ValidationError};
pub use store::Store;
