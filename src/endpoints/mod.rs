//! One module per REST resource: models and checks in `mod.rs`, the async
//! calls in `calls.rs`.

pub mod auth;
pub mod examples;
pub mod media;
pub mod projects;
pub mod questions;
pub mod ratings;
pub mod sessions;
