//! Recolor - palette remapping service
//!
//! Accepts image uploads over HTTP, queues them and converts each one to a
//! user-supplied color palette in the background.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
