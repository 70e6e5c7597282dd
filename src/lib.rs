//! Last.fm Notifier Library
//!
//! Polls Last.fm for followed users' latest scrobbles and relays new tracks
//! to a chat channel. Modules are exposed for the binary and integration tests.

pub mod commands;
pub mod config;
pub mod detector;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod test_utils;
