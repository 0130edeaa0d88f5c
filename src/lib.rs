//! Desktop client for forum direct messages.
//!
//! A conversation is mounted per counterpart: a background task polls the
//! REST backend and streams full snapshots to the egui view, which groups
//! them by day and composes text or image messages.

pub mod common;
pub mod config;
pub mod conversation;
pub mod error;
pub mod network;
pub mod storage;
pub mod ui;

pub use error::{ClientError, Result};
