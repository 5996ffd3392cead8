//! Daily Word - SMS word-of-the-day service
//!
//! Texts an uppercased word of the day to every subscribed phone number once a
//! day, and exposes a small HTTP API for managing the subscriber list.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod schedule;
pub mod server;
pub mod sms;
pub mod store;
pub mod words;

pub use error::{Error, Result};
