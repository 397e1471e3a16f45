//! # Tally Core
//!
//! The domain layer of the click tally service.
//! This crate holds the counter store, the leaderboard builder and the
//! persistence gateway, plus the ports that infrastructure implements.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::StoreError;
