//! Middleware modules and request extractors.

pub mod client_id;
pub mod error;
