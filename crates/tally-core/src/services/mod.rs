//! Services - orchestration over the domain and the ports.

mod persistence;

pub use persistence::{LoadSummary, PersistenceGateway, SaveOutcome};
