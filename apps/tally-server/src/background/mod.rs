//! Background processing - the save loop and its shutdown handshake.

mod lifecycle;

pub use lifecycle::{Lifecycle, LifecycleConfig};
