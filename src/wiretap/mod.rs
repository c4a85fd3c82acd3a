//! # Wiretap
//!
//! Time-bounded audit snapshots of events as they pass flow components.
//! Records are immutable once built; storing and purging them belongs to
//! the audit store.

pub mod errors;
pub mod event;
pub mod factory;
pub mod serialiser;

pub use errors::{WiretapError, WiretapResult};
pub use event::WiretapEvent;
pub use factory::{WiretapEventFactory, WiretapEventFactoryBuilder};
pub use serialiser::{JsonSerialiser, RawSerialiser, WiretapSerialiser};
