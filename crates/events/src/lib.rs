//! Domain events and their distribution.
//!
//! Events are facts appended to a user's stream; once committed they are
//! wrapped in an [`EventEnvelope`] and fanned out over an [`EventBus`].

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
