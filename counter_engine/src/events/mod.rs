//! Domain events and the hook system that fans them out.
//!
//! Three events make up the live-update channel: `order:created`, `order:updated` and `queue:updated` (see
//! [`EventType`]). A fourth, [`RefundFailedEvent`], is aimed at operators and is raised when a refund owed to a
//! customer could not be issued.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
