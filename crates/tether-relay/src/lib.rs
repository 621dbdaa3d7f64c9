//! tether-relay - Callback relay for native libraries with their own threads
//!
//! Features:
//! - Single-slot handoff off the foreign callback thread
//! - Relay thread that turns raw callbacks into typed events
//! - Dispatcher that runs handlers only on the consuming thread
//! - Blocking waits that also drive the library's internal pump
//!
//! ```text
//! foreign thread -> handoff -> relay thread -> event queue -> dispatcher -> handlers
//!                                                                       \-> wait_for
//! ```

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handoff;
pub mod relay;
pub mod wait;

#[cfg(test)]
mod test_support;

pub use dispatcher::{Dispatched, Dispatcher, EventSender};
pub use error::{ConversionError, RelayError};
pub use event::{Event, HandlerId, Wake};
pub use handoff::{HandoffConsumer, HandoffProducer, handoff};
pub use relay::RelayHandle;
pub use wait::{DEFAULT_MAX_INTERVAL, Pump, WaitCoordinator};
