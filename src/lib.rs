//! tether - blocking session API over a callback-driven native library
//!
//! The native library calls back from its own thread. Each callback is handed
//! to a relay thread through a single-slot handoff, converted into a
//! [`SessionEvent`], and queued for the thread that owns the [`Session`].
//! That thread dispatches events to registered handlers and can block on
//! conditions while still driving the library's internal pump.

pub mod config;
pub mod error;
pub mod events;
pub mod native;
pub mod session;

pub use config::SessionConfig;
pub use error::{NativeError, SessionError};
pub use events::{RawCallback, SessionEvent, SessionTag, convert_callback};
pub use native::{ConnectionState, NativeBackend, SimulatedBackend};
pub use session::{Session, TrackList};

pub use tether_lazy::{IndexAccessor, LazySeq, Vacant};
pub use tether_relay::{HandlerId, RelayError, Wake};
