//! Boundary to the native library.
//!
//! The library runs its own thread and reports everything through session
//! callbacks, which it hands to the relay one at a time through a
//! [`HandoffProducer`]. Everything else is plain calls made from the
//! consuming thread.

mod simulated;

pub use simulated::SimulatedBackend;

use crate::error::NativeError;
use crate::events::RawCallback;
use std::time::Duration;
use tether_relay::HandoffProducer;

/// Connection state as reported by the library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    LoggedOut,
    LoggedIn,
    Disconnected,
    Undefined,
    Offline,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::LoggedOut => write!(f, "logged out"),
            ConnectionState::LoggedIn => write!(f, "logged in"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Undefined => write!(f, "undefined"),
            ConnectionState::Offline => write!(f, "offline"),
        }
    }
}

/// Trait every native library binding must implement.
///
/// Calls other than the callbacks it delivers happen on the consuming
/// thread, and none of them may block on callback delivery.
pub trait NativeBackend: Send + Sync {
    /// Start the library's thread. All callbacks go through `callbacks`,
    /// ending with [`RawCallback::release`] once shut down.
    fn start(&self, callbacks: HandoffProducer<RawCallback>) -> Result<(), NativeError>;

    /// Do pending library work. Returns when it should be called again.
    fn process_events(&self) -> Duration;

    /// Begin an asynchronous login; completion arrives as `logged_in`.
    fn login(&self, username: &str, password: &str, remember_me: bool) -> Result<(), NativeError>;

    /// Log in again with remembered credentials.
    fn relogin(&self) -> Result<(), NativeError>;

    fn remembered_user(&self) -> Option<String>;

    fn forget_me(&self);

    /// Begin an asynchronous logout; completion arrives as `logged_out`.
    fn logout(&self) -> Result<(), NativeError>;

    fn connection_state(&self) -> ConnectionState;

    /// Whether the user's track list has finished loading.
    fn tracks_loaded(&self) -> bool;

    fn track_count(&self) -> usize;

    /// `None` while the track at `index` has no metadata yet.
    fn track_name(&self, index: usize) -> Option<String>;

    /// Stop calling back. Emits the release sentinel and must not block.
    fn shutdown(&self);
}
