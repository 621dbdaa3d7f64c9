//! Error types for tether-relay

/// Relay, dispatch and wait errors
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The handoff protocol was broken. Never retried.
    #[error("Handoff protocol violation: {0}")]
    ProtocolViolation(&'static str),

    #[error("Callback conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// The other end of the handoff or event queue is gone.
    #[error("Relay disconnected")]
    Disconnected,

    #[error("Failed to spawn relay thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Relay thread panicked")]
    Panicked,
}

/// Raised by a conversion handler that cannot turn raw callback data into an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConversionError {
    pub message: String,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
