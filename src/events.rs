//! Session event definitions and conversion from raw native callbacks.
//!
//! The native thread hands a [`RawCallback`] to the relay thread for every
//! session callback it fires. [`convert_callback`] turns it into a typed
//! [`SessionEvent`] (or the release sentinel) while the native thread waits.

use crate::error::NativeError;
use tether_relay::{ConversionError, Event};

/// Raw callback codes as the native library numbers them.
pub mod code {
    /// Not a callback: the library is shutting down and will stop calling back.
    pub const RELEASE: u32 = 0;
    pub const LOGGED_IN: u32 = 1;
    pub const LOGGED_OUT: u32 = 2;
    pub const METADATA_UPDATED: u32 = 3;
    pub const CONNECTION_ERROR: u32 = 4;
    pub const MESSAGE_TO_USER: u32 = 5;
    pub const NOTIFY_MAIN_THREAD: u32 = 6;
    pub const PLAY_TOKEN_LOST: u32 = 7;
    pub const LOG_MESSAGE: u32 = 8;
    pub const END_OF_TRACK: u32 = 9;
    pub const STREAMING_ERROR: u32 = 10;
    pub const USERINFO_UPDATED: u32 = 11;
    pub const CONNECTIONSTATE_UPDATED: u32 = 12;
    pub const OFFLINE_STATUS_UPDATED: u32 = 13;
    pub const CREDENTIALS_BLOB_UPDATED: u32 = 14;
    pub const PLAYLIST_STATE_CHANGED: u32 = 15;
}

/// Call data written by the native thread into the handoff slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCallback {
    pub code: u32,
    /// Native error code, 0 for success.
    pub error: i32,
    pub text: Option<String>,
}

impl RawCallback {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            error: 0,
            text: None,
        }
    }

    /// The shutdown sentinel.
    pub fn release() -> Self {
        Self::new(code::RELEASE)
    }

    pub fn with_error(mut self, error: i32) -> Self {
        self.error = error;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// All notifications a session delivers to the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(Result<(), NativeError>),
    LoggedOut,
    MetadataUpdated,
    ConnectionError(Result<(), NativeError>),
    MessageToUser(String),
    /// The library wants `process_events` called soon.
    NotifyMainThread,
    PlayTokenLost,
    LogMessage(String),
    EndOfTrack,
    StreamingError(NativeError),
    UserinfoUpdated,
    ConnectionstateUpdated,
    OfflineStatusUpdated,
    CredentialsBlobUpdated(String),
    PlaylistStateChanged,
}

/// Discriminant of [`SessionEvent`], used to register handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionTag {
    LoggedIn,
    LoggedOut,
    MetadataUpdated,
    ConnectionError,
    MessageToUser,
    NotifyMainThread,
    PlayTokenLost,
    LogMessage,
    EndOfTrack,
    StreamingError,
    UserinfoUpdated,
    ConnectionstateUpdated,
    OfflineStatusUpdated,
    CredentialsBlobUpdated,
    PlaylistStateChanged,
}

impl Event for SessionEvent {
    type Tag = SessionTag;

    #[inline]
    fn tag(&self) -> SessionTag {
        match self {
            SessionEvent::LoggedIn(_) => SessionTag::LoggedIn,
            SessionEvent::LoggedOut => SessionTag::LoggedOut,
            SessionEvent::MetadataUpdated => SessionTag::MetadataUpdated,
            SessionEvent::ConnectionError(_) => SessionTag::ConnectionError,
            SessionEvent::MessageToUser(_) => SessionTag::MessageToUser,
            SessionEvent::NotifyMainThread => SessionTag::NotifyMainThread,
            SessionEvent::PlayTokenLost => SessionTag::PlayTokenLost,
            SessionEvent::LogMessage(_) => SessionTag::LogMessage,
            SessionEvent::EndOfTrack => SessionTag::EndOfTrack,
            SessionEvent::StreamingError(_) => SessionTag::StreamingError,
            SessionEvent::UserinfoUpdated => SessionTag::UserinfoUpdated,
            SessionEvent::ConnectionstateUpdated => SessionTag::ConnectionstateUpdated,
            SessionEvent::OfflineStatusUpdated => SessionTag::OfflineStatusUpdated,
            SessionEvent::CredentialsBlobUpdated(_) => SessionTag::CredentialsBlobUpdated,
            SessionEvent::PlaylistStateChanged => SessionTag::PlaylistStateChanged,
        }
    }
}

/// Turn raw callback data into a session event.
///
/// Returns `Ok(None)` for the release sentinel. Unknown codes and callbacks
/// missing their payload are conversion failures.
pub fn convert_callback(raw: RawCallback) -> Result<Option<SessionEvent>, ConversionError> {
    let event = match raw.code {
        code::RELEASE => return Ok(None),
        code::LOGGED_IN => SessionEvent::LoggedIn(NativeError::check(raw.error)),
        code::LOGGED_OUT => SessionEvent::LoggedOut,
        code::METADATA_UPDATED => SessionEvent::MetadataUpdated,
        code::CONNECTION_ERROR => SessionEvent::ConnectionError(NativeError::check(raw.error)),
        code::MESSAGE_TO_USER => SessionEvent::MessageToUser(require_text(raw)?),
        code::NOTIFY_MAIN_THREAD => SessionEvent::NotifyMainThread,
        code::PLAY_TOKEN_LOST => SessionEvent::PlayTokenLost,
        code::LOG_MESSAGE => SessionEvent::LogMessage(require_text(raw)?),
        code::END_OF_TRACK => SessionEvent::EndOfTrack,
        code::STREAMING_ERROR => match NativeError::from_code(raw.error) {
            Some(error) => SessionEvent::StreamingError(error),
            None => {
                return Err(ConversionError::new(
                    "streaming_error callback without an error code",
                ));
            }
        },
        code::USERINFO_UPDATED => SessionEvent::UserinfoUpdated,
        code::CONNECTIONSTATE_UPDATED => SessionEvent::ConnectionstateUpdated,
        code::OFFLINE_STATUS_UPDATED => SessionEvent::OfflineStatusUpdated,
        code::CREDENTIALS_BLOB_UPDATED => SessionEvent::CredentialsBlobUpdated(require_text(raw)?),
        code::PLAYLIST_STATE_CHANGED => SessionEvent::PlaylistStateChanged,
        other => {
            return Err(ConversionError::new(format!("unknown callback code {other}")));
        }
    };
    Ok(Some(event))
}

fn require_text(raw: RawCallback) -> Result<String, ConversionError> {
    let code = raw.code;
    raw.text
        .ok_or_else(|| ConversionError::new(format!("callback {code} is missing its text")))
}
