//! Error types for tether

use std::time::Duration;
use tether_relay::RelayError;

/// Error codes reported by the native library.
pub mod error_code {
    pub const OK: i32 = 0;
    pub const BAD_API_VERSION: i32 = 1;
    pub const API_INITIALIZATION_FAILED: i32 = 2;
    pub const TRACK_NOT_PLAYABLE: i32 = 3;
    pub const BAD_APPLICATION_KEY: i32 = 5;
    pub const BAD_USERNAME_OR_PASSWORD: i32 = 6;
    pub const USER_BANNED: i32 = 7;
    pub const UNABLE_TO_CONTACT_SERVER: i32 = 8;
    pub const CLIENT_TOO_OLD: i32 = 9;
    pub const OTHER_PERMANENT: i32 = 10;
    pub const BAD_USER_AGENT: i32 = 11;
    pub const MISSING_CALLBACK: i32 = 12;
    pub const INVALID_INDATA: i32 = 13;
    pub const INDEX_OUT_OF_RANGE: i32 = 14;
    pub const USER_NEEDS_PREMIUM: i32 = 15;
    pub const OTHER_TRANSIENT: i32 = 16;
    pub const IS_LOADING: i32 = 17;
    pub const NO_STREAM_AVAILABLE: i32 = 18;
    pub const PERMISSION_DENIED: i32 = 19;
    pub const NO_CREDENTIALS: i32 = 23;
}

/// A non-zero error code from the native library.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct NativeError {
    pub code: i32,
    pub message: &'static str,
}

impl NativeError {
    pub fn new(code: i32) -> Self {
        Self {
            code,
            message: describe(code),
        }
    }

    /// `None` for the success code.
    pub fn from_code(code: i32) -> Option<Self> {
        (code != error_code::OK).then(|| Self::new(code))
    }

    /// `Ok` for the success code, the matching error otherwise.
    pub fn check(code: i32) -> Result<(), Self> {
        match Self::from_code(code) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code,
            error_code::UNABLE_TO_CONTACT_SERVER
                | error_code::OTHER_TRANSIENT
                | error_code::IS_LOADING
        )
    }
}

fn describe(code: i32) -> &'static str {
    use error_code::*;

    match code {
        OK => "no error",
        BAD_API_VERSION => "the library version does not match the application",
        API_INITIALIZATION_FAILED => "initialization failed",
        TRACK_NOT_PLAYABLE => "the track cannot be played",
        BAD_APPLICATION_KEY => "the application key is invalid",
        BAD_USERNAME_OR_PASSWORD => "login failed because of bad username and/or password",
        USER_BANNED => "the specified username is banned",
        UNABLE_TO_CONTACT_SERVER => "cannot connect to the server",
        CLIENT_TOO_OLD => "client is too old, library will need to be updated",
        OTHER_PERMANENT => "some other error occurred, and it is permanent",
        BAD_USER_AGENT => "the user agent string is invalid or too long",
        MISSING_CALLBACK => "no valid callback registered to handle events",
        INVALID_INDATA => "input data was either missing or invalid",
        INDEX_OUT_OF_RANGE => "index out of range",
        USER_NEEDS_PREMIUM => "the specified user needs a premium account",
        OTHER_TRANSIENT => "a transient error occurred",
        IS_LOADING => "the resource is currently loading",
        NO_STREAM_AVAILABLE => "could not find any suitable stream to play",
        PERMISSION_DENIED => "requested operation is not allowed",
        NO_CREDENTIALS => "no credentials are stored",
        _ => "unknown error",
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Native error: {0}")]
    Native(#[from] NativeError),

    #[error("Timed out after {0:?} waiting for load")]
    LoadTimeout(Duration),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_code_is_not_an_error() {
        assert_eq!(NativeError::check(error_code::OK), Ok(()));
        assert!(NativeError::from_code(error_code::OK).is_none());
    }

    #[test]
    fn test_error_code_description() {
        let err = NativeError::check(error_code::USER_BANNED).unwrap_err();
        assert_eq!(err.code, error_code::USER_BANNED);
        assert_eq!(
            err.to_string(),
            "the specified username is banned (code 7)"
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn test_unknown_code_still_reported() {
        let err = NativeError::from_code(4242).unwrap();
        assert_eq!(err.message, "unknown error");
        assert!(NativeError::from_code(error_code::IS_LOADING)
            .unwrap()
            .is_transient());
    }
}
