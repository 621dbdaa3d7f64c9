//! In-process stand-in for the native library.
//!
//! Behaves like the real thing from the session's point of view: callbacks
//! come from a dedicated native thread through the handoff, work requested
//! from the consuming thread only completes inside `process_events`, and the
//! library asks to be pumped with `notify_main_thread`.

use super::{ConnectionState, NativeBackend};
use crate::error::{NativeError, error_code};
use crate::events::{RawCallback, code};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tether_relay::HandoffProducer;

/// Pump interval while work is still queued.
const BUSY_INTERVAL: Duration = Duration::from_millis(10);
/// Tracks whose metadata arrives per pump.
const TRACK_BATCH: usize = 2;

enum Command {
    Callback(RawCallback),
    Release,
}

enum Work {
    Login {
        username: String,
        accepted: bool,
        remember: bool,
    },
    Logout,
    LoadTracks,
}

#[derive(Default)]
struct SimState {
    connection: ConnectionState,
    pending: VecDeque<Work>,
    current_user: Option<String>,
    remembered: Option<String>,
    loaded_tracks: usize,
}

/// Simulated native library.
pub struct SimulatedBackend {
    user_agent: String,
    pump_interval: Duration,
    accounts: HashMap<String, String>,
    catalog: Vec<String>,
    state: Mutex<SimState>,
    commands: Sender<Command>,
    inbox: Mutex<Option<Receiver<Command>>>,
}

impl SimulatedBackend {
    pub fn new(user_agent: impl Into<String>) -> Self {
        let (commands, inbox) = unbounded();
        Self {
            user_agent: user_agent.into(),
            pump_interval: Duration::from_secs(1),
            accounts: HashMap::new(),
            catalog: Vec::new(),
            state: Mutex::new(SimState::default()),
            commands,
            inbox: Mutex::new(Some(inbox)),
        }
    }

    /// Only listed accounts may log in. Without any, every non-empty
    /// password is accepted.
    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts.insert(username.to_string(), password.to_string());
        self
    }

    /// Names of the tracks in the user's track list.
    pub fn with_tracks<I, S>(mut self, tracks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalog = tracks.into_iter().map(Into::into).collect();
        self
    }

    /// Interval reported by `process_events` when idle.
    pub fn with_pump_interval(mut self, interval: Duration) -> Self {
        self.pump_interval = interval;
        self
    }

    /// Fire an arbitrary callback from the native thread.
    pub fn inject(&self, callback: RawCallback) {
        self.emit(callback);
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, callback: RawCallback) {
        if self.commands.send(Command::Callback(callback)).is_err() {
            warn!("Native thread gone, dropping callback");
        }
    }

    fn notify(&self) {
        self.emit(RawCallback::new(code::NOTIFY_MAIN_THREAD));
    }

    fn queue(&self, work: Work) {
        self.state().pending.push_back(work);
        self.notify();
    }

    fn perform(&self, state: &mut SimState, work: Work) {
        match work {
            Work::Login {
                username,
                accepted: true,
                remember,
            } => {
                info!("Simulated login for {}", username);
                state.connection = ConnectionState::LoggedIn;
                state.loaded_tracks = 0;
                if remember {
                    self.emit(
                        RawCallback::new(code::CREDENTIALS_BLOB_UPDATED)
                            .with_text(format!("blob:{username}")),
                    );
                    state.remembered = Some(username.clone());
                }
                state.current_user = Some(username);
                self.emit(RawCallback::new(code::CONNECTIONSTATE_UPDATED));
                self.emit(RawCallback::new(code::LOGGED_IN));
                if !self.catalog.is_empty() {
                    state.pending.push_back(Work::LoadTracks);
                }
            }
            Work::Login { username, .. } => {
                info!("Simulated login rejected for {}", username);
                self.emit(
                    RawCallback::new(code::LOGGED_IN)
                        .with_error(error_code::BAD_USERNAME_OR_PASSWORD),
                );
            }
            Work::Logout => {
                state.connection = ConnectionState::LoggedOut;
                state.current_user = None;
                state.loaded_tracks = 0;
                self.emit(RawCallback::new(code::CONNECTIONSTATE_UPDATED));
                self.emit(RawCallback::new(code::LOGGED_OUT));
            }
            Work::LoadTracks if state.connection == ConnectionState::LoggedIn => {
                state.loaded_tracks = (state.loaded_tracks + TRACK_BATCH).min(self.catalog.len());
                debug!(
                    "Track metadata loaded: {}/{}",
                    state.loaded_tracks,
                    self.catalog.len()
                );
                self.emit(RawCallback::new(code::METADATA_UPDATED));
                if state.loaded_tracks < self.catalog.len() {
                    state.pending.push_back(Work::LoadTracks);
                }
            }
            Work::LoadTracks => {}
        }
    }
}

impl NativeBackend for SimulatedBackend {
    fn start(&self, callbacks: HandoffProducer<RawCallback>) -> Result<(), NativeError> {
        let inbox = self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| NativeError::new(error_code::API_INITIALIZATION_FAILED))?;

        thread::Builder::new()
            .name("native-callbacks".to_string())
            .spawn(move || {
                for command in inbox.iter() {
                    let (callback, last) = match command {
                        Command::Callback(callback) => (callback, false),
                        Command::Release => (RawCallback::release(), true),
                    };
                    if let Err(e) = callbacks.deliver(callback) {
                        warn!("Callback delivery failed: {}", e);
                        break;
                    }
                    if last {
                        debug!("Release delivered, native thread exiting");
                        break;
                    }
                }
            })
            .map_err(|_| NativeError::new(error_code::API_INITIALIZATION_FAILED))?;

        self.emit(
            RawCallback::new(code::LOG_MESSAGE)
                .with_text(format!("started with user agent {}", self.user_agent)),
        );
        Ok(())
    }

    fn process_events(&self) -> Duration {
        let mut state = self.state();
        let work: Vec<Work> = state.pending.drain(..).collect();
        for item in work {
            self.perform(&mut state, item);
        }

        if state.pending.is_empty() {
            self.pump_interval
        } else {
            self.notify();
            BUSY_INTERVAL
        }
    }

    fn login(&self, username: &str, password: &str, remember_me: bool) -> Result<(), NativeError> {
        if username.is_empty() {
            return Err(NativeError::new(error_code::INVALID_INDATA));
        }

        let accepted = self
            .accounts
            .get(username)
            .map_or(!password.is_empty(), |expected| expected == password);

        self.queue(Work::Login {
            username: username.to_string(),
            accepted,
            remember: remember_me,
        });
        Ok(())
    }

    fn relogin(&self) -> Result<(), NativeError> {
        let username = self
            .remembered_user()
            .ok_or_else(|| NativeError::new(error_code::NO_CREDENTIALS))?;

        self.queue(Work::Login {
            username,
            accepted: true,
            remember: true,
        });
        Ok(())
    }

    fn remembered_user(&self) -> Option<String> {
        self.state().remembered.clone()
    }

    fn forget_me(&self) {
        self.state().remembered = None;
    }

    fn logout(&self) -> Result<(), NativeError> {
        self.queue(Work::Logout);
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        self.state().connection
    }

    fn tracks_loaded(&self) -> bool {
        let state = self.state();
        state.connection == ConnectionState::LoggedIn && state.loaded_tracks == self.catalog.len()
    }

    fn track_count(&self) -> usize {
        if self.connection_state() == ConnectionState::LoggedIn {
            self.catalog.len()
        } else {
            0
        }
    }

    fn track_name(&self, index: usize) -> Option<String> {
        let loaded = self.state().loaded_tracks;
        self.catalog.get(index).filter(|_| index < loaded).cloned()
    }

    fn shutdown(&self) {
        if self.commands.send(Command::Release).is_err() {
            debug!("Native thread already stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_relay::{HandoffConsumer, handoff};

    fn next_code(consumer: &mut HandoffConsumer<RawCallback>) -> u32 {
        let callback = consumer.wait_for_data().unwrap();
        consumer.signal_slot_free().unwrap();
        callback.code
    }

    fn started(backend: &SimulatedBackend) -> HandoffConsumer<RawCallback> {
        let (producer, mut consumer) = handoff();
        backend.start(producer).unwrap();
        assert_eq!(next_code(&mut consumer), code::LOG_MESSAGE);
        consumer
    }

    #[test]
    fn test_login_completes_inside_process_events() {
        let backend = SimulatedBackend::new("test").with_tracks(["one", "two", "three"]);
        let mut consumer = started(&backend);

        backend.login("alice", "secret", false).unwrap();
        assert_eq!(next_code(&mut consumer), code::NOTIFY_MAIN_THREAD);
        assert_eq!(backend.connection_state(), ConnectionState::LoggedOut);

        assert_eq!(backend.process_events(), BUSY_INTERVAL);
        assert_eq!(backend.connection_state(), ConnectionState::LoggedIn);
        assert_eq!(next_code(&mut consumer), code::CONNECTIONSTATE_UPDATED);
        assert_eq!(next_code(&mut consumer), code::LOGGED_IN);
        assert_eq!(next_code(&mut consumer), code::NOTIFY_MAIN_THREAD);

        assert_eq!(backend.track_count(), 3);
        assert_eq!(backend.track_name(0), None);
        backend.process_events();
        assert_eq!(backend.track_name(1).as_deref(), Some("two"));
        assert!(!backend.tracks_loaded());
        backend.process_events();
        assert!(backend.tracks_loaded());
        assert_eq!(backend.track_name(3), None);
    }

    #[test]
    fn test_rejected_login_reports_error_code() {
        let backend = SimulatedBackend::new("test").with_account("alice", "secret");
        let mut consumer = started(&backend);

        backend.login("alice", "wrong", false).unwrap();
        backend.process_events();

        assert_eq!(next_code(&mut consumer), code::NOTIFY_MAIN_THREAD);
        let callback = consumer.wait_for_data().unwrap();
        assert_eq!(callback.code, code::LOGGED_IN);
        assert_eq!(callback.error, error_code::BAD_USERNAME_OR_PASSWORD);
        assert_eq!(backend.connection_state(), ConnectionState::LoggedOut);
    }

    #[test]
    fn test_relogin_needs_remembered_user() {
        let backend = SimulatedBackend::new("test");
        assert_eq!(
            backend.relogin().unwrap_err().code,
            error_code::NO_CREDENTIALS
        );
        assert!(matches!(
            backend.login("", "pw", false),
            Err(NativeError { code: error_code::INVALID_INDATA, .. })
        ));
    }

    #[test]
    fn test_shutdown_delivers_release_last() {
        let backend = SimulatedBackend::new("test");
        let mut consumer = started(&backend);

        backend.inject(RawCallback::new(code::END_OF_TRACK));
        backend.shutdown();

        assert_eq!(next_code(&mut consumer), code::END_OF_TRACK);
        let release = consumer.wait_for_data().unwrap();
        assert_eq!(release, RawCallback::release());
    }

    #[test]
    fn test_start_twice_fails() {
        let backend = SimulatedBackend::new("test");
        let _consumer = started(&backend);
        let (producer, _second) = handoff();

        assert_eq!(
            backend.start(producer).unwrap_err().code,
            error_code::API_INITIALIZATION_FAILED
        );
    }
}
