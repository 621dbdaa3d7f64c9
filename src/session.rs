//! A running session: native backend, relay thread and event dispatch tied
//! together on the consuming thread.
//!
//! Everything here runs on the thread that owns the [`Session`]. Handlers
//! registered with [`Session::on`] run there too, during `drain_events`,
//! `wait_for` or one of the blocking helpers.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::{SessionEvent, SessionTag, convert_callback};
use crate::native::{ConnectionState, NativeBackend};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_lazy::{IndexAccessor, LazySeq};
use tether_relay::{
    Dispatcher, HandlerId, RelayError, RelayHandle, Wake, WaitCoordinator, handoff, relay,
};

/// How long shutdown blocks per event while draining the queue.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Track names, read from the backend on every access.
pub struct TrackList {
    backend: Arc<dyn NativeBackend>,
}

impl IndexAccessor for TrackList {
    /// `None` until the track's metadata has loaded.
    type Item = Option<String>;

    fn at(&self, index: usize) -> Option<String> {
        self.backend.track_name(index)
    }
}

/// Session owned by the consuming thread.
pub struct Session {
    config: SessionConfig,
    backend: Arc<dyn NativeBackend>,
    dispatcher: Dispatcher<SessionEvent>,
    waiter: WaitCoordinator<SessionTag>,
    relay: Option<RelayHandle>,
}

impl Session {
    /// Wire up the relay and start the backend.
    pub fn start(
        config: SessionConfig,
        backend: Arc<dyn NativeBackend>,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let (producer, consumer) = handoff();
        let (events, dispatcher) = Dispatcher::with_capacity(config.event_queue_capacity);
        let relay = relay::spawn(
            &format!("{}-relay", config.application_name),
            consumer,
            events,
            convert_callback,
        )?;

        // On failure the producer is dropped with the backend's error, which
        // disconnects the handoff and lets the relay exit on its own.
        backend.start(producer)?;

        let waiter = WaitCoordinator::new(SessionTag::NotifyMainThread)
            .with_max_interval(config.max_pump_interval());

        info!(
            "Session started ({}, relay thread {})",
            config.user_agent,
            relay.name()
        );

        Ok(Self {
            config,
            backend,
            dispatcher,
            waiter,
            relay: Some(relay),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn NativeBackend {
        self.backend.as_ref()
    }

    /// Subscribe to an event. The handler runs on this thread.
    pub fn on<F>(&mut self, tag: SessionTag, handler: F) -> HandlerId
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.dispatcher.on(tag, handler)
    }

    pub fn off(&mut self, id: HandlerId) -> bool {
        self.dispatcher.off(id)
    }

    /// Run handlers for `event` immediately, as if the library had fired it.
    pub fn trigger(&mut self, event: SessionEvent) -> usize {
        self.dispatcher.trigger(event)
    }

    /// Let the library do pending work once. Returns when to call it next.
    pub fn process_events(&self) -> Duration {
        self.backend.process_events()
    }

    /// Dispatch everything relayed so far without blocking.
    pub fn drain_events(&mut self) -> Result<usize, SessionError> {
        Ok(self.dispatcher.drain_and_dispatch()?)
    }

    /// Block, pumping the library, until `predicate` returns `Some`.
    ///
    /// See [`WaitCoordinator::wait_for`] for what the predicate is shown.
    pub fn wait_for<R, F>(&mut self, tags: &[SessionTag], predicate: F) -> Result<R, SessionError>
    where
        F: FnMut(Wake<SessionEvent>) -> Result<Option<R>, SessionError>,
    {
        let backend = &self.backend;
        let mut pump = || backend.process_events();
        self.waiter.wait_for(&mut self.dispatcher, &mut pump, tags, predicate)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.backend.connection_state()
    }

    pub fn is_logged_in(&self) -> bool {
        self.connection_state() == ConnectionState::LoggedIn
    }

    /// Log in and block until the library reports the outcome.
    pub fn login_blocking(
        &mut self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<(), SessionError> {
        info!("Logging in as {}", username);
        self.backend.login(username, password, remember_me)?;
        self.await_login()
    }

    /// Log in with the remembered credentials and block for the outcome.
    pub fn relogin_blocking(&mut self) -> Result<(), SessionError> {
        info!("Logging in with remembered credentials");
        self.backend.relogin()?;
        self.await_login()
    }

    fn await_login(&mut self) -> Result<(), SessionError> {
        let backend = Arc::clone(&self.backend);
        self.wait_for(
            &[SessionTag::LoggedIn, SessionTag::ConnectionError],
            move |wake| match wake {
                Wake::Event(SessionEvent::LoggedIn(Err(e)))
                | Wake::Event(SessionEvent::ConnectionError(Err(e))) => Err(e.into()),
                _ => Ok((backend.connection_state() == ConnectionState::LoggedIn).then_some(())),
            },
        )?;
        info!("Logged in");
        Ok(())
    }

    /// Log out and block until the library confirms.
    pub fn logout_blocking(&mut self) -> Result<(), SessionError> {
        if !self.is_logged_in() {
            return Err(SessionError::NotLoggedIn);
        }

        self.backend.logout()?;
        let backend = Arc::clone(&self.backend);
        self.wait_for(&[SessionTag::LoggedOut], move |_| {
            Ok((backend.connection_state() != ConnectionState::LoggedIn).then_some(()))
        })?;
        info!("Logged out");
        Ok(())
    }

    /// Block until `is_loaded` holds, re-checking on every metadata update.
    ///
    /// `timeout` defaults to the configured load timeout. It is only checked
    /// when the wait wakes, so it can be overrun by up to one pump interval.
    /// A timeout too large to be represented as a deadline never expires.
    pub fn wait_until<F>(
        &mut self,
        timeout: Option<Duration>,
        mut is_loaded: F,
    ) -> Result<(), SessionError>
    where
        F: FnMut(&dyn NativeBackend) -> bool,
    {
        let timeout = timeout.unwrap_or_else(|| self.config.load_timeout());
        let deadline = Instant::now().checked_add(timeout);
        let backend = Arc::clone(&self.backend);

        self.wait_for(&[SessionTag::MetadataUpdated], move |_| {
            if is_loaded(backend.as_ref()) {
                return Ok(Some(()));
            }
            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    Err(SessionError::LoadTimeout(timeout))
                }
                _ => Ok(None),
            }
        })
    }

    /// Block until the user's track list has loaded.
    pub fn load_tracks(&mut self, timeout: Option<Duration>) -> Result<(), SessionError> {
        if !self.is_logged_in() {
            return Err(SessionError::NotLoggedIn);
        }
        self.wait_until(timeout, |backend| backend.tracks_loaded())?;
        debug!("Track list loaded ({} tracks)", self.backend.track_count());
        Ok(())
    }

    /// The user's track list as it stands now.
    pub fn tracks(&self) -> LazySeq<TrackList> {
        LazySeq::new(
            self.backend.track_count(),
            TrackList {
                backend: Arc::clone(&self.backend),
            },
        )
    }

    /// Stop the backend and the relay. Returns how many events were relayed.
    pub fn shutdown(mut self) -> Result<u64, SessionError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<u64, SessionError> {
        let Some(relay) = self.relay.take() else {
            return Ok(0);
        };

        info!("Shutting down session");
        self.backend.shutdown();

        // Keep dispatching so a full queue cannot hold the relay back from
        // reaching the release sentinel.
        loop {
            match self.dispatcher.dispatch_next(SHUTDOWN_POLL) {
                Ok(_) => {}
                Err(RelayError::Disconnected) => break,
                Err(e) => return Err(e.into()),
            }
        }

        let relayed = relay.join()?;
        info!("Session stopped after {} events", relayed);
        Ok(relayed)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Session shutdown failed: {}", e);
        }
    }
}
