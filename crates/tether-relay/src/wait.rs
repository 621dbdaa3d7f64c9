//! Blocking "wait until predicate holds" on top of the dispatcher.
//!
//! One loop covers three things that all race for the same private slot:
//! waiting for named events, driving the native library's internal pump,
//! and bounding how long a single block may last.

use crate::dispatcher::{Dispatched, Dispatcher};
use crate::error::RelayError;
use crate::event::{Event, HandlerId, Wake};
use crossbeam_channel::{Receiver, TrySendError, bounded};
use log::{trace, warn};
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Upper bound on a single block, whatever the pump asks for.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(5);

/// The native library's periodic work function.
pub trait Pump {
    /// Process pending native work and report when it next needs to run.
    fn process_events(&mut self) -> Duration;
}

impl<F> Pump for F
where
    F: FnMut() -> Duration,
{
    fn process_events(&mut self) -> Duration {
        self()
    }
}

/// Runs blocking waits for one session.
#[derive(Clone, Debug)]
pub struct WaitCoordinator<T> {
    pump_tag: T,
    max_interval: Duration,
}

impl<T> WaitCoordinator<T>
where
    T: Copy + Eq + Debug,
{
    /// `pump_tag` is the event the native library fires when it wants
    /// `process_events` to run soon.
    pub fn new(pump_tag: T) -> Self {
        Self {
            pump_tag,
            max_interval: DEFAULT_MAX_INTERVAL,
        }
    }

    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn pump_tag(&self) -> T {
        self.pump_tag
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Block until `predicate` returns `Some`.
    ///
    /// The predicate is first asked with [`Wake::Check`]; a `Some` there
    /// returns at once without pumping. After that it sees every dispatched
    /// event tagged with one of `tags`, and [`Wake::Timeout`] whenever a pump
    /// interval passes without one. Pump requests restart the interval
    /// without reaching the predicate.
    ///
    /// There is no retry limit. An `Err` from the predicate is returned as
    /// is; events still queued at that point stay queued.
    pub fn wait_for<E, P, R, Er, F>(
        &self,
        dispatcher: &mut Dispatcher<E>,
        pump: &mut P,
        tags: &[T],
        mut predicate: F,
    ) -> Result<R, Er>
    where
        E: Event<Tag = T>,
        P: Pump + ?Sized,
        F: FnMut(Wake<E>) -> Result<Option<R>, Er>,
        Er: From<RelayError>,
    {
        if let Some(value) = predicate(Wake::Check)? {
            return Ok(value);
        }

        let (slot_tx, slot_rx) = bounded::<E>(1);
        let mut watched: Vec<T> = Vec::with_capacity(tags.len() + 1);
        for tag in tags.iter().copied().chain(std::iter::once(self.pump_tag)) {
            if !watched.contains(&tag) {
                watched.push(tag);
            }
        }

        let ids: Vec<HandlerId> = watched
            .into_iter()
            .map(|tag| {
                let slot_tx = slot_tx.clone();
                dispatcher.on(tag, move |event: &E| {
                    if let Err(TrySendError::Full(event)) = slot_tx.try_send(event.clone()) {
                        warn!("Wait slot occupied, dropping {:?}", event.tag());
                    }
                })
            })
            .collect();

        let result = self.run(dispatcher, pump, tags, &slot_rx, &mut predicate);

        for id in ids {
            dispatcher.off(id);
        }
        result
    }

    fn run<E, P, R, Er, F>(
        &self,
        dispatcher: &mut Dispatcher<E>,
        pump: &mut P,
        tags: &[T],
        slot: &Receiver<E>,
        predicate: &mut F,
    ) -> Result<R, Er>
    where
        E: Event<Tag = T>,
        P: Pump + ?Sized,
        F: FnMut(Wake<E>) -> Result<Option<R>, Er>,
        Er: From<RelayError>,
    {
        let pump_is_internal = !tags.contains(&self.pump_tag);

        loop {
            let interval = pump.process_events().min(self.max_interval);
            let deadline = Instant::now() + interval;
            trace!("Waiting up to {:?} for {:?}", interval, tags);

            let wake = loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match dispatcher.dispatch_next(remaining)? {
                    Dispatched::Timeout => break Some(Wake::Timeout),
                    Dispatched::Event(_) => {
                        // Events nobody in this wait asked for leave the slot empty.
                        let Ok(event) = slot.try_recv() else {
                            continue;
                        };
                        if pump_is_internal && event.tag() == self.pump_tag {
                            break None;
                        }
                        break Some(Wake::Event(event));
                    }
                }
            };

            let Some(wake) = wake else {
                trace!("Pump requested, restarting wait interval");
                continue;
            };

            if let Some(value) = predicate(wake)? {
                return Ok(value);
            }
        }
    }
}
