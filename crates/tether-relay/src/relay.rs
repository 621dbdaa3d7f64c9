//! Relay thread: drains the handoff slot and feeds the event queue.

use crate::dispatcher::EventSender;
use crate::error::{ConversionError, RelayError};
use crate::event::Event;
use crate::handoff::HandoffConsumer;
use log::{debug, error, info};
use std::thread::{self, JoinHandle};

/// Handle to a running relay thread.
pub struct RelayHandle {
    name: String,
    handle: JoinHandle<Result<u64, RelayError>>,
}

impl RelayHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the relay to stop. Returns how many events it relayed, or the
    /// error that killed it.
    ///
    /// Only returns once the foreign side has produced the sentinel (or gone
    /// away); joining before that blocks.
    pub fn join(self) -> Result<u64, RelayError> {
        self.handle.join().unwrap_or(Err(RelayError::Panicked))
    }
}

/// Spawn the relay thread.
///
/// `convert` runs on the relay thread while the foreign thread is parked, so
/// it must be cheap. It returns `Ok(None)` for the sentinel, which stops the
/// relay without releasing the slot again. An `Err` is fatal: the relay
/// stops, the event queue disconnects and the foreign side sees
/// `Disconnected` on its next delivery.
pub fn spawn<D, E, F>(
    name: &str,
    mut consumer: HandoffConsumer<D>,
    events: EventSender<E>,
    mut convert: F,
) -> Result<RelayHandle, RelayError>
where
    D: Send + 'static,
    E: Event,
    F: FnMut(D) -> Result<Option<E>, ConversionError> + Send + 'static,
{
    let thread_name = name.to_string();
    let handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let result = run(&mut consumer, &events, &mut convert);
            if let Err(e) = &result {
                error!("Relay thread stopped: {}", e);
            }
            result
        })
        .map_err(RelayError::Spawn)?;

    Ok(RelayHandle {
        name: thread_name,
        handle,
    })
}

fn run<D, E, F>(
    consumer: &mut HandoffConsumer<D>,
    events: &EventSender<E>,
    convert: &mut F,
) -> Result<u64, RelayError>
where
    E: Event,
    F: FnMut(D) -> Result<Option<E>, ConversionError>,
{
    info!("Relay thread running");
    let mut relayed = 0u64;

    loop {
        let data = consumer.wait_for_data()?;

        let Some(event) = convert(data)? else {
            info!("Sentinel received after {} events, relay exiting", relayed);
            return Ok(relayed);
        };

        debug!("Relaying {:?}", event.tag());
        events.send(event)?;
        consumer.signal_slot_free()?;
        relayed += 1;
    }
}
