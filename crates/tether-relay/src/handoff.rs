//! Single-slot handoff between the foreign callback thread and the relay thread.
//!
//! Two binary signals guard one buffer:
//!
//! ```text
//! foreign thread                 relay thread
//! --------------                 ------------
//! slot_free.wait                 data_ready.wait
//! write call data                read + convert call data
//! data_ready.post                slot_free.post
//! ```
//!
//! `data_ready` starts at 0 and `slot_free` starts at 1, so at most one
//! callback is ever in flight. The foreign thread stays blocked until the
//! relay has taken its data; there is no queue at this layer.
//!
//! Both signals are capacity-1 channels. The data channel doubles as the
//! shared buffer, and a second post on a full signal is reported as a
//! protocol violation instead of being absorbed.

use crate::error::RelayError;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::trace;

/// Create a connected producer/consumer pair with the slot initially free.
pub fn handoff<D: Send>() -> (HandoffProducer<D>, HandoffConsumer<D>) {
    let (data_tx, data_rx) = bounded(1);
    let (free_tx, free_rx) = bounded(1);

    // Slot starts free. Both ends are alive and the channel is empty.
    let _ = free_tx.try_send(());

    (
        HandoffProducer { data_tx, free_rx },
        HandoffConsumer {
            data_rx,
            free_tx,
            outstanding: false,
        },
    )
}

/// Foreign-thread side of the handoff.
pub struct HandoffProducer<D> {
    data_tx: Sender<D>,
    free_rx: Receiver<()>,
}

impl<D> HandoffProducer<D> {
    /// Hand one callback's data to the relay thread.
    ///
    /// Blocks until the previous callback has been relayed. Fails with
    /// `Disconnected` once the relay thread is gone.
    pub fn deliver(&self, data: D) -> Result<(), RelayError> {
        self.free_rx.recv().map_err(|_| RelayError::Disconnected)?;

        match self.data_tx.try_send(data) {
            Ok(()) => {
                trace!("Callback data handed off");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(RelayError::ProtocolViolation(
                "call data written while the previous callback was still pending",
            )),
            Err(TrySendError::Disconnected(_)) => Err(RelayError::Disconnected),
        }
    }
}

/// Relay-thread side of the handoff.
pub struct HandoffConsumer<D> {
    data_rx: Receiver<D>,
    free_tx: Sender<()>,
    /// Data was taken and the slot has not been released yet.
    outstanding: bool,
}

impl<D> HandoffConsumer<D> {
    /// Block until the foreign thread signals that call data is ready.
    pub fn wait_for_data(&mut self) -> Result<D, RelayError> {
        if self.outstanding {
            return Err(RelayError::ProtocolViolation(
                "waited for new data before releasing the slot",
            ));
        }

        let data = self.data_rx.recv().map_err(|_| RelayError::Disconnected)?;
        self.outstanding = true;
        Ok(data)
    }

    /// Let the foreign thread produce its next callback.
    pub fn signal_slot_free(&mut self) -> Result<(), RelayError> {
        if !self.outstanding {
            return Err(RelayError::ProtocolViolation(
                "slot-free signaled with no callback outstanding",
            ));
        }

        match self.free_tx.try_send(()) {
            Ok(()) => {
                self.outstanding = false;
                Ok(())
            }
            Err(TrySendError::Full(())) => Err(RelayError::ProtocolViolation(
                "slot-free signaled while a previous signal was unconsumed",
            )),
            Err(TrySendError::Disconnected(())) => Err(RelayError::Disconnected),
        }
    }

    /// Whether data has been taken but the slot not yet released.
    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }
}
