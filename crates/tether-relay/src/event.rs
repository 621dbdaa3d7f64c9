//! Core types shared by the dispatcher and the wait coordinator

use std::fmt::Debug;
use std::hash::Hash;

/// A relayed notification: a closed enum with one case per callback.
///
/// The tag is the discriminant handlers are registered against. Events cross
/// from the relay thread to the consumer thread, so they must be `Send`.
pub trait Event: Clone + Debug + Send + 'static {
    type Tag: Copy + Eq + Hash + Debug + Send + 'static;

    fn tag(&self) -> Self::Tag;
}

/// What a wait predicate is being asked about.
#[derive(Clone, Debug, PartialEq)]
pub enum Wake<E> {
    /// Pre-check before any blocking happens.
    Check,
    /// A requested event was dispatched.
    Event(E),
    /// Nothing requested arrived within the pump interval.
    Timeout,
}

impl<E: Event> Wake<E> {
    /// Tag of the woken event, `None` for checks and timeouts.
    pub fn tag(&self) -> Option<E::Tag> {
        match self {
            Wake::Event(event) => Some(event.tag()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Wake::Timeout)
    }
}

/// Identifies one handler registration so it can be removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);
