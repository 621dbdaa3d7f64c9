//! Event queue and handler dispatch.
//!
//! The relay thread pushes events into a bounded queue through an
//! [`EventSender`]. The [`Dispatcher`] drains that queue on the consumer
//! thread and runs every handler registered for the event's tag, in
//! registration order.
//!
//! Handlers are stored as non-`Send` closures, which makes the dispatcher
//! itself `!Send`: once created, handler code can only ever run on the thread
//! that owns it. Domain state touched by handlers needs no locking.

use crate::error::RelayError;
use crate::event::{Event, HandlerId};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use log::{debug, trace};
use std::collections::HashMap;
use std::time::Duration;

type Handler<E> = Box<dyn FnMut(&E)>;

/// Producer end of the event queue, owned by the relay thread.
#[derive(Clone)]
pub struct EventSender<E> {
    tx: Sender<E>,
}

impl<E: Event> EventSender<E> {
    /// Enqueue an event, blocking while the queue is full.
    pub fn send(&self, event: E) -> Result<(), RelayError> {
        self.tx.send(event).map_err(|_| RelayError::Disconnected)
    }
}

/// Outcome of [`Dispatcher::dispatch_next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatched<T> {
    /// An event with this tag was dispatched.
    Event(T),
    /// Nothing arrived in time.
    Timeout,
}

/// Tag-to-handlers registry plus the consumer end of the event queue.
pub struct Dispatcher<E: Event> {
    queue: Receiver<E>,
    handlers: HashMap<E::Tag, Vec<(HandlerId, Handler<E>)>>,
    next_id: u64,
}

impl<E: Event> Dispatcher<E> {
    /// Create a dispatcher with a queue holding up to `capacity` events.
    /// A capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> (EventSender<E>, Self) {
        let (tx, rx) = bounded(capacity.max(1));
        let dispatcher = Self {
            queue: rx,
            handlers: HashMap::new(),
            next_id: 0,
        };
        (EventSender { tx }, dispatcher)
    }

    /// Subscribe `handler` to every event tagged `tag`.
    pub fn on<F>(&mut self, tag: E::Tag, handler: F) -> HandlerId
    where
        F: FnMut(&E) + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(tag)
            .or_default()
            .push((id, Box::new(handler)));
        trace!("Registered handler {:?} for {:?}", id, tag);
        id
    }

    /// Remove a registration. Returns false if it was already gone.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let mut emptied = None;
        let mut removed = false;

        for (tag, list) in self.handlers.iter_mut() {
            if let Some(pos) = list.iter().position(|(hid, _)| *hid == id) {
                list.remove(pos);
                removed = true;
                if list.is_empty() {
                    emptied = Some(*tag);
                }
                break;
            }
        }

        if let Some(tag) = emptied {
            self.handlers.remove(&tag);
        }
        removed
    }

    pub fn has_handlers(&self, tag: E::Tag) -> bool {
        self.handler_count(tag) > 0
    }

    pub fn handler_count(&self, tag: E::Tag) -> usize {
        self.handlers.get(&tag).map_or(0, Vec::len)
    }

    /// Number of relayed events waiting to be dispatched.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch a synthetic event through the same handlers, right now, on
    /// this thread. Returns how many handlers ran.
    pub fn trigger(&mut self, event: E) -> usize {
        self.dispatch(&event)
    }

    /// Dispatch every event currently queued, in arrival order.
    ///
    /// Returns the number of events dispatched. `Disconnected` is only
    /// reported once the queue is both empty and abandoned by the relay.
    pub fn drain_and_dispatch(&mut self) -> Result<usize, RelayError> {
        let mut count = 0;
        loop {
            match self.queue.try_recv() {
                Ok(event) => {
                    self.dispatch(&event);
                    count += 1;
                }
                Err(TryRecvError::Empty) => return Ok(count),
                Err(TryRecvError::Disconnected) if count > 0 => return Ok(count),
                Err(TryRecvError::Disconnected) => return Err(RelayError::Disconnected),
            }
        }
    }

    /// Block up to `timeout` for one event and dispatch it.
    ///
    /// A timeout leaves the queue untouched, so an event arriving right after
    /// is picked up by the next call.
    pub fn dispatch_next(&mut self, timeout: Duration) -> Result<Dispatched<E::Tag>, RelayError> {
        match self.queue.recv_timeout(timeout) {
            Ok(event) => {
                self.dispatch(&event);
                Ok(Dispatched::Event(event.tag()))
            }
            Err(RecvTimeoutError::Timeout) => Ok(Dispatched::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(RelayError::Disconnected),
        }
    }

    fn dispatch(&mut self, event: &E) -> usize {
        let tag = event.tag();
        let Some(list) = self.handlers.get_mut(&tag) else {
            debug!("No handlers for {:?}", tag);
            return 0;
        };

        for (_, handler) in list.iter_mut() {
            handler(event);
        }
        list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestEvent, TestTag};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::thread;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let (_tx, mut dispatcher) = Dispatcher::<TestEvent>::with_capacity(4);
        let seen = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            dispatcher.on(TestTag::Ping, move |event| {
                if let TestEvent::Ping(n) = event {
                    seen.borrow_mut().push(format!("{name}:{n}"));
                }
            });
        }

        assert_eq!(dispatcher.trigger(TestEvent::Ping(3)), 3);
        assert_eq!(*seen.borrow(), vec!["first:3", "second:3", "third:3"]);
    }

    #[test]
    fn test_only_matching_tag_runs() {
        let (_tx, mut dispatcher) = Dispatcher::<TestEvent>::with_capacity(4);
        let pongs = Rc::new(RefCell::new(0));
        let pongs_cb = Rc::clone(&pongs);
        dispatcher.on(TestTag::Pong, move |_| *pongs_cb.borrow_mut() += 1);

        assert_eq!(dispatcher.trigger(TestEvent::Ping(1)), 0);
        assert_eq!(dispatcher.trigger(TestEvent::Pong), 1);
        assert_eq!(*pongs.borrow(), 1);
    }

    #[test]
    fn test_drain_preserves_arrival_order_on_consumer_thread() {
        let (tx, mut dispatcher) = Dispatcher::<TestEvent>::with_capacity(16);
        let consumer = thread::current().id();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_cb = Rc::clone(&seen);

        dispatcher.on(TestTag::Ping, move |event| {
            assert_eq!(thread::current().id(), consumer);
            if let TestEvent::Ping(n) = event {
                seen_cb.borrow_mut().push(*n);
            }
        });

        thread::spawn(move || {
            for n in 0..10 {
                tx.send(TestEvent::Ping(n)).unwrap();
            }
        })
        .join()
        .unwrap();

        assert_eq!(dispatcher.drain_and_dispatch().unwrap(), 10);
        assert_eq!(*seen.borrow(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_off_removes_registration() {
        let (_tx, mut dispatcher) = Dispatcher::<TestEvent>::with_capacity(1);
        let first = dispatcher.on(TestTag::Pong, |_| {});
        let second = dispatcher.on(TestTag::Pong, |_| {});

        assert_eq!(dispatcher.handler_count(TestTag::Pong), 2);
        assert!(dispatcher.off(first));
        assert!(!dispatcher.off(first));
        assert_eq!(dispatcher.handler_count(TestTag::Pong), 1);
        assert!(dispatcher.off(second));
        assert!(!dispatcher.has_handlers(TestTag::Pong));
    }

    #[test]
    fn test_timeout_does_not_lose_later_event() {
        let (tx, mut dispatcher) = Dispatcher::<TestEvent>::with_capacity(1);

        assert_eq!(
            dispatcher.dispatch_next(Duration::from_millis(20)).unwrap(),
            Dispatched::Timeout
        );

        tx.send(TestEvent::Pong).unwrap();
        assert_eq!(
            dispatcher.dispatch_next(Duration::from_secs(2)).unwrap(),
            Dispatched::Event(TestTag::Pong)
        );
    }

    #[test]
    fn test_disconnect_reported_after_queue_drained() {
        let (tx, mut dispatcher) = Dispatcher::<TestEvent>::with_capacity(4);
        tx.send(TestEvent::Ping(1)).unwrap();
        tx.send(TestEvent::Pong).unwrap();
        drop(tx);

        assert_eq!(dispatcher.drain_and_dispatch().unwrap(), 2);
        assert!(matches!(
            dispatcher.drain_and_dispatch(),
            Err(RelayError::Disconnected)
        ));
        assert!(matches!(
            dispatcher.dispatch_next(Duration::from_millis(10)),
            Err(RelayError::Disconnected)
        ));
    }
}
