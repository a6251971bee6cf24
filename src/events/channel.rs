//! Event plumbing between the verification engine and its observers.
//!
//! Sending never fails: with no one listening, events are dropped.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Cloneable handle the engine reports through
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Deliver `event` without blocking
    pub fn send(&self, event: Event) {
        // Disconnected receiver: nobody is watching
        let _ = self.inner.send(event);
    }
}

/// Consuming end, owned by the presentation layer
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Next event, or `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Drain events until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded pair; the engine never waits on the observer
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver): (Sender<Event>, Receiver<Event>) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender whose receiver is already gone, for runs without an observer
pub fn null_sender() -> EventSender {
    EventChannel::new().0
}
