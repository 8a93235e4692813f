//! The parent-window port.
//!
//! The bridge never talks to a windowing system directly. Hosts implement
//! [`ParentWindow`] over whatever carries cross-window messages (a browser
//! `postMessage` binding, an in-process channel, a test double) and the
//! transport uses it for exactly two things: posting serialised call envelopes
//! and registering its single message listener.
//!
//! [`MemoryWindow`] is an in-memory implementation used by headless hosts and
//! tests.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A raw inbound message event as delivered by the windowing system.
///
/// Every message posted into the window arrives here, including traffic that
/// has nothing to do with the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// The message payload, expected to be serialised JSON.
    pub data: String,
    /// Origin of the window that posted the message (e.g. `"https://dashboard.enplug.com"`).
    pub origin: String,
}

impl MessageEvent {
    /// Creates an event carrying `data` from `origin`.
    pub fn new(data: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            origin: origin.into(),
        }
    }

    /// Creates an event with an empty origin.
    pub fn from_data(data: impl Into<String>) -> Self {
        Self::new(data, "")
    }
}

/// Handler invoked for every inbound [`MessageEvent`].
pub type MessageListener = Box<dyn Fn(&MessageEvent)>;

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// The window posting a message failed or refused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DeliveryError {
    message: String,
}

impl DeliveryError {
    /// Creates a delivery error with a human-readable description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The privileged window that hosts the embedded application.
pub trait ParentWindow {
    /// Posts a serialised message to the parent window.
    ///
    /// `target_origin` is the destination restriction; the bridge passes its
    /// configured value, `"*"` by default.
    fn post_message(&self, message: &str, target_origin: &str) -> Result<(), DeliveryError>;

    /// Registers `listener` for every message event received by the
    /// embedded application's own window.
    fn add_message_listener(&self, listener: MessageListener);
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// A message accepted by [`MemoryWindow::post_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    /// Serialised payload.
    pub message: String,
    /// Destination restriction passed by the poster.
    pub target_origin: String,
}

#[derive(Default)]
struct MemoryWindowState {
    posted: Vec<PostedMessage>,
    refusal: Option<String>,
}

/// An in-memory [`ParentWindow`].
///
/// Records posted messages instead of delivering them and lets the owner
/// [`dispatch`](Self::dispatch) inbound events to registered listeners.
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryWindow {
    state: Rc<RefCell<MemoryWindowState>>,
    listeners: Rc<RefCell<Vec<Rc<dyn Fn(&MessageEvent)>>>>,
}

impl MemoryWindow {
    /// Creates a window with no listeners and nothing posted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every message posted so far, oldest first.
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.state.borrow().posted.clone()
    }

    /// Removes and returns every message posted so far.
    pub fn take_posted(&self) -> Vec<PostedMessage> {
        std::mem::take(&mut self.state.borrow_mut().posted)
    }

    /// Makes subsequent posts fail with `reason`, or accept again with `None`.
    pub fn refuse_posts(&self, reason: Option<&str>) {
        self.state.borrow_mut().refusal = reason.map(str::to_owned);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Delivers `event` to every registered listener, in registration order.
    ///
    /// Listeners may post messages or register further listeners while
    /// running; listeners added during a dispatch first see the next event.
    pub fn dispatch(&self, event: &MessageEvent) {
        let listeners: Vec<_> = self.listeners.borrow().iter().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl ParentWindow for MemoryWindow {
    fn post_message(&self, message: &str, target_origin: &str) -> Result<(), DeliveryError> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.refusal {
            return Err(DeliveryError::new(reason.clone()));
        }
        state.posted.push(PostedMessage {
            message: message.to_owned(),
            target_origin: target_origin.to_owned(),
        });
        Ok(())
    }

    fn add_message_listener(&self, listener: MessageListener) {
        self.listeners.borrow_mut().push(Rc::from(listener));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn refused_posts_are_not_recorded() {
        let window = MemoryWindow::new();
        window.refuse_posts(Some("detached"));
        let err = window.post_message("{}", "*").unwrap_err();
        assert_eq!(err.to_string(), "detached");
        assert!(window.posted().is_empty());

        window.refuse_posts(None);
        window.post_message("{}", "*").unwrap();
        assert_eq!(window.take_posted().len(), 1);
        assert!(window.posted().is_empty());
    }

    #[test]
    fn dispatch_reaches_every_listener() {
        let window = MemoryWindow::new();
        let hits = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            window.add_message_listener(Box::new(move |_| hits.set(hits.get() + 1)));
        }
        window.dispatch(&MessageEvent::from_data("noise"));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn listener_may_post_while_dispatching() {
        let window = MemoryWindow::new();
        let inner = window.clone();
        window.add_message_listener(Box::new(move |event| {
            inner.post_message(&event.data, "*").unwrap();
        }));
        window.dispatch(&MessageEvent::from_data("ping"));
        assert_eq!(window.posted()[0].message, "ping");
    }
}
