//! A [`ParentWindow`] backed by tokio channels.
//!
//! Posted messages go to the host over an unbounded channel. Inbound events
//! are handed to [`ChannelWindow::dispatch`] by the demo's event loop, which
//! runs every registered listener on the current turn.

use std::cell::RefCell;
use std::rc::Rc;

use bridge::{DeliveryError, MessageEvent, MessageListener, ParentWindow};
use tokio::sync::mpsc::UnboundedSender;

/// The embedded application's side of the loopback channel.
#[derive(Clone)]
pub struct ChannelWindow {
    to_host: UnboundedSender<String>,
    listeners: Rc<RefCell<Vec<Rc<dyn Fn(&MessageEvent)>>>>,
}

impl ChannelWindow {
    pub fn new(to_host: UnboundedSender<String>) -> Self {
        Self {
            to_host,
            listeners: Rc::default(),
        }
    }

    /// Runs every listener for `event`.
    pub fn dispatch(&self, event: &MessageEvent) {
        let listeners: Vec<_> = self.listeners.borrow().iter().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl ParentWindow for ChannelWindow {
    fn post_message(&self, message: &str, _target_origin: &str) -> Result<(), DeliveryError> {
        self.to_host
            .send(message.to_owned())
            .map_err(|_| DeliveryError::new("host window is gone"))
    }

    fn add_message_listener(&self, listener: MessageListener) {
        self.listeners.borrow_mut().push(Rc::from(listener));
    }
}
