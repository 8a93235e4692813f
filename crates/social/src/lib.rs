//! Social-feed method namespace.
//!
//! Implements the `social` namespace on top of [`bridge::MethodNamespace`]:
//! every operation checks its arguments, builds the call parameters and sends
//! through the namespace's method, so calls reach the host as
//! `"<scope>.social.<operation>"` (`"app.social.getFeeds"` with the default
//! scope).
//!
//! ## Architectural Layer
//!
//! **Collaborator.** This crate holds no protocol state; correlation, ids and
//! callbacks belong to [`bridge::Transport`].

use bridge::{BridgeError, CallId, CallOptions, MethodNamespace, Payload, Transport};
use serde::Serialize;
use tracing::instrument;

/// Tag of this namespace.
pub const TAG: &str = "social";

/// Success and error callbacks for one operation. Either may be left unset.
#[derive(Default)]
pub struct Callbacks {
    on_success: Option<Box<dyn FnMut(Payload)>>,
    on_error: Option<Box<dyn FnMut(Payload)>>,
}

impl Callbacks {
    /// No callbacks; responses are still correlated and then discarded.
    pub fn none() -> Self {
        Self::default()
    }

    /// Sets the success callback.
    pub fn on_success(mut self, callback: impl FnMut(Payload) + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Sets the error callback.
    pub fn on_error(mut self, callback: impl FnMut(Payload) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    fn apply(self, mut options: CallOptions) -> CallOptions {
        if let Some(cb) = self.on_success {
            options = options.on_success(cb);
        }
        if let Some(cb) = self.on_error {
            options = options.on_error(cb);
        }
        options
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateParams<'a> {
    auth_code: &'a str,
    redirect_uri: &'a str,
}

/// Social feeds functionality.
#[derive(Debug, Clone)]
pub struct SocialNamespace {
    base: MethodNamespace,
}

impl SocialNamespace {
    /// Creates the namespace on `transport`.
    pub fn new(transport: &Transport) -> Self {
        Self {
            base: MethodNamespace::new(transport, TAG),
        }
    }

    /// Exchanges an OAuth authorization code with the host.
    #[instrument(level = "debug", skip(self, callbacks))]
    pub fn authenticate(
        &self,
        auth_code: &str,
        redirect_uri: &str,
        callbacks: Callbacks,
    ) -> Result<CallId, BridgeError> {
        MethodNamespace::validate_str(auth_code, "No authCode provided.")?;
        MethodNamespace::validate_str(redirect_uri, "No redirectUri provided.")?;
        let params = serde_json::to_value(AuthenticateParams {
            auth_code,
            redirect_uri,
        })?;
        self.send("authenticate", params, callbacks)
    }

    /// Requests the feeds configured for an asset.
    #[instrument(level = "debug", skip(self, callbacks))]
    pub fn get_feeds(&self, asset_id: &str, callbacks: Callbacks) -> Result<CallId, BridgeError> {
        MethodNamespace::validate_str(asset_id, "No assetid provided.")?;
        self.send("getFeeds", Payload::from(asset_id), callbacks)
    }

    /// Saves a feed asset.
    #[instrument(level = "debug", skip(self, asset, callbacks))]
    pub fn save_feed(&self, asset: Payload, callbacks: Callbacks) -> Result<CallId, BridgeError> {
        MethodNamespace::validate_object(&asset, "No asset provided.")?;
        self.send("saveFeed", asset, callbacks)
    }

    /// Opens the host's preapproval dialog for a feed.
    #[instrument(level = "debug", skip(self, feed, callbacks))]
    pub fn open_preapproval_dialog(
        &self,
        feed: Payload,
        callbacks: Callbacks,
    ) -> Result<CallId, BridgeError> {
        MethodNamespace::validate_object(&feed, "No feed provided.")?;
        self.send("openPreapprovalDialog", feed, callbacks)
    }

    fn send(&self, name: &str, params: Payload, callbacks: Callbacks) -> Result<CallId, BridgeError> {
        self.base
            .method(callbacks.apply(CallOptions::new(name).params(params)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bridge::{BridgeConfig, MemoryWindow, MessageEvent};
    use serde_json::{json, Value};

    use super::*;

    fn setup() -> (SocialNamespace, Transport, MemoryWindow) {
        let window = MemoryWindow::new();
        let transport = Transport::new(window.clone(), BridgeConfig::default()).unwrap();
        (SocialNamespace::new(&transport), transport, window)
    }

    fn last_posted(window: &MemoryWindow) -> Value {
        let posted = window.posted();
        serde_json::from_str(&posted.last().unwrap().message).unwrap()
    }

    #[test]
    fn authenticate_sends_both_codes() {
        let (social, _transport, window) = setup();
        let id = social
            .authenticate("code-1", "https://app/cb", Callbacks::none())
            .unwrap();

        assert_eq!(id, CallId::new(1));
        let sent = last_posted(&window);
        assert_eq!(sent["name"], "app.social.authenticate");
        assert_eq!(
            sent["params"],
            json!({"authCode": "code-1", "redirectUri": "https://app/cb"})
        );
        assert_eq!(sent["namespace"], "Enplug");
    }

    #[test]
    fn authenticate_requires_redirect_uri() {
        let (social, transport, window) = setup();
        let err = social
            .authenticate("code-1", "", Callbacks::none())
            .unwrap_err();

        assert_eq!(err.to_string(), "No redirectUri provided.");
        assert!(window.posted().is_empty());
        assert_eq!(transport.pending_count(), 0);
    }

    #[test]
    fn get_feeds_delivers_feeds_to_success_callback() {
        let (social, _transport, window) = setup();
        let feeds = Rc::new(RefCell::new(None));
        let sink = feeds.clone();

        let id = social
            .get_feeds(
                "abc",
                Callbacks::none().on_success(move |data| *sink.borrow_mut() = Some(data)),
            )
            .unwrap();
        assert_eq!(last_posted(&window)["params"], "abc");

        let reply = json!({"namespace": "Enplug", "callId": id, "success": true, "data": [{"id": 1}]});
        window.dispatch(&MessageEvent::from_data(reply.to_string()));

        assert_eq!(*feeds.borrow(), Some(json!([{"id": 1}])));
    }

    #[test]
    fn get_feeds_requires_asset_id() {
        let (social, _transport, _window) = setup();
        assert_eq!(
            social.get_feeds("", Callbacks::none()),
            Err(BridgeError::InvalidArgument {
                message: "No assetid provided.".to_owned()
            })
        );
    }

    #[test]
    fn save_feed_requires_object() {
        let (social, _transport, window) = setup();
        assert!(social.save_feed(json!("feed"), Callbacks::none()).is_err());
        assert!(window.posted().is_empty());

        social
            .save_feed(json!({"Id": "f1", "Type": "twitter"}), Callbacks::none())
            .unwrap();
        let sent = last_posted(&window);
        assert_eq!(sent["name"], "app.social.saveFeed");
        assert_eq!(sent["params"]["Type"], "twitter");
    }

    #[test]
    fn preapproval_dialog_reports_errors() {
        let (social, _transport, window) = setup();
        let reason = Rc::new(RefCell::new(None));
        let sink = reason.clone();

        let id = social
            .open_preapproval_dialog(
                json!({"Id": "f1"}),
                Callbacks::none().on_error(move |data| *sink.borrow_mut() = Some(data)),
            )
            .unwrap();
        assert_eq!(last_posted(&window)["name"], "app.social.openPreapprovalDialog");

        let reply = json!({"namespace": "Enplug", "callId": id, "success": false, "data": "closed"});
        window.dispatch(&MessageEvent::from_data(reply.to_string()));
        assert_eq!(*reason.borrow(), Some(json!("closed")));
    }

    #[test]
    fn open_preapproval_dialog_requires_feed() {
        let (social, _transport, _window) = setup();
        let err = social
            .open_preapproval_dialog(Payload::Null, Callbacks::none())
            .unwrap_err();
        assert_eq!(err.to_string(), "No feed provided.");
    }
}
