//! A simulated dashboard host.
//!
//! Answers calls from the embedded application the way the dashboard would,
//! but with deliberately scrambled timing so responses arrive out of order.
//! It also injects the background noise a shared window channel carries:
//! non-JSON strings, foreign JSON, and (in echo mode) copies of the app's
//! own outbound calls.

use std::time::Duration;

use bridge::MessageEvent;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Base delay between scheduled replies.
const REPLY_STEP: Duration = Duration::from_millis(15);

/// Replies are staggered over this many slots, later call ids first.
const REPLY_SLOTS: u64 = 4;

/// Updates pushed for each persistent call.
pub const PERSISTENT_UPDATES: u64 = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingCall {
    name: String,
    #[serde(default)]
    params: Value,
    call_id: u64,
    #[serde(default)]
    transient: bool,
    #[serde(default)]
    persistent: bool,
}

pub struct Dashboard {
    origin: String,
    namespace: String,
    echo: bool,
    to_app: UnboundedSender<MessageEvent>,
}

impl Dashboard {
    pub fn new(
        origin: impl Into<String>,
        namespace: impl Into<String>,
        echo: bool,
        to_app: UnboundedSender<MessageEvent>,
    ) -> Self {
        Self {
            origin: origin.into(),
            namespace: namespace.into(),
            echo,
            to_app,
        }
    }

    /// Serves calls until the application side of the channel closes.
    pub async fn run(self, mut from_app: UnboundedReceiver<String>) {
        self.emit("ready".to_owned(), &self.origin);
        self.emit(json!({"type": "webpackOk"}).to_string(), "http://localhost:3000");

        while let Some(message) = from_app.recv().await {
            if self.echo {
                self.emit(message.clone(), &self.origin);
            }

            let call: IncomingCall = match serde_json::from_str(&message) {
                Ok(call) => call,
                Err(err) => {
                    warn!(error = %err, "host could not parse call");
                    continue;
                }
            };
            debug!(call_id = call.call_id, method = %call.name, "host received call");

            if call.transient {
                info!(method = %call.name, params = %call.params, "host handled transient call");
                continue;
            }

            let updates = if call.persistent { PERSISTENT_UPDATES } else { 1 };
            for update in 0..updates {
                let (success, data) = answer(&call, update);
                let reply = json!({
                    "namespace": self.namespace,
                    "callId": call.call_id,
                    "success": success,
                    "data": data,
                })
                .to_string();
                let slot = REPLY_SLOTS - call.call_id % REPLY_SLOTS;
                let delay = REPLY_STEP * u32::try_from(slot + update * REPLY_SLOTS).unwrap_or(1);
                self.schedule(reply, delay);
            }
        }
        debug!("host channel closed");
    }

    fn emit(&self, data: String, origin: &str) {
        let _ = self.to_app.send(MessageEvent::new(data, origin));
    }

    fn schedule(&self, data: String, delay: Duration) {
        let to_app = self.to_app.clone();
        let origin = self.origin.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = to_app.send(MessageEvent::new(data, origin));
        });
    }
}

fn answer(call: &IncomingCall, update: u64) -> (bool, Value) {
    let method = call.name.rsplit('.').next().unwrap_or_default();
    match method {
        "authenticate" => match call.params.get("authCode").and_then(Value::as_str) {
            Some("denied") | None => (false, json!("denied")),
            Some(code) => (true, json!({"token": format!("tok-{code}")})),
        },
        "getFeeds" => (
            true,
            json!([
                {"id": 1, "assetId": call.params, "type": "twitter"},
                {"id": 2, "assetId": call.params, "type": "instagram"},
            ]),
        ),
        "saveFeed" => {
            let mut asset = call.params.clone();
            if let Some(map) = asset.as_object_mut() {
                map.insert("Id".to_owned(), json!(format!("feed-{}", call.call_id)));
            }
            (true, asset)
        }
        "openPreapprovalDialog" => (false, json!("dialog closed by user")),
        "watchFeeds" => (true, json!({"update": update + 1})),
        _ => (false, json!(format!("unknown method {}", call.name))),
    }
}
