//! The transport: call-id allocation, the pending-call table, and the
//! correlation of inbound responses to outbound calls.
//!
//! A [`Transport`] posts serialised [`CallEnvelope`]s to its
//! [`ParentWindow`] and registers one message listener on it. Every message
//! arriving in the window reaches [`Transport::receive`], which filters out
//! foreign traffic and echoes of its own calls, matches the rest by call id
//! and invokes the selected callback synchronously.
//!
//! ## Call lifecycle
//!
//! | Kind | States |
//! |------|--------|
//! | default | `CREATED → PENDING → SETTLED` |
//! | persistent | `CREATED → PENDING → DISPATCHED → PENDING …` until [`Transport::cancel`] |
//! | transient | `CREATED → FIRE-AND-FORGET` |
//!
//! ## Threading
//!
//! Single-threaded and event driven. The handle is `Clone` but not `Send`;
//! callbacks may capture a clone and call back into [`Transport::send`] or
//! [`Transport::cancel`] while they run. No borrow of the table is held while
//! a callback runs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, error, trace};

use crate::errors::CallbackKind;
use crate::namespace::Method;
use crate::pending::{PendingCall, PendingCallTable};
use crate::types::{
    CallEnvelope, Callback, CallbackSlot, CallOptions, PendingCallSummary, ResponseEnvelope,
};
use crate::window::{MessageEvent, ParentWindow};
use crate::{BridgeConfig, BridgeError, CallId, MethodName, TransportId};

struct Inner {
    id: TransportId,
    config: BridgeConfig,
    window: Box<dyn ParentWindow>,
    /// Last allocated call id; pre-incremented so the first call gets 1.
    last_call_id: Cell<u64>,
    pending: RefCell<PendingCallTable>,
}

/// Correlates calls posted to a parent window with the responses it sends back.
#[derive(Clone)]
pub struct Transport {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("id", &self.inner.id)
            .field("last_call_id", &self.inner.last_call_id.get())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Transport {
    /// Creates a transport posting to `window` and registers its message
    /// listener there.
    ///
    /// The listener holds a weak handle: once every [`Transport`] clone is
    /// dropped, further events are ignored.
    pub fn new(window: impl ParentWindow + 'static, config: BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;

        let inner = Rc::new(Inner {
            id: TransportId::new_random(),
            config,
            window: Box::new(window),
            last_call_id: Cell::new(0),
            pending: RefCell::new(PendingCallTable::new()),
        });

        let weak = Rc::downgrade(&inner);
        inner.window.add_message_listener(Box::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                Transport { inner }.receive(event);
            }
        }));

        debug!(transport = %inner.id, namespace = %inner.config.namespace, "transport created");
        Ok(Self { inner })
    }

    /// Identifier of this transport instance.
    pub fn id(&self) -> TransportId {
        self.inner.id
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Makes a call against the parent window.
    ///
    /// Fails synchronously with [`BridgeError::MissingName`] before an id is
    /// allocated, or with [`BridgeError::InvalidCallback`] after one is, so a
    /// rejected callback still consumes its id. In both cases nothing is
    /// stored or posted. Otherwise the call is stored (unless transient)
    /// before it is posted, and its id is returned even when serialisation or
    /// posting fails. Those failures are logged only.
    pub fn send(&self, options: CallOptions) -> Result<CallId, BridgeError> {
        let CallOptions {
            name,
            params,
            namespace,
            transient,
            persistent,
            success_callback,
            error_callback,
        } = options;

        let name = name.and_then(MethodName::new).ok_or(BridgeError::MissingName)?;
        let call_id = self.next_call_id();
        let on_success = resolve_callback(success_callback, CallbackKind::Success)?;
        let on_error = resolve_callback(error_callback, CallbackKind::Error)?;

        let envelope = CallEnvelope {
            name,
            params,
            namespace: namespace.unwrap_or_else(|| self.inner.config.namespace.clone()),
            call_id,
            transient,
            persistent,
        };

        debug!(
            transport = %self.inner.id,
            call_id = %call_id,
            method = %envelope.name,
            transient,
            persistent,
            "calling method"
        );

        let wire = serde_json::to_string(&envelope);

        if !transient {
            self.inner
                .pending
                .borrow_mut()
                .insert(PendingCall::new(envelope, on_success, on_error));
        }

        if let Err(err) = wire.map_err(BridgeError::from).and_then(|m| self.post(&m)) {
            error!(
                transport = %self.inner.id,
                call_id = %call_id,
                error = %err,
                "call could not be delivered to the parent window"
            );
        }

        Ok(call_id)
    }

    /// Returns a [`Method`] that prefixes names with `prefix.` and stamps the
    /// protocol namespace before delegating to [`send`](Self::send).
    pub fn factory(&self, prefix: impl Into<String>) -> Method {
        Method::new(self.clone(), prefix.into())
    }

    fn next_call_id(&self) -> CallId {
        let next = self.inner.last_call_id.get() + 1;
        self.inner.last_call_id.set(next);
        CallId::new(next)
    }

    fn post(&self, message: &str) -> Result<(), BridgeError> {
        self.inner
            .window
            .post_message(message, &self.inner.config.target_origin)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Handles one inbound message event.
    ///
    /// Returns `true` only if the event was a response to a live pending call
    /// and a callback was invoked. Everything else (untrusted origins,
    /// non-JSON payloads, foreign formats, echoes of outbound calls, unknown
    /// or settled call ids) is dropped without side effects.
    pub fn receive(&self, event: &MessageEvent) -> bool {
        let id = self.inner.id;

        if !self.inner.config.trusts_origin(&event.origin) {
            debug!(transport = %id, origin = %event.origin, "dropping message from untrusted origin");
            return false;
        }

        let response = match parse_response(&event.data, &self.inner.config.namespace) {
            Inbound::Response(response) => response,
            Inbound::Echo => {
                trace!(transport = %id, "ignoring outbound call seen on the window");
                return false;
            }
            Inbound::Foreign => {
                debug!(
                    transport = %id,
                    origin = %event.origin,
                    data = %event.data,
                    "did not recognize window message response format"
                );
                return false;
            }
            Inbound::Unparseable => {
                debug!(
                    transport = %id,
                    origin = %event.origin,
                    data = %event.data,
                    "did not recognize non-JSON window message"
                );
                return false;
            }
        };

        match response.call_id {
            Some(call_id) => self.dispatch(call_id, response.success, response.data),
            None => {
                debug!(transport = %id, "response carries no usable call id");
                false
            }
        }
    }

    fn dispatch(&self, call_id: CallId, success: bool, data: Value) -> bool {
        let id = self.inner.id;

        // The removed entry is kept alive until after the callback so that
        // dropping its other callback never happens under the table borrow.
        let (callback, persistent, _settled) = {
            let mut table = self.inner.pending.borrow_mut();
            let persistent = match table.get_mut(call_id) {
                Some(entry) => entry.envelope.persistent,
                None => {
                    debug!(transport = %id, call_id = %call_id, "no pending call for response");
                    return false;
                }
            };
            if persistent {
                let callback = table
                    .get_mut(call_id)
                    .and_then(|entry| entry.take_callback(success));
                (callback, true, None)
            } else {
                let mut entry = table.remove(call_id);
                let callback = entry.as_mut().and_then(|e| e.take_callback(success));
                (callback, false, entry)
            }
        };

        let Some(mut callback) = callback else {
            debug!(
                transport = %id,
                call_id = %call_id,
                "callback is already running; response dropped"
            );
            return false;
        };

        debug!(
            transport = %id,
            call_id = %call_id,
            success,
            persistent,
            "calling method {} callback",
            if success { "success" } else { "error" }
        );
        callback(data);

        if persistent {
            if let Some(entry) = self.inner.pending.borrow_mut().get_mut(call_id) {
                entry.restore_callback(success, callback);
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Pending-call management
    // -----------------------------------------------------------------------

    /// Removes a pending call without invoking any callback.
    ///
    /// Returns `true` if an entry was removed. This is the only way to retire
    /// a persistent call.
    pub fn cancel(&self, call_id: CallId) -> bool {
        let removed = self.inner.pending.borrow_mut().remove(call_id);
        let cancelled = removed.is_some();
        drop(removed);
        debug!(transport = %self.inner.id, call_id = %call_id, cancelled, "cancel");
        cancelled
    }

    /// Returns `true` if `call_id` resolves to a live pending call.
    pub fn is_pending(&self, call_id: CallId) -> bool {
        self.inner.pending.borrow().contains(call_id)
    }

    /// Number of calls awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Snapshot of the pending calls, ordered by call id.
    pub fn pending_calls(&self) -> Vec<PendingCallSummary> {
        self.inner.pending.borrow().summaries()
    }
}

fn noop() -> Callback {
    Box::new(|_| {})
}

fn resolve_callback(slot: Option<CallbackSlot>, kind: CallbackKind) -> Result<Callback, BridgeError> {
    match slot {
        None => Ok(noop()),
        Some(CallbackSlot::Function(callback)) => Ok(callback),
        Some(CallbackSlot::Value(_)) => Err(BridgeError::InvalidCallback { callback: kind }),
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Classification of an inbound payload.
#[derive(Debug, PartialEq)]
enum Inbound {
    /// Carries our namespace and a boolean `success`.
    Response(ResponseEnvelope),
    /// Carries our namespace but no boolean `success`: one of our own calls.
    Echo,
    /// Structured data in some other format.
    Foreign,
    /// Not JSON, or JSON that is not an object or array.
    Unparseable,
}

fn parse_response(data: &str, namespace: &str) -> Inbound {
    let value: Value = match serde_json::from_str(data) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => return Inbound::Unparseable,
    };

    let ours = value.get("namespace").and_then(Value::as_str) == Some(namespace);
    match (ours, value.get("success").and_then(Value::as_bool)) {
        (true, Some(success)) => Inbound::Response(ResponseEnvelope {
            call_id: value.get("callId").and_then(wire_call_id),
            success,
            data: value.get("data").cloned().unwrap_or(Value::Null),
        }),
        (true, None) => Inbound::Echo,
        (false, _) => Inbound::Foreign,
    }
}

/// Reads a call id written either as an integer or as an integral float
/// (`1.0`), as some host serialisers emit.
fn wire_call_id(value: &Value) -> Option<CallId> {
    let id = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 1.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })?;
    (id > 0).then(|| CallId::new(id))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn non_object_json_is_unparseable() {
        for data in ["", "not json", "null", "42", "\"text\"", "true"] {
            assert_eq!(parse_response(data, "Enplug"), Inbound::Unparseable, "{data}");
        }
    }

    #[test]
    fn arrays_are_structured_but_foreign() {
        assert_eq!(parse_response("[1,2]", "Enplug"), Inbound::Foreign);
    }

    #[test]
    fn outbound_call_is_an_echo() {
        let call = json!({
            "name": "app.social.getFeeds",
            "params": "abc",
            "namespace": "Enplug",
            "callId": 1,
            "transient": false,
            "persistent": false
        });
        assert_eq!(parse_response(&call.to_string(), "Enplug"), Inbound::Echo);
    }

    #[test]
    fn string_success_is_not_a_response() {
        let msg = json!({"namespace": "Enplug", "callId": 1, "success": "true"});
        assert_eq!(parse_response(&msg.to_string(), "Enplug"), Inbound::Echo);
    }

    #[test]
    fn response_fields_are_extracted() {
        let msg = json!({"namespace": "Enplug", "callId": 4, "success": false, "data": "denied"});
        assert_eq!(
            parse_response(&msg.to_string(), "Enplug"),
            Inbound::Response(ResponseEnvelope {
                call_id: Some(CallId::new(4)),
                success: false,
                data: json!("denied"),
            })
        );
    }

    #[test]
    fn missing_data_is_null_and_bad_call_id_is_none() {
        let msg = json!({"namespace": "Enplug", "callId": "4", "success": true});
        assert_eq!(
            parse_response(&msg.to_string(), "Enplug"),
            Inbound::Response(ResponseEnvelope {
                call_id: None,
                success: true,
                data: Value::Null,
            })
        );
    }

    #[test]
    fn integral_float_call_id_is_accepted() {
        assert_eq!(wire_call_id(&json!(1.0)), Some(CallId::new(1)));
        assert_eq!(wire_call_id(&json!(7)), Some(CallId::new(7)));
        assert_eq!(wire_call_id(&json!(1.5)), None);
        assert_eq!(wire_call_id(&json!(0.0)), None);
        assert_eq!(wire_call_id(&json!(-2.0)), None);
        assert_eq!(wire_call_id(&json!(0)), None);
    }

    #[test]
    fn other_namespace_is_foreign() {
        let msg = json!({"namespace": "Other", "callId": 1, "success": true});
        assert_eq!(parse_response(&msg.to_string(), "Enplug"), Inbound::Foreign);
    }
}
