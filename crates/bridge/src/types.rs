//! Shared value types for the bridge: payloads, envelopes, call options and
//! timestamps.
//!
//! Payloads are deliberately untyped. [`Payload`] is the JSON sum type
//! {null, boolean, number, string, array, string-keyed map}; the bridge does
//! not assume any richer schema for `params` or `data`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CallId, MethodName};

/// An untyped payload carried in `params` (outbound) or `data` (inbound).
pub type Payload = serde_json::Value;

/// A unary callback receiving the `data` of a response.
///
/// `FnMut` because persistent calls invoke the same callback once per
/// response.
pub type Callback = Box<dyn FnMut(Payload)>;

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

/// The outbound record for one method invocation, exactly as serialised onto
/// the wire.
///
/// Callbacks are local-only and never part of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnvelope {
    /// Fully-qualified method name (`"<prefix>.<method>"` when built by a namespace).
    pub name: MethodName,
    /// Arbitrary parameters for the host.
    pub params: Payload,
    /// Protocol tag.
    pub namespace: String,
    /// Identifier the host echoes back in its responses.
    pub call_id: CallId,
    /// No response expected; never tracked.
    pub transient: bool,
    /// Several responses expected; tracking survives each dispatch.
    pub persistent: bool,
}

/// The inbound record correlating to a prior [`CallEnvelope`].
///
/// Only produced for messages that carry the expected namespace and a boolean
/// `success`; everything else is filtered out before one is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Call the response belongs to. `None` when the message carried no
    /// usable positive integer, which can never match a pending call.
    pub call_id: Option<CallId>,
    /// Selects the success or the error callback.
    pub success: bool,
    /// Delivered to the selected callback; [`Payload::Null`] when absent.
    pub data: Payload,
}

// ---------------------------------------------------------------------------
// Call options
// ---------------------------------------------------------------------------

/// A callback as supplied by the caller.
///
/// Options assembled from untyped configuration may carry a value in a
/// callback slot; such a value is not invocable and `send` rejects it.
pub enum CallbackSlot {
    /// An invocable callback.
    Function(Callback),
    /// A value that was supplied where a function was expected.
    Value(Payload),
}

impl std::fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackSlot::Function(_) => f.write_str("Function(..)"),
            CallbackSlot::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// The configuration a caller hands to [`crate::Transport::send`].
///
/// Mirrors the envelope shape plus the two local callbacks. `name` is
/// optional here so a nameless call can be expressed and rejected.
#[derive(Debug, Default)]
pub struct CallOptions {
    /// Method name. Required by `send`; an empty string counts as missing.
    pub name: Option<String>,
    /// Parameters for the host.
    pub params: Payload,
    /// Protocol tag override. `send` falls back to the transport's configured
    /// namespace when unset.
    pub namespace: Option<String>,
    /// Fire-and-forget: no response expected, nothing tracked.
    pub transient: bool,
    /// Expect multiple responses; tracking is never removed by a response.
    pub persistent: bool,
    /// Invoked with `data` for `success: true` responses.
    pub success_callback: Option<CallbackSlot>,
    /// Invoked with `data` for `success: false` responses.
    pub error_callback: Option<CallbackSlot>,
}

impl CallOptions {
    /// Starts options for a call to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the call parameters.
    pub fn params(mut self, params: impl Into<Payload>) -> Self {
        self.params = params.into();
        self
    }

    /// Marks the call as fire-and-forget.
    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    /// Marks the call as expecting multiple responses.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Sets the success callback.
    pub fn on_success(mut self, callback: impl FnMut(Payload) + 'static) -> Self {
        self.success_callback = Some(CallbackSlot::Function(Box::new(callback)));
        self
    }

    /// Sets the error callback.
    pub fn on_error(mut self, callback: impl FnMut(Payload) + 'static) -> Self {
        self.error_callback = Some(CallbackSlot::Function(Box::new(callback)));
        self
    }

    /// Builds options from an untyped, envelope-shaped configuration object.
    ///
    /// Flags are coerced by truthiness. A truthy value under `successCallback`
    /// or `errorCallback` is kept as [`CallbackSlot::Value`] so that `send`
    /// reports it; falsy values there mean "no callback". A non-object input
    /// yields options without a name.
    pub fn from_json(value: &Payload) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let slot = |key: &str| {
            map.get(key)
                .filter(|v| is_truthy(v))
                .map(|v| CallbackSlot::Value(v.clone()))
        };
        Self {
            name: map
                .get("name")
                .and_then(Payload::as_str)
                .map(str::to_owned),
            params: map.get("params").cloned().unwrap_or(Payload::Null),
            namespace: map
                .get("namespace")
                .and_then(Payload::as_str)
                .map(str::to_owned),
            transient: map.get("transient").is_some_and(is_truthy),
            persistent: map.get("persistent").is_some_and(is_truthy),
            success_callback: slot("successCallback"),
            error_callback: slot("errorCallback"),
        }
    }
}

/// JavaScript truthiness over a JSON value.
pub(crate) fn is_truthy(value: &Payload) -> bool {
    match value {
        Payload::Null => false,
        Payload::Bool(b) => *b,
        Payload::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Payload::String(s) => !s.is_empty(),
        Payload::Array(_) | Payload::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Introspection
// ---------------------------------------------------------------------------

/// A read-only view of one entry in the pending-call table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCallSummary {
    /// Identifier of the call.
    pub call_id: CallId,
    /// Wire name of the call.
    pub name: MethodName,
    /// Whether the entry survives dispatch.
    pub persistent: bool,
    /// When the call was handed to the window.
    pub sent_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
