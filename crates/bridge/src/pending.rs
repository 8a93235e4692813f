//! The pending-call table: calls awaiting one or more responses, keyed by
//! [`CallId`].
//!
//! Entries are inserted and removed in any order. The table is owned by a
//! single transport and never exposed mutably outside the crate.

use std::collections::BTreeMap;

use crate::types::{CallEnvelope, Callback, PendingCallSummary, Timestamp};
use crate::CallId;

/// A call that is still awaiting a response.
pub(crate) struct PendingCall {
    pub(crate) envelope: CallEnvelope,
    /// `None` only while the callback is out on loan to a dispatch.
    pub(crate) on_success: Option<Callback>,
    pub(crate) on_error: Option<Callback>,
    pub(crate) sent_at: Timestamp,
}

impl PendingCall {
    pub(crate) fn new(envelope: CallEnvelope, on_success: Callback, on_error: Callback) -> Self {
        Self {
            envelope,
            on_success: Some(on_success),
            on_error: Some(on_error),
            sent_at: Timestamp::now(),
        }
    }

    fn slot(&mut self, success: bool) -> &mut Option<Callback> {
        if success {
            &mut self.on_success
        } else {
            &mut self.on_error
        }
    }

    /// Takes the callback selected by `success` out of the entry.
    pub(crate) fn take_callback(&mut self, success: bool) -> Option<Callback> {
        self.slot(success).take()
    }

    /// Puts a callback taken with [`take_callback`](Self::take_callback) back.
    pub(crate) fn restore_callback(&mut self, success: bool, callback: Callback) {
        let slot = self.slot(success);
        if slot.is_none() {
            *slot = Some(callback);
        }
    }

    fn summary(&self) -> PendingCallSummary {
        PendingCallSummary {
            call_id: self.envelope.call_id,
            name: self.envelope.name.clone(),
            persistent: self.envelope.persistent,
            sent_at: self.sent_at,
        }
    }
}

/// Mapping from [`CallId`] to the call awaiting a response under it.
#[derive(Default)]
pub(crate) struct PendingCallTable {
    calls: BTreeMap<CallId, PendingCall>,
}

impl PendingCallTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `call` under its own id.
    ///
    /// Ids are allocated by a monotonic counter, so an occupied slot means
    /// the counter was bypassed; the existing entry is kept.
    pub(crate) fn insert(&mut self, call: PendingCall) -> bool {
        use std::collections::btree_map::Entry;

        match self.calls.entry(call.envelope.call_id) {
            Entry::Vacant(slot) => {
                slot.insert(call);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub(crate) fn get_mut(&mut self, call_id: CallId) -> Option<&mut PendingCall> {
        self.calls.get_mut(&call_id)
    }

    pub(crate) fn remove(&mut self, call_id: CallId) -> Option<PendingCall> {
        self.calls.remove(&call_id)
    }

    pub(crate) fn contains(&self, call_id: CallId) -> bool {
        self.calls.contains_key(&call_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }

    /// Snapshot of every entry, ordered by call id.
    pub(crate) fn summaries(&self) -> Vec<PendingCallSummary> {
        self.calls.values().map(PendingCall::summary).collect()
    }
}
