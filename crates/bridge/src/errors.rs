//! Error types for the bridge.
//!
//! [`BridgeError`] covers every failure the bridge can name. Only
//! [`BridgeError::MissingName`], [`BridgeError::InvalidCallback`],
//! [`BridgeError::InvalidArgument`] and [`BridgeError::Configuration`] ever
//! reach a caller. Serialisation and delivery failures are logged and
//! swallowed by the transport; the caller still receives its [`crate::CallId`].
//!
//! Inbound noise (unparseable, foreign or unmatched messages) is not an error
//! at all and has no variant here.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Callback slots
// ---------------------------------------------------------------------------

/// Which of the two callbacks of a call an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// The callback invoked for `success: true` responses.
    Success,
    /// The callback invoked for `success: false` responses.
    Error,
}

impl std::fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackKind::Success => f.write_str("Success"),
            CallbackKind::Error => f.write_str("Error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bridge errors
// ---------------------------------------------------------------------------

/// Errors produced by the bridge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A call was attempted without a method name.
    ///
    /// Raised synchronously by `send`; nothing is allocated, stored or posted.
    #[error("All transport method calls must have a name.")]
    MissingName,

    /// A call supplied a callback that cannot be invoked.
    ///
    /// Raised synchronously by `send` before anything is stored or posted.
    #[error("{callback} callback must be a function.")]
    InvalidCallback {
        /// The offending callback slot.
        callback: CallbackKind,
    },

    /// A namespace operation received an argument of the wrong shape.
    ///
    /// Raised by namespace argument validation before a call is built.
    #[error("{message}")]
    InvalidArgument {
        /// Human-readable description (e.g. `"No assetid provided."`).
        message: String,
    },

    /// A call envelope could not be serialised to the wire format.
    #[error("Serialization failed: {message}")]
    Serialization {
        /// Details about the serialisation failure.
        message: String,
    },

    /// The parent window refused or failed to accept a posted message.
    #[error("Delivery failed: {message}")]
    Delivery {
        /// Details about the delivery failure.
        message: String,
    },

    /// The bridge configuration is invalid.
    ///
    /// Produced at construction time; a transport never starts with an
    /// invalid config.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<crate::window::DeliveryError> for BridgeError {
    fn from(err: crate::window::DeliveryError) -> Self {
        BridgeError::Delivery {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_the_sdk_wording() {
        assert_eq!(
            BridgeError::MissingName.to_string(),
            "All transport method calls must have a name."
        );
        assert_eq!(
            BridgeError::InvalidCallback {
                callback: CallbackKind::Error
            }
            .to_string(),
            "Error callback must be a function."
        );
    }
}
