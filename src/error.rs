use thiserror::Error;

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A mutation rejected locally, before any network traffic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No records selected")]
    EmptySelection,

    #[error("Batch delete requires the admin role")]
    NotPermitted,

    #[error("Confirmation declined")]
    ConfirmationDeclined,
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// A remote call that failed after leaving the client.
///
/// `Connection` covers network-level failures with no HTTP response (the
/// generic connection-error message is derived from it). `Api` covers any
/// response that carried a failure: non-2xx status or a `success: false`
/// body, with the server-provided message. `Unauthorized` is a 401: the auth
/// collaborator's session is no longer valid and the call is never retried.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Unauthorized(String),
}

impl TransportError {
    /// Construct an `Api` error with a fallback message when the server body
    /// had none.
    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api {
            status,
            message: message.unwrap_or_else(|| format!("Request failed with status {status}")),
        }
    }

    /// The text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

// ---------------------------------------------------------------------------
// RosterError — top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum RosterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Convenience alias — the default error type is `RosterError`.
pub type Result<T, E = RosterError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
