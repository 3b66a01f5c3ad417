use std::fmt;

use thiserror::Error;

use crate::audio::EndpointId;

/// Transfer direction of a failed PCM operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoOp::Read => f.write_str("read"),
            IoOp::Write => f.write_str("write"),
        }
    }
}

/// Failures that end one bridging session.
///
/// None of these are fatal to the process: the session tears down its
/// endpoints and control goes back to call-state polling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("unable to open {endpoint}: {reason}")]
    EndpointOpen { endpoint: EndpointId, reason: String },

    #[error("unable to allocate {bytes} bytes for {endpoint}")]
    Allocation { endpoint: EndpointId, bytes: usize },

    #[error("{op} failed on {endpoint}: {reason}")]
    Io {
        endpoint: EndpointId,
        op: IoOp,
        reason: String,
    },
}

impl BridgeError {
    pub fn endpoint(&self) -> EndpointId {
        match self {
            BridgeError::EndpointOpen { endpoint, .. }
            | BridgeError::Allocation { endpoint, .. }
            | BridgeError::Io { endpoint, .. } => *endpoint,
        }
    }
}
