//! Dispatcher-level error taxonomy
//!
//! Matches §7: protocol-shape failures (malformed JSON, a missing field) are
//! logged and the message dropped, never propagated past the poll loop that
//! produced them. [`DispatchError`] exists so the parsing functions in
//! [`crate::inbound`] have something precise to return; nothing in this
//! crate turns one into a process exit.

use spread_core::errors::ConversionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed {kind} message: {source}")]
    MalformedJson {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} message failed float-to-decimal conversion: {source}")]
    BadDecimal {
        kind: &'static str,
        #[source]
        source: ConversionError,
    },
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::MalformedJson { kind, .. } => kind,
            DispatchError::BadDecimal { kind, .. } => kind,
        }
    }
}
