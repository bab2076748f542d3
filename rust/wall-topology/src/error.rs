// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for wall topology reconstruction.
//!
//! Only configuration and JSON errors escape the public API. Malformed
//! primitives and degenerate geometry are raised by stage helpers and
//! recovered by the stage itself (the record or path is dropped).

use crate::primitives::PrimitiveKind;

/// Result type alias for wall topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during wall topology reconstruction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A raw primitive record lacks required coordinate fields.
    #[error("malformed {kind} primitive: {reason}")]
    MalformedPrimitive { kind: PrimitiveKind, reason: String },

    /// A path or room reduced to fewer than the required points.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Caller-supplied configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(kind: PrimitiveKind, reason: impl Into<String>) -> Self {
        Error::MalformedPrimitive {
            kind,
            reason: reason.into(),
        }
    }
}
