//! Request and response types exchanged over the public HTTP API.
//!
//! Profile bodies themselves are typed in the service crate; these are the
//! envelopes around them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Profile endpoints
// ---------------------------------------------------------------------------

/// Successful response body for `POST /profiles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileResponse {
    /// Identifier assigned to the stored profile.
    pub id: String,
}

/// Response body for `GET /profiles/:id`, and each element of `GET /profiles`.
///
/// `profile` is the stored record with every sealed field opened back to
/// plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: String,
    pub profile: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Number of profiles currently stored.
    pub profiles_stored: usize,
    /// Number of path groups in the active encryption policy.
    pub path_groups: usize,
}
