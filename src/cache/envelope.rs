//! Envelope Codec
//!
//! Wraps a cached value together with its absolute expiry timestamp. This is
//! the exact record written to disk, one JSON object per file:
//! `{"content": <value>, "expire": <unix millis>}`.

use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Envelope ==
/// A stored value and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The caller-supplied value
    pub content: T,
    /// Expiration timestamp (Unix milliseconds)
    pub expire: u64,
}

impl<T> Envelope<T> {
    /// Creates an envelope that expires `timeout` from now.
    pub fn new(content: T, timeout: Duration) -> Self {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        Self {
            content,
            expire: current_timestamp_ms().saturating_add(timeout_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the envelope has expired.
    ///
    /// An envelope is valid only while `now < expire`, so it counts as expired
    /// from the exact millisecond its timeout elapses.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against an explicit timestamp.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expire
    }

    /// Returns remaining lifetime in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expire.saturating_sub(current_timestamp_ms())
    }
}

// == Codec ==
/// Serializes `content` into envelope bytes expiring `timeout` from now.
pub fn encode<T: Serialize + ?Sized>(content: &T, timeout: Duration) -> Result<Vec<u8>> {
    serde_json::to_vec(&Envelope::new(content, timeout)).map_err(CacheError::Encode)
}

/// Parses envelope bytes. Corrupt or truncated input yields
/// [`CacheError::Decode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<T>> {
    serde_json::from_slice(bytes).map_err(CacheError::Decode)
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
