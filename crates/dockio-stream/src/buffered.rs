//! Helpers for fully buffered response bodies.
//!
//! Pair with [`buffer_all`](crate::buffer_all) for endpoints that answer
//! with a single document instead of a stream.

use serde::de::DeserializeOwned;

use crate::error::Result;

/// A `text/plain` body. Invalid UTF-8 is replaced, never rejected.
pub fn expect_plain(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

/// An `application/json` body decoded into `T`.
pub fn expect_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

/// A `204 No Content` body. Whatever the daemon sent anyway is returned as text.
pub fn expect_empty(body: &[u8]) -> String {
    expect_plain(body)
}
