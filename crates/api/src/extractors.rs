//! Request extractors.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use sana_core::analytics::TimezoneOffset;

/// Header carrying the client's `Date.getTimezoneOffset()` in minutes.
pub const TIMEZONE_OFFSET_HEADER: &str = "x-timezone-offset";

/// The client's UTC offset; missing or malformed headers mean UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimezone(pub TimezoneOffset);

impl<S> FromRequestParts<S> for ClientTimezone
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TIMEZONE_OFFSET_HEADER)
            .and_then(|v| v.to_str().ok());
        Ok(Self(TimezoneOffset::from_header(raw)))
    }
}
