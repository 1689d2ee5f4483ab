//! One method per backend operation.
//!
//! Each wrapper maps a method name to an HTTP verb and path and nothing
//! more: no validation, no retries, no caching. Failures surface as
//! [`crate::ApiError`]; turn them into text with [`crate::extract_error`].

mod admin;
mod auth;
mod bookings;
mod contact;
mod payments;
mod rooms;
mod services;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value for use as a single path segment.
pub(crate) fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
