//! Security subsystem.
//!
//! The forwarder carries no authorization policy of its own; bearer tokens
//! pass through to the upstream untouched. The only concern handled here is
//! which headers may cross the relay in each direction.

pub mod headers;

pub use headers::{sanitize_request_headers, sanitize_response_headers};
