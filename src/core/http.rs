//! HTTP plumbing shared by the REST-based STT and TTS clients.

use std::time::Duration;

use reqwest::{Client, StatusCode};

/// Time allowed to establish a connection to a vendor.
pub const PROVIDER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest a vendor may stay silent while a response is read.
///
/// Applies per read, so a slowly consumed synthesis stream can outlive it.
pub const PROVIDER_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// How a failed vendor call should be treated by the gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    /// Credentials rejected
    Auth,
    /// Vendor down, overloaded, or unreachable
    Unavailable,
    /// Vendor refused the audio encoding
    UnsupportedFormat,
    /// Anything else; never triggers fallback
    Other,
}

/// Map a non-success HTTP status to a failure kind.
pub(crate) fn classify_status(status: StatusCode) -> FailureKind {
    match status.as_u16() {
        401 | 403 => FailureKind::Auth,
        408 | 429 => FailureKind::Unavailable,
        415 => FailureKind::UnsupportedFormat,
        s if s >= 500 => FailureKind::Unavailable,
        _ => FailureKind::Other,
    }
}

/// Map a transport-level reqwest error to a failure kind.
pub(crate) fn classify_transport(err: &reqwest::Error) -> FailureKind {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        return FailureKind::Unavailable;
    }
    match err.status() {
        Some(status) => classify_status(status),
        None => FailureKind::Other,
    }
}

/// Build the pooled client shared by every provider of the process.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    client_with_timeouts(PROVIDER_CONNECT_TIMEOUT, PROVIDER_READ_TIMEOUT)
}

fn client_with_timeouts(connect: Duration, read: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(connect)
        .read_timeout(read)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}

/// Trim a vendor error body so it stays readable in logs and error events.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
