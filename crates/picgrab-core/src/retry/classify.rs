//! Classify HTTP status and curl errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::{ErrorKind, RetryPolicy};

/// Classify an HTTP status code against the policy's retryable set.
pub fn classify_http_status(code: u32, policy: &RetryPolicy) -> ErrorKind {
    if !policy.is_retryable_status(code) {
        return ErrorKind::Other;
    }
    match code {
        429 => ErrorKind::Throttled,
        _ => ErrorKind::RetryableStatus(code as u16),
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a request error into an ErrorKind.
pub fn classify(e: &FetchError, policy: &RetryPolicy) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code, policy),
        FetchError::Rejected(_) | FetchError::Storage(_) => ErrorKind::Other,
    }
}
