use std::fmt::Display;

use http::StatusCode;
use serde::{Serialize, Serializer};

use crate::ErrorKind;

/// The outcome of one [`Request`](crate::Request), including all of its
/// redirect hops
///
/// Exactly one `FetchResult` is produced for every request the dispatcher
/// accepts. Only the terminal hop is observable: a chain which fails on its
/// last hop reports that failure, even if earlier hops succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FetchResult {
    /// Position of the request in the input, in the order it was accepted.
    /// Results arrive in completion order, so this is the token to correlate
    /// them with their requests.
    pub index: usize,
    /// The target of the original request, before any redirects
    pub url: String,
    /// Status of the last response received, if any
    #[serde(serialize_with = "serialize_status")]
    pub status: Option<StatusCode>,
    /// Why the request failed, if it did
    pub error: Option<ErrorKind>,
}

impl FetchResult {
    /// A terminal response whose body was fully read
    #[inline]
    #[must_use]
    pub const fn ok(index: usize, url: String, status: StatusCode) -> Self {
        FetchResult {
            index,
            url,
            status: Some(status),
            error: None,
        }
    }

    /// A request which failed before any response was received
    #[inline]
    #[must_use]
    pub const fn failed(index: usize, url: String, error: ErrorKind) -> Self {
        FetchResult {
            index,
            url,
            status: None,
            error: Some(error),
        }
    }

    /// A response was received, but the request still failed afterwards
    /// (e.g. while draining its body)
    #[inline]
    #[must_use]
    pub const fn partial(index: usize, url: String, status: StatusCode, error: ErrorKind) -> Self {
        FetchResult {
            index,
            url,
            status: Some(status),
            error: Some(error),
        }
    }

    /// The numeric status code, `0` if no response was received
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.map_or(0, |s| s.as_u16())
    }

    /// `true` if the request completed without error.
    ///
    /// Note that the status code is not taken into account: a `404`
    /// response that was read completely is a successful fetch.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `true` if the request never started because of cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(ErrorKind::is_cancelled)
    }
}

fn serialize_status<S>(status: &Option<StatusCode>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.map_or(0, |s| s.as_u16()))
}

impl Display for FetchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{}] {}", status.as_u16(), self.url)?,
            None => write!(f, "[ERR] {}", self.url)?,
        }
        if let Some(error) = &self.error {
            write!(f, " | {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_code_defaults_to_zero() {
        let result = FetchResult::failed(
            0,
            "http://127.0.0.1:1".into(),
            ErrorKind::Transport("connection refused".into()),
        );
        assert_eq!(result.status_code(), 0);
        assert!(!result.is_success());
        assert!(!result.is_cancelled());
    }

    #[test]
    fn test_partial_result_keeps_status() {
        let result = FetchResult::partial(
            3,
            "https://example.com".into(),
            StatusCode::OK,
            ErrorKind::Transport("body".into()),
        );
        assert_eq!(result.status_code(), 200);
        assert!(!result.is_success());
    }

    #[test]
    fn test_display() {
        let ok = FetchResult::ok(0, "https://example.com".into(), StatusCode::NOT_FOUND);
        assert_eq!(ok.to_string(), "[404] https://example.com");

        let cancelled = FetchResult::failed(1, "https://example.com".into(), ErrorKind::Cancelled);
        assert_eq!(
            cancelled.to_string(),
            "[ERR] https://example.com | Request cancelled before it could be sent"
        );
        assert!(cancelled.is_cancelled());
    }

    #[test]
    fn test_serialize() {
        let result = FetchResult::ok(7, "https://example.com".into(), StatusCode::OK);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "index": 7,
                "url": "https://example.com",
                "status": 200,
                "error": null,
            })
        );
    }
}
