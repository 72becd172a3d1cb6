use serde::{Serialize, Serializer};
use std::error::Error as _;
use thiserror::Error;

/// Possible errors when fetching with `fetchall_lib`
///
/// Request-level failures are stored inside the
/// [`FetchResult`](crate::FetchResult) of the request that caused them. They
/// never abort sibling requests and never stop the dispatcher.
///
/// Unlike the errors of the underlying transport, every variant is plain
/// data, so results can be cloned, compared and hashed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The cancellation signal had already fired before an attempt could
    /// start. This includes redirect hops.
    #[error("Request cancelled before it could be sent")]
    Cancelled,

    /// The network call itself failed: connection, timeout, TLS, or reading
    /// the body of an otherwise valid response.
    #[error("Network error: {0}")]
    Transport(String),

    /// The request cannot be turned into a valid outbound call,
    /// e.g. an unknown method or an unparsable target.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The redirect chain was longer than the configured maximum.
    #[error("Stopped after following {0} redirects")]
    TooManyRedirects(usize),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    BuildClient(String),

    /// A configured header name or value is invalid.
    #[error("Header could not be parsed: {0}")]
    InvalidHeader(String),
}

impl ErrorKind {
    /// Whether the error means that no attempt was made at all because of
    /// cancellation
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

// `reqwest` hides the interesting part of an error (e.g. "connection
// refused") in its source chain, so the whole chain is rendered.
impl From<reqwest::Error> for ErrorKind {
    fn from(e: reqwest::Error) -> Self {
        let mut detail = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport(detail)
    }
}

impl From<url::ParseError> for ErrorKind {
    fn from(e: url::ParseError) -> Self {
        Self::MalformedRequest(format!("cannot parse URL: {e}"))
    }
}

impl From<http::method::InvalidMethod> for ErrorKind {
    fn from(e: http::method::InvalidMethod) -> Self {
        Self::MalformedRequest(e.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for ErrorKind {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_kinds_compare_by_value() {
        assert_eq!(
            ErrorKind::Transport("connection refused".into()),
            ErrorKind::Transport("connection refused".into())
        );
        assert_ne!(
            ErrorKind::Transport("connection refused".into()),
            ErrorKind::MalformedRequest("connection refused".into())
        );
        assert!(ErrorKind::Cancelled.is_cancelled());
    }

    #[test]
    fn test_serialize_as_display_string() {
        let json = serde_json::to_string(&ErrorKind::TooManyRedirects(3)).unwrap();
        assert_eq!(json, "\"Stopped after following 3 redirects\"");
    }

    #[test]
    fn test_url_parse_error_is_malformed() {
        let err: ErrorKind = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ErrorKind::MalformedRequest(_)));
    }
}
