use std::{convert::TryFrom, fmt::Display};

use crate::ErrorKind;

/// Method used for request lines which don't name one
pub const DEFAULT_METHOD: &str = "GET";

/// Describes one outbound HTTP request
///
/// A `Request` is immutable once constructed. The method and target are kept
/// as given; they are only validated when the request gets executed, so that
/// an invalid request produces a [`FetchResult`](crate::FetchResult) with
/// [`ErrorKind::MalformedRequest`] instead of being rejected up front.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Request {
    method: String,
    url: String,
    body: Vec<u8>,
}

impl Request {
    /// Instantiate a new `Request` object
    #[inline]
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Request {
            method: method.into(),
            url: url.into(),
            body: body.into(),
        }
    }

    /// A `GET` request without a body
    #[inline]
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(DEFAULT_METHOD, url, Vec::new())
    }

    /// The HTTP method, e.g. `GET` or `POST`
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The target of the request
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request body. Empty for requests without a body.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parse a request line of the form `[METHOD] URL [BODY]`, falling back
    /// to `default_method` if the line doesn't start with a method.
    ///
    /// Everything after the URL (trimmed) is the body.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedRequest`] if the line is empty or has
    /// trailing content but no leading method.
    pub fn parse_line(line: &str, default_method: &str) -> Result<Self, ErrorKind> {
        let line = line.trim();
        let mut parts = line.splitn(2, char::is_whitespace);
        let first = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ErrorKind::MalformedRequest("empty request line".to_string()))?;
        let rest = parts.next().map(str::trim_start).unwrap_or_default();

        if !looks_like_method(first) {
            if !rest.is_empty() {
                return Err(ErrorKind::MalformedRequest(format!(
                    "expected `[METHOD] URL [BODY]`, got `{line}`"
                )));
            }
            return Ok(Self::new(default_method, first, Vec::new()));
        }

        let mut parts = rest.splitn(2, char::is_whitespace);
        let url = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ErrorKind::MalformedRequest(format!("missing URL after `{first}`")))?;
        let body = parts.next().map(str::trim).unwrap_or_default();

        Ok(Self::new(
            first.to_ascii_uppercase(),
            url,
            body.as_bytes().to_vec(),
        ))
    }
}

/// Methods are plain tokens, URLs always contain a `:` or `/`
fn looks_like_method(token: &str) -> bool {
    token.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-')
}

impl Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

impl TryFrom<&str> for Request {
    type Error = ErrorKind;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        Self::parse_line(line, DEFAULT_METHOD)
    }
}

impl TryFrom<String> for Request {
    type Error = ErrorKind;

    fn try_from(line: String) -> Result<Self, Self::Error> {
        Self::parse_line(&line, DEFAULT_METHOD)
    }
}
