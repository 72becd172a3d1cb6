//! The network client used by the executor.
//!
//! This module defines the [`HttpClient`] and [`HttpResponse`] traits, which
//! are the only capabilities the dispatcher needs from a transport: "send one
//! request, receive one response or an error" and "read a response body to
//! the end". Both are implemented for `reqwest`.
//!
//! [`ClientBuilder`] creates a `reqwest::Client` which is suitable for the
//! executor. In particular, it never follows redirects itself, because
//! following them is the job of the [`Executor`](crate::Executor).
#![allow(clippy::module_name_repetitions)]
use std::time::Duration;

use async_trait::async_trait;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, StatusCode};
use log::debug;
use typed_builder::TypedBuilder;
use url::Url;

use crate::{ErrorKind, Result};

/// Default user agent, `fetchall/<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("fetchall/", env!("CARGO_PKG_VERSION"));

// Constants currently not configurable by the user.
/// A timeout for only the connect phase of a Client.
const CONNECT_TIMEOUT: u64 = 10;
/// TCP keepalive
/// See <https://tldp.org/HOWTO/TCP-Keepalive-HOWTO/overview.html> for more info
const TCP_KEEPALIVE: u64 = 60;

/// Sends a single HTTP request and hands back the response.
///
/// Implementations are shared by all tasks of a dispatch session and must be
/// safe for concurrent use. They must not follow redirects.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// The response type produced by this client
    type Response: HttpResponse;

    /// Issue exactly one HTTP call.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Transport`] if the call fails before a response
    /// was received.
    async fn send(&self, method: Method, url: Url, body: Vec<u8>) -> Result<Self::Response>;
}

/// A response whose body has not been read yet.
///
/// Dropping a response releases its body.
#[async_trait]
pub trait HttpResponse: Send + 'static {
    /// The status code of the response
    fn status(&self) -> StatusCode;

    /// The raw value of the `Location` header, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedRequest`] if the header is not valid
    /// UTF-8.
    fn location(&self) -> Result<Option<String>>;

    /// Read the whole body and discard it, returning the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Transport`] if reading the body fails.
    async fn drain(self) -> Result<u64>;
}

#[async_trait]
impl HttpClient for reqwest::Client {
    type Response = reqwest::Response;

    async fn send(&self, method: Method, url: Url, body: Vec<u8>) -> Result<reqwest::Response> {
        let mut request = self.request(method, url);
        if !body.is_empty() {
            request = request.body(body);
        }
        Ok(request.send().await?)
    }
}

#[async_trait]
impl HttpResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }

    fn location(&self) -> Result<Option<String>> {
        let Some(value) = self.headers().get(header::LOCATION) else {
            return Ok(None);
        };
        let location = value.to_str().map_err(|_| {
            ErrorKind::MalformedRequest(format!(
                "{} response with a Location header which is not valid UTF-8",
                self.status()
            ))
        })?;
        Ok(Some(location.to_owned()))
    }

    async fn drain(mut self) -> Result<u64> {
        let mut read = 0;
        while let Some(chunk) = self.chunk().await? {
            read += chunk.len() as u64;
        }
        debug!("Drained {read} bytes from {}", self.url());
        Ok(read)
    }
}

/// Builder for the `reqwest::Client` used to execute requests.
///
/// ```
/// use fetchall_lib::ClientBuilder;
/// use std::time::Duration;
///
/// # fn main() -> fetchall_lib::Result<()> {
/// let client = ClientBuilder::builder()
///     .user_agent("my-agent/1.0")
///     .timeout(Duration::from_secs(5))
///     .build()
///     .client()?;
/// # Ok(())
/// # }
/// ```
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
#[builder(builder_method(doc = "
Create a builder for building `ClientBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `ClientBuilder`.
"))]
pub struct ClientBuilder {
    /// User-agent sent with every request.
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)")]
    user_agent: String,

    /// Total timeout of a single attempt (connect, send and read the body).
    ///
    /// The executor never cancels an attempt which is already in flight, so
    /// this is what bounds slow servers. `None` means no timeout.
    timeout: Option<Duration>,

    /// When `true`, accept invalid SSL certificates.
    ///
    /// ## Warning
    ///
    /// You should think very carefully before using this method. If
    /// invalid certificates are trusted, any certificate for any site
    /// will be trusted for use. This includes expired certificates. This
    /// introduces significant vulnerabilities, and should only be used
    /// as a last resort.
    allow_insecure: bool,

    /// Sets the default [headers] for every request.
    ///
    /// [headers]: https://docs.rs/http/latest/http/header/struct.HeaderName.html
    custom_headers: HeaderMap,
}

impl Default for ClientBuilder {
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientBuilder {
    /// Instantiates a `reqwest::Client`.
    ///
    /// Redirects are disabled on the returned client.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - The user-agent is invalid.
    /// - The request client cannot be created.
    ///   See [here](https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#errors).
    pub fn client(self) -> Result<reqwest::Client> {
        let Self {
            user_agent,
            timeout,
            allow_insecure,
            custom_headers: mut headers,
        } = self;

        headers.insert(header::USER_AGENT, HeaderValue::from_str(&user_agent)?);

        let builder = reqwest::ClientBuilder::new()
            .gzip(true)
            .default_headers(headers)
            .danger_accept_invalid_certs(allow_insecure)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
            .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE))
            .redirect(reqwest::redirect::Policy::none());

        (match timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        })
        .build()
        .map_err(|e| ErrorKind::BuildClient(e.to_string()))
    }
}
