//! Execution of a single request, including the redirects it triggers.
//!
//! Redirects are followed by an explicit loop instead of recursion, so a long
//! chain does not grow the stack. Each hop reuses the method and body of the
//! original request. Before every attempt the cancellation token is checked;
//! an attempt which is already in flight is never interrupted.
//!
//! By default the number of hops is unbounded and a server which redirects
//! forever keeps the executor busy until cancellation. Set
//! [`Executor::max_redirects`] to put a cap on it.
use std::sync::Arc;

use http::{Method, StatusCode};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{ErrorKind, FetchResult, HttpClient, HttpResponse, Request};

/// Runs requests against a shared [`HttpClient`].
///
/// Cloning an `Executor` is cheap; all clones share the same client.
#[derive(Debug)]
pub struct Executor<C> {
    client: Arc<C>,
    max_redirects: Option<usize>,
}

impl<C> Clone for Executor<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            max_redirects: self.max_redirects,
        }
    }
}

impl<C: HttpClient> Executor<C> {
    /// Create an executor which follows redirects without limit
    #[must_use]
    pub fn new(client: C) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// Create an executor from a client which is shared with other code
    #[must_use]
    pub const fn from_shared(client: Arc<C>) -> Self {
        Self {
            client,
            max_redirects: None,
        }
    }

    /// Give up after following `max` redirects of one request.
    /// `None` follows redirects until the chain ends.
    #[must_use]
    pub const fn max_redirects(mut self, max: Option<usize>) -> Self {
        self.max_redirects = max;
        self
    }

    /// The client requests are sent with
    #[must_use]
    pub const fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Execute `request`, following redirects, and report the terminal
    /// outcome under the given `index`.
    pub async fn execute(
        &self,
        index: usize,
        request: &Request,
        cancel: &CancellationToken,
    ) -> FetchResult {
        fetch(&*self.client, index, request, cancel, self.max_redirects).await
    }
}

/// Execute a single request with the given client.
///
/// This is a shorthand for [`Executor::execute`] with unbounded redirects.
/// The result has index `0`.
///
/// ```
/// use fetchall_lib::{ClientBuilder, Request, execute};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> fetchall_lib::Result<()> {
/// let client = ClientBuilder::default().client()?;
/// let cancel = CancellationToken::new();
/// cancel.cancel();
///
/// let result = execute(&client, &Request::get("https://example.com"), &cancel).await;
/// assert!(result.is_cancelled());
/// # Ok(())
/// # }
/// ```
pub async fn execute<C: HttpClient>(
    client: &C,
    request: &Request,
    cancel: &CancellationToken,
) -> FetchResult {
    fetch(client, 0, request, cancel, None).await
}

async fn fetch<C: HttpClient>(
    client: &C,
    index: usize,
    request: &Request,
    cancel: &CancellationToken,
    max_redirects: Option<usize>,
) -> FetchResult {
    let original = request.url().to_owned();

    if cancel.is_cancelled() {
        debug!("Skipping {request}: cancelled");
        return FetchResult::failed(index, original, ErrorKind::Cancelled);
    }

    let (method, mut target) = match prepare(request) {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("Cannot send {request}: {e}");
            return FetchResult::failed(index, original, e);
        }
    };

    let mut hops = 0;
    loop {
        debug!("{method} {target}");
        let response = match client
            .send(method.clone(), target.clone(), request.body().to_vec())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {target} failed: {e}");
                return FetchResult::failed(index, original, e);
            }
        };

        let status = response.status();
        if !status.is_redirection() {
            return match response.drain().await {
                Ok(_) => FetchResult::ok(index, original, status),
                Err(e) => {
                    warn!("Cannot read body of {target} ({status}): {e}");
                    FetchResult::partial(index, original, status, e)
                }
            };
        }

        if let Some(max) = max_redirects.filter(|&max| hops >= max) {
            warn!("Giving up on {original} after {max} redirects");
            return FetchResult::partial(index, original, status, ErrorKind::TooManyRedirects(max));
        }

        let next = redirect_target(&target, status, response.location());
        // The superseded response is released before the next attempt
        drop(response);
        target = match next {
            Ok(next) => next,
            Err(e) => {
                warn!("Cannot follow redirect of {original}: {e}");
                return FetchResult::failed(index, original, e);
            }
        };
        hops += 1;

        if cancel.is_cancelled() {
            debug!("Not following redirect #{hops} of {original}: cancelled");
            return FetchResult::failed(index, original, ErrorKind::Cancelled);
        }
        debug!("Following redirect #{hops} of {original} to {target}");
    }
}

/// Turn a request into a method and a target which can be sent
fn prepare(request: &Request) -> Result<(Method, Url), ErrorKind> {
    let method = Method::from_bytes(request.method().as_bytes())?;
    let url = Url::parse(request.url())?;
    check_scheme(&url)?;
    Ok((method, url))
}

/// Resolve the `Location` of a redirect response against the URL it came from
fn redirect_target(
    current: &Url,
    status: StatusCode,
    location: Result<Option<String>, ErrorKind>,
) -> Result<Url, ErrorKind> {
    let location = location?.ok_or_else(|| {
        ErrorKind::MalformedRequest(format!("{status} response without Location header"))
    })?;
    let url = current.join(&location).map_err(|e| {
        ErrorKind::MalformedRequest(format!("invalid redirect location `{location}`: {e}"))
    })?;
    check_scheme(&url)?;
    Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), ErrorKind> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ErrorKind::MalformedRequest(format!(
            "unsupported URL scheme `{scheme}` in {url}"
        ))),
    }
}
