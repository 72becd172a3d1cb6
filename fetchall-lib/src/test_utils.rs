use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{ErrorKind, HttpClient, HttpResponse, Result};

/// How the [`StubClient`] answers a request for one URL
#[derive(Debug, Clone, Default)]
pub(crate) struct Reply {
    status: u16,
    location: Option<String>,
    fail_body: bool,
    delay: Duration,
    cancel: Option<CancellationToken>,
}

impl Reply {
    pub(crate) fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub(crate) fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            location: Some(location.to_string()),
            ..Self::default()
        }
    }

    /// Fail while the body gets drained
    pub(crate) fn fail_body(mut self) -> Self {
        self.fail_body = true;
        self
    }

    /// Take this long before responding
    pub(crate) fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fire the token while the request is in flight
    pub(crate) fn cancel(mut self, token: &CancellationToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }
}

/// An in-memory [`HttpClient`] with scripted replies per URL.
/// Unknown URLs fail like a refused connection.
#[derive(Debug, Default)]
pub(crate) struct StubClient {
    routes: HashMap<String, Reply>,
    sent: Mutex<Vec<(Method, String, Vec<u8>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    open_responses: Arc<AtomicUsize>,
}

impl StubClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(mut self, url: &str, reply: Reply) -> Self {
        let url = Url::parse(url).expect("Expected valid stub URL");
        self.routes.insert(url.to_string(), reply);
        self
    }

    /// Every request sent so far, in order
    pub(crate) fn sent(&self) -> Vec<(Method, String, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }

    /// Highest number of requests that were in flight at the same time
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Responses handed out but not dropped yet
    pub(crate) fn open_responses(&self) -> usize {
        self.open_responses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for StubClient {
    type Response = StubResponse;

    async fn send(&self, method: Method, url: Url, body: Vec<u8>) -> Result<StubResponse> {
        self.sent
            .lock()
            .unwrap()
            .push((method, url.to_string(), body));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let reply = self.routes.get(url.as_str()).cloned();
        if let Some(reply) = &reply {
            tokio::time::sleep(reply.delay).await;
            if let Some(token) = &reply.cancel {
                token.cancel();
            }
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = reply.ok_or_else(|| ErrorKind::Transport("connection refused".to_string()))?;
        self.open_responses.fetch_add(1, Ordering::SeqCst);
        Ok(StubResponse {
            status: StatusCode::from_u16(reply.status).expect("Expected valid status code"),
            location: reply.location,
            fail_body: reply.fail_body,
            open: self.open_responses.clone(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct StubResponse {
    status: StatusCode,
    location: Option<String>,
    fail_body: bool,
    open: Arc<AtomicUsize>,
}

#[async_trait]
impl HttpResponse for StubResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn location(&self) -> Result<Option<String>> {
        Ok(self.location.clone())
    }

    async fn drain(self) -> Result<u64> {
        if self.fail_body {
            return Err(ErrorKind::Transport("connection reset".to_string()));
        }
        Ok(0)
    }
}

impl Drop for StubResponse {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A local port nothing is listening on
pub(crate) fn unused_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("Cannot bind to a free port")
}
