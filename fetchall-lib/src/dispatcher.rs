//! Concurrent dispatch of a stream of requests.
//!
//! A [`Dispatcher`] runs one coordinating task, which reads requests from the
//! input stream and spawns one task per request. Every task sends exactly one
//! [`FetchResult`] to the output stream. There is no pool and no cap on the
//! number of tasks unless an admission gate is configured with
//! [`Dispatcher::max_concurrency`] or [`Dispatcher::gate`].
//!
//! Shutdown works as follows:
//!
//! 1. Intake stops once the input ends, the cancellation token fires or the
//!    admission gate is closed, whichever comes first. The input stream is
//!    dropped at that point.
//! 2. The coordinator waits for all spawned tasks (see [`crate::waiter`]).
//!    Cancellation does not abandon them: a task that is already sending a
//!    request finishes it, a task about to start a new attempt reports
//!    [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled) instead.
//! 3. The coordinator drops the last sender, which closes the output.
//!
//! Results are delivered in completion order, use [`FetchResult::index`] to
//! match them with their requests.
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc::{Sender, channel};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::waiter::{WaitGroup, WaitGuard};
use crate::{ErrorKind, Executor, FetchResult, HttpClient, Request};

/// Default capacity of the output stream, 128.
///
/// Tasks wait when the consumer falls behind by this many results.
pub const DEFAULT_BUFFER: usize = 128;

/// Turns a stream of [`Request`]s into a stream of [`FetchResult`]s.
#[derive(Debug)]
pub struct Dispatcher<C> {
    executor: Executor<C>,
    buffer: usize,
    gate: Option<Arc<Semaphore>>,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            buffer: self.buffer,
            gate: self.gate.clone(),
        }
    }
}

impl<C: HttpClient> Dispatcher<C> {
    /// Create a dispatcher without an admission gate
    #[must_use]
    pub const fn new(executor: Executor<C>) -> Self {
        Self {
            executor,
            buffer: DEFAULT_BUFFER,
            gate: None,
        }
    }

    /// Capacity of the output stream. Values below 1 are raised to 1.
    #[must_use]
    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Only let `max` requests execute at the same time.
    ///
    /// Requests are still read from the input in order, but the next one is
    /// only accepted once a slot is free.
    #[must_use]
    pub fn max_concurrency(self, max: usize) -> Self {
        self.gate(Arc::new(Semaphore::new(max.max(1))))
    }

    /// Put an external gate in front of the dispatcher.
    ///
    /// Each execution holds one permit of the semaphore. Sharing a semaphore
    /// between dispatchers bounds their combined concurrency.
    #[must_use]
    pub fn gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Start dispatching `requests` and return the stream of results.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn dispatch<S>(self, cancel: CancellationToken, requests: S) -> ResultStream
    where
        S: Stream<Item = Request> + Send + 'static,
    {
        let (send, recv) = channel(self.buffer);
        tokio::spawn(self.coordinate(cancel, requests, send));
        ResultStream {
            inner: ReceiverStream::new(recv),
        }
    }

    /// Fetch all `requests` and return their results in input order
    pub async fn fetch_all(self, requests: Vec<Request>) -> Vec<FetchResult> {
        let mut results: Vec<_> = self
            .dispatch(CancellationToken::new(), futures::stream::iter(requests))
            .collect()
            .await;
        results.sort_unstable_by_key(|result| result.index);
        results
    }

    async fn coordinate<S>(self, cancel: CancellationToken, requests: S, send: Sender<FetchResult>)
    where
        S: Stream<Item = Request> + Send + 'static,
    {
        let (waiter, guard) = WaitGroup::new();

        // The input is moved into `accept`, so it is dropped as soon as
        // intake stops and the producer notices right away
        let accepted = self.accept(&cancel, requests, &send, &guard).await;

        drop(guard);
        debug!(
            "Accepted {accepted} requests, waiting for {} outstanding",
            waiter.outstanding()
        );
        waiter.wait().await;
        // All other senders are gone, this closes the output
        drop(send);
    }

    /// Read and spawn requests until the input ends, cancellation fires or
    /// the gate is closed. Returns the number of accepted requests.
    async fn accept<S>(
        &self,
        cancel: &CancellationToken,
        requests: S,
        send: &Sender<FetchResult>,
        guard: &WaitGuard,
    ) -> usize
    where
        S: Stream<Item = Request> + Send + 'static,
    {
        let mut requests = pin!(requests);
        let mut accepted = 0;

        loop {
            let request = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("Cancelled after accepting {accepted} requests");
                    break;
                }
                next = requests.next() => match next {
                    Some(request) => request,
                    None => {
                        debug!("Input exhausted after {accepted} requests");
                        break;
                    }
                },
            };

            let admission = match &self.gate {
                Some(gate) => admit(gate, cancel).await,
                None => Admission::Open,
            };
            let closed = matches!(admission, Admission::Closed);

            let index = accepted;
            accepted += 1;
            let executor = self.executor.clone();
            let cancel = cancel.clone();
            let send = send.clone();
            let guard = guard.clone();
            tokio::spawn(async move {
                let result = match admission {
                    Admission::Closed => {
                        FetchResult::failed(index, request.url().to_owned(), ErrorKind::Cancelled)
                    }
                    _ => executor.execute(index, &request, &cancel).await,
                };
                drop(admission);
                if send.send(result).await.is_err() {
                    debug!("Discarding result #{index}: output stream was dropped");
                }
                drop(send);
                drop(guard);
            });

            if closed {
                warn!("Admission gate was closed, not accepting further requests");
                break;
            }
        }
        accepted
    }
}

/// Outcome of waiting at the admission gate
enum Admission {
    /// No gate is configured
    Open,
    /// Holds a slot of the gate until dropped
    Granted(#[allow(dead_code)] OwnedSemaphorePermit),
    /// Cancellation fired first, the executor reports it
    Cancelled,
    /// The semaphore was closed, nothing may run through it anymore
    Closed,
}

/// Wait for a free slot of the gate, unless cancellation comes first
async fn admit(gate: &Arc<Semaphore>, cancel: &CancellationToken) -> Admission {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Admission::Cancelled,
        permit = gate.clone().acquire_owned() => match permit {
            Ok(permit) => Admission::Granted(permit),
            Err(_) => Admission::Closed,
        },
    }
}

/// Dispatch `requests` with the given client, using default settings.
///
/// See [`Dispatcher::dispatch`].
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime.
pub fn dispatch<C, S>(client: C, cancel: CancellationToken, requests: S) -> ResultStream
where
    C: HttpClient,
    S: Stream<Item = Request> + Send + 'static,
{
    Dispatcher::new(Executor::new(client)).dispatch(cancel, requests)
}

/// Fetch all `requests` concurrently and return their results in input
/// order.
///
/// ```
/// use fetchall_lib::{ClientBuilder, Request, fetch_all};
///
/// # #[tokio::main]
/// # async fn main() -> fetchall_lib::Result<()> {
/// let client = ClientBuilder::default().client()?;
/// let results = fetch_all(client, vec![Request::get("not a url")]).await;
/// assert_eq!(results.len(), 1);
/// assert!(!results[0].is_success());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_all<C: HttpClient>(client: C, requests: Vec<Request>) -> Vec<FetchResult> {
    Dispatcher::new(Executor::new(client))
        .fetch_all(requests)
        .await
}

/// The output of a dispatch session.
///
/// The stream ends once every accepted request has reported its result.
#[derive(Debug)]
pub struct ResultStream {
    inner: ReceiverStream<FetchResult>,
}

impl ResultStream {
    /// Receive the next result, `None` once all results were delivered
    pub async fn recv(&mut self) -> Option<FetchResult> {
        self.inner.next().await
    }
}

impl Stream for ResultStream {
    type Item = FetchResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
