//! `fetchall` is a library for sending many HTTP requests concurrently.
//!
//! Requests go in as a stream, results come out as a stream, in the order in
//! which they complete. Every accepted request produces exactly one
//! [`FetchResult`], and the whole session can be stopped with a
//! [`CancellationToken`]:
//!
//! ```no_run
//! use fetchall_lib::{CancellationToken, ClientBuilder, Request, Result, dispatch};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!   let client = ClientBuilder::default().client()?;
//!   let requests = futures::stream::iter(vec![
//!     Request::get("https://example.com"),
//!     Request::new("POST", "https://example.com/form", "name=fetchall"),
//!   ]);
//!
//!   let mut results = dispatch(client, CancellationToken::new(), requests);
//!   while let Some(result) = results.next().await {
//!     println!("{result}");
//!   }
//!   Ok(())
//! }
//! ```
//!
//! For more control, configure an [`Executor`] and a [`Dispatcher`]
//! yourself, for example to limit redirects or concurrency:
//!
//! ```no_run
//! use fetchall_lib::{ClientBuilder, Dispatcher, Executor, Request, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!   let client = ClientBuilder::default().client()?;
//!   let executor = Executor::new(client).max_redirects(Some(10));
//!   let results = Dispatcher::new(executor)
//!     .max_concurrency(8)
//!     .fetch_all(vec![Request::get("https://example.com")])
//!     .await;
//!   assert_eq!(results.len(), 1);
//!   Ok(())
//! }
//! ```
// #![deny(missing_docs)]

mod client;
mod dispatcher;
mod executor;
mod types;

pub mod waiter;
#[cfg(test)]
mod test_utils;

pub use client::{ClientBuilder, DEFAULT_USER_AGENT, HttpClient, HttpResponse};
pub use dispatcher::{DEFAULT_BUFFER, Dispatcher, ResultStream, dispatch, fetch_all};
pub use executor::{Executor, execute};
pub use tokio_util::sync::CancellationToken;
pub use types::*;
