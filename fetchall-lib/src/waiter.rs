//! Facility to wait for a dynamic set of tasks to complete, with a single
//! waiter and multiple waitees (things that are waited for).
//!
//! The dispatcher uses this to decide when its output stream may be closed:
//! every spawned task holds a [`WaitGuard`], the coordinator holds the
//! [`WaitGroup`], and the output is closed right after [`WaitGroup::wait`]
//! returns. Because `wait` consumes the group, there is exactly one place
//! where that can happen.
//!
//! # Implementation Details
//!
//! Waiting is a wrapper around [`tokio::sync::mpsc::channel`]. A
//! [`WaitGroup`] holds the unique [`tokio::sync::mpsc::Receiver`] and each
//! [`WaitGuard`] holds a [`tokio::sync::mpsc::Sender`]; the receiver wakes up
//! once the last sender is gone. Next to that, the guards maintain an atomic
//! count of outstanding work, which is only used for reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::never::Never;
use tokio::sync::mpsc::{Receiver, Sender, channel};

/// Manager for a particular wait group. This can spawn a number of
/// [`WaitGuard`]s and it can then wait for them to all complete.
///
/// Each [`WaitGroup`] is single-use&mdash;calling [`WaitGroup::wait`] to start
/// waiting consumes the [`WaitGroup`]. Additionally, once all [`WaitGuard`]s
/// have been dropped, it is not possible to create any more [`WaitGuard`]s.
#[derive(Debug)]
pub struct WaitGroup {
    /// [`Receiver`] is held to wait for multiple [`Sender`]s and detect
    /// when they have closed. The [`Never`] type means no value can/will
    /// ever be received through the channel.
    recv: Receiver<Never>,
    outstanding: Arc<AtomicUsize>,
}

/// RAII guard held by a task which is being waited for.
///
/// The existence of values of this type represents outstanding work for
/// its corresponding [`WaitGroup`]. Cloning a guard registers one more unit
/// of work, dropping it marks that unit as done.
#[derive(Debug)]
pub struct WaitGuard {
    /// Keeps the [`Receiver`] end (stored in [`WaitGroup`]) open.
    send: Sender<Never>,
    outstanding: Arc<AtomicUsize>,
}

impl WaitGroup {
    /// Creates a new [`WaitGroup`] and its first associated [`WaitGuard`].
    ///
    /// Note that [`WaitGroup`] itself has no ability to create new guards.
    /// If needed, new guards should be created by cloning the returned [`WaitGuard`].
    #[must_use]
    pub fn new() -> (Self, WaitGuard) {
        let (send, recv) = channel(1);
        let outstanding = Arc::new(AtomicUsize::new(1));
        (
            Self {
                recv,
                outstanding: outstanding.clone(),
            },
            WaitGuard { send, outstanding },
        )
    }

    /// Number of guards which are still alive
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Waits, asynchronously, until all the associated [`WaitGuard`]s have finished.
    pub async fn wait(mut self) {
        let None = self.recv.recv().await;
        debug_assert_eq!(self.outstanding(), 0);
    }
}

impl Clone for WaitGuard {
    fn clone(&self) -> Self {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        Self {
            send: self.send.clone(),
            outstanding: self.outstanding.clone(),
        }
    }
}

impl Drop for WaitGuard {
    // The sender field is dropped after this, so the count is already
    // decremented when the group wakes up.
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}
