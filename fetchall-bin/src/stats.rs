use std::collections::HashSet;
use std::time::Duration;

use fetchall_lib::{ErrorKind, FetchResult};
use serde::Serialize;

/// Statistics of all results of a run
#[derive(Default, Serialize, Debug)]
pub(crate) struct ResponseStats {
    /// Number of results received
    pub(crate) total: usize,
    /// Completed with a status below 400 or an accepted status
    pub(crate) successful: usize,
    /// Completed with a status of 400 or above which is not accepted
    pub(crate) failed_status: usize,
    /// Network failures, including failures while reading a body
    pub(crate) transport_errors: usize,
    /// Requests which could not be sent at all
    pub(crate) malformed: usize,
    /// Requests which never started because of cancellation
    pub(crate) cancelled: usize,
    /// Requests which hit the redirect limit
    pub(crate) redirect_limit: usize,
    /// Any other error
    pub(crate) errors: usize,
    /// Run time of the whole session
    pub(crate) duration_secs: u64,
    /// Every result which is not counted as successful, by index once
    /// [`ResponseStats::finish`] was called
    pub(crate) failures: Vec<FetchResult>,
    #[serde(skip)]
    accept: HashSet<u16>,
}

impl ResponseStats {
    /// Create empty stats, counting the `accept`ed status codes as success
    pub(crate) fn new(accept: &[u16]) -> Self {
        Self {
            accept: accept.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn is_accepted(&self, result: &FetchResult) -> bool {
        let code = result.status_code();
        result.is_success() && (code < 400 || self.accept.contains(&code))
    }

    pub(crate) fn add(&mut self, result: FetchResult) {
        self.total += 1;

        if self.is_accepted(&result) {
            self.successful += 1;
            return;
        }

        match &result.error {
            None => self.failed_status += 1,
            Some(ErrorKind::Cancelled) => self.cancelled += 1,
            Some(ErrorKind::Transport(_)) => self.transport_errors += 1,
            Some(ErrorKind::MalformedRequest(_)) => self.malformed += 1,
            Some(ErrorKind::TooManyRedirects(_)) => self.redirect_limit += 1,
            Some(_) => self.errors += 1,
        }

        self.failures.push(result);
    }

    /// Record the run time once all results are in and put the failures in
    /// input order
    pub(crate) fn finish(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs();
        self.failures.sort_unstable_by_key(|failure| failure.index);
    }

    #[inline]
    pub(crate) const fn is_success(&self) -> bool {
        self.total == self.successful
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use pretty_assertions::assert_eq;

    fn url(index: usize) -> String {
        format!("http://example.com/{index}")
    }

    #[test]
    fn test_stats_is_empty() {
        let stats = ResponseStats::new(&[]);
        assert!(stats.is_empty());
        assert!(stats.is_success());
    }

    #[test]
    fn test_stats_counts_outcomes() {
        let mut stats = ResponseStats::new(&[]);
        stats.add(FetchResult::ok(0, url(0), StatusCode::OK));
        stats.add(FetchResult::ok(1, url(1), StatusCode::NOT_FOUND));
        stats.add(FetchResult::failed(2, url(2), ErrorKind::Cancelled));
        stats.add(FetchResult::failed(
            3,
            url(3),
            ErrorKind::Transport("connection refused".into()),
        ));
        stats.add(FetchResult::failed(
            4,
            url(4),
            ErrorKind::MalformedRequest("no scheme".into()),
        ));
        stats.add(FetchResult::partial(
            5,
            url(5),
            StatusCode::FOUND,
            ErrorKind::TooManyRedirects(3),
        ));
        stats.add(FetchResult::partial(
            6,
            url(6),
            StatusCode::OK,
            ErrorKind::Transport("connection reset".into()),
        ));

        assert_eq!(stats.total, 7);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed_status, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.transport_errors, 2);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.redirect_limit, 1);
        assert_eq!(stats.errors, 0);
        assert!(!stats.is_success());
    }

    #[test]
    fn test_accepted_status_codes() {
        let mut stats = ResponseStats::new(&[404]);
        stats.add(FetchResult::ok(0, url(0), StatusCode::NOT_FOUND));
        stats.add(FetchResult::ok(1, url(1), StatusCode::NO_CONTENT));

        assert_eq!(stats.successful, 2);
        assert!(stats.is_success());
        assert!(stats.failures.is_empty());
    }

    #[test]
    fn test_failures_are_ordered_by_index() {
        let mut stats = ResponseStats::new(&[]);
        for index in [3, 0, 2] {
            stats.add(FetchResult::ok(index, url(index), StatusCode::GONE));
        }
        stats.finish(Duration::from_millis(2500));

        let indices: Vec<_> = stats.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert_eq!(stats.duration_secs, 2);
    }
}
