//! Reading requests from the command-line inputs.
//!
//! Inputs are read in the background and handed to the dispatcher through a
//! channel, one request at a time, so requests start while later lines are
//! still being read. Reading stops early once the dispatcher no longer
//! accepts requests.

use std::fmt::{self, Display};
use std::path::PathBuf;

use anyhow::{Context, Result};
use fetchall_lib::Request;
use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{Sender, channel};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::options::STDIN_INPUT;

/// Ignore lines starting with this marker
const COMMENT_MARKER: &str = "#";

/// Number of parsed requests waiting for the dispatcher
const INPUT_BUFFER: usize = 64;

/// Where requests are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputSource {
    /// Standard input, one request per line
    Stdin,
    /// A file with one request per line
    File(PathBuf),
    /// A single URL given on the command line
    Url(String),
}

impl InputSource {
    pub(crate) fn new(raw: &str) -> Self {
        let lowercase = raw.to_ascii_lowercase();
        if raw == STDIN_INPUT {
            Self::Stdin
        } else if lowercase.starts_with("http://") || lowercase.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Start reading `inputs` in the background.
///
/// Returns the stream of parsed requests and a handle which resolves once
/// reading has finished. It resolves to an error if an input could not be
/// read.
pub(crate) fn stream(
    inputs: Vec<InputSource>,
    default_method: String,
) -> (ReceiverStream<Request>, JoinHandle<Result<()>>) {
    let (send, recv) = channel(INPUT_BUFFER);
    let handle = tokio::spawn(async move { read_all(inputs, &default_method, &send).await });
    (ReceiverStream::new(recv), handle)
}

async fn read_all(inputs: Vec<InputSource>, default_method: &str, send: &Sender<Request>) -> Result<()> {
    for input in inputs {
        let accepting = match &input {
            InputSource::Url(url) => send
                .send(Request::new(default_method, url.as_str(), Vec::new()))
                .await
                .is_ok(),
            InputSource::Stdin => {
                read_lines(tokio::io::stdin(), &input, default_method, send).await?
            }
            InputSource::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Cannot open input file `{input}`"))?;
                read_lines(file, &input, default_method, send).await?
            }
        };

        if !accepting {
            debug!("Requests are no longer accepted, stop reading inputs");
            break;
        }
    }
    Ok(())
}

/// Send every request line of `reader`.
///
/// Returns `false` if the receiving end went away.
async fn read_lines<R: AsyncRead + Unpin>(
    reader: R,
    source: &InputSource,
    default_method: &str,
    send: &Sender<Request>,
) -> Result<bool> {
    let mut lines = BufReader::new(reader).lines();
    let mut number = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Cannot read from input `{source}`"))?
    {
        number += 1;
        let Some(request) = parse_line(&line, default_method, source, number) else {
            continue;
        };
        if send.send(request).await.is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}

fn parse_line(
    line: &str,
    default_method: &str,
    source: &InputSource,
    number: usize,
) -> Option<Request> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        return None;
    }
    match Request::parse_line(line, default_method) {
        Ok(request) => Some(request),
        Err(e) => {
            warn!("Skipping line {number} of {source}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case("-", InputSource::Stdin)]
    #[case("https://example.com", InputSource::Url("https://example.com".to_string()))]
    #[case("HTTP://example.com", InputSource::Url("HTTP://example.com".to_string()))]
    #[case("requests.txt", InputSource::File(PathBuf::from("requests.txt")))]
    #[case("ftp://example.com", InputSource::File(PathBuf::from("ftp://example.com")))]
    fn test_input_source(#[case] raw: &str, #[case] expected: InputSource) {
        assert_eq!(InputSource::new(raw), expected);
    }

    #[tokio::test]
    async fn test_read_lines_skips_comments_and_garbage() {
        let content = b"# a comment\n\
            \n\
            https://example.com/a\n\
            post https://example.com/b name=value&x=1\n\
            https://example.com/c trailing garbage\n\
            \t  DELETE   https://example.com/d  \n";
        let (send, recv) = channel(16);

        let accepting = read_lines(&content[..], &InputSource::Stdin, "GET", &send)
            .await
            .unwrap();
        drop(send);

        assert!(accepting);
        let requests: Vec<_> = ReceiverStream::new(recv).collect().await;
        assert_eq!(
            requests,
            vec![
                Request::get("https://example.com/a"),
                Request::new("POST", "https://example.com/b", "name=value&x=1"),
                Request::new("DELETE", "https://example.com/d", ""),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_lines_stops_without_receiver() {
        let (send, recv) = channel(1);
        drop(recv);

        let accepting = read_lines(
            &b"https://example.com\n"[..],
            &InputSource::Stdin,
            "GET",
            &send,
        )
        .await
        .unwrap();
        assert!(!accepting);
    }

    #[tokio::test]
    async fn test_stream_files_and_urls() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "https://example.com/from-file").unwrap();
        writeln!(file, "PUT https://example.com/put {{\"a\":1}}").unwrap();

        let inputs = vec![
            InputSource::Url("https://example.com/literal".to_string()),
            InputSource::File(file.path().to_path_buf()),
        ];
        let (requests, handle) = stream(inputs, "HEAD".to_string());
        let requests: Vec<_> = requests.collect().await;

        assert!(handle.await.unwrap().is_ok());
        assert_eq!(
            requests,
            vec![
                Request::new("HEAD", "https://example.com/literal", ""),
                Request::new("HEAD", "https://example.com/from-file", ""),
                Request::new("PUT", "https://example.com/put", "{\"a\":1}"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let inputs = vec![InputSource::File(PathBuf::from("does/not/exist.txt"))];
        let (requests, handle) = stream(inputs, "GET".to_string());

        assert_eq!(requests.count().await, 0);
        let error = handle.await.unwrap().unwrap_err();
        assert!(error.to_string().contains("does/not/exist.txt"));
    }
}
