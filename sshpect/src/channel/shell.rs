//! Buffered pattern-matching reads over a shell stream.
//!
//! `ShellChannel` owns the consumer side of a session: the write half of the
//! stream, the handoff queue fed by the reader task, and the session buffer.
//! Reads poll at a fixed interval; each poll evaluates the target against
//! the full buffer, drains at most one queued chunk, and re-checks. The
//! deadline is computed once per read, so a wait can overrun it by up to one
//! poll interval.

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use super::buffer::SessionBuffer;
use super::patterns::Pattern;
use super::reader::spawn_reader;
use crate::error::{ChannelError, Result};

/// Tuning for the buffered read loop.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Pause between buffer polls when no chunk is waiting.
    pub poll_interval: Duration,

    /// Bound on the reader-to-consumer handoff queue, in chunks.
    pub handoff_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            handoff_capacity: 32,
        }
    }
}

/// How a read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// A target matched; `pattern` is its index in the caller's list
    /// (always 0 for single-target reads).
    Matched { pattern: usize },

    /// The deadline passed without a match.
    TimedOut,

    /// The stream closed without a match.
    Disconnected,
}

impl MatchStatus {
    /// Whether the read ended on a match.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Index of the winning pattern, if any.
    pub fn matched_pattern(&self) -> Option<usize> {
        match self {
            Self::Matched { pattern } => Some(*pattern),
            _ => None,
        }
    }
}

/// Outcome of a buffered read.
///
/// `data` is everything consumed from the buffer: the prefix through the end
/// of the matched text on success, or the entire buffer on timeout and
/// disconnect. Nothing is dropped either way.
#[derive(Debug)]
pub struct ReadResult {
    /// The consumed bytes.
    pub data: Vec<u8>,

    /// How the read ended.
    pub status: MatchStatus,
}

impl ReadResult {
    /// The consumed bytes as a string (lossy UTF-8).
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Consume into a string (lossy UTF-8).
    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Consumer half of an interactive shell session.
///
/// Owns the stream's write half outright; the read half lives in the
/// background reader task, which is aborted when the channel drops.
pub struct ShellChannel {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    chunks: mpsc::Receiver<Bytes>,
    buffer: SessionBuffer,
    poll_interval: Duration,
    stream_closed: bool,
    reader_task: JoinHandle<()>,
}

impl ShellChannel {
    /// Attach to an established duplex stream, spawning the reader task.
    pub fn attach<R, W>(reader: R, writer: W, config: ChannelConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.handoff_capacity);
        let reader_task = spawn_reader(reader, tx);
        Self {
            writer: Box::new(writer),
            chunks: rx,
            buffer: SessionBuffer::new(),
            poll_interval: config.poll_interval,
            stream_closed: false,
            reader_task,
        }
    }

    /// Send a line of input, appending a newline, as a single write.
    pub async fn write_line(&mut self, text: &str) -> Result<()> {
        let mut line = Vec::with_capacity(text.len() + 1);
        line.extend_from_slice(text.as_bytes());
        line.push(b'\n');
        self.writer.write_all(&line).await.map_err(ChannelError::Io)?;
        self.writer.flush().await.map_err(ChannelError::Io)?;
        trace!("wrote {} bytes", line.len());
        Ok(())
    }

    /// Read until an exact byte substring appears.
    ///
    /// The returned data runs through the end of the matched text; bytes
    /// after it stay buffered for the next read.
    pub async fn read_until(&mut self, literal: &str, timeout: Duration) -> Result<ReadResult> {
        Ok(self.read_until_target(&Pattern::literal(literal), timeout).await)
    }

    /// Read until a regex matches. Fails fast on an invalid pattern.
    pub async fn read_until_pattern(&mut self, pattern: &str, timeout: Duration) -> Result<ReadResult> {
        let target = Pattern::regex(pattern)?;
        Ok(self.read_until_target(&target, timeout).await)
    }

    /// Read until the first of several regexes matches.
    ///
    /// Alternatives are tried in list order on every poll; the first in list
    /// order to match wins, even if a later one matches earlier in the
    /// buffer. Invalid entries are skipped at compile time (the winner's
    /// reported index still refers to the original list); a list with no
    /// valid entries fails fast.
    pub async fn read_until_any<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        timeout: Duration,
    ) -> Result<ReadResult> {
        let target = Pattern::any(patterns)?;
        Ok(self.read_until_target(&target, timeout).await)
    }

    /// The shared read loop.
    ///
    /// On a match, consumes and returns the prefix through the match end.
    /// On deadline expiry or stream closure, drains and returns the entire
    /// buffer; those outcomes are carried in the status, not as errors.
    pub async fn read_until_target(&mut self, target: &Pattern, timeout: Duration) -> ReadResult {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Some(hit) = target.find(self.buffer.as_slice()) {
                debug!(
                    "pattern {} matched at {}..{} ({} bytes buffered)",
                    hit.index,
                    hit.start,
                    hit.end,
                    self.buffer.len()
                );
                return ReadResult {
                    data: self.buffer.consume_to(hit.end),
                    status: MatchStatus::Matched { pattern: hit.index },
                };
            }
            if self.stream_closed {
                debug!(
                    "stream closed with no match, draining {} bytes",
                    self.buffer.len()
                );
                return ReadResult {
                    data: self.buffer.take_all(),
                    status: MatchStatus::Disconnected,
                };
            }
            self.fill().await;
        }
        debug!(
            "no match within {:?}, draining {} bytes",
            timeout,
            self.buffer.len()
        );
        ReadResult {
            data: self.buffer.take_all(),
            status: MatchStatus::TimedOut,
        }
    }

    /// Drain one queued chunk if available, otherwise sleep one poll
    /// interval. The read loop's sole suspension point.
    async fn fill(&mut self) {
        match self.chunks.try_recv() {
            Ok(chunk) => {
                trace!("buffered {} bytes", chunk.len());
                self.buffer.extend(&chunk);
            }
            Err(TryRecvError::Empty) => {
                tokio::time::sleep(self.poll_interval).await;
            }
            Err(TryRecvError::Disconnected) => {
                // Queued chunks are delivered before this, so nothing is lost.
                self.stream_closed = true;
            }
        }
    }
}

impl Drop for ShellChannel {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

impl std::fmt::Debug for ShellChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellChannel")
            .field("buffered", &self.buffer.len())
            .field("poll_interval", &self.poll_interval)
            .field("stream_closed", &self.stream_closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    fn test_config() -> ChannelConfig {
        ChannelConfig {
            poll_interval: Duration::from_millis(10),
            ..ChannelConfig::default()
        }
    }

    /// Channel wired to the near end of an in-memory duplex; the far end
    /// plays the remote shell.
    fn attach_pair() -> (ShellChannel, DuplexStream) {
        let (near, far) = tokio::io::duplex(4096);
        let (read_half, write_half) = tokio::io::split(near);
        (ShellChannel::attach(read_half, write_half, test_config()), far)
    }

    #[tokio::test]
    async fn test_literal_match_partitions_buffer() {
        let (mut channel, mut far) = attach_pair();
        far.write_all(b"line1\n$ more").await.unwrap();

        let result = channel
            .read_until("$ ", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(result.data, b"line1\n$ ");
        assert_eq!(result.status, MatchStatus::Matched { pattern: 0 });
        // Remainder stays for the next read.
        assert_eq!(channel.buffer.as_slice(), b"more");
    }

    #[tokio::test]
    async fn test_regex_match_across_chunks() {
        let (mut channel, far) = attach_pair();

        let shell = tokio::spawn(async move {
            let mut far = far;
            far.write_all(b"par").await.unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            far.write_all(b"tial$ tail").await.unwrap();
            far
        });

        let result = channel
            .read_until_pattern(r"\$\s", Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(result.data, b"partial$ ");
        assert!(result.status.is_match());
        assert_eq!(channel.buffer.as_slice(), b"tail");
        shell.await.unwrap();
    }

    #[tokio::test]
    async fn test_chunked_arrival_keeps_order() {
        let (mut channel, far) = attach_pair();

        let shell = tokio::spawn(async move {
            let mut far = far;
            for chunk in [&b"ab"[..], &b"cd"[..], &b"ef"[..], &b"$ "[..]] {
                far.write_all(chunk).await.unwrap();
                tokio::time::sleep(Duration::from_millis(15)).await;
            }
            far
        });

        let result = channel
            .read_until("$ ", Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(result.data, b"abcdef$ ");
        shell.await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_drains_everything() {
        let (mut channel, mut far) = attach_pair();
        far.write_all(b"no prompt here").await.unwrap();

        let started = tokio::time::Instant::now();
        let result = channel
            .read_until("never", Duration::from_millis(100))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(result.status, MatchStatus::TimedOut);
        assert_eq!(result.data, b"no prompt here");
        assert!(channel.buffer.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_surfaces_before_deadline() {
        let (mut channel, mut far) = attach_pair();
        far.write_all(b"goodbye").await.unwrap();
        drop(far);

        let started = tokio::time::Instant::now();
        let result = channel
            .read_until("never", Duration::from_secs(5))
            .await
            .unwrap();

        // Well before the five-second deadline.
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(result.status, MatchStatus::Disconnected);
        assert_eq!(result.data, b"goodbye");
        assert!(channel.buffer.is_empty());
    }

    #[tokio::test]
    async fn test_list_order_wins_within_one_poll() {
        let (mut channel, _far) = attach_pair();
        // Load the buffer directly so both alternatives are present on the
        // first poll.
        channel.buffer.extend(b"login: then password: tail");

        let result = channel
            .read_until_any(&["password:", "login:"], Duration::from_secs(1))
            .await
            .unwrap();

        // "login:" matches at offset 0, but "password:" is first in the
        // list, so it wins and consumption runs through its match end.
        assert_eq!(result.status, MatchStatus::Matched { pattern: 0 });
        assert_eq!(result.data, b"login: then password:");
        assert_eq!(channel.buffer.as_slice(), b" tail");
    }

    #[tokio::test]
    async fn test_list_skips_invalid_keeping_indices() {
        let (mut channel, mut far) = attach_pair();
        far.write_all(b"ready> ").await.unwrap();

        let result = channel
            .read_until_any(&["unclosed[", "ready> "], Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(result.status, MatchStatus::Matched { pattern: 1 });
    }

    #[tokio::test]
    async fn test_invalid_pattern_fails_fast() {
        let (mut channel, _far) = attach_pair();

        let started = tokio::time::Instant::now();
        let err = channel
            .read_until_pattern("unclosed[", Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(
            err,
            Error::Channel(ChannelError::InvalidPattern(_))
        ));
    }

    #[tokio::test]
    async fn test_all_invalid_list_fails_fast() {
        let (mut channel, _far) = attach_pair();

        let err = channel
            .read_until_any(&["unclosed[", "*bad"], Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Channel(ChannelError::NoValidPatterns)));
    }

    #[tokio::test]
    async fn test_write_line_appends_newline() {
        let (mut channel, mut far) = attach_pair();
        channel.write_line("ls -la").await.unwrap();

        let mut sent = [0u8; 7];
        far.read_exact(&mut sent).await.unwrap();
        assert_eq!(&sent, b"ls -la\n");
    }

    #[tokio::test]
    async fn test_second_read_starts_from_remainder() {
        let (mut channel, mut far) = attach_pair();
        far.write_all(b"first$ second$ ").await.unwrap();

        let first = channel
            .read_until("$ ", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(first.data, b"first$ ");

        let second = channel
            .read_until("$ ", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(second.data, b"second$ ");
        assert!(channel.buffer.is_empty());
    }

    #[test]
    fn test_match_status_accessors() {
        assert!(MatchStatus::Matched { pattern: 2 }.is_match());
        assert_eq!(MatchStatus::Matched { pattern: 2 }.matched_pattern(), Some(2));
        assert!(!MatchStatus::TimedOut.is_match());
        assert_eq!(MatchStatus::Disconnected.matched_pattern(), None);
    }
}
