//! Background reader task feeding the session buffer.
//!
//! One task per session pulls fixed-size chunks off the stream's read half
//! and forwards them over a bounded handoff queue. The bound is the
//! backpressure mechanism: a consumer that stops draining eventually parks
//! the reader in `send`.

use bytes::Bytes;
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Bytes requested per stream read.
const READ_CHUNK_SIZE: usize = 1024;

/// Spawn the reader task for a stream's read half.
///
/// The task runs until the stream ends (EOF or read error) or the consumer
/// hangs up, then exits quietly; the consumer observes either case as the
/// handoff queue closing.
pub(crate) fn spawn_reader<R>(mut stream: R, tx: mpsc::Sender<Bytes>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => {
                    debug!("reader: stream closed");
                    break;
                }
                Ok(n) => {
                    if tx.send(Bytes::copy_from_slice(&chunk[..n])).await.is_err() {
                        debug!("reader: consumer gone, stopping");
                        break;
                    }
                }
                Err(err) => {
                    debug!("reader: read failed: {err}");
                    break;
                }
            }
        }
    })
}
