//! # sshpect
//!
//! Expect-style command/response driver for interactive SSH shells.
//!
//! sshpect opens a shell over SSH, writes commands line by line, and
//! recovers each command's output by watching the byte stream for a
//! delimiter: a literal substring, a regex, or the first match among
//! several regexes. Arrival may be slow and arbitrarily chunked; every wait
//! is bounded by a timeout, and a timed-out or disconnected wait still
//! hands back whatever bytes arrived.
//!
//! ## Features
//!
//! - Async SSH sessions via russh, with password and private key auth
//! - Buffered pattern matching that tolerates chunked, bursty output
//! - Exact output accounting: matched prefix returned, remainder kept for
//!   the next read, nothing dropped on timeout
//! - Transparent reconnect when a session's shell has died
//! - Bring-your-own-stream sessions over any `AsyncRead`/`AsyncWrite` pair
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sshpect::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sshpect::Error> {
//!     let mut session = SessionBuilder::new("192.168.1.50")
//!         .username("admin")
//!         .password("secret")
//!         .prompt(r"\$ $")
//!         .build()?;
//!
//!     session.open().await?;
//!
//!     let response = session.send_command("uname -a").await?;
//!     println!("{}", response.output);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod transport;

// Re-export main types for convenience
pub use channel::{ChannelConfig, MatchStatus, Pattern, ReadResult, ShellChannel};
pub use driver::{Response, Session, SessionBuilder, SessionOptions};
pub use error::{ChannelError, DriverError, Error, Result, TransportError};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig, SshTransport};
