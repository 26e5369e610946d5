//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication, host key policy, and shell channel
//! creation. The rest of the crate only sees the shell as a duplex byte
//! stream.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
