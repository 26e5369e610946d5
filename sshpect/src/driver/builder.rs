//! Builder for configuring and creating sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::session::{Session, SessionOptions};
use crate::channel::ChannelConfig;
use crate::error::{DriverError, Result};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for [`Session`]s.
///
/// # Example
///
/// ```rust,no_run
/// use sshpect::SessionBuilder;
///
/// # async fn example() -> Result<(), sshpect::Error> {
/// let mut session = SessionBuilder::new("192.168.1.50")
///     .username("admin")
///     .password("secret")
///     .prompt(r"\$ $")
///     .build()?;
/// session.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    prompt: Option<String>,
    timeout: Duration,
    prompt_timeout: Duration,
    poll_interval: Duration,
    terminal_type: String,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            prompt: None,
            timeout: Duration::from_secs(30),
            prompt_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(250),
            terminal_type: "xterm".to_string(),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Set the prompt pattern that marks end-of-command output. Required.
    pub fn prompt(mut self, pattern: impl Into<String>) -> Self {
        self.prompt = Some(pattern.into());
        self
    }

    /// Set the connect and per-command timeout (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the wait for the initial prompt after the shell opens
    /// (default: 3s).
    pub fn prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Set the pause between buffer polls while waiting for output
    /// (default: 250ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the requested terminal type (default: "xterm").
    pub fn terminal_type(mut self, term: impl Into<String>) -> Self {
        self.terminal_type = term.into();
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the host key verification mode (default: disabled).
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file instead of the user default.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the session.
    ///
    /// Validates required fields and compiles the prompt pattern, but does
    /// not connect; call [`Session::open`] on the result.
    pub fn build(self) -> Result<Session> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "username is required".to_string(),
        })?;
        let prompt = self.prompt.ok_or_else(|| DriverError::InvalidConfig {
            message: "prompt pattern is required".to_string(),
        })?;

        let config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.timeout,
            terminal_type: self.terminal_type,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        let options = SessionOptions::new(prompt)
            .with_command_timeout(self.timeout)
            .with_prompt_timeout(self.prompt_timeout)
            .with_channel_config(ChannelConfig {
                poll_interval: self.poll_interval,
                ..ChannelConfig::default()
            });

        Session::new(config, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChannelError, Error};

    #[test]
    fn test_build_without_username_fails() {
        let err = SessionBuilder::new("10.0.0.1")
            .prompt(r"\$ $")
            .build()
            .unwrap_err();
        match err {
            Error::Driver(DriverError::InvalidConfig { message }) => {
                assert!(message.contains("username"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_without_prompt_fails() {
        let err = SessionBuilder::new("10.0.0.1")
            .username("admin")
            .build()
            .unwrap_err();
        match err {
            Error::Driver(DriverError::InvalidConfig { message }) => {
                assert!(message.contains("prompt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_invalid_prompt_pattern() {
        let err = SessionBuilder::new("10.0.0.1")
            .username("admin")
            .prompt("unclosed[")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Channel(ChannelError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_build_succeeds_unconnected() {
        let session = SessionBuilder::new("10.0.0.1")
            .port(2222)
            .username("admin")
            .password("secret")
            .prompt(r"[$#>]\s*$")
            .timeout(Duration::from_secs(10))
            .poll_interval(Duration::from_millis(50))
            .build()
            .unwrap();
        assert!(!session.is_open());
    }
}
