//! Session driver: command/response over an interactive shell.
//!
//! A [`Session`] owns one transport and one shell channel. Commands are a
//! write of `command + "\n"` followed by a buffered read on the standing
//! prompt pattern; the `&mut self` receivers keep one read in flight at a
//! time. When a session built from connection parameters finds its channel
//! gone, the next command reconnects once before giving up.

use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use super::response::Response;
use crate::channel::{ChannelConfig, Pattern, ReadResult, ShellChannel};
use crate::error::{DriverError, Result};
use crate::transport::{SshConfig, SshTransport};

/// Behavior knobs for a session, separate from connection parameters.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    prompt_pattern: String,
    command_timeout: Duration,
    prompt_timeout: Duration,
    channel: ChannelConfig,
}

impl SessionOptions {
    /// Options with the given end-of-output prompt pattern and defaults
    /// everywhere else: 30s per command, 3s for the initial prompt.
    pub fn new(prompt_pattern: impl Into<String>) -> Self {
        Self {
            prompt_pattern: prompt_pattern.into(),
            command_timeout: Duration::from_secs(30),
            prompt_timeout: Duration::from_secs(3),
            channel: ChannelConfig::default(),
        }
    }

    /// How long each command may take to show the prompt again.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// How long to wait for the first prompt after the shell opens.
    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Read-loop tuning.
    pub fn with_channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel = config;
        self
    }
}

/// An interactive shell session.
///
/// Built from connection parameters via [`SessionBuilder`](super::SessionBuilder),
/// or adopted over an existing duplex stream via [`Session::attach`].
pub struct Session {
    /// Connection parameters; `None` for attached sessions, which cannot
    /// reconnect.
    config: Option<SshConfig>,
    options: SessionOptions,
    prompt: Pattern,
    transport: Option<SshTransport>,
    channel: Option<ShellChannel>,
}

impl Session {
    /// Create an unconnected session. The prompt pattern is compiled here,
    /// so a bad pattern fails before anything touches the network.
    pub fn new(config: SshConfig, options: SessionOptions) -> Result<Self> {
        let prompt = Pattern::regex(&options.prompt_pattern)?;
        Ok(Self {
            config: Some(config),
            options,
            prompt,
            transport: None,
            channel: None,
        })
    }

    /// Adopt an established duplex stream instead of connecting.
    ///
    /// Waits for the initial prompt like a normal open. The resulting
    /// session has no connection parameters, so once its stream dies it
    /// cannot come back.
    pub async fn attach<R, W>(reader: R, writer: W, options: SessionOptions) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let prompt = Pattern::regex(&options.prompt_pattern)?;
        let mut channel = ShellChannel::attach(reader, writer, options.channel.clone());

        let ready = channel
            .read_until_target(&prompt, options.prompt_timeout)
            .await;
        if !ready.status.is_match() {
            return Err(DriverError::PromptNotFound {
                timeout: options.prompt_timeout,
            }
            .into());
        }

        Ok(Self {
            config: None,
            options,
            prompt,
            transport: None,
            channel: Some(channel),
        })
    }

    /// Connect, open the shell, and wait for the initial prompt.
    pub async fn open(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }
        let config = self.config.clone().ok_or(DriverError::LostConnection)?;
        self.connect(config).await
    }

    /// Whether the session currently has a live shell channel.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Send a line of input without waiting for anything back.
    ///
    /// Fails with `LostConnection` when there is no live channel; unlike
    /// the `send_command` family, a bare write never reconnects. A failed
    /// write tears the channel down so the next command goes through the
    /// reconnect path.
    pub async fn write(&mut self, text: &str) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(DriverError::LostConnection)?;
        match channel.write_line(text).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("write failed, dropping channel: {err}");
                self.channel = None;
                Err(err)
            }
        }
    }

    /// Read until an exact substring appears in the output.
    pub async fn read_until(&mut self, literal: &str, timeout: Duration) -> Result<ReadResult> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        channel.read_until(literal, timeout).await
    }

    /// Read until a regex matches the output.
    pub async fn read_until_pattern(
        &mut self,
        pattern: &str,
        timeout: Duration,
    ) -> Result<ReadResult> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        channel.read_until_pattern(pattern, timeout).await
    }

    /// Read until the first of several regexes matches the output.
    pub async fn read_until_any<S: AsRef<str>>(
        &mut self,
        patterns: &[S],
        timeout: Duration,
    ) -> Result<ReadResult> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        channel.read_until_any(patterns, timeout).await
    }

    /// Send a command and wait for the prompt.
    ///
    /// A timeout or disconnect during the wait is not an error: the
    /// response carries the partial output and the status says what
    /// happened.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        self.ensure_open().await?;
        let prompt = self.prompt.clone();
        self.run_command(command, &prompt).await
    }

    /// Send a command and wait for whichever comes first: one of the extra
    /// patterns or the prompt.
    ///
    /// The extras are tried before the prompt on every poll. A matched
    /// extra reports its index in `patterns`; the prompt reports
    /// `patterns.len()`.
    pub async fn send_command_wait_for_list<S: AsRef<str>>(
        &mut self,
        command: &str,
        patterns: &[S],
    ) -> Result<Response> {
        let mut combined: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        combined.push(self.options.prompt_pattern.clone());
        let target = Pattern::any(&combined)?;

        self.ensure_open().await?;
        self.run_command(command, &target).await
    }

    /// Send a command and strip its echo from the first output line.
    pub async fn send_command_stripped(&mut self, command: &str) -> Result<Response> {
        let mut response = self.send_command(command).await?;
        response.output = strip_command_echo(&response.output, command);
        Ok(response)
    }

    /// Send a command without reading anything back.
    pub async fn send_command_no_wait(&mut self, command: &str) -> Result<()> {
        self.ensure_open().await?;
        self.write(command).await
    }

    /// Close the shell and disconnect.
    pub async fn close(&mut self) -> Result<()> {
        // Dropping the channel aborts the reader task.
        self.channel = None;
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    /// Write the command and wait on the given target.
    async fn run_command(&mut self, command: &str, target: &Pattern) -> Result<Response> {
        let start = Instant::now();
        self.write(command).await?;

        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let result = channel
            .read_until_target(target, self.options.command_timeout)
            .await;

        let elapsed = start.elapsed();
        let status = result.status;
        debug!("command {command:?}: {status:?} after {elapsed:?}");
        Ok(Response::new(command, result.into_string(), status, elapsed))
    }

    /// Reconnect once if the channel is gone. Attached sessions have
    /// nothing to reconnect with.
    async fn ensure_open(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Ok(());
        }
        let Some(config) = self.config.clone() else {
            return Err(DriverError::LostConnection.into());
        };
        debug!("no live channel, connecting to {}:{}", config.host, config.port);
        if let Err(err) = self.connect(config).await {
            warn!("reconnect failed: {err}");
            return Err(DriverError::LostConnection.into());
        }
        Ok(())
    }

    async fn connect(&mut self, config: SshConfig) -> Result<()> {
        let prompt_timeout = self.options.prompt_timeout;

        let transport = SshTransport::connect(config).await?;
        let stream = transport.open_shell().await?;
        let (read_half, write_half) = tokio::io::split(stream);
        let mut channel = ShellChannel::attach(read_half, write_half, self.options.channel.clone());

        let ready = channel.read_until_target(&self.prompt, prompt_timeout).await;
        if !ready.status.is_match() {
            // A shell that never shows its prompt is unusable.
            drop(channel);
            transport.close().await.ok();
            return Err(DriverError::PromptNotFound {
                timeout: prompt_timeout,
            }
            .into());
        }
        debug!("shell ready, {} greeting bytes", ready.data.len());

        self.transport = Some(transport);
        self.channel = Some(channel);
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Remove the echoed command when the first line of output contains it.
fn strip_command_echo(output: &str, command: &str) -> String {
    match output.split_once('\n') {
        Some((first, rest)) if first.contains(command) => rest.to_string(),
        None if output.contains(command) => String::new(),
        _ => output.to_string(),
    }
}
