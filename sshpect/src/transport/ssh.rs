//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::client::{self, Handle};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::ExposeSecret;
use tokio::io::{AsyncRead, AsyncWrite};

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// SSH transport wrapping a russh client session.
pub struct SshTransport {
    session: Handle<SshHandler>,
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config::default());

        let rejection: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            rejection: rejection.clone(),
        };

        debug!("connecting to {}:{}", config.host, config.port);
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // check_server_key records the specific rejection; surface it
            // instead of russh's generic key error.
            match rejection.lock().unwrap().take() {
                Some(reason) => reason,
                None => TransportError::ConnectionFailed {
                    host: config.host.clone(),
                    port: config.port,
                    source: e,
                },
            }
        })?;

        Self::authenticate(&mut session, &config).await?;
        debug!("authenticated as {}", config.username);

        Ok(Self { session, config })
    }

    /// Open an interactive shell over a fresh channel.
    ///
    /// Requests a PTY with terminal echo disabled, starts the shell, and
    /// hands back the channel as a duplex byte stream.
    pub async fn open_shell(
        &self,
    ) -> Result<impl AsyncRead + AsyncWrite + Send + Unpin + 'static> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                &self.config.terminal_type,
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[(russh::Pty::ECHO, 0)],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel.into_stream())
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let authenticated = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                // RSA keys need the strongest hash the server will take.
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !authenticated {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// russh client handler carrying the host key policy.
struct SshHandler {
    host: String,
    port: u16,
    verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed rejection reason, read back by `connect` when russh reports
    /// only a generic key error.
    rejection: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Look the key up in known_hosts. `Ok(true)` on a match, `Ok(false)`
    /// for an unknown host, an error when the recorded key differs.
    fn known_hosts_status(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let checked = match &self.known_hosts_path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };

        match checked {
            Ok(known) => Ok(known),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Record a newly seen host key.
    fn remember(&self, key: &PublicKey) {
        let learned = match &self.known_hosts_path {
            Some(path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            warn!("failed to record host key for {}:{}: {}", self.host, self.port, e);
        }
    }

    /// Store the rejection reason and refuse the key.
    fn reject(&self, reason: TransportError) -> bool {
        *self.rejection.lock().unwrap() = Some(reason);
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accept = match self.verification {
            HostKeyVerification::Disabled => true,

            HostKeyVerification::AcceptNew => match self.known_hosts_status(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    self.remember(server_public_key);
                    true
                }
                Err(reason) => self.reject(reason),
            },

            HostKeyVerification::Strict => match self.known_hosts_status(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(reason) => self.reject(reason),
            },
        };

        Ok(accept)
    }
}
