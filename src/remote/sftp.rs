//! SFTP implementation of the remote capability using `ssh2`.

use std::fs::File;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use ssh2::{ErrorCode, Session, Sftp};

use super::{Connector, Identity, PathState, RemoteFs};
use crate::error::{ConnectionError, RemoteError};
use crate::uploader::TransferConfig;

/// `SSH_FX_NO_SUCH_FILE` status code.
const FX_NO_SUCH_FILE: i32 = 2;

/// Permissions for directories created on the server.
const DIR_MODE: i32 = 0o755;

/// Opens SFTP sessions for a fixed host and user.
#[derive(Debug, Clone)]
pub struct SftpConnector {
    host: String,
    port: u16,
    user: String,
    key_path: Option<PathBuf>,
}

impl SftpConnector {
    /// Create a connector from transfer settings.
    #[must_use]
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            user: config.username.clone(),
            key_path: config.key_path.clone(),
        }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Connector for SftpConnector {
    type Session = SftpSession;

    fn connect(&self) -> Result<SftpSession, ConnectionError> {
        let address = self.address();

        let tcp = TcpStream::connect((self.host.as_str(), self.port)).map_err(|e| {
            ConnectionError::Tcp {
                address: address.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut session = Session::new().map_err(|e| ConnectionError::Handshake {
            address: address.clone(),
            reason: e.to_string(),
        })?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ConnectionError::Handshake {
                address: address.clone(),
                reason: e.to_string(),
            })?;

        let auth = match Identity::resolve(self.key_path.as_deref()) {
            Identity::KeyFile(key) => {
                tracing::debug!(key = %key.display(), "Authenticating with private key");
                session.userauth_pubkey_file(&self.user, None, &key, None)
            }
            Identity::Agent => {
                tracing::debug!("Authenticating with SSH agent");
                session.userauth_agent(&self.user)
            }
        };
        auth.map_err(|e| ConnectionError::Auth {
            user: self.user.clone(),
            reason: e.to_string(),
        })?;

        if !session.authenticated() {
            return Err(ConnectionError::Auth {
                user: self.user.clone(),
                reason: "server did not accept any credentials".to_string(),
            });
        }

        let sftp = session
            .sftp()
            .map_err(|e| ConnectionError::Subsystem(e.to_string()))?;

        tracing::debug!(%address, "SFTP session established");
        Ok(SftpSession { session, sftp })
    }
}

/// One authenticated SFTP session.
pub struct SftpSession {
    session: Session,
    sftp: Sftp,
}

fn is_no_such_file(err: &ssh2::Error) -> bool {
    matches!(err.code(), ErrorCode::SFTP(FX_NO_SUCH_FILE))
}

impl RemoteFs for SftpSession {
    fn stat(&mut self, path: &str) -> Result<PathState, RemoteError> {
        match self.sftp.stat(Path::new(path)) {
            Ok(_) => Ok(PathState::Present),
            Err(e) if is_no_such_file(&e) => Ok(PathState::Missing),
            Err(e) => Err(RemoteError::Stat {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .mkdir(Path::new(path), DIR_MODE)
            .map_err(|e| RemoteError::Mkdir {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    fn put(&mut self, local: &Path, remote: &str) -> Result<(), RemoteError> {
        let local_name = local.display().to_string();

        let mut source =
            File::open(local).map_err(|e| RemoteError::put(&*local_name, remote, e))?;
        let mut target = self
            .sftp
            .create(Path::new(remote))
            .map_err(|e| RemoteError::put(&*local_name, remote, e))?;

        let bytes = std::io::copy(&mut source, &mut target)
            .map_err(|e| RemoteError::put(&*local_name, remote, e))?;

        tracing::debug!(local = %local_name, remote, bytes, "Transferred file content");
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), RemoteError> {
        self.sftp
            .rename(Path::new(from), Path::new(to), None)
            .map_err(|e| RemoteError::Rename {
                from: from.to_string(),
                to: to.to_string(),
                reason: e.to_string(),
            })
    }

    fn close(&mut self) {
        if let Err(e) = self.session.disconnect(None, "upload finished", None) {
            tracing::debug!("SFTP disconnect failed: {e}");
        }
    }
}
