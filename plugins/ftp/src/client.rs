//! Built-in FTP client over tokio TCP.
//!
//! Plain FTP only. Data connections are passive (`EPSV`, falling back to
//! `PASV`) unless the key asks for active mode (`PORT`/`EPRT`).

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::codec;
use crate::config::FtpConfig;
use crate::error::FtpError;
use crate::key::FtpCacheKey;
use crate::session::{FtpSession, ListEntry, Reply, SessionFactory};

const READ_CHUNK: usize = 64 * 1024;

async fn with_timeout<T>(
    limit: Duration,
    operation: &str,
    fut: impl Future<Output = Result<T, FtpError>>,
) -> Result<T, FtpError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(FtpError::Timeout {
            operation: operation.to_string(),
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

enum DataChannel {
    Passive(TcpStream),
    Active(TcpListener),
}

/// FTP session over a tokio `TcpStream`.
pub struct TcpFtpSession {
    key: FtpCacheKey,
    config: FtpConfig,
    control: Option<BufReader<TcpStream>>,
}

impl fmt::Debug for TcpFtpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpFtpSession")
            .field("key", &self.key)
            .field("connected", &self.control.is_some())
            .finish_non_exhaustive()
    }
}

impl TcpFtpSession {
    /// Create a disconnected session.
    pub fn new(key: FtpCacheKey, config: FtpConfig) -> Self {
        Self {
            key,
            config,
            control: None,
        }
    }

    /// Send `NOOP` to check the control connection end to end.
    pub async fn noop(&mut self) -> Result<(), FtpError> {
        self.expect_positive("NOOP").await.map(|_| ())
    }

    /// Drop the control connection if `result` shows it is unusable.
    fn check<T>(&mut self, result: Result<T, FtpError>) -> Result<T, FtpError> {
        if let Err(err) = &result
            && err.breaks_session()
            && self.control.take().is_some()
        {
            tracing::debug!(host = %self.key.host, error = %err, "dropping ftp control connection");
        }
        result
    }

    async fn read_reply(&mut self) -> Result<Reply, FtpError> {
        let limit = self.config.command_timeout;
        let control = self.control.as_mut().ok_or(FtpError::NotConnected)?;
        let result = with_timeout(limit, "read reply", codec::read_reply(control)).await;
        let reply = self.check(result)?;
        if reply.code == 421 {
            // Service closing the control connection.
            return self.check(reply.into_result());
        }
        tracing::trace!(host = %self.key.host, code = reply.code, "ftp reply");
        Ok(reply)
    }

    async fn send(&mut self, command: &str) -> Result<(), FtpError> {
        tracing::trace!(host = %self.key.host, command = codec::redact(command), "ftp command");
        let limit = self.config.command_timeout;
        let verb = command.split(' ').next().unwrap_or(command).to_string();
        let control = self.control.as_mut().ok_or(FtpError::NotConnected)?;
        let line = format!("{command}\r\n");
        let result = with_timeout(limit, &verb, async {
            control.write_all(line.as_bytes()).await?;
            control.flush().await?;
            Ok(())
        })
        .await;
        self.check(result)
    }

    async fn command(&mut self, command: &str) -> Result<Reply, FtpError> {
        self.send(command).await?;
        self.read_reply().await
    }

    async fn expect_positive(&mut self, command: &str) -> Result<Reply, FtpError> {
        self.command(command).await?.into_result()
    }

    async fn login(&mut self) -> Result<(), FtpError> {
        let mut greeting = self.read_reply().await?;
        while greeting.is_preliminary() {
            greeting = self.read_reply().await?;
        }
        greeting.into_result()?;

        let user = format!("USER {}", self.key.username);
        let reply = self.expect_positive(&user).await?;
        if (300..400).contains(&reply.code) {
            let pass = format!("PASS {}", self.key.password);
            self.expect_positive(&pass).await?;
        }

        let mode = if self.key.binary_mode { "TYPE I" } else { "TYPE A" };
        self.expect_positive(mode).await?;

        tracing::debug!(
            host = %self.key.host,
            user = %self.key.username,
            binary = self.key.binary_mode,
            active = self.key.active_mode,
            "ftp session logged in"
        );
        Ok(())
    }

    fn control_addrs(&self) -> Result<(SocketAddr, SocketAddr), FtpError> {
        let stream = self.control.as_ref().ok_or(FtpError::NotConnected)?.get_ref();
        Ok((stream.local_addr()?, stream.peer_addr()?))
    }

    async fn open_data(&mut self) -> Result<DataChannel, FtpError> {
        if self.key.active_mode {
            return self.open_active().await;
        }

        let (_, peer) = self.control_addrs()?;
        let reply = self.command("EPSV").await?;
        let addr = if reply.code == 229 {
            SocketAddr::new(peer.ip(), codec::parse_epsv(&reply.message)?)
        } else {
            let reply = self.expect_positive("PASV").await?;
            let addr = codec::parse_pasv(&reply.message)?;
            if addr.ip().is_unspecified() {
                SocketAddr::new(peer.ip(), addr.port())
            } else {
                SocketAddr::V4(addr)
            }
        };

        let limit = self.config.connect_timeout;
        let stream = with_timeout(limit, "data connect", async {
            Ok(TcpStream::connect(addr).await?)
        })
        .await;
        Ok(DataChannel::Passive(self.check(stream)?))
    }

    async fn open_active(&mut self) -> Result<DataChannel, FtpError> {
        let (local, _) = self.control_addrs()?;
        let listener = TcpListener::bind(SocketAddr::new(local.ip(), 0)).await?;
        let addr = listener.local_addr()?;
        let command = match addr {
            SocketAddr::V4(v4) => format!("PORT {}", codec::format_port(v4)),
            SocketAddr::V6(_) => format!("EPRT {}", codec::format_eprt(addr)),
        };
        self.expect_positive(&command).await?;
        Ok(DataChannel::Active(listener))
    }

    /// Open a data connection and issue a transfer command on it.
    async fn start_transfer(&mut self, command: &str) -> Result<TcpStream, FtpError> {
        let channel = self.open_data().await?;
        let reply = self.expect_positive(command).await?;
        if !reply.is_preliminary() {
            // The server may still send the reply we skipped, so the control
            // channel can no longer be trusted.
            return self.check(Err(FtpError::protocol(format!(
                "expected a 1xx reply to '{}', got {}",
                codec::redact(command),
                reply.code
            ))));
        }

        match channel {
            DataChannel::Passive(stream) => Ok(stream),
            DataChannel::Active(listener) => {
                let limit = self.config.connect_timeout;
                let accepted = with_timeout(limit, "data accept", async {
                    Ok(listener.accept().await?.0)
                })
                .await;
                self.check(accepted)
            }
        }
    }

    async fn read_data(&mut self, mut stream: TcpStream, operation: &str) -> Result<Vec<u8>, FtpError> {
        let limit = self.config.command_timeout;
        let mut data = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let read = with_timeout(limit, operation, async {
                Ok(stream.read(&mut chunk).await?)
            })
            .await;
            let n = self.check(read)?;
            if n == 0 {
                return Ok(data);
            }
            data.extend_from_slice(&chunk[..n]);
        }
    }

    async fn finish_transfer(&mut self) -> Result<Reply, FtpError> {
        self.read_reply().await?.into_result()
    }
}

#[async_trait]
impl FtpSession for TcpFtpSession {
    async fn connect(&mut self) -> Result<(), FtpError> {
        if self.key.use_tls {
            return Err(FtpError::Unsupported(
                "FTPS is not available in the built-in client; use a TLS-capable SessionFactory"
                    .to_string(),
            ));
        }

        let (host, port) = codec::parse_host(&self.key.host)?;
        let limit = self.config.connect_timeout;
        let stream = with_timeout(limit, "connect", async {
            Ok(TcpStream::connect((host.as_str(), port)).await?)
        })
        .await?;
        stream.set_nodelay(true)?;
        self.control = Some(BufReader::new(stream));

        let result = with_timeout(limit, "login", self.login()).await;
        if result.is_err() {
            self.control = None;
        }
        result
    }

    async fn disconnect(&mut self) -> Result<(), FtpError> {
        if self.control.is_none() {
            return Ok(());
        }
        let result = self.command("QUIT").await;
        self.control = None;
        result.map(|_| ())
    }

    fn is_connected(&self) -> bool {
        self.control.is_some()
    }

    async fn list(&mut self, path: &str) -> Result<Vec<ListEntry>, FtpError> {
        let stream = self.start_transfer(&format!("NLST {path}")).await?;
        let data = self.read_data(stream, "NLST").await?;
        self.finish_transfer().await?;

        let text = String::from_utf8_lossy(&data);
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != "." && *line != "..")
            .map(|line| ListEntry::in_dir(path, line))
            .collect())
    }

    async fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FtpError> {
        let stream = self.start_transfer(&format!("RETR {path}")).await?;
        let data = self.read_data(stream, "RETR").await?;
        self.finish_transfer().await?;
        Ok(data)
    }

    async fn store(&mut self, path: &str, data: &[u8]) -> Result<Reply, FtpError> {
        let mut stream = self.start_transfer(&format!("STOR {path}")).await?;
        let limit = self.config.command_timeout;
        let written = with_timeout(limit, "STOR", async {
            stream.write_all(data).await?;
            stream.shutdown().await?;
            Ok(())
        })
        .await;
        self.check(written)?;
        drop(stream);
        self.finish_transfer().await
    }

    async fn delete(&mut self, path: &str) -> Result<(), FtpError> {
        self.expect_positive(&format!("DELE {path}")).await.map(|_| ())
    }
}

/// Opens [`TcpFtpSession`]s.
#[derive(Debug, Clone, Default)]
pub struct TcpSessionFactory {
    config: FtpConfig,
}

impl TcpSessionFactory {
    /// Create a factory using `config` for every session.
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for TcpSessionFactory {
    async fn open(&self, key: &FtpCacheKey) -> Result<Box<dyn FtpSession>, FtpError> {
        let mut session = TcpFtpSession::new(key.clone(), self.config.clone());
        session.connect().await?;
        Ok(Box::new(session))
    }
}

