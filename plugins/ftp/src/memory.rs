//! In-memory FTP server and sessions.
//!
//! Behaves like a tiny FTP server without sockets: files live in a map,
//! logins can be refused, and live sessions can be cut off. Useful for
//! exercising the connector and the pool without a network.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::FtpError;
use crate::key::FtpCacheKey;
use crate::session::{FtpSession, ListEntry, Reply, SessionFactory};

#[derive(Debug, Default)]
struct ServerState {
    files: BTreeMap<String, Vec<u8>>,
    logins: usize,
    logouts: usize,
    epoch: u64,
    login_reply: Option<Reply>,
}

/// Shared state of an in-memory server. Clones refer to the same server.
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

fn not_found(path: &str) -> FtpError {
    FtpError::Reply {
        code: 550,
        message: format!("{path}: No such file or directory"),
    }
}

impl MemoryServer {
    /// An empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file.
    pub fn put_file(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.state.lock().files.insert(normalize(path), data.into());
    }

    /// Contents of a file.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(&normalize(path)).cloned()
    }

    /// Successful logins so far.
    pub fn logins(&self) -> usize {
        self.state.lock().logins
    }

    /// Logouts so far.
    pub fn logouts(&self) -> usize {
        self.state.lock().logouts
    }

    /// Refuse logins with `reply` until called again with `None`.
    pub fn refuse_logins(&self, reply: Option<Reply>) {
        self.state.lock().login_reply = reply;
    }

    /// Cut off every live session.
    pub fn drop_connections(&self) {
        self.state.lock().epoch += 1;
    }

    /// A factory opening sessions against this server.
    pub fn factory(&self) -> MemoryFactory {
        MemoryFactory {
            server: self.clone(),
        }
    }
}

/// A session against a [`MemoryServer`].
#[derive(Debug)]
pub struct MemorySession {
    server: MemoryServer,
    key: FtpCacheKey,
    epoch: Option<u64>,
}

impl MemorySession {
    /// A disconnected session.
    pub fn new(server: MemoryServer, key: FtpCacheKey) -> Self {
        Self {
            server,
            key,
            epoch: None,
        }
    }

    /// The key this session logged in with.
    pub fn key(&self) -> &FtpCacheKey {
        &self.key
    }

    fn ensure_connected(&self) -> Result<(), FtpError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(FtpError::NotConnected)
        }
    }
}

#[async_trait]
impl FtpSession for MemorySession {
    async fn connect(&mut self) -> Result<(), FtpError> {
        let mut state = self.server.state.lock();
        if let Some(reply) = state.login_reply.clone() {
            return Err(FtpError::Reply {
                code: reply.code,
                message: reply.message,
            });
        }
        state.logins += 1;
        self.epoch = Some(state.epoch);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), FtpError> {
        if self.epoch.take().is_some() {
            self.server.state.lock().logouts += 1;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.epoch
            .is_some_and(|epoch| epoch == self.server.state.lock().epoch)
    }

    async fn list(&mut self, path: &str) -> Result<Vec<ListEntry>, FtpError> {
        self.ensure_connected()?;
        let dir = normalize(path);
        let state = self.server.state.lock();
        let prefix = if dir == "/" { dir.clone() } else { format!("{dir}/") };
        if dir != "/" && !state.files.keys().any(|file| file.starts_with(&prefix)) {
            return Err(not_found(&dir));
        }
        Ok(state
            .files
            .keys()
            .filter(|file| parent(file) == dir)
            .map(|file| ListEntry::in_dir(&dir, file))
            .collect())
    }

    async fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FtpError> {
        self.ensure_connected()?;
        let path = normalize(path);
        self.server
            .state
            .lock()
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| not_found(&path))
    }

    async fn store(&mut self, path: &str, data: &[u8]) -> Result<Reply, FtpError> {
        self.ensure_connected()?;
        self.server
            .state
            .lock()
            .files
            .insert(normalize(path), data.to_vec());
        Ok(Reply::new(226, "Transfer complete."))
    }

    async fn delete(&mut self, path: &str) -> Result<(), FtpError> {
        self.ensure_connected()?;
        let path = normalize(path);
        self.server
            .state
            .lock()
            .files
            .remove(&path)
            .map(|_| ())
            .ok_or_else(|| not_found(&path))
    }
}

/// Opens [`MemorySession`]s.
#[derive(Debug, Clone)]
pub struct MemoryFactory {
    server: MemoryServer,
}

#[async_trait]
impl SessionFactory for MemoryFactory {
    async fn open(&self, key: &FtpCacheKey) -> Result<Box<dyn FtpSession>, FtpError> {
        let mut session = MemorySession::new(self.server.clone(), key.clone());
        session.connect().await?;
        Ok(Box::new(session))
    }
}
