//! Pool integration: FTP sessions as a [`wharf_pool::Resource`].

use std::sync::Arc;

use wharf_pool::{BoxError, Resource};

use crate::client::TcpSessionFactory;
use crate::config::FtpConfig;
use crate::key::FtpCacheKey;
use crate::session::{FtpSession, SessionFactory};

/// Pooled FTP sessions, created through a [`SessionFactory`].
#[derive(Clone)]
pub struct FtpResource {
    factory: Arc<dyn SessionFactory>,
}

impl FtpResource {
    /// Sessions opened by `factory`.
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self { factory }
    }

    /// Sessions opened with the built-in TCP client.
    pub fn tcp(config: FtpConfig) -> Self {
        Self::new(Arc::new(TcpSessionFactory::new(config)))
    }
}

impl std::fmt::Debug for FtpResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpResource").finish_non_exhaustive()
    }
}

impl Resource for FtpResource {
    type Key = FtpCacheKey;
    type Instance = Box<dyn FtpSession>;

    fn id(&self) -> &str {
        "ftp"
    }

    async fn create(&self, key: &FtpCacheKey) -> Result<Box<dyn FtpSession>, BoxError> {
        Ok(self.factory.open(key).await?)
    }

    fn is_valid(&self, session: &Box<dyn FtpSession>) -> bool {
        session.is_connected()
    }

    async fn cleanup(&self, mut session: Box<dyn FtpSession>) -> Result<(), BoxError> {
        session.disconnect().await?;
        Ok(())
    }
}
