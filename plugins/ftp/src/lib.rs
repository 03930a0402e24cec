//! # Wharf FTP
//!
//! FTP connector plugin: list, download, upload, delete, and copy files to
//! blob storage, all over pooled FTP sessions.
//!
//! Sessions are keyed by [`FtpCacheKey`] (every connection parameter) and
//! held in a [`wharf_pool::Pool`] through [`FtpResource`]. Each session is
//! used by one operation at a time.
//!
//! ```rust,ignore
//! let pool = Pool::new(FtpResource::tcp(FtpConfig::default()), PoolConfig::default())?;
//! let connector = FtpConnector::new(pool, Arc::new(FsBlobStore::new()), FtpConfig::default());
//! let response = connector.invoke("FTPList", &connection, &request).await;
//! ```

pub mod blob;
pub mod client;
pub mod codec;
pub mod config;
pub mod connector;
pub mod error;
pub mod key;
pub mod memory;
pub mod operations;
pub mod resource;
pub mod session;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use client::{TcpFtpSession, TcpSessionFactory};
pub use config::FtpConfig;
pub use connector::{FtpConnector, SERVICE_ID};
pub use error::{FtpError, status_for_code};
pub use key::FtpCacheKey;
pub use resource::FtpResource;
pub use session::{FtpSession, ListEntry, Reply, SessionFactory};
