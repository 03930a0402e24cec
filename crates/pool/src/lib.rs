//! # Wharf Resource Pool
//!
//! A bounded, keyed, asynchronous pool for expensive client connections.
//!
//! Each key maps to at most one live instance. Concurrent requests for a key
//! that has no instance yet trigger exactly one creation; everybody else waits
//! for its outcome. When the pool is full, the least-recently-used instance
//! nobody is borrowing gets evicted and disposed in the background.
//!
//! ```rust,ignore
//! let pool = Pool::new(FtpResource::new(factory), PoolConfig::default())?;
//! let handle = pool.acquire(&key).await?;
//! let mut session = handle.lock().await;
//! session.list("/").await?;
//! // dropping `handle` returns the session to the pool
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod pool;
pub mod resource;

mod disposal;

pub use config::{AbandonPolicy, PoolConfig};
pub use error::{Error, Result};
pub use handle::Handle;
pub use pool::{Pool, PoolStats};
pub use resource::{BoxError, Resource};
