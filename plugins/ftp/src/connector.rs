//! The FTP [`Connector`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use wharf_connector::{Connector, ConnectorError, OperationDescriptor, Parameters};
use wharf_pool::Pool;

use crate::blob::BlobStore;
use crate::config::FtpConfig;
use crate::error::FtpError;
use crate::key::FtpCacheKey;
use crate::operations;
use crate::resource::FtpResource;
use crate::session::FtpSession;

/// Service provider id of the built-in FTP connector.
pub const SERVICE_ID: &str = "/serviceProviders/FTPbuiltin";

/// Operation ids.
pub mod ops {
    pub const LIST: &str = "FTPList";
    pub const GET_FILE: &str = "FTPGetFile";
    pub const UPLOAD_FILE: &str = "FTPUploadFile";
    pub const DELETE_FILE: &str = "FTPDeleteFile";
    pub const COPY_FILE_TO_BLOB: &str = "FTPCopyFileToBlob";
}

const OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor::new(ops::LIST, "List files in a folder"),
    OperationDescriptor::new(ops::GET_FILE, "Get file content"),
    OperationDescriptor::new(ops::UPLOAD_FILE, "Upload file"),
    OperationDescriptor::new(ops::DELETE_FILE, "Delete file"),
    OperationDescriptor::new(ops::COPY_FILE_TO_BLOB, "Copy file to blob storage"),
];

/// A validated operation request.
enum Call<'a> {
    List {
        path: &'a str,
    },
    Get {
        path: &'a str,
    },
    Upload {
        path: &'a str,
        content: String,
    },
    Delete {
        path: &'a str,
    },
    CopyToBlob {
        path: &'a str,
        connection_string: &'a str,
        container: &'a str,
    },
}

impl<'a> Call<'a> {
    fn parse(operation: &str, request: &'a Parameters) -> Result<Self, ConnectorError> {
        let path = request.required_str("inputParam")?;
        match operation {
            ops::LIST => Ok(Self::List { path }),
            ops::GET_FILE => Ok(Self::Get { path }),
            ops::UPLOAD_FILE => {
                let content = match request.get("content") {
                    None | Some(Value::Null) => {
                        return Err(ConnectorError::validation("parameter 'content' is required"));
                    }
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                Ok(Self::Upload { path, content })
            }
            ops::DELETE_FILE => Ok(Self::Delete { path }),
            ops::COPY_FILE_TO_BLOB => Ok(Self::CopyToBlob {
                path,
                connection_string: request.required_str("storageconnectionstring")?,
                container: request.required_str("targetcontainer")?,
            }),
            other => Err(ConnectorError::NotImplemented(other.to_string())),
        }
    }
}

/// Map a failure to obtain a session.
///
/// A server that answered the login with an error reply is reported by its
/// completion code; anything else means the server is unavailable.
fn classify_pool_error(err: wharf_pool::Error) -> ConnectorError {
    match err.cause().and_then(|cause| cause.downcast_ref::<FtpError>()) {
        Some(ftp @ FtpError::Reply { .. }) => ConnectorError::operation(ftp.status(), ftp.to_string()),
        Some(ftp @ FtpError::Unsupported(_)) => ConnectorError::validation(ftp.to_string()),
        _ => ConnectorError::from(err),
    }
}

/// FTP connector over pooled sessions.
#[derive(Clone)]
pub struct FtpConnector {
    pool: Pool<FtpResource>,
    blobs: Arc<dyn BlobStore>,
    config: FtpConfig,
}

impl std::fmt::Debug for FtpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpConnector")
            .field("pool", &self.pool)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FtpConnector {
    /// Create a connector using `pool` for sessions and `blobs` for
    /// `FTPCopyFileToBlob`.
    pub fn new(pool: Pool<FtpResource>, blobs: Arc<dyn BlobStore>, config: FtpConfig) -> Self {
        Self {
            pool,
            blobs,
            config,
        }
    }

    /// The session pool.
    pub fn pool(&self) -> &Pool<FtpResource> {
        &self.pool
    }

    async fn run(&self, call: Call<'_>, key: &FtpCacheKey) -> Result<Value, ConnectorError> {
        let handle = self.pool.acquire(key).await.map_err(classify_pool_error)?;
        let mut guard = handle.lock().await;
        let session: &mut dyn FtpSession = &mut **guard;

        let result = match call {
            Call::List { path } => operations::list_files(session, path).await,
            Call::Get { path } => {
                operations::get_file(session, path, self.config.compress_threshold).await
            }
            Call::Upload { path, content } => {
                operations::upload_file(session, path, &content, key.binary_mode).await
            }
            Call::Delete { path } => operations::delete_file(session, path).await,
            Call::CopyToBlob {
                path,
                connection_string,
                container,
            } => {
                operations::copy_file_to_blob(
                    session,
                    self.blobs.as_ref(),
                    path,
                    connection_string,
                    container,
                )
                .await
            }
        };

        let broken = !guard.is_connected();
        drop(guard);
        if broken && self.pool.invalidate_handle(&handle) {
            tracing::warn!(
                component = SERVICE_ID,
                host = %key.host,
                generation = handle.generation(),
                "session lost during operation, evicted from pool"
            );
        }
        result
    }
}

#[async_trait]
impl Connector for FtpConnector {
    fn service_id(&self) -> &str {
        SERVICE_ID
    }

    fn operations(&self) -> &[OperationDescriptor] {
        OPERATIONS
    }

    async fn execute(
        &self,
        operation: &str,
        connection: &Parameters,
        request: &Parameters,
    ) -> Result<Value, ConnectorError> {
        let call = Call::parse(operation, request)?;
        let key = FtpCacheKey::from_parameters(connection)?;
        tracing::debug!(component = SERVICE_ID, operation, key = ?key, "invoking ftp operation");
        self.run(call, &key).await
    }
}
