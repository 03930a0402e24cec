//! FTP operations run on a borrowed session.
//!
//! Each function produces the JSON body for one connector operation.

use std::borrow::Cow;
use std::io::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::{Value, json};
use wharf_connector::{ConnectorError, content_envelope};

use crate::blob::BlobStore;
use crate::session::FtpSession;

/// Content type of uncompressed downloads.
pub const OCTET_STREAM: &str = "application/octet-stream";
/// Content type of gzip-compressed downloads.
pub const GZIP: &str = "application/gzip";

/// `path` with a leading `/`.
pub fn rooted(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    }
}

/// Final path segment of `path`.
fn file_name(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

/// `[{"Name", "FullName"}]` for the directory at `path`.
pub async fn list_files(session: &mut dyn FtpSession, path: &str) -> Result<Value, ConnectorError> {
    let path = rooted(path);
    let entries = session.list(&path).await?;
    serde_json::to_value(entries).map_err(|e| ConnectorError::internal(e.to_string()))
}

/// Content envelope with the file at `path`, gzip-compressed when it is at
/// least `compress_threshold` bytes.
pub async fn get_file(
    session: &mut dyn FtpSession,
    path: &str,
    compress_threshold: u64,
) -> Result<Value, ConnectorError> {
    let data = session.retrieve(path).await?;
    if data.len() as u64 >= compress_threshold {
        let compressed = gzip(&data)?;
        tracing::debug!(
            path,
            size = data.len(),
            compressed = compressed.len(),
            "download compressed"
        );
        Ok(content_envelope(GZIP, &compressed))
    } else {
        Ok(content_envelope(OCTET_STREAM, &data))
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, ConnectorError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    let failed = |e: std::io::Error| ConnectorError::internal(format!("gzip failed: {e}"));
    encoder.write_all(data).map_err(failed)?;
    encoder.finish().map_err(failed)
}

/// Upload `content` to `path`.
///
/// In binary mode `content` is base64; otherwise it is written as UTF-8
/// text. Returns the server's final reply as `{"code", "message"}`.
pub async fn upload_file(
    session: &mut dyn FtpSession,
    path: &str,
    content: &str,
    binary: bool,
) -> Result<Value, ConnectorError> {
    let data: Cow<'_, [u8]> = if binary {
        let decoded = STANDARD.decode(content.trim()).map_err(|e| {
            ConnectorError::validation(format!("content is not valid base64: {e}"))
        })?;
        Cow::Owned(decoded)
    } else {
        Cow::Borrowed(content.as_bytes())
    };

    let reply = session.store(path, &data).await?;
    Ok(json!({
        "code": reply.code.to_string(),
        "message": reply.message,
    }))
}

/// Delete the file at `path`.
pub async fn delete_file(session: &mut dyn FtpSession, path: &str) -> Result<Value, ConnectorError> {
    session.delete(&rooted(path)).await?;
    Ok(json!("success"))
}

/// Copy the file at `path` into `container`, named after the file.
pub async fn copy_file_to_blob(
    session: &mut dyn FtpSession,
    blobs: &dyn BlobStore,
    path: &str,
    connection_string: &str,
    container: &str,
) -> Result<Value, ConnectorError> {
    let name = file_name(path)
        .ok_or_else(|| ConnectorError::validation(format!("'{path}' has no file name")))?;
    let data = session.retrieve(path).await?;
    let size = data.len();

    blobs
        .upload(connection_string, container, name, data)
        .await
        .map_err(|e| {
            ConnectorError::operation(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("blob upload failed: {e}"),
            )
        })?;

    tracing::debug!(path, container, blob = name, size, "file copied to blob storage");
    Ok(json!(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pub/a", "/pub/a")]
    #[case("/pub/a", "/pub/a")]
    #[case("", "/")]
    fn rooting(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(rooted(input), expected);
    }

    #[rstest]
    #[case("/in/report.csv", Some("report.csv"))]
    #[case("report.csv", Some("report.csv"))]
    #[case("dir\\file.bin", Some("file.bin"))]
    #[case("/in/", Some("in"))]
    #[case("/", None)]
    fn file_names(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(file_name(path), expected);
    }

    #[test]
    fn gzip_round_trips() {
        use std::io::Read as _;
        let compressed = gzip(b"hello hello hello").unwrap();
        let mut decoded = String::new();
        flate2::read::GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "hello hello hello");
    }
}
