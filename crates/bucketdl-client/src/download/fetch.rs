//! Downloading one resource to disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time;
use url::Url;

use super::TRACING_TARGET;
use super::sanitize::sanitize_filename;
use crate::connect::ClientConfig;
use crate::cookie::{self, CookieAcquirer};
use crate::error::{DownloadFailure, Error, Result};
use crate::resource::ResourceUrl;

/// Write buffer size for downloads (256 KiB).
const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Suffix of the file a download is streamed into.
const PARTIAL_SUFFIX: &str = ".part";

/// What happened to a resource that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Downloaded {
    /// The body was written to `path`.
    Written { path: PathBuf, bytes: u64 },
    /// A file already existed at `path`; nothing was fetched.
    Skipped { path: PathBuf },
}

impl Downloaded {
    /// Returns the local path of the file.
    pub fn path(&self) -> &Path {
        match self {
            Self::Written { path, .. } | Self::Skipped { path } => path,
        }
    }
}

/// Downloads `resource` into `dest_dir` unless a file of the same name exists.
pub(crate) async fn fetch_resource(
    http: &Client,
    config: &ClientConfig,
    acquirer: &CookieAcquirer,
    resource: &ResourceUrl,
    cookie_url: &str,
    dest_dir: &Path,
) -> Result<Downloaded> {
    let name = sanitize_filename(resource.escaped_name())?;
    if name.is_empty() {
        return Err(Error::download(resource.as_str(), DownloadFailure::UnusableFilename));
    }

    let path = dest_dir.join(&name);
    let exists = fs::try_exists(&path)
        .await
        .map_err(|err| Error::filesystem(resource.as_str(), &path, err))?;
    if exists {
        tracing::debug!(
            target: TRACING_TARGET,
            url = %resource,
            path = %path.display(),
            "File already exists, skipping"
        );
        return Ok(Downloaded::Skipped { path });
    }

    let cookies = acquirer
        .acquire(cookie_url)
        .await
        .map_err(|err| Error::download(resource.as_str(), DownloadFailure::Cookies(Box::new(err))))?;

    let target = Url::parse(resource.as_str()).map_err(|source| Error::InvalidUrl {
        url: resource.to_string(),
        source,
    })?;
    let jar = cookies.jar_for(&target);

    // Bounds each wait for data, not the whole transfer.
    let stall_timeout = config.request_timeout();
    let request = cookie::authorize(http.get(target.clone()), &jar, &target);
    let response = time::timeout(stall_timeout, request.send())
        .await
        .map_err(|_| Error::download(resource.as_str(), DownloadFailure::Stalled(stall_timeout)))?
        .map_err(|err| Error::download(resource.as_str(), DownloadFailure::Transport(err)))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::download(
            resource.as_str(),
            DownloadFailure::Status(status.as_u16()),
        ));
    }

    fs::create_dir_all(dest_dir)
        .await
        .map_err(|err| Error::filesystem(resource.as_str(), dest_dir, err))?;

    // Only a complete body ever appears under the final name.
    let partial = partial_path(&path);
    let file = File::create(&partial)
        .await
        .map_err(|err| Error::filesystem(resource.as_str(), &partial, err))?;

    let written = match write_body(response, file, resource, &partial, stall_timeout).await {
        Ok(bytes) => fs::rename(&partial, &path)
            .await
            .map(|()| bytes)
            .map_err(|err| Error::filesystem(resource.as_str(), &path, err)),
        Err(err) => Err(err),
    };

    match written {
        Ok(bytes) => {
            tracing::debug!(
                target: TRACING_TARGET,
                url = %resource,
                path = %path.display(),
                bytes,
                "Resource written"
            );
            Ok(Downloaded::Written { path, bytes })
        }
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(&partial).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    path = %partial.display(),
                    error = %remove_err,
                    "Failed to remove partial file"
                );
            }
            Err(err)
        }
    }
}

/// Returns the sibling path a download is streamed into before it completes.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Streams the response body into `file`, returning the number of bytes written.
///
/// Fails with [`DownloadFailure::Stalled`] when no chunk arrives within `stall_timeout`.
async fn write_body(
    response: reqwest::Response,
    file: File,
    resource: &ResourceUrl,
    path: &Path,
    stall_timeout: Duration,
) -> Result<u64> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    loop {
        let next = time::timeout(stall_timeout, stream.next())
            .await
            .map_err(|_| Error::download(resource.as_str(), DownloadFailure::Stalled(stall_timeout)))?;
        let Some(chunk) = next else {
            break;
        };

        let chunk =
            chunk.map_err(|err| Error::download(resource.as_str(), DownloadFailure::Transport(err)))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|err| Error::filesystem(resource.as_str(), path, err))?;
        written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|err| Error::filesystem(resource.as_str(), path, err))?;

    Ok(written)
}
