//! Installer download into a scoped temporary directory.
//!
//! The downloaded file lives inside a [`tempfile::TempDir`] owned by
//! [`InstallerDownload`]. Dropping the handle removes the directory and the
//! installer with it, so every exit path of an update attempt cleans up,
//! including early returns and errors halfway through the stream.

use crate::core::UpdaterError;
use crate::update::release::ReleaseClient;
use crate::utils::DownloadProgress;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

/// Size of the write buffer between the network stream and the file.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// File name used when the URL has no usable last path segment.
const FALLBACK_FILE_NAME: &str = "installer";

/// A downloaded installer and the temporary directory that owns it.
#[derive(Debug)]
pub struct InstallerDownload {
    path: PathBuf,
    dir: TempDir,
}

impl InstallerDownload {
    /// Location of the installer executable.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the temporary directory now, reporting any failure.
    ///
    /// Dropping the handle does the same but ignores errors.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// File name for the installer: the URL's last non-empty path segment.
#[must_use]
pub fn installer_file_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Stream the resource at `url` into a fresh temporary directory.
///
/// Waiting for the response headers and each network read are bounded by the
/// client's request timeout, so an unresponsive server or a stalled transfer
/// aborts instead of hanging the cycle.
///
/// # Errors
///
/// Returns [`UpdaterError::DownloadError`] for transport failures, non-2xx
/// statuses, stalled reads and file I/O errors. The temporary directory has
/// already been removed when the error is returned.
pub async fn download_installer(
    client: &ReleaseClient,
    url: &str,
    show_progress: bool,
) -> Result<InstallerDownload, UpdaterError> {
    let download_error = |reason: String| UpdaterError::DownloadError {
        url: url.to_string(),
        reason,
    };

    let dir = tempfile::Builder::new()
        .prefix("kvm-updater-")
        .tempdir()
        .map_err(|e| download_error(format!("failed to create temporary directory: {e}")))?;
    let file_name = installer_file_name(url);
    let path = dir.path().join(&file_name);

    debug!("Downloading {} to {}", url, path.display());

    // Headers must arrive within the request timeout; the body is bounded per chunk below.
    let stall_timeout = client.request_timeout();
    let mut response = tokio::time::timeout(stall_timeout, client.http().get(url).send())
        .await
        .map_err(|_| download_error(format!("no response within {}s", stall_timeout.as_secs())))?
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| download_error(e.to_string()))?;

    let progress = if show_progress {
        DownloadProgress::new(response.content_length(), file_name)
    } else {
        DownloadProgress::hidden()
    };

    let file = File::create(&path)
        .await
        .map_err(|e| download_error(format!("failed to create {}: {e}", path.display())))?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

    loop {
        let chunk = tokio::time::timeout(stall_timeout, response.chunk())
            .await
            .map_err(|_| download_error(format!("no data received for {}s", stall_timeout.as_secs())))?
            .map_err(|e| download_error(e.to_string()))?;

        let Some(bytes) = chunk else {
            break;
        };

        writer.write_all(&bytes).await.map_err(|e| download_error(e.to_string()))?;
        progress.inc(bytes.len() as u64);
    }

    writer.flush().await.map_err(|e| download_error(e.to_string()))?;
    // The installer is executed right after; make sure the handle is closed.
    let file = writer.into_inner();
    file.sync_all().await.map_err(|e| download_error(e.to_string()))?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| download_error(format!("failed to mark {} executable: {e}", path.display())))?;
    }

    progress.finish_and_clear();
    info!("Downloaded file saved as: {} ({} bytes)", path.display(), progress.position());

    Ok(InstallerDownload {
        path,
        dir,
    })
}
