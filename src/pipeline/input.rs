//! Input resolution: load a user-supplied path or URL into memory.
//!
//! The parsing service takes the PDF as a multipart upload, so there is no
//! need to keep a file on disk: local files are read and URLs are downloaded
//! straight into a byte buffer. We validate the PDF magic bytes (`%PDF`)
//! before returning so callers get a meaningful error rather than a failed
//! upload several seconds later.

use crate::error::DiligenceError;
use std::path::Path;
use tracing::{debug, info};

/// A PDF held in memory, ready to upload.
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    /// Name sent with the upload (last path or URL segment).
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it. If the input is a local file,
/// validate it exists and is readable.
pub async fn load_pdf(input: &str, timeout_secs: u64) -> Result<LoadedPdf, DiligenceError> {
    if input.trim().is_empty() {
        return Err(DiligenceError::InvalidInput {
            input: input.to_string(),
        });
    }
    let pdf = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(Path::new(input)).await?
    };
    check_magic(&pdf)?;
    Ok(pdf)
}

/// Wrap bytes that are already in memory, validating the PDF magic.
pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<LoadedPdf, DiligenceError> {
    let pdf = LoadedPdf {
        file_name: file_name.into(),
        bytes,
    };
    check_magic(&pdf)?;
    Ok(pdf)
}

fn check_magic(pdf: &LoadedPdf) -> Result<(), DiligenceError> {
    if pdf.bytes.len() >= 4 && &pdf.bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&pdf.bytes[..4]);
        return Err(DiligenceError::NotAPdf {
            name: pdf.file_name.clone(),
            magic,
        });
    }
    Ok(())
}

async fn read_local(path: &Path) -> Result<LoadedPdf, DiligenceError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DiligenceError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DiligenceError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(LoadedPdf { file_name, bytes })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<LoadedPdf, DiligenceError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DiligenceError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DiligenceError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DiligenceError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DiligenceError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DiligenceError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());

    Ok(LoadedPdf {
        file_name: filename_from_url(url),
        bytes: bytes.to_vec(),
    })
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "document.pdf".to_string()
}
