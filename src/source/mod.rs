//! Source Path Classification and Opening
//!
//! Decides whether a source path is remote (network share, FTP/SFTP/SMB,
//! HTTP) or local, and opens a readable stream over it. Classification is
//! purely lexical; no network probing happens until the stream is opened.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::errors::CacheError;

/// Prefixes that mark a path as living on a network share or remote protocol
const NETWORK_PREFIXES: &[&str] = &["//", r"\\", "ftp://", "sftp://", "smb://"];

/// Prefixes that mark a path as fetchable with a streaming HTTP GET
const HTTP_PREFIXES: &[&str] = &["http://", "https://", "www."];

/// How a source path is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Ordinary local filesystem path
    Local,
    /// UNC / FTP / SFTP / SMB path, opened through the filesystem layer
    NetworkShare,
    /// HTTP(S) URL, opened with a streaming GET
    Http,
}

/// A source path with its derived classification
///
/// Immutable once classified; lives for the duration of one invocation.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    path: String,
    kind: SourceKind,
}

impl SourceDescriptor {
    /// Classify a source path by prefix
    pub fn classify(path: &str) -> Self {
        let kind = if HTTP_PREFIXES.iter().any(|p| path.starts_with(p)) {
            SourceKind::Http
        } else if NETWORK_PREFIXES.iter().any(|p| path.starts_with(p)) {
            SourceKind::NetworkShare
        } else {
            SourceKind::Local
        };
        debug!(path = path, kind = ?kind, "Classified source path");
        Self {
            path: path.to_string(),
            kind,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn is_remote(&self) -> bool {
        self.kind != SourceKind::Local
    }

    pub fn is_http(&self) -> bool {
        self.kind == SourceKind::Http
    }

    /// Last path segment of the original (non-normalized) source path
    pub fn base_file_name(&self) -> &str {
        base_file_name(&self.path)
    }
}

/// Last segment of a path string, splitting on both separator styles
pub fn base_file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// An open readable source with its declared length in bytes
pub struct SourceStream {
    pub reader: Box<dyn Read>,
    pub len: u64,
}

/// Open a source for streaming
///
/// HTTP sources are opened with a GET and must declare a Content-Length;
/// everything else is opened as a filesystem path. Remote existence is
/// implied by a successful open.
pub fn open(descriptor: &SourceDescriptor) -> Result<SourceStream, CacheError> {
    match descriptor.kind() {
        SourceKind::Http => open_http(descriptor.path()),
        SourceKind::Local | SourceKind::NetworkShare => open_file(descriptor.path()),
    }
}

fn open_http(path: &str) -> Result<SourceStream, CacheError> {
    // A bare "www." path is not a fetchable URL on its own
    let url = if path.starts_with("www.") {
        format!("https://{path}")
    } else {
        path.to_string()
    };

    let response = reqwest::blocking::Client::new()
        .get(&url)
        .send()
        .map_err(|e| CacheError::SourceUnreadable(format!("{url}: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(CacheError::SourceNotFound(url));
    }
    if !status.is_success() {
        return Err(CacheError::SourceUnreadable(format!("{url}: HTTP {status}")));
    }

    let len = response
        .content_length()
        .ok_or_else(|| CacheError::InvalidSourceLength(format!("{url}: no Content-Length")))?;

    info!(url = %url, size = len, "Opened HTTP source stream");
    Ok(SourceStream {
        reader: Box::new(response),
        len,
    })
}

fn open_file(path: &str) -> Result<SourceStream, CacheError> {
    let file = File::open(Path::new(path)).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CacheError::SourceNotFound(path.to_string())
        } else {
            CacheError::SourceUnreadable(format!("{path}: {e}"))
        }
    })?;

    let len = file
        .metadata()
        .map_err(|e| CacheError::SourceUnreadable(format!("{path}: {e}")))?
        .len();

    info!(path = path, size = len, "Opened file source stream");
    Ok(SourceStream {
        reader: Box::new(file),
        len,
    })
}
