use crate::error::StaticError;
use crate::http::{Response, Status};
use log::debug;
use std::io;
use std::path::{Component, Path, PathBuf};

/// URL prefix under which files are served
pub const STATIC_PREFIX: &str = "/static/";

/// Content type used when the extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Map a file extension to a content type
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    let content_type = match ext.to_ascii_lowercase().as_str() {
        // Text types
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown",
        "csv" => "text/csv",

        // Application types
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "wasm" => "application/wasm",

        // Image types
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",

        // Audio types
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",

        // Video types
        "mp4" => "video/mp4",
        "webm" => "video/webm",

        // Font types
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",

        _ => return None,
    };
    Some(content_type)
}

/// Get the content type for a file based on its extension
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(content_type_for_extension)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decode `%XX` escapes in a URL path.
///
/// Every `%` must be followed by two hex digits. The result is raw bytes and
/// need not be UTF-8. `+` is left alone since it only means a space in query
/// strings.
pub fn percent_decode(input: &str) -> Result<Vec<u8>, StaticError> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied().and_then(hex_value);
            let lo = bytes.get(i + 2).copied().and_then(hex_value);
            match (hi, lo) {
                (Some(hi), Some(lo)) => decoded.push((hi << 4) | lo),
                _ => return Err(StaticError::Decode),
            }
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    Ok(decoded)
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// A resolved static response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub status: Status,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl StaticFile {
    fn from_error(err: &StaticError) -> Self {
        let (status, body) = match err {
            StaticError::Decode => (Status::BadRequest, "Bad Request"),
            StaticError::Forbidden => (Status::Forbidden, "Forbidden"),
            StaticError::NotFound => (Status::NotFound, "File Not Found"),
            StaticError::ReadFailure(_) => (Status::InternalServerError, "Internal Server Error"),
        };
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn into_response(self) -> Response {
        Response::new(self.status, &self.content_type, self.body)
    }
}

/// Serves files below a root directory for paths under `/static/`
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Whether `path` belongs to the static file tree
    pub fn handles(path: &str) -> bool {
        path.starts_with(STATIC_PREFIX)
    }

    /// Turn a raw request path into a filesystem path under the root.
    ///
    /// Any `..` in the decoded path is refused outright, even inside a file
    /// name. Root and drive components of the remainder are dropped so the
    /// result never leaves the root.
    pub fn locate(&self, request_path: &str) -> Result<PathBuf, StaticError> {
        let decoded = percent_decode(request_path)?;
        if decoded.windows(2).any(|pair| pair == b"..") {
            return Err(StaticError::Forbidden);
        }

        let relative = decoded
            .strip_prefix(STATIC_PREFIX.as_bytes())
            .unwrap_or(&decoded);
        let mut full = self.root.clone();
        for component in path_from_bytes(relative).components() {
            if let Component::Normal(part) = component {
                full.push(part);
            }
        }
        Ok(full)
    }

    async fn load(&self, request_path: &str) -> Result<StaticFile, StaticError> {
        let path = self.locate(request_path)?;
        let body = tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => StaticError::NotFound,
            _ => StaticError::ReadFailure(err),
        })?;

        Ok(StaticFile {
            status: Status::Ok,
            content_type: content_type_for(&path).to_string(),
            body,
        })
    }

    /// Resolve `request_path` to a file, or to the error response that
    /// replaces it
    pub async fn resolve(&self, request_path: &str) -> StaticFile {
        match self.load(request_path).await {
            Ok(file) => file,
            Err(err) => {
                debug!("static {} -> {}", request_path, err);
                StaticFile::from_error(&err)
            }
        }
    }
}

impl Default for StaticFiles {
    fn default() -> Self {
        Self::new("static")
    }
}
