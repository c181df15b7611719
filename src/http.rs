use crate::error::{ParseError, ServerResult};
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Write;

/// HTTP status codes this server produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 200,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    InternalServerError = 500,
}

impl Status {
    /// Numeric status code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the text description for this status code
    pub fn as_str(&self) -> &'static str {
        match *self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
        }
    }

    /// Code and reason as they appear on the status line, e.g. `404 Not Found`
    pub fn line(&self) -> &'static str {
        match *self {
            Status::Ok => "200 OK",
            Status::BadRequest => "400 Bad Request",
            Status::Forbidden => "403 Forbidden",
            Status::NotFound => "404 Not Found",
            Status::InternalServerError => "500 Internal Server Error",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(Status::Ok),
            400 => Some(Status::BadRequest),
            403 => Some(Status::Forbidden),
            404 => Some(Status::NotFound),
            500 => Some(Status::InternalServerError),
            _ => None,
        }
    }
}

/// Header fields in arrival order.
///
/// Names keep the case they were received with. Inserting a name that is
/// already present replaces its value in place, so the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
    // exact name -> position in `entries`
    index: HashMap<String, usize>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, overwriting an existing entry with the exact same name
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.index.get(name) {
            Some(&pos) => self.entries[pos].1 = value.to_string(),
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Look up a header by its exact name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// Look up a header ignoring ASCII case. When several spellings are
    /// present the most recently added one is returned.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fully parsed HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub version: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    /// Create a request with no headers and an empty body
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            version: "HTTP/1.1".to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Attach a body, used mostly when building requests by hand
    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    /// Get a header by exact name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Body decoded as UTF-8, with invalid sequences replaced
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Request line and headers, parsed before the body is known to be complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub version: String,
    pub headers: Headers,
    /// Offset of the first body byte in the buffer the head was parsed from
    pub body_start: usize,
}

impl RequestHead {
    /// Declared body length. Absent, unparsable or zero values all mean an
    /// empty body; `Transfer-Encoding` is not consulted.
    pub fn content_length(&self) -> usize {
        self.headers
            .get_ignore_case("Content-Length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0)
    }

    /// Total number of bytes this request occupies in its buffer
    pub fn total_len(&self) -> usize {
        self.body_start.saturating_add(self.content_length())
    }

    /// Attach the body from `data`, the same buffer the head was parsed from
    pub fn into_request(self, data: &[u8]) -> Result<Request, ParseError> {
        let expected = self.content_length();
        let available = data.len().saturating_sub(self.body_start);
        if available < expected {
            return Err(ParseError::IncompleteBody {
                expected,
                received: available,
            });
        }

        let body = data[self.body_start..self.body_start + expected].to_vec();
        Ok(Request {
            method: self.method,
            path: self.path,
            version: self.version,
            headers: self.headers,
            body,
        })
    }
}

/// Split off the next line, returning it without its `\n` and the offset of
/// the following line
fn next_line(data: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = data.get(start..)?;
    let newline = rest.iter().position(|&b| b == b'\n')?;
    Some((&rest[..newline], start + newline + 1))
}

/// Parse the request line and header block.
///
/// Header parsing stops at the first blank line or when the data runs out.
/// Header lines without a `:` are skipped.
pub fn parse_head(data: &[u8]) -> Result<RequestHead, ParseError> {
    let (line, mut pos) = next_line(data, 0).ok_or_else(|| {
        ParseError::MalformedRequestLine(String::from_utf8_lossy(data).trim().to_string())
    })?;

    let line = String::from_utf8_lossy(line);
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [method, path, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine(line.trim().to_string()));
    };

    let mut head = RequestHead {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
        headers: Headers::new(),
        body_start: data.len(),
    };

    while let Some((raw, next)) = next_line(data, pos) {
        pos = next;
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            head.body_start = pos;
            break;
        }

        if let Some((key, value)) = line.split_once(':') {
            head.headers.insert(key.trim(), value.trim());
        }
    }

    Ok(head)
}

/// Parse a complete request from the buffered bytes of one connection
pub fn parse_request(data: &[u8]) -> Result<Request, ParseError> {
    parse_head(data)?.into_request(data)
}

/// HTTP response with the fixed framing this server writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response
    pub fn new(status: Status, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            body: body.into(),
        }
    }

    /// 200 response carrying a handler's output
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Status::Ok, content_type, body)
    }

    /// The fixed response for requests no route accepts
    pub fn not_found() -> Self {
        Self::new(Status::NotFound, "text/plain", "404 Not Found")
    }

    /// Serialize the response to a byte vector
    pub fn serialize(&self, writer: &mut Vec<u8>) -> ServerResult<()> {
        write!(
            writer,
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.status.line(),
            self.content_type,
            self.body.len()
        )?;
        writer.extend_from_slice(&self.body);
        Ok(())
    }

    pub fn to_bytes(&self) -> ServerResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.body.len() + 96);
        self.serialize(&mut out)?;
        Ok(out)
    }
}
