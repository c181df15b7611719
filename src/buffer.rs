use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// The byte sequence that ends an HTTP header block
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Growable buffer holding the bytes of a single request
#[derive(Debug)]
pub struct RequestBuffer {
    data: BytesMut,
    chunk_size: usize,
}

impl RequestBuffer {
    /// Create a new buffer with the specified initial capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            chunk_size: capacity.clamp(512, 64 * 1024),
        }
    }

    /// Read at most one chunk from `reader`, returning the number of bytes
    /// appended. Zero means the peer closed its write half.
    pub async fn read_from<R>(&mut self, reader: &mut R) -> io::Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        self.data.reserve(self.chunk_size);
        reader.read_buf(&mut self.data).await
    }

    /// Offset just past the header terminator, if it has been received
    pub fn header_end(&self) -> Option<usize> {
        find_header_end(&self.data)
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a slice of the buffered data
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Locate the end of the header block, returning the offset of the first
/// byte after `\r\n\r\n`
pub fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}
