use crate::buffer::RequestBuffer;
use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::{ServerError, ServerResult};
use crate::http::{parse_head, Request, Response};
use log::{debug, info};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Represents the current state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Reading,
    Processing,
    Writing,
    Closed,
}

/// Per-connection bounds on buffering and waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub initial_buffer_size: usize,
    pub max_header_size: usize,
    pub max_body_size: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for Limits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            initial_buffer_size: config.initial_buffer_size,
            max_header_size: config.max_header_size,
            max_body_size: config.max_body_size,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }
}

/// One client connection carrying exactly one request and one response
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    id: usize,
    state: ConnectionState,
    buffer: RequestBuffer,
    limits: Limits,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, id: usize, limits: Limits) -> Self {
        Self {
            stream,
            id,
            state: ConnectionState::New,
            buffer: RequestBuffer::new(limits.initial_buffer_size),
            limits,
        }
    }

    /// Get the current state of the connection
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Read one chunk under the read deadline; zero means end of stream
    async fn read_chunk(&mut self) -> ServerResult<usize> {
        match timeout(self.limits.read_timeout, self.buffer.read_from(&mut self.stream)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServerError::Timeout("read")),
        }
    }

    /// Buffer and parse the request.
    ///
    /// Reads until the header terminator or end of stream, then keeps
    /// reading until the declared body is buffered.
    pub async fn read_request(&mut self) -> ServerResult<Request> {
        self.state = ConnectionState::Reading;
        let max_header = self.limits.max_header_size;

        loop {
            if let Some(end) = self.buffer.header_end() {
                if end > max_header {
                    return Err(ServerError::HeaderTooLarge { limit: max_header });
                }
                break;
            }
            if self.buffer.len() > max_header {
                return Err(ServerError::HeaderTooLarge { limit: max_header });
            }
            if self.read_chunk().await? == 0 {
                break;
            }
        }

        let head = parse_head(self.buffer.as_slice())?;
        let declared = head.content_length();
        if declared > self.limits.max_body_size {
            return Err(ServerError::BodyTooLarge {
                limit: self.limits.max_body_size,
                declared,
            });
        }

        let total = head.total_len();
        while self.buffer.len() < total {
            if self.read_chunk().await? == 0 {
                break;
            }
        }

        Ok(head.into_request(self.buffer.as_slice())?)
    }

    /// Write a response under the write deadline
    pub async fn write_response(&mut self, response: &Response) -> ServerResult<()> {
        self.state = ConnectionState::Writing;
        let bytes = response.to_bytes()?;
        let deadline = self.limits.write_timeout;
        let stream = &mut self.stream;
        let write = async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        };
        match timeout(deadline, write).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServerError::Timeout("write")),
        }
    }

    /// Close the connection
    pub async fn close(&mut self) {
        self.state = ConnectionState::Closed;
        if let Err(err) = self.stream.shutdown().await {
            debug!("connection {}: shutdown failed: {}", self.id, err);
        }
    }

    /// Run the connection to completion: read, dispatch, respond, close.
    ///
    /// Any error closes the connection without writing a response.
    pub async fn serve(mut self, dispatcher: &Dispatcher) -> ServerResult<()> {
        let request = match self.read_request().await {
            Ok(request) => request,
            Err(err) => {
                self.state = ConnectionState::Closed;
                return Err(err);
            }
        };
        debug!("connection {}: {} {} {}", self.id, request.method, request.path, request.version);

        self.state = ConnectionState::Processing;
        let response = dispatcher.dispatch(&request).await;

        self.write_response(&response).await?;
        info!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.path,
            response.status.code(),
            response.body.len()
        );

        self.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use tokio::io::{duplex, AsyncReadExt};

    fn limits() -> Limits {
        Limits {
            initial_buffer_size: 64,
            max_header_size: 256,
            max_body_size: 32,
            read_timeout: Duration::from_millis(200),
            write_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_reads_body_arriving_after_headers() {
        let (mut client, server) = duplex(1024);
        let mut conn = Connection::new(server, 1, limits());

        let writer = tokio::spawn(async move {
            client.write_all(b"POST /api/echo HTTP/1.1\r\nContent-Length: 5\r\n\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.write_all(b"hel").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.write_all(b"lo").await.unwrap();
            client
        });

        let request = conn.read_request().await.unwrap();
        assert_eq!(request.body, b"hello");
        assert_eq!(conn.state(), ConnectionState::Reading);
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_eof_before_terminator_parses_what_arrived() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n").await.unwrap();
        client.shutdown().await.unwrap();

        let mut conn = Connection::new(server, 2, limits());
        let request = conn.read_request().await.unwrap();
        assert_eq!(request.path, "/");
        assert_eq!(request.header("Host"), Some("x"));
    }

    #[tokio::test]
    async fn test_eof_mid_body_is_incomplete() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"POST /e HTTP/1.1\r\nContent-Length: 9\r\n\r\nabc").await.unwrap();
        client.shutdown().await.unwrap();

        let mut conn = Connection::new(server, 3, limits());
        let err = conn.read_request().await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Parse(ParseError::IncompleteBody { expected: 9, received: 3 })
        ));
    }

    #[tokio::test]
    async fn test_oversized_header_is_rejected() {
        let (mut client, server) = duplex(4096);
        let long = format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", "a".repeat(512));
        client.write_all(long.as_bytes()).await.unwrap();

        let mut conn = Connection::new(server, 4, limits());
        let err = conn.read_request().await.unwrap_err();
        assert!(matches!(err, ServerError::HeaderTooLarge { limit: 256 }));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"POST /e HTTP/1.1\r\nContent-Length: 100\r\n\r\n").await.unwrap();

        let mut conn = Connection::new(server, 5, limits());
        let err = conn.read_request().await.unwrap_err();
        assert!(matches!(err, ServerError::BodyTooLarge { limit: 32, declared: 100 }));
    }

    #[tokio::test]
    async fn test_silent_peer_times_out() {
        let (_client, server) = duplex(1024);
        let mut conn = Connection::new(server, 6, limits());
        let err = conn.read_request().await.unwrap_err();
        assert!(matches!(err, ServerError::Timeout("read")));
    }

    #[tokio::test]
    async fn test_peer_that_never_reads_hits_write_deadline() {
        let (_client, server) = duplex(1);
        let mut conn = Connection::new(server, 9, limits());
        let err = conn
            .write_response(&Response::ok("text/plain", vec![b'x'; 64]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Timeout("write")));
        assert_eq!(conn.state(), ConnectionState::Writing);
    }

    #[tokio::test]
    async fn test_serve_writes_response_and_closes() {
        let (mut client, server) = duplex(4096);
        client.write_all(b"GET /api/user/42 HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();

        let dispatcher = Dispatcher::new(crate::routes::default_router(), Default::default());
        Connection::new(server, 7, limits()).serve(&dispatcher).await.unwrap();

        let mut raw = String::new();
        client.read_to_string(&mut raw).await.unwrap();
        assert_eq!(
            raw,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 17\r\n\r\n{\"user_id\": \"42\"}"
        );
    }

    #[tokio::test]
    async fn test_malformed_request_gets_no_response() {
        let (mut client, server) = duplex(4096);
        client.write_all(b"GARBAGE\r\n\r\n").await.unwrap();

        let dispatcher = Dispatcher::new(crate::routes::default_router(), Default::default());
        let err = Connection::new(server, 8, limits()).serve(&dispatcher).await.unwrap_err();
        assert!(matches!(err, ServerError::Parse(ParseError::MalformedRequestLine(_))));

        let mut raw = Vec::new();
        client.read_to_end(&mut raw).await.unwrap();
        assert!(raw.is_empty());
    }
}
