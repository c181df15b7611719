use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};

/// The ConnectionAcceptor owns the listening socket and hands out accepted
/// streams tagged with a sequential connection id.
#[derive(Debug)]
pub struct ConnectionAcceptor {
    listener: TcpListener,
    connection_count: AtomicUsize,
}

impl ConnectionAcceptor {
    /// Bind to `addr` with the given listen backlog.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind<A: ToSocketAddrs>(addr: A, backlog: u32) -> io::Result<Self> {
        let socket_addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "No socket addresses found")
        })?;

        let socket = Self::create_socket(&socket_addr, backlog)?;
        let listener = TcpListener::from_std(socket.into())?;

        Ok(Self {
            listener,
            connection_count: AtomicUsize::new(0),
        })
    }

    /// Accept a new connection
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr, usize)> {
        let (stream, addr) = self.listener.accept().await?;
        let id = self.connection_count.fetch_add(1, Ordering::Relaxed);
        stream.set_nodelay(true)?;
        Ok((stream, addr, id))
    }

    /// Get the local address this acceptor is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Number of connections accepted so far
    pub fn accepted(&self) -> usize {
        self.connection_count.load(Ordering::Relaxed)
    }

    /// Create a properly configured socket
    fn create_socket(addr: &SocketAddr, backlog: u32) -> io::Result<Socket> {
        let domain = if addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

        // tokio requires a non-blocking socket
        socket.set_nonblocking(true)?;
        socket.set_reuse_address(true)?;

        socket.bind(&(*addr).into())?;
        socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;

        Ok(socket)
    }
}
