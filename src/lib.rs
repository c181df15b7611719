pub mod acceptor;
pub mod buffer;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod router;
pub mod routes;
pub mod server;
pub mod static_files;

/// Re-exports of common components for easier access
pub use acceptor::ConnectionAcceptor;
pub use buffer::RequestBuffer;
pub use config::ServerConfig;
pub use connection::{Connection, ConnectionState, Limits};
pub use dispatch::Dispatcher;
pub use error::{ParseError, ServerError, ServerResult, StaticError};
pub use http::{parse_head, parse_request, Headers, Request, RequestHead, Response, Status};
pub use router::{HandlerFn, Params, Reply, RouteMatch, Router};
pub use server::Server;
pub use static_files::{StaticFile, StaticFiles};
