use crate::acceptor::ConnectionAcceptor;
use crate::config::ServerConfig;
use crate::connection::{Connection, Limits};
use crate::dispatch::Dispatcher;
use crate::error::{ServerError, ServerResult};
use crate::router::Router;
use crate::static_files::StaticFiles;
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

/// Accepts connections and runs each one on its own task
#[derive(Debug)]
pub struct Server {
    acceptor: ConnectionAcceptor,
    dispatcher: Dispatcher,
    limits: Limits,
}

impl Server {
    /// Bind the listening socket described by `config`, serving `router`
    /// and the static tree rooted at `config.static_root`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: &ServerConfig, router: Router) -> ServerResult<Self> {
        let files = StaticFiles::new(config.static_root.clone());
        Self::with_dispatcher(config, Dispatcher::new(router, files))
    }

    pub fn with_dispatcher(config: &ServerConfig, dispatcher: Dispatcher) -> ServerResult<Self> {
        config.validate()?;
        let acceptor = ConnectionAcceptor::bind(config.socket_address(), config.backlog_size)?;
        Ok(Self {
            acceptor,
            dispatcher,
            limits: Limits::from(config),
        })
    }

    /// Get the local address the server is bound to
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.acceptor.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then stop accepting and wait for the
    /// connections already in flight
    pub async fn run_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, draining {} connection(s)", tasks.len());
                    break;
                }
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
                accepted = self.acceptor.accept() => match accepted {
                    Ok((stream, peer, id)) => {
                        let dispatcher = self.dispatcher.clone();
                        let limits = self.limits;
                        tasks.spawn(handle_connection(stream, peer, id, limits, dispatcher));
                    }
                    Err(err) => warn!("error accepting connection: {}", err),
                },
            }
        }

        while tasks.join_next().await.is_some() {}
        info!("server stopped after {} connection(s)", self.acceptor.accepted());
        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    id: usize,
    limits: Limits,
    dispatcher: Dispatcher,
) {
    debug!("connection {} accepted from {}", id, peer);
    let connection = Connection::new(stream, id, limits);

    match connection.serve(&dispatcher).await {
        Ok(()) => debug!("connection {} closed", id),
        Err(err @ ServerError::Parse(_)) => {
            warn!("connection {} from {}: {}; closing without response", id, peer, err)
        }
        Err(
            err @ (ServerError::Timeout(_)
            | ServerError::HeaderTooLarge { .. }
            | ServerError::BodyTooLarge { .. }),
        ) => warn!("connection {} from {} aborted: {}", id, peer, err),
        Err(err) => debug!("connection {} from {} failed: {}", id, peer, err),
    }
}
