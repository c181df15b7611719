use crate::http::{Request, Response};
use crate::router::Router;
use crate::static_files::StaticFiles;
use std::sync::Arc;

/// Picks the responder for a parsed request: the static file tree for
/// `/static/` paths, the router for everything else.
///
/// Both collaborators are read-only once the server starts, so clones are
/// cheap and share the same tables.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    files: Arc<StaticFiles>,
}

impl Dispatcher {
    pub fn new(router: Router, files: StaticFiles) -> Self {
        Self {
            router: Arc::new(router),
            files: Arc::new(files),
        }
    }

    /// Produce the response for `request`
    pub async fn dispatch(&self, request: &Request) -> Response {
        if StaticFiles::handles(&request.path) {
            return self.files.resolve(&request.path).await.into_response();
        }

        match self.router.handle(request) {
            Some(reply) => Response::ok(&reply.content_type, reply.body),
            None => Response::not_found(),
        }
    }
}
