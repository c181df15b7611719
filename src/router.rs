use crate::http::Request;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Output of a handler: the content type and the body of a 200 response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content_type: String,
    pub body: String,
}

impl Reply {
    pub fn new(content_type: &str, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.to_string(),
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::new("text/plain", body)
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new("application/json", body)
    }
}

/// Path parameters bound by a dynamic route, keyed by capture name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A handler function for processing HTTP requests.
///
/// Handlers registered on exact routes always receive empty params.
pub type HandlerFn = Arc<dyn Fn(&Request, &Params) -> Reply + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A pattern route: `method` plus `/`-separated segments, `:name` captures
#[derive(Clone)]
struct DynamicRoute {
    method: String,
    pattern: String,
    segments: Vec<Segment>,
    handler: HandlerFn,
}

impl DynamicRoute {
    fn new(method: &str, pattern: &str, handler: HandlerFn) -> Self {
        let segments = pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Capture(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            method: method.to_string(),
            pattern: pattern.to_string(),
            segments,
            handler,
        }
    }

    /// Bind captures against `path`, or `None` if the shape differs
    fn matches(&self, path: &str) -> Option<Params> {
        let path_segments: Vec<&str> = path.split('/').collect();
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(path_segments) {
            match segment {
                Segment::Literal(literal) if literal != value => return None,
                Segment::Literal(_) => {}
                Segment::Capture(name) => params.insert(name, value),
            }
        }
        Some(params)
    }
}

// Custom Debug implementation since handlers can't be automatically derived
impl fmt::Debug for DynamicRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRoute")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("handler", &"<function>")
            .finish()
    }
}

/// A successful lookup: the handler to run and the params it gets
pub struct RouteMatch<'a> {
    pub handler: &'a HandlerFn,
    pub params: Params,
}

impl RouteMatch<'_> {
    /// Run the matched handler
    pub fn invoke(&self, request: &Request) -> Reply {
        (self.handler)(request, &self.params)
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("handler", &"<function>")
            .field("params", &self.params)
            .finish()
    }
}

/// Two-phase router.
///
/// Lookups try the exact table keyed by `"METHOD PATH"` first, then scan the
/// pattern routes in registration order; the first pattern that fits wins.
/// Populate it before serving and share it behind an `Arc`.
#[derive(Clone, Default)]
pub struct Router {
    exact: HashMap<String, HandlerFn>,
    dynamic: Vec<DynamicRoute>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exact: Vec<&String> = self.exact.keys().collect();
        exact.sort();
        f.debug_struct("Router")
            .field("exact", &exact)
            .field("dynamic", &self.dynamic)
            .finish()
    }
}

fn exact_key(method: &str, path: &str) -> String {
    format!("{} {}", method, path)
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route matched by literal method and path. Registering the
    /// same pair twice replaces the earlier handler.
    pub fn exact<F>(&mut self, method: &str, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Reply + Send + Sync + 'static,
    {
        self.exact.insert(exact_key(method, path), Arc::new(handler));
        self
    }

    /// Append a pattern route such as `/api/user/:id`
    pub fn pattern<F>(&mut self, method: &str, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Reply + Send + Sync + 'static,
    {
        self.dynamic.push(DynamicRoute::new(method, pattern, Arc::new(handler)));
        self
    }

    /// Register a GET route, as a pattern if it contains a capture
    pub fn get<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Reply + Send + Sync + 'static,
    {
        self.add("GET", path, handler)
    }

    /// Register a POST route, as a pattern if it contains a capture
    pub fn post<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Reply + Send + Sync + 'static,
    {
        self.add("POST", path, handler)
    }

    fn add<F>(&mut self, method: &str, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Reply + Send + Sync + 'static,
    {
        if path.split('/').any(|segment| segment.starts_with(':')) {
            self.pattern(method, path, handler)
        } else {
            self.exact(method, path, handler)
        }
    }

    /// Find the handler for `method` and `path`
    pub fn lookup(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        if let Some(handler) = self.exact.get(&exact_key(method, path)) {
            return Some(RouteMatch {
                handler,
                params: Params::new(),
            });
        }

        self.dynamic
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route.matches(path).map(|params| RouteMatch {
                    handler: &route.handler,
                    params,
                })
            })
    }

    /// Route and run `request`, `None` when nothing matches
    pub fn handle(&self, request: &Request) -> Option<Reply> {
        self.lookup(&request.method, &request.path)
            .map(|matched| matched.invoke(request))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
