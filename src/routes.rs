//! Application routes compiled into the binary.

use crate::http::Request;
use crate::router::{Params, Reply, Router};
use serde_json::Value;

/// JSON string literal for `value`, quotes included
fn json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// `GET /`
pub fn home(_request: &Request, _params: &Params) -> Reply {
    Reply::text("Welcome to BYOS-GO!")
}

/// `GET /api/hello`
pub fn hello(_request: &Request, _params: &Params) -> Reply {
    Reply::json(r#"{"message": "Hello from BYOS-GO API"}"#)
}

/// `GET /api/user/:id`
pub fn user(_request: &Request, params: &Params) -> Reply {
    let id = params.get("id").unwrap_or_default();
    Reply::json(format!(r#"{{"user_id": {}}}"#, json_string(id)))
}

/// `POST /api/echo`
pub fn echo(request: &Request, _params: &Params) -> Reply {
    Reply::json(format!(r#"{{"echo": {}}}"#, json_string(&request.body_text())))
}

/// The route table the server runs with
pub fn default_router() -> Router {
    let mut router = Router::new();
    router
        .exact("GET", "/", home)
        .exact("GET", "/api/hello", hello)
        .pattern("GET", "/api/user/:id", user)
        .pattern("POST", "/api/echo", echo);
    router
}
