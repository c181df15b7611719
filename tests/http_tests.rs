use tiny_http_core::http::{parse_head, parse_request, Response, Status};
use tiny_http_core::ParseError;

#[test]
fn test_http_parser_simple_get() {
    let request = parse_request(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();

    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/index.html");
    assert_eq!(request.version, "HTTP/1.1");
    assert_eq!(request.header("Host"), Some("example.com"));
    assert_eq!(request.body.len(), 0);
}

#[test]
fn test_http_parser_post_with_body() {
    let request_data = b"POST /submit HTTP/1.1\r\nHost: example.com\r\nContent-Type: application/json\r\nContent-Length: 15\r\n\r\n{\"name\":\"test\"}";

    let request = parse_request(request_data).unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/submit");
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert_eq!(request.header("Content-Length"), Some("15"));
    assert_eq!(request.body, b"{\"name\":\"test\"}");
}

#[test]
fn test_http_parser_multiple_headers() {
    let request_data = b"GET /api/data HTTP/1.1\r\n\
                        Host: example.com\r\n\
                        User-Agent: Test Client\r\n\
                        Accept: application/json\r\n\
                        Accept-Language: en-US\r\n\
                        Cookie: session=abc123\r\n\
                        \r\n";

    let request = parse_request(request_data).unwrap();
    assert_eq!(request.path, "/api/data");
    assert_eq!(request.headers.len(), 5);
    assert_eq!(request.header("User-Agent"), Some("Test Client"));
    assert_eq!(request.header("Accept-Language"), Some("en-US"));
    assert_eq!(request.header("Cookie"), Some("session=abc123"));
    // Names are case-sensitive on lookup by exact name.
    assert_eq!(request.header("cookie"), None);
    assert_eq!(request.headers.get_ignore_case("cookie"), Some("session=abc123"));
}

#[test]
fn test_header_values_may_contain_colons() {
    let request = parse_request(b"GET / HTTP/1.1\r\nHost: localhost:8080\r\n\r\n").unwrap();
    assert_eq!(request.header("Host"), Some("localhost:8080"));
}

#[test]
fn test_lowercase_content_length_is_honored() {
    let request = parse_request(b"POST /e HTTP/1.1\r\ncontent-length: 3\r\n\r\nabcdef").unwrap();
    assert_eq!(request.body, b"abc");
}

#[test]
fn test_head_reports_body_offset() {
    let data = b"POST /e HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody";
    let head = parse_head(data).unwrap();
    assert_eq!(head.body_start, data.len() - 4);
    assert_eq!(head.content_length(), 4);
    assert_eq!(head.total_len(), data.len());
}

#[test]
fn test_incomplete_body_is_an_error() {
    let err = parse_request(b"POST /e HTTP/1.1\r\nContent-Length: 4\r\n\r\nab").unwrap_err();
    assert_eq!(err, ParseError::IncompleteBody { expected: 4, received: 2 });
}

#[test]
fn test_malformed_request_lines() {
    for raw in [&b"GET\r\n\r\n"[..], b"GET /\r\n\r\n", b"GET / HTTP/1.1 x\r\n\r\n", b""] {
        assert!(matches!(parse_request(raw), Err(ParseError::MalformedRequestLine(_))));
    }
}

#[test]
fn test_response_creation_and_serialization() {
    let response = Response::new(Status::Ok, "text/plain", "Hello, World!");

    let mut buffer = Vec::new();
    response.serialize(&mut buffer).unwrap();

    let response_str = String::from_utf8_lossy(&buffer);
    assert!(response_str.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response_str.contains("Content-Type: text/plain\r\n"));
    assert!(response_str.contains("Content-Length: 13\r\n"));
    assert!(response_str.ends_with("\r\n\r\nHello, World!"));
}

#[test]
fn test_different_status_codes() {
    let statuses = vec![
        (Status::Ok, "200 OK"),
        (Status::BadRequest, "400 Bad Request"),
        (Status::Forbidden, "403 Forbidden"),
        (Status::NotFound, "404 Not Found"),
        (Status::InternalServerError, "500 Internal Server Error"),
    ];

    for (status, line) in statuses {
        let bytes = Response::new(status, "text/plain", Vec::new()).to_bytes().unwrap();
        let response_str = String::from_utf8_lossy(&bytes);
        assert!(response_str.starts_with(&format!("HTTP/1.1 {}\r\n", line)));
        assert!(response_str.ends_with("Content-Length: 0\r\n\r\n"));
    }
}
