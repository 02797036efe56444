use std::time::Duration;

use tinyweb::http::error::{HttpError, ParseError};
use tinyweb::http::parser::{parse_header_line, parse_http_request, parse_request_line, MAX_LINE_LEN};
use tinyweb::http::request::{Method, Request, Version};

async fn parse(bytes: &[u8]) -> Result<Request, ParseError> {
    let mut input = bytes;
    parse_http_request(&mut input, None).await
}

fn rejected(result: Result<Request, ParseError>) -> (HttpError, Version, Option<Method>) {
    let (error, version, method, _) = rejected_with_keep_alive(result);
    (error, version, method)
}

fn rejected_with_keep_alive(result: Result<Request, ParseError>) -> (HttpError, Version, Option<Method>, bool) {
    match result {
        Err(ParseError::Rejected {
            error,
            version,
            method,
            keep_alive,
        }) => (error, version, method, keep_alive),
        other => panic!("expected a rejected request, got {:?}", other),
    }
}

#[tokio::test]
async fn test_parse_simple_get_request() {
    let parsed = parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").await.unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.target, "/");
    assert_eq!(parsed.version, Version::HTTP_11);
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
}

#[tokio::test]
async fn test_parse_http09_request_reads_no_headers() {
    let mut input: &[u8] = b"GET /foo.txt\r\nHost: ignored\r\n\r\n";
    let parsed = parse_http_request(&mut input, None).await.unwrap();

    assert_eq!(parsed.version, Version::HTTP_09);
    assert_eq!(parsed.target, "/foo.txt");
    assert!(parsed.headers.is_empty());
    // Only the request line was consumed.
    assert_eq!(input, b"Host: ignored\r\n\r\n");
}

#[tokio::test]
async fn test_parse_empty_input_is_no_data() {
    let result = parse(b"").await;
    assert!(matches!(result, Err(ParseError::NoDataFromClient)));
}

#[tokio::test]
async fn test_parse_multiple_headers() {
    let parsed = parse(
        b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n",
    )
    .await
    .unwrap();

    assert_eq!(parsed.header("Host"), Some("example.com"));
    assert_eq!(parsed.header("User-Agent"), Some("test-client"));
    assert_eq!(parsed.header("Accept"), Some("*/*"));
}

#[tokio::test]
async fn test_parse_header_value_leading_whitespace_trimmed() {
    let parsed = parse(b"GET / HTTP/1.0\r\nX-Padded:    value \r\nX-Tight:v\r\n\r\n").await.unwrap();

    assert_eq!(parsed.header("X-Padded"), Some("value "));
    assert_eq!(parsed.header("X-Tight"), Some("v"));
}

#[tokio::test]
async fn test_parse_duplicate_header_last_wins() {
    let parsed = parse(b"GET / HTTP/1.0\r\nX-Dup: first\r\nX-Dup: second\r\n\r\n").await.unwrap();
    assert_eq!(parsed.header("X-Dup"), Some("second"));
}

#[tokio::test]
async fn test_parse_header_case_preservation() {
    let parsed = parse(b"GET / HTTP/1.0\r\nContent-Type: application/json\r\n\r\n").await.unwrap();

    assert!(parsed.headers.contains_key("Content-Type"));
    assert_eq!(parsed.header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_parse_accepts_bare_lf() {
    let parsed = parse(b"GET / HTTP/1.1\nHost: x\n\n").await.unwrap();
    assert_eq!(parsed.header("Host"), Some("x"));
}

#[tokio::test]
async fn test_parse_eof_ends_header_block() {
    let parsed = parse(b"GET / HTTP/1.0\r\nAccept: */*\r\n").await.unwrap();
    assert_eq!(parsed.header("Accept"), Some("*/*"));
}

#[tokio::test]
async fn test_parse_malformed_request_line() {
    let (error, version, method) = rejected(parse(b"foo bar buzz\r\n").await);

    assert_eq!(error, HttpError::BadRequest);
    assert_eq!(version, Version::HTTP_09);
    assert_eq!(method, None);
}

#[tokio::test]
async fn test_parse_malformed_header() {
    let (error, version, method) = rejected(parse(b"HEAD / HTTP/1.0\r\nBrokenHeader\r\n\r\n").await);

    assert_eq!(error, HttpError::BadRequest);
    assert_eq!(version, Version::HTTP_10);
    assert_eq!(method, Some(Method::HEAD));
}

#[tokio::test]
async fn test_parse_unknown_method_is_not_implemented() {
    let (error, version, method) = rejected(parse(b"FOO / HTTP/1.0\r\n\r\n").await);

    assert_eq!(error, HttpError::NotImplemented);
    assert_eq!(version, Version::HTTP_10);
    assert_eq!(method, None);
}

#[tokio::test]
async fn test_parse_http09_only_allows_get() {
    let (error, version, _) = rejected(parse(b"HEAD /foo.txt\r\n").await);

    assert_eq!(error, HttpError::BadRequest);
    assert_eq!(version, Version::HTTP_09);
}

#[tokio::test]
async fn test_parse_http09_unknown_method_is_not_implemented() {
    let (error, _, _) = rejected(parse(b"POST /foo.txt\r\n").await);
    assert_eq!(error, HttpError::NotImplemented);
}

#[tokio::test]
async fn test_parse_http11_requires_host() {
    let (error, version, method) =
        rejected(parse(b"HEAD /nonexistent HTTP/1.1\r\nConnection: close\r\n\r\n").await);

    assert_eq!(error, HttpError::BadRequest);
    assert_eq!(version, Version::HTTP_11);
    assert_eq!(method, Some(Method::HEAD));
}

#[tokio::test]
async fn test_parse_unknown_method_keeps_connection_usable() {
    let (error, _, _, keep_alive) =
        rejected_with_keep_alive(parse(b"FOO /foo.txt HTTP/1.1\r\nHost: x\r\n\r\n").await);
    assert_eq!(error, HttpError::NotImplemented);
    assert!(keep_alive);

    let (_, _, _, keep_alive) = rejected_with_keep_alive(
        parse(b"FOO /foo.txt HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await,
    );
    assert!(!keep_alive);

    let (_, _, _, keep_alive) = rejected_with_keep_alive(parse(b"FOO /foo.txt HTTP/1.0\r\n\r\n").await);
    assert!(!keep_alive);
}

#[tokio::test]
async fn test_parse_framing_and_host_errors_close() {
    let (_, _, _, keep_alive) =
        rejected_with_keep_alive(parse(b"GET / HTTP/1.1\r\nHost: x\r\nBroken\r\n\r\n").await);
    assert!(!keep_alive);

    let (_, _, _, keep_alive) = rejected_with_keep_alive(parse(b"GET / HTTP/1.1\r\n\r\n").await);
    assert!(!keep_alive);

    let (_, _, _, keep_alive) = rejected_with_keep_alive(parse(b"GET / HTTP/1.1\r\nHost: \xff\r\n\r\n").await);
    assert!(!keep_alive);
}

#[tokio::test]
async fn test_parse_http10_does_not_require_host() {
    assert!(parse(b"GET / HTTP/1.0\r\n\r\n").await.is_ok());
}

#[tokio::test]
async fn test_parse_newer_versions_require_host() {
    let (error, version, _) = rejected(parse(b"GET / HTTP/2.0\r\n\r\n").await);

    assert_eq!(error, HttpError::BadRequest);
    assert_eq!(version, Version::new(2, 0));
}

#[tokio::test]
async fn test_parse_overlong_line_is_rejected() {
    let mut request = b"GET /".to_vec();
    request.extend(std::iter::repeat(b'a').take(MAX_LINE_LEN));
    request.extend_from_slice(b" HTTP/1.0\r\n\r\n");

    let (error, _, _) = rejected(parse(&request).await);
    assert_eq!(error, HttpError::BadRequest);
}

#[tokio::test]
async fn test_parse_times_out_waiting_for_headers() {
    let (mut client, server) = tokio::io::duplex(64);
    tokio::io::AsyncWriteExt::write_all(&mut client, b"GET / HTTP/1.1\r\nHost: x\r\n")
        .await
        .unwrap();

    let mut reader = tokio::io::BufReader::new(server);
    let result = parse_http_request(&mut reader, Some(Duration::from_millis(50))).await;

    match result {
        Err(ParseError::Timeout { version, method }) => {
            assert_eq!(version, Version::HTTP_11);
            assert_eq!(method, Some(Method::GET));
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
    drop(client);
}

#[test]
fn test_request_line_grammar() {
    let line = parse_request_line("GET /a HTTP/1.1").unwrap();
    assert_eq!(line.method, "GET");
    assert_eq!(line.target, "/a");
    assert_eq!(line.version, Some(Version::HTTP_11));

    assert_eq!(parse_request_line("GET  HTTP/1.1").unwrap().target, "");
    assert!(parse_request_line("get / HTTP/1.1").is_err());
    assert!(parse_request_line("GET / HTTP/1").is_err());
    assert!(parse_request_line("GET / HTTP/1.x").is_err());
    assert!(parse_request_line("GET / HTTP/1.1 extra").is_err());
    assert!(parse_request_line("GET / FTP/1.1").is_err());
    assert!(parse_request_line("GET").is_err());
}

#[test]
fn test_header_line_grammar() {
    assert_eq!(parse_header_line("Host: a:b").unwrap(), ("Host", "a:b"));
    assert_eq!(parse_header_line("X-1:").unwrap(), ("X-1", ""));
    assert!(parse_header_line(": empty-name").is_err());
    assert!(parse_header_line("Bad Name: v").is_err());
    assert!(parse_header_line("Under_score: v").is_err());
}
