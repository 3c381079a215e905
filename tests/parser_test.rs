//! Request framing: GET lines, POST/PUT bodies, bounded header scans.

use request_anomaly::config::ParserConfig;
use request_anomaly::error::DetectorError;
use request_anomaly::parser::{normalize, Method, RequestLogParser};

const POST_LINE: &str = "POST http://localhost:8080/tienda1/publico/anadir.jsp HTTP/1.1";
const BODY: &str = "id=3&nombre=Vino+Rioja&precio=100&cantidad=55&B1=A%F1adir+al+carrito";

fn post_request(request_line: &str, body: &str) -> Vec<String> {
    vec![
        request_line.to_string(),
        "User-Agent: Mozilla/5.0 (compatible; Konqueror/3.5; Linux)".to_string(),
        "Content-Type: application/x-www-form-urlencoded".to_string(),
        "Content-Length: 68".to_string(),
        String::new(),
        body.to_string(),
    ]
}

#[test]
fn get_line_becomes_one_normalized_record() {
    let parser = RequestLogParser::default();
    let records = parser
        .parse(&["GET /index.html HTTP/1.1", "Host: localhost:8080", ""])
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method, Method::Get);
    assert_eq!(records[0].canonical_form, "get/index.htmlhttp/1.1");
}

#[test]
fn normalization_strips_every_kind_of_whitespace() {
    assert_eq!(normalize("GET /A\tB HTTP/1.1\r"), "get/abhttp/1.1");
    assert_eq!(normalize("  "), "");
}

#[test]
fn post_concatenates_request_line_and_body() {
    let parser = RequestLogParser::default();
    let records = parser.parse(&post_request(POST_LINE, BODY)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method, Method::Post);
    assert_eq!(
        records[0].canonical_form,
        normalize(&format!("{POST_LINE}{BODY}"))
    );
    assert!(records[0].canonical_form.ends_with("b1=a%f1adir+al+carrito"));
}

#[test]
fn put_is_framed_like_post() {
    let put = POST_LINE.replacen("POST", "PUT", 1);
    let records = RequestLogParser::default()
        .parse(&post_request(&put, "x=1"))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method, Method::Put);
    assert!(records[0].canonical_form.starts_with("puthttp://"));
    assert!(records[0].canonical_form.ends_with("x=1"));
}

#[test]
fn canonical_get_reparses_to_itself() {
    let parser = RequestLogParser::default();
    let first = parser.parse(&["GET /Shop/Item.jsp?id=2 HTTP/1.1"]).unwrap();
    let canonical = &first[0].canonical_form;
    assert_eq!(&normalize(canonical), canonical);

    let again = format!("GET{}", &canonical[3..]);
    let second = parser.parse(&[again]).unwrap();
    assert_eq!(&second[0].canonical_form, canonical);
}

#[test]
fn order_follows_input_and_unknown_lines_are_skipped() {
    let mut lines = vec![
        "GET /first HTTP/1.1".to_string(),
        "Cookie: JSESSIONID=ABC".to_string(),
        String::new(),
    ];
    lines.extend(post_request(POST_LINE, BODY));
    lines.push("GET /last HTTP/1.1".to_string());
    lines.push("delete /not-a-request".to_string());

    let (records, stats) = RequestLogParser::default()
        .parse_with_stats(&lines)
        .unwrap();
    let methods: Vec<Method> = records.iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::Get, Method::Post, Method::Get]);
    assert_eq!(records[0].canonical_form, "get/firsthttp/1.1");
    assert_eq!(records[2].canonical_form, "get/lasthttp/1.1");
    assert_eq!(stats.lines, lines.len());
    assert_eq!(stats.requests(), 3);
    assert_eq!((stats.get, stats.post, stats.put), (2, 1, 0));
    assert_eq!(stats.skipped, 3);
}

#[test]
fn body_line_is_not_parsed_again() {
    let records = RequestLogParser::default()
        .parse(&post_request(POST_LINE, "GET=1&x=2"))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method, Method::Post);
}

#[test]
fn lowercase_prefixes_are_not_requests() {
    let records = RequestLogParser::default()
        .parse(&["get /index.html HTTP/1.1", "post /x HTTP/1.1"])
        .unwrap();
    assert!(records.is_empty());
}

#[test]
fn missing_content_length_is_malformed() {
    let lines = [POST_LINE, "Host: localhost:8080", "Connection: close"];
    let err = RequestLogParser::default().parse(&lines).unwrap_err();
    match err {
        DetectorError::MalformedRequest { line, reason } => {
            assert_eq!(line, 1);
            assert!(reason.contains("Content-Length"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_body_line_is_malformed() {
    let lines = [POST_LINE, "Content-Length: 12", ""];
    let err = RequestLogParser::default().parse(&lines).unwrap_err();
    assert!(matches!(err, DetectorError::MalformedRequest { line: 2, .. }));
}

#[test]
fn scan_stops_at_the_next_request_line() {
    let lines = [
        POST_LINE,
        "Host: localhost:8080",
        "GET /other HTTP/1.1",
        "Content-Length: 3",
        "",
        "a=1",
    ];
    let err = RequestLogParser::default().parse(&lines).unwrap_err();
    assert!(matches!(err, DetectorError::MalformedRequest { line: 1, .. }));
}

#[test]
fn header_scan_respects_configured_bound() {
    let lines = post_request(POST_LINE, BODY);
    let tight = RequestLogParser::new(&ParserConfig {
        max_header_lines: Some(2),
        ..ParserConfig::default()
    })
    .unwrap();
    let err = tight.parse(&lines).unwrap_err();
    assert!(err.to_string().contains("within 2 lines"));

    let enough = RequestLogParser::new(&ParserConfig {
        max_header_lines: Some(3),
        ..ParserConfig::default()
    })
    .unwrap();
    assert_eq!(enough.parse(&lines).unwrap().len(), 1);
}

#[test]
fn body_offset_is_configurable() {
    let lines = [POST_LINE, "Content-Length: 3", "a=1"];
    let parser = RequestLogParser::new(&ParserConfig {
        body_line_offset: 1,
        ..ParserConfig::default()
    })
    .unwrap();
    assert_eq!(parser.body_line_offset(), 1);
    let records = parser.parse(&lines).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].canonical_form.ends_with("a=1"));
}

#[test]
fn zero_body_offset_is_rejected() {
    let result = RequestLogParser::new(&ParserConfig {
        body_line_offset: 0,
        ..ParserConfig::default()
    });
    assert!(matches!(result, Err(DetectorError::InvalidConfig(_))));
}

#[test]
fn parse_str_splits_crlf_text() {
    let text = "GET /a HTTP/1.1\r\nHost: x\r\n\r\nGET /b HTTP/1.1\r\n";
    let records = RequestLogParser::default().parse_str(text).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].canonical_form, "get/bhttp/1.1");
}
