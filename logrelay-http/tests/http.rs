#![expect(missing_docs, reason = "tests")]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use logrelay::reporter::{OnUnloadConfig, OnUnloadReporter};
use logrelay::submit::{Delivery, Transport};
use logrelay::{Hub, args};
use logrelay_http::HttpTransport;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[derive(Debug)]
struct Received {
    request_line: String,
    content_type: Option<String>,
    body: String,
}

/// Serves a single request with `status` and reports what it received.
fn serve_once(status: &'static str) -> (String, mpsc::Receiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/log", listener.local_addr().unwrap());
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut content_type = None;
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').unwrap();
            match name.to_ascii_lowercase().as_str() {
                "content-type" => content_type = Some(value.trim().to_owned()),
                "content-length" => content_length = value.trim().parse().unwrap(),
                _ => {}
            }
        }

        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();

        write!(
            reader.get_mut(),
            "HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        )
        .unwrap();

        sender
            .send(Received {
                request_line: request_line.trim_end().to_owned(),
                content_type,
                body: String::from_utf8(body).unwrap(),
            })
            .unwrap();
    });

    (endpoint, receiver)
}

#[test]
fn blocking_delivery_posts_json() {
    let (endpoint, received) = serve_once("200 OK");
    let transport = HttpTransport::new().unwrap();

    transport
        .send(&endpoint, r#"[{"message":"hi"}]"#.to_owned(), Delivery::Blocking)
        .unwrap();

    let received = received.recv().unwrap();
    assert_eq!(received.request_line, "POST /log HTTP/1.1");
    assert_eq!(received.content_type.as_deref(), Some("application/json"));
    assert_eq!(received.body, r#"[{"message":"hi"}]"#);
}

#[test]
fn blocking_delivery_fails_on_error_status() {
    let (endpoint, _received) = serve_once("500 Internal Server Error");
    let transport = HttpTransport::new().unwrap();

    assert!(transport.send(&endpoint, "[]".to_owned(), Delivery::Blocking).is_err());
}

#[test]
fn background_delivery_does_not_wait() {
    let (endpoint, received) = serve_once("200 OK");
    let transport = HttpTransport::new().unwrap();

    transport
        .send(&endpoint, "[]".to_owned(), Delivery::Background)
        .unwrap();

    assert_eq!(received.recv().unwrap().body, "[]");
}

#[test]
fn teardown_submits_through_http() {
    let (endpoint, received) = serve_once("200 OK");
    let hub = Hub::builder()
        .transport(HttpTransport::new().unwrap())
        .submit_url(endpoint)
        .build();
    OnUnloadReporter::init(&hub, OnUnloadConfig::default());

    hub.error(&args!["disk %s", "full"]);
    hub.teardown();

    let body: Value = serde_json::from_str(&received.recv().unwrap().body).unwrap();
    assert_eq!(body[0]["level"], json!("error"));
    assert_eq!(body[0]["message"], json!("disk full"));
}
