use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::*;
use crate::error::{Operation, TransportError};
use crate::models::{Draft, UNKNOWN_ALBUM};

/// Serve exactly one canned HTTP response on a loopback port and hand back the
/// request line and body that were received.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/posts", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            if header == "\r\n" || header.is_empty() {
                break;
            }
            let lower = header.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();

        (
            request_line.trim().to_string(),
            String::from_utf8(request_body).unwrap(),
        )
    });

    (base_url, handle)
}

fn gateway(base_url: &str) -> HttpGateway {
    HttpGateway::new(base_url, Duration::from_secs(2), Duration::from_secs(2))
}

fn draft() -> Draft {
    Draft {
        title: "Test Song".to_string(),
        duration_seconds: 200,
        rating: Some(4.5),
        album: "Demo".to_string(),
    }
}

#[test]
fn pseudo_values_follow_the_fixed_formula() {
    assert_eq!(pseudo_duration(1), 181);
    assert_eq!(pseudo_duration(29), 209);
    assert_eq!(pseudo_duration(30), 190);
    assert_eq!(pseudo_duration(60), 190);

    assert_eq!(pseudo_rating(0), 0.5);
    assert_eq!(pseudo_rating(1), 1.0);
    assert_eq!(pseudo_rating(4), 2.5);
    assert_eq!(pseudo_rating(9), 5.0);
    assert_eq!(pseudo_rating(19), 5.0);
}

#[test]
fn projection_is_reproducible_for_the_same_id() {
    let record = RemoteRecord {
        id: Some(12),
        title: Some("qui est esse".to_string()),
        body: Some("est rerum tempore vitae sequi".to_string()),
        ..RemoteRecord::default()
    };
    let first = project(12, &record);
    let second = project(12, &record);

    assert_eq!(first, second);
    assert_eq!(first.title, "Qui est esse");
    assert_eq!(first.album, "Est rerum tempore");
    assert_eq!(first.duration_seconds, 192);
    assert_eq!(first.rating, 1.5);
    assert!(first.artists.is_empty());
    assert!(first.cover_image_url.is_none());
}

#[test]
fn projection_prefers_remote_fields_and_clamps_rating() {
    let record = RemoteRecord {
        id: Some(3),
        title: Some("  ".to_string()),
        rating: Some(9.0),
        duration: Some(240),
        album: Some("Live".to_string()),
        ..RemoteRecord::default()
    };
    let track = project(3, &record);
    assert_eq!(track.title, "Untitled");
    assert_eq!(track.album, "Live");
    assert_eq!(track.rating, 5.0);
    assert_eq!(track.duration_seconds, 240);

    let bare = project(3, &RemoteRecord::default());
    assert_eq!(bare.album, UNKNOWN_ALBUM);
}

#[test]
fn overlay_keeps_payload_fields_missing_from_the_echo() {
    let payload = RemotePayload::from(&draft());
    let echo = RemoteRecord {
        id: Some(101),
        ..RemoteRecord::default()
    };
    let merged = RemoteRecord::from(&payload).overlay(echo);
    assert_eq!(merged.id, Some(101));
    assert_eq!(merged.title.as_deref(), Some("Test Song"));
    assert_eq!(merged.rating, Some(4.5));
}

#[test]
fn list_sends_the_limit_and_projects_records() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"[{"userId":1,"id":1,"title":"sunt aut facere","body":"quia et suscipit recusandae"},
            {"userId":1,"id":2,"title":"qui est esse","body":"est rerum"}]"#,
    );

    let tracks = gateway(&base_url).list(2).unwrap();
    let (request_line, _) = server.join().unwrap();

    assert!(request_line.starts_with("GET /posts?_limit=2 "));
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, 1);
    assert_eq!(tracks[0].title, "Sunt aut facere");
    assert_eq!(tracks[1].album, "Est rerum");
}

#[test]
fn non_success_status_is_a_transport_error() {
    let (base_url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}");

    let err = gateway(&base_url).list(12).unwrap_err();
    server.join().unwrap();

    assert_eq!(
        err,
        TransportError::Status {
            operation: Operation::Load,
            status: 500
        }
    );
}

#[test]
fn undecodable_body_is_a_transport_error() {
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", "not json");

    let err = gateway(&base_url).list(12).unwrap_err();
    server.join().unwrap();

    assert!(matches!(
        err,
        TransportError::Decode {
            operation: Operation::Load,
            ..
        }
    ));
}

#[test]
fn create_posts_the_draft_and_uses_the_echoed_id() {
    let (base_url, server) = serve_once("HTTP/1.1 201 Created", r#"{"id":101}"#);

    let track = gateway(&base_url).create(&draft()).unwrap();
    let (request_line, body) = server.join().unwrap();

    assert!(request_line.starts_with("POST /posts "));
    let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(sent["title"], "Test Song");
    assert_eq!(sent["body"], "Demo");
    assert_eq!(sent["rating"], 4.5);
    assert_eq!(track.id, 101);
    assert_eq!(track.title, "Test Song");
    assert_eq!(track.album, "Demo");
    assert_eq!(track.duration_seconds, 200);
}

#[test]
fn update_patches_the_item_url() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"id":5,"title":"Test Song","rating":3.2}"#,
    );

    let mut changed = draft();
    changed.rating = Some(3.2);
    let track = gateway(&base_url).update(5, &changed).unwrap();
    let (request_line, _) = server.join().unwrap();

    assert!(request_line.starts_with("PATCH /posts/5 "));
    assert_eq!(track.id, 5);
    assert_eq!(track.rating, 3.2);
}

#[test]
fn delete_maps_not_found_to_a_transport_error() {
    let (base_url, server) = serve_once("HTTP/1.1 404 Not Found", "{}");

    let err = gateway(&base_url).delete(7).unwrap_err();
    let (request_line, _) = server.join().unwrap();

    assert!(request_line.starts_with("DELETE /posts/7 "));
    assert_eq!(err.operation(), Operation::Delete);
}

#[test]
fn unreachable_host_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/posts", listener.local_addr().unwrap());
    drop(listener);

    let err = gateway(&base_url).list(1).unwrap_err();
    assert!(matches!(err, TransportError::Network { .. }));
}

#[test]
fn malformed_echo_is_a_decode_error_for_writes_too() {
    let (base_url, server) = serve_once("HTTP/1.1 201 Created", "[1, 2");
    let err = gateway(&base_url).create(&draft()).unwrap_err();
    server.join().unwrap();
    assert!(matches!(
        err,
        TransportError::Decode {
            operation: Operation::Create,
            ..
        }
    ));

    let (base_url, server) = serve_once("HTTP/1.1 200 OK", "<html>");
    let err = gateway(&base_url).update(5, &draft()).unwrap_err();
    server.join().unwrap();
    assert_eq!(err.operation(), Operation::Update);
    assert!(err.to_string().contains("malformed response"));
}
