use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use geospace_series::error::SeriesError;
use geospace_series::fetch::{Fetcher, HttpFetcher};

/// Answers a single request with `status` and `body`, then returns the
/// request line it saw.
fn serve_once(status: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/dst_final/195701/index-j.html", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                break;
            }
        }
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();
        request_line
    });
    (url, handle)
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Some(Duration::from_secs(5))).unwrap()
}

fn cache_file(temp: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join("cache").join("195701.html")).unwrap()
}

#[test]
fn ok_body_is_stored_byte_for_byte() {
    let mut body = b"<pre class=\"data\">DAY\n".to_vec();
    body.extend_from_slice(&[0xff, 0xfe, b'\r', b'\n', 0x00]);
    let (url, server) = serve_once("200 OK", body.clone());
    let temp = tempfile::tempdir().unwrap();
    let destination = cache_file(&temp);

    fetcher().fetch(&url, &destination).unwrap();

    let request_line = server.join().unwrap();
    assert!(request_line.starts_with("GET /dst_final/195701/index-j.html "));
    assert_eq!(std::fs::read(&destination).unwrap(), body);
}

#[test]
fn not_found_leaves_no_cache_file() {
    let (url, server) = serve_once("404 Not Found", b"missing".to_vec());
    let temp = tempfile::tempdir().unwrap();
    let destination = cache_file(&temp);

    let err = fetcher().fetch(&url, &destination).unwrap_err();
    server.join().unwrap();

    assert_matches!(err, SeriesError::Download { url: failed, status: 404 } if failed == url);
    assert!(!destination.exists());
}

#[test]
fn unreachable_host_is_http_error() {
    // bind then drop to get a port nothing listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let temp = tempfile::tempdir().unwrap();
    let destination = cache_file(&temp);

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{port}/mtkmonthly.txt"), &destination)
        .unwrap_err();

    assert_matches!(err, SeriesError::Http { .. });
    assert!(!destination.exists());
}
