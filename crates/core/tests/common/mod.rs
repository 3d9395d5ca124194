//! In-process mock RTSP upstream.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A mock RTSP server answering one response per connection.
pub struct MockUpstream {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    /// Start a server; `respond` gets the raw request and the server's own
    /// address and returns the chunks to write back.
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, SocketAddr) -> Vec<Vec<u8>> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let (c, r) = (connections.clone(), requests.clone());
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                c.fetch_add(1, Ordering::SeqCst);
                let respond = respond.clone();
                let requests = r.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf).to_string();
                    requests.lock().push(request.clone());
                    for part in respond(&request, addr) {
                        if stream.write_all(&part).await.is_err() {
                            return;
                        }
                        stream.flush().await.ok();
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    }
                });
            }
        });

        Self {
            addr,
            connections,
            requests,
        }
    }

    /// Server that always answers with the same single response.
    pub async fn fixed(response: &str) -> Self {
        let response = response.as_bytes().to_vec();
        Self::start(move |_, _| vec![response.clone()]).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("rtsp://{}{}", self.addr, path)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

pub const SDP: &str = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=Stream\r\nt=0 0\r\nm=video 0 RTP/AVP 96\r\n";

pub fn ok_with_sdp() -> String {
    format!(
        "RTSP/1.0 200 OK\r\nCSeq: 1\r\nContent-Type: application/sdp\r\nContent-Length: {}\r\n\r\n{}",
        SDP.len(),
        SDP
    )
}

pub fn redirect_to(location: &str) -> String {
    format!("RTSP/1.0 302 Found\r\nCSeq: 1\r\nLocation: {}\r\n\r\n", location)
}
