use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Clone)]
struct MockReply {
    status: u16,
    body: Vec<u8>,
    index: Option<u64>,
}

/// Minimal HTTP/1.1 server standing in for a Consul agent. Replies are keyed
/// by request path; unknown paths get a 404. Every request head is recorded.
#[derive(Clone)]
pub struct MockConsulServer {
    addr: SocketAddr,
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockConsulServer {
    pub async fn start() -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let server = Self {
            addr: listener.local_addr()?,
            replies: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let state = server.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let state = state.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&head).to_string();
                    let reply = state.reply_for(&head);
                    state.requests.lock().unwrap().push(head);

                    let mut response = format!(
                        "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nConnection: close\r\n",
                        reply.status,
                        reply.body.len()
                    );
                    if let Some(index) = reply.index {
                        response.push_str(&format!("X-Consul-Index: {}\r\n", index));
                    }
                    response.push_str("\r\n");

                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.write_all(&reply.body).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Ok(server)
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn reply(&self, path: &str, status: u16, body: &str) {
        self.reply_with_index(path, status, body, None);
    }

    pub fn reply_with_index(&self, path: &str, status: u16, body: &str, index: Option<u64>) {
        self.replies.lock().unwrap().insert(
            path.to_string(),
            MockReply {
                status,
                body: body.as_bytes().to_vec(),
                index,
            },
        );
    }

    /// Request heads received so far, lowercased.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.to_ascii_lowercase())
            .collect()
    }

    fn reply_for(&self, head: &str) -> MockReply {
        let target = head
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("/");
        let path = target.split('?').next().unwrap_or(target);

        self.replies
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or(MockReply {
                status: 404,
                body: Vec::new(),
                index: None,
            })
    }
}
