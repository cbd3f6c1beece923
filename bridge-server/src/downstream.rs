//! Downstream TCP fan-out server (C5).
//!
//! Subscribers are write-only sinks from the system's perspective: bytes
//! they send are read and discarded purely to detect a half-close. All
//! publishing happens under one mutex so sentences land on every subscriber
//! in the same order (§4.5, §9 "single-writer fan-out").

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Listen backlog requested at bind time. The spec calls for 100; std/tokio
/// listeners don't expose a portable backlog knob beyond what `bind` takes,
/// so this is surfaced for documentation and left to the OS default, which
/// comfortably exceeds it on every target this runs on.
pub const LISTEN_BACKLOG: u32 = 100;

type SubscriberId = u64;

/// Accepts AIS subscribers and broadcasts sentences to every live one.
pub struct DownstreamServer {
    subscribers: Arc<Mutex<HashMap<SubscriberId, OwnedWriteHalf>>>,
    next_id: AtomicU64,
}

impl DownstreamServer {
    pub fn new() -> Self {
        DownstreamServer {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Current subscriber count. Used for logging and tests.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Appends `"\n"` and writes to every current subscriber under a single
    /// lock. A subscriber whose write fails is closed and evicted; the
    /// publish continues to the rest.
    pub async fn publish(&self, sentence: &str) {
        let mut data = sentence.as_bytes().to_vec();
        data.push(b'\n');

        let mut subs = self.subscribers.lock().await;
        let mut dead = Vec::new();
        for (&id, writer) in subs.iter_mut() {
            if writer.write_all(&data).await.is_err() {
                dead.push(id);
            }
        }
        for id in dead {
            if let Some(mut writer) = subs.remove(&id) {
                let _ = writer.shutdown().await;
            }
            warn!(subscriber = id, "evicted subscriber after write failure");
        }
    }

    /// Accepts subscribers until `cancel` fires. Each accepted connection
    /// gets its own read-and-discard task so a half-close is noticed without
    /// blocking `publish`.
    pub async fn accept_loop(&self, listener: TcpListener, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.register(stream, addr, cancel.clone()).await,
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }
        info!("downstream accept loop stopped");
    }

    async fn register(&self, stream: TcpStream, addr: SocketAddr, cancel: CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (mut read_half, write_half) = stream.into_split();
        self.subscribers.lock().await.insert(id, write_half);
        info!(subscriber = id, %addr, "subscriber connected");

        let subs = self.subscribers.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = read_half.read(&mut buf) => match result {
                        Ok(0) => break,
                        Ok(_) => continue,
                        Err(_) => break,
                    },
                }
            }
            subs.lock().await.remove(&id);
            info!(subscriber = id, "subscriber disconnected");
        });
    }

    /// Closes every live subscriber, waiting for each close to complete.
    /// The listener itself is closed by the caller dropping it once
    /// `accept_loop` returns.
    pub async fn shutdown(&self) {
        let mut subs = self.subscribers.lock().await;
        for (_, mut writer) in subs.drain() {
            let _ = writer.shutdown().await;
        }
        info!("downstream server shut down");
    }
}

impl Default for DownstreamServer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    async fn bind_loopback() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[tokio::test]
    async fn test_two_subscribers_receive_identical_sentences_in_order() {
        let server = Arc::new(DownstreamServer::new());
        let (listener, addr) = bind_loopback().await;
        let cancel = CancellationToken::new();

        let server_clone = server.clone();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move { server_clone.accept_loop(listener, cancel_clone).await });

        let client_a = TcpStream::connect(addr).await.unwrap();
        let client_b = TcpStream::connect(addr).await.unwrap();

        // give the accept loop a chance to register both
        while server.subscriber_count().await < 2 {
            tokio::task::yield_now().await;
        }

        server.publish("!AIVDM,1,1,,A,test,0*00").await;

        let mut reader_a = BufReader::new(client_a);
        let mut reader_b = BufReader::new(client_b);
        let mut line_a = String::new();
        let mut line_b = String::new();
        reader_a.read_line(&mut line_a).await.unwrap();
        reader_b.read_line(&mut line_b).await.unwrap();

        assert_eq!(line_a, "!AIVDM,1,1,,A,test,0*00\n");
        assert_eq!(line_a, line_b);

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_half_closed_subscriber_is_evicted_without_stalling_others() {
        let server = Arc::new(DownstreamServer::new());
        let (listener, addr) = bind_loopback().await;
        let cancel = CancellationToken::new();

        let server_clone = server.clone();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move { server_clone.accept_loop(listener, cancel_clone).await });

        let dropped = TcpStream::connect(addr).await.unwrap();
        let healthy = TcpStream::connect(addr).await.unwrap();

        while server.subscriber_count().await < 2 {
            tokio::task::yield_now().await;
        }

        // Half-close the read side from the dropped client's perspective by
        // dropping the whole socket — the server's write will eventually fail.
        drop(dropped);

        let mut reader = BufReader::new(healthy);
        for i in 0..10 {
            server.publish(&format!("sentence-{i}")).await;
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            assert_eq!(line, format!("sentence-{i}\n"));
        }

        cancel.cancel();
    }

    #[tokio::test]
    async fn test_shutdown_closes_all_subscribers() {
        let server = DownstreamServer::new();
        let (listener, addr) = bind_loopback().await;
        let cancel = CancellationToken::new();

        let server = Arc::new(server);
        let server_clone = server.clone();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move { server_clone.accept_loop(listener, cancel_clone).await });

        let _client = TcpStream::connect(addr).await.unwrap();
        while server.subscriber_count().await < 1 {
            tokio::task::yield_now().await;
        }

        server.shutdown().await;
        assert_eq!(server.subscriber_count().await, 0);
        cancel.cancel();
    }
}
