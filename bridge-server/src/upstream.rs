//! Upstream SBS feed reader (C1), chained synchronously into the tracker
//! (C3) and encoder (C4) per §5 — there is no queue between them, only the
//! line loop below. The only concurrency boundary in the whole pipeline is
//! [`DownstreamServer::publish`].

use std::time::Duration;

use bridge_core::{ais9, LineOutcome, Tracker};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::downstream::DownstreamServer;

/// Reconnecting client for the upstream ADS-B/SBS feed. Retries forever;
/// there is no bounded retry count (§4.1, §9).
pub struct UpstreamClient {
    host: String,
    port: u16,
    reconnect_delay: Duration,
}

impl UpstreamClient {
    pub fn new(host: String, port: u16, reconnect_delay_seconds: f64) -> Self {
        UpstreamClient {
            host,
            port,
            reconnect_delay: Duration::from_secs_f64(reconnect_delay_seconds.max(0.0)),
        }
    }

    /// Runs until `cancel` fires. Maintains a single upstream connection at
    /// a time, reconnecting with `reconnect_delay` between attempts on any
    /// connect or read failure.
    pub async fn run(&self, downstream: &DownstreamServer, cancel: CancellationToken) {
        let mut tracker = Tracker::new();

        while !cancel.is_cancelled() {
            info!(host = %self.host, port = self.port, "connecting to upstream feed");

            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                result = TcpStream::connect((self.host.as_str(), self.port)) => result,
            };

            let stream = match connected {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "upstream connect failed");
                    self.sleep_or_cancel(&cancel).await;
                    continue;
                }
            };

            info!(host = %self.host, port = self.port, "upstream connected");
            self.read_until_disconnect(stream, &mut tracker, downstream, &cancel)
                .await;

            if cancel.is_cancelled() {
                break;
            }
            self.sleep_or_cancel(&cancel).await;
        }

        info!("upstream client stopped");
    }

    async fn read_until_disconnect(
        &self,
        stream: TcpStream,
        tracker: &mut Tracker,
        downstream: &DownstreamServer,
        cancel: &CancellationToken,
    ) {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let read = tokio::select! {
                _ = cancel.cancelled() => return,
                result = reader.read_until(b'\n', &mut raw) => result,
            };

            match read {
                Ok(0) => {
                    warn!("upstream connection closed by peer");
                    return;
                }
                Ok(_) => {
                    // Lossy: a handful of mangled bytes on a noisy feed is not
                    // worth tearing down the connection over.
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.process_line(tracker, line, downstream).await;
                }
                Err(e) => {
                    warn!(error = %e, "upstream read failed");
                    return;
                }
            }
        }
    }

    async fn process_line(&self, tracker: &mut Tracker, line: &str, downstream: &DownstreamServer) {
        match tracker.process_line(line) {
            LineOutcome::NotSbs => {}
            LineOutcome::Malformed(reason) => {
                debug!(line = %line, reason = %reason, "dropping malformed line");
            }
            LineOutcome::Updated => {}
            LineOutcome::Ready(aircraft) => match ais9::encode(&aircraft) {
                Ok(sentence) => downstream.publish(&sentence).await,
                Err(e) => warn!(icao = %aircraft.icao, error = %e, "dropping record at encode"),
            },
        }
    }

    async fn sleep_or_cancel(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.reconnect_delay) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
