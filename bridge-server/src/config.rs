//! Configuration surface: a CLI with environment-variable fallback for every
//! recognised option (§6, §10). No YAML — the config record is built
//! directly from parsed, already-validated CLI/env input.

use clap::Parser;

/// Reconnecting SBS ingest and AIS Type 9 fan-out daemon.
#[derive(Debug, Parser)]
#[command(name = "ais-bridge", version, about)]
pub struct Config {
    /// Host of the upstream ADS-B/SBS feed.
    #[arg(long = "ads-host", env = "ADS_RECEIVER_TCP_HOST", default_value = "127.0.0.1")]
    pub ads_receiver_host: String,

    /// Port of the upstream ADS-B/SBS feed.
    #[arg(long = "ads-port", env = "ADS_RECEIVER_TCP_PORT", default_value_t = 30003)]
    pub ads_receiver_port: u16,

    /// Delay before retrying a dropped or failed upstream connection.
    #[arg(
        long = "ads-reconnect-delay-seconds",
        env = "ADS_RECEIVER_TCP_RECONNECT_DELAY_SECONDS",
        default_value_t = 5.0
    )]
    pub ads_reconnect_delay_seconds: f64,

    /// Host to bind the downstream AIS fan-out server on.
    #[arg(long = "ais-host", env = "AIS_SENDER_TCP_HOST", default_value = "0.0.0.0")]
    pub ais_sender_host: String,

    /// Port to bind the downstream AIS fan-out server on.
    #[arg(long = "ais-port", env = "AIS_SENDER_TCP_PORT", default_value_t = 4002)]
    pub ais_sender_port: u16,
}

impl Config {
    pub fn ads_receiver_addr(&self) -> (String, u16) {
        (self.ads_receiver_host.clone(), self.ads_receiver_port)
    }

    pub fn ais_sender_addr(&self) -> (String, u16) {
        (self.ais_sender_host.clone(), self.ais_sender_port)
    }
}
