//! bridge-core: SBS aircraft tracking and AIS Type 9 encoding.
//!
//! No async, no I/O — just algorithms. This crate is the pure logic shared
//! by `bridge-server`'s upstream reader and downstream publisher.

pub mod ais9;
pub mod sixbit;
pub mod timestamp;
pub mod tracker;
pub mod types;

pub use timestamp::TimestampAdjuster;
pub use tracker::{LineOutcome, Tracker};
pub use types::{Aircraft, BridgeError, Result};
