//! HTTP client for the door capture server.
//!
//! Usage e.g (in `async fn main() .. `):
//!
//! let door = Door::builder().tier(Tier::Basic).build()?;
//! let capture = door.fetch_trace("3333").await?;
//! door.unlock(&mut chart, "3333", &PlotOptions::default().smooth(6)?).await?;

pub mod door;
pub mod types;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::plot::PlotErr;

pub use door::{Door, DoorBuilder, Guess, Tier, sweep_guesses};
pub use types::{Capture, CaptureSummary, Trace};

pub type DoorResult<T> = core::result::Result<T, DoorErr>;

#[derive(Debug, Error)]
pub enum DoorErr {
    #[error("got {got} value(s) for {expected} configured label(s)")]
    Arity { expected: usize, got: usize },

    #[error("fetch failed with code {code}: {body}")]
    Status { code: StatusCode, body: String },

    #[error("reqwest error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body is not a JSON object: {0}")]
    NotAnObject(Value),

    #[error("while hex-decoding trace data: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("trace payload of {0} bytes is not a whole number of f64 samples")]
    TraceLength(usize),

    #[error("trace field '{field}' is not a hex string: {found}")]
    TraceField { field: String, found: Value },

    #[error(transparent)]
    Plot(#[from] PlotErr),
}
