//! Client and plotting helpers for a power-analysis timing exercise.
//!
//! A [`Door`] fetches side-channel captures for guessed values from a capture server; the
//! [`plot`] helpers smooth, decimate and crop the returned traces and append them to a [`Chart`]
//! so several guesses can be compared by eye.

pub mod client;
pub mod hints;
pub mod plot;
pub mod util;

pub use client::{Capture, Door, DoorErr, DoorResult, Guess, Tier, Trace};
pub use plot::{Chart, Crop, PlotErr, PlotOptions, PlotResult, plot_trace};
