use crate::client::types::{DEFAULT_RESULT_FIELD, DEFAULT_VALUE_FIELD, PASSWORD_CORRECT};
use crate::client::Capture;

use super::chart::{Chart, Series};
use super::{PlotErr, PlotResult};

/// Half-open sample index range `start..end` to keep on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub start: usize,
    pub end: usize,
}

impl Crop {
    pub fn new(start: usize, end: usize) -> PlotResult<Self> {
        if start > end {
            return Err(PlotErr::InvalidCrop { start, end });
        }

        Ok(Self { start, end })
    }
}

/// Rendering options for a single capture.
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub smooth: usize,
    pub crop: Option<Crop>,
    pub decimate: usize,
    pub value_field: String,
    pub label_decode: bool,
    pub result_field: String,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            smooth: 1,
            crop: None,
            decimate: 1,
            value_field: DEFAULT_VALUE_FIELD.to_string(),
            label_decode: true,
            result_field: DEFAULT_RESULT_FIELD.to_string(),
        }
    }
}

impl PlotOptions {
    /// Box-car window width; `1` leaves the trace untouched.
    pub fn smooth(mut self, window: usize) -> PlotResult<Self> {
        if window == 0 {
            return Err(PlotErr::ZeroWindow("smoothing window"));
        }
        self.smooth = window;
        Ok(self)
    }

    pub fn decimate(mut self, stride: usize) -> PlotResult<Self> {
        if stride == 0 {
            return Err(PlotErr::ZeroWindow("decimation stride"));
        }
        self.decimate = stride;
        Ok(self)
    }

    pub fn crop(mut self, crop: Crop) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn value_field(mut self, field: impl Into<String>, decode: bool) -> Self {
        self.value_field = field.into();
        self.label_decode = decode;
        self
    }

    pub fn result_field(mut self, field: impl Into<String>) -> Self {
        self.result_field = field.into();
        self
    }
}

/// Crude low-pass filter: convolves `samples` with a normalised box-car of width `window`.
///
/// The edges of the full convolution are trimmed by `window` samples on each side, and the
/// result is left-padded with `window / 2` NaNs so that traces smoothed with different windows
/// stay aligned in time with the raw trace.
pub fn smooth(samples: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return samples.to_vec();
    }

    let pad = window / 2;
    let kept = samples.len().saturating_sub(window + 1);
    let scale = window as f64;

    let mut out = Vec::with_capacity(pad + kept);
    out.extend(std::iter::repeat_n(f64::NAN, pad));
    out.extend(
        samples
            .windows(window)
            .skip(1)
            .take(kept)
            .map(|w| w.iter().sum::<f64>() / scale),
    );

    out
}

/// Keeps every `stride`-th sample, starting with the first.
pub fn decimate(samples: Vec<f64>, stride: usize) -> Vec<f64> {
    if stride <= 1 {
        return samples;
    }

    samples.into_iter().step_by(stride).collect()
}

fn build_label(capture: &Capture, options: &PlotOptions) -> PlotResult<String> {
    let value = capture
        .text(&options.value_field)
        .ok_or_else(|| PlotErr::MissingField(options.value_field.clone()))?;

    let mut label = match options.label_decode {
        true => String::from_utf8(hex::decode(value)?)?,
        false => value.to_string(),
    };

    if options.smooth > 1 {
        label.push_str(&format!(" (sm{})", options.smooth));
    }

    match capture.text(&options.result_field) == Some(PASSWORD_CORRECT) {
        true => label.push_str(" CORRECT!!!!"),
        false => label.push_str(" (incorrect)"),
    }

    Ok(label)
}

/// Builds the labelled series for `capture` without touching any chart.
pub fn build_series(capture: &Capture, options: &PlotOptions) -> PlotResult<Series> {
    let trace = capture.trace.as_ref().ok_or(PlotErr::MissingTrace)?;
    let label = build_label(capture, options)?;

    let samples = decimate(smooth(trace.samples(), options.smooth), options.decimate);

    let points = match options.crop {
        Some(Crop { start, end }) => {
            let end = end.min(samples.len());
            let start = start.min(end);
            (start..end).zip(samples[start..end].iter().copied()).collect()
        }
        None => samples.into_iter().enumerate().collect(),
    };

    Ok(Series { label, points })
}

/// Appends `capture` to `chart` as a new labelled series; earlier series are kept.
pub fn plot_trace(chart: &mut Chart, capture: &Capture, options: &PlotOptions) -> PlotResult<()> {
    let series = build_series(capture, options)?;
    tracing::debug!(label = %series.label, points = series.points.len(), "adding series");
    chart.push(series);

    Ok(())
}
