pub mod chart;
pub mod series;

use thiserror::Error;

pub use chart::{Chart, Guide, Series};
pub use series::{Crop, PlotOptions, decimate, plot_trace, smooth};

pub type PlotResult<T> = core::result::Result<T, PlotErr>;

#[derive(Debug, Error)]
pub enum PlotErr {
    #[error("{0} must be at least 1")]
    ZeroWindow(&'static str),

    #[error("crop start {start} is past its end {end}")]
    InvalidCrop { start: usize, end: usize },

    #[error("capture has no trace data to plot")]
    MissingTrace,

    #[error("capture has no '{0}' field to label the series with")]
    MissingField(String),

    #[error("while hex-decoding the series label: {0}")]
    LabelHex(#[from] hex::FromHexError),

    #[error("series label is not valid UTF-8: {0}")]
    LabelUtf8(#[from] std::string::FromUtf8Error),

    #[error("chart has no series to draw")]
    EmptyChart,

    #[error("while drawing chart: {0}")]
    Draw(String),
}
