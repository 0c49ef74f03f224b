use std::path::Path;

use plotters::prelude::*;

use super::{PlotErr, PlotResult};

pub const X_DESC: &str = "Time";
pub const Y_DESC: &str = "Power consumption";

const DEFAULT_SIZE: (u32, u32) = (1280, 720);
const LEGEND_LINE: i32 = 20;
const GUIDE_WIDTH: u32 = 4;
const GUIDE_MARKER: i32 = 5;

/// One labelled line on a chart; NaN samples are drawn as gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(usize, f64)>,
}

impl Series {
    /// Splits the series into runs of finite samples.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for &(x, y) in &self.points {
            if y.is_finite() {
                current.push((x as f64, y));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }

        if !current.is_empty() {
            segments.push(current);
        }

        segments
    }
}

/// Reference polyline drawn over the traces, with a marker at each point; not part of the
/// legend.
#[derive(Debug, Clone)]
pub struct Guide {
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
}

impl Guide {
    pub fn new(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self { points, color }
    }
}

/// Chart session that series get appended to, so several captures can be compared on one set of
/// axes.
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: Option<String>,
    pub size: (u32, u32),
    series: Vec<Series>,
    guides: Vec<Guide>,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            title: None,
            size: DEFAULT_SIZE,
            series: Vec::new(),
            guides: Vec::new(),
        }
    }
}

impl Chart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn add_guide(&mut self, guide: Guide) {
        self.guides.push(guide);
    }

    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    /// Bounds over every finite point as `(x_range, y_range)`, widened when degenerate.
    fn bounds(&self) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

        let series_points = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|&(x, y)| (x as f64, y)));
        let guide_points = self.guides.iter().flat_map(|g| g.points.iter().copied());

        for (x, y) in series_points.chain(guide_points) {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            if y.is_finite() {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }

        if !x_min.is_finite() {
            (x_min, x_max) = (0.0, 1.0);
        }
        if !y_min.is_finite() {
            (y_min, y_max) = (0.0, 1.0);
        }
        if x_max <= x_min {
            x_max = x_min + 1.0;
        }
        if y_max <= y_min {
            y_min -= 0.5;
            y_max += 0.5;
        }

        let y_margin = (y_max - y_min) * 0.05;
        (x_min..x_max, (y_min - y_margin)..(y_max + y_margin))
    }

    /// Draws every series with a legend to an SVG file at `path`.
    pub fn render_svg(&self, path: &Path) -> PlotResult<()> {
        if self.series.is_empty() {
            return Err(PlotErr::EmptyChart);
        }

        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let (x_range, y_range) = self.bounds();
        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70);
        if let Some(title) = &self.title {
            builder.caption(title, ("sans-serif", 22).into_font());
        }

        let mut chart = builder
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc(X_DESC)
            .y_desc(Y_DESC)
            .draw()
            .map_err(draw_err)?;

        for (idx, series) in self.series.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let mut segments = series.segments();

            // an all-gap series still gets its legend entry
            if segments.is_empty() {
                segments.push(Vec::new());
            }

            for (i, segment) in segments.into_iter().enumerate() {
                let anno = chart
                    .draw_series(LineSeries::new(segment, color.stroke_width(1)))
                    .map_err(draw_err)?;

                if i == 0 {
                    anno.label(series.label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + LEGEND_LINE, y)], color)
                    });
                }
            }
        }

        for guide in &self.guides {
            let style = guide.color.mix(0.6).stroke_width(GUIDE_WIDTH);
            chart
                .draw_series(LineSeries::new(guide.points.iter().copied(), style))
                .map_err(draw_err)?;
            chart
                .draw_series(
                    guide
                        .points
                        .iter()
                        .map(|&p| Circle::new(p, GUIDE_MARKER, guide.color.filled())),
                )
                .map_err(draw_err)?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        tracing::info!(path = %path.display(), series = self.series.len(), "chart written");

        Ok(())
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> PlotErr {
    PlotErr::Draw(e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    fn series(label: &str, ys: &[f64]) -> Series {
        Series {
            label: label.to_string(),
            points: ys.iter().copied().enumerate().collect(),
        }
    }

    #[test]
    fn test_segments_split_on_nan() {
        let s = series("a", &[f64::NAN, f64::NAN, 1.0, 2.0, f64::NAN, 3.0]);
        assert_eq!(
            s.segments(),
            vec![vec![(2.0, 1.0), (3.0, 2.0)], vec![(5.0, 3.0)]]
        );
        assert!(series("b", &[f64::NAN]).segments().is_empty());
    }

    #[test]
    fn test_bounds() {
        let mut chart = Chart::default();
        chart.push(series("a", &[f64::NAN, 1.0, 3.0]));

        let (x, y) = chart.bounds();
        assert_eq!(x, 0.0..2.0);
        assert!(y.start < 1.0 && y.end > 3.0);
    }

    #[test]
    fn test_bounds_include_guides() {
        let mut chart = Chart::default();
        chart.push(series("a", &[1.0, 2.0]));
        chart.add_guide(Guide::new(vec![(0.5, 0.0), (4.0, 5.0)], GREEN));

        let (x, y) = chart.bounds();
        assert_eq!(x, 0.0..4.0);
        assert!(y.start < 0.0 && y.end > 5.0);
    }

    #[test]
    fn test_render_empty_chart() {
        let dir = tempfile::tempdir().unwrap();
        let res = Chart::default().render_svg(&dir.path().join("empty.svg"));
        assert!(matches!(res, Err(PlotErr::EmptyChart)));
    }

    #[test]
    fn test_render_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.svg");

        let mut chart = Chart::new("door");
        chart.push(series("0000 (incorrect)", &[0.1, 0.3, 0.2, 0.4]));
        chart.push(series("6000 (sm2) CORRECT!!!!", &[f64::NAN, 0.2, 0.25, 0.3]));
        chart.render_svg(&path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Power consumption"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn test_render_svg_with_guides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guided.svg");

        let mut chart = Chart::default();
        chart.push(series("0000 (incorrect)", &[0.1, 0.3, 0.2, 0.4]));
        chart.add_guide(Guide::new(vec![(0.0, 0.1), (3.0, 0.4)], RED));
        chart.render_svg(&path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert_eq!(svg.matches("<circle").count(), 2);
    }
}
