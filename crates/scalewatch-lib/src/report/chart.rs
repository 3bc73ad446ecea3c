//! Inline SVG line chart geometry
//!
//! Charts are laid out here and drawn by the report template, which
//! handles escaping of series names and labels.

const WIDTH: f64 = 920.0;
const HEIGHT: f64 = 260.0;
const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 36.0;

const PALETTE: &[&str] = &[
    "#1565c0", "#2e7d32", "#c62828", "#ef6c00", "#6a1b9a", "#00838f", "#ad1457", "#558b2f",
    "#4e342e", "#37474f",
];

/// Color for the n-th series
pub fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// One named line
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    pub color: &'static str,
    pub dashed: bool,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>, color: &'static str) -> Self {
        Self {
            name: name.into(),
            values,
            color,
            dashed: false,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// A horizontal grid line with its y-axis label
pub struct GridLine {
    pub y: String,
    pub label_y: String,
    pub label: String,
}

/// An x-axis tick label
pub struct AxisTick {
    pub x: String,
    pub label: String,
}

/// A drawn series
pub struct Polyline {
    pub name: String,
    pub color: &'static str,
    pub dashed: bool,
    pub points: String,
}

/// A laid-out chart ready for the template
pub struct ChartView {
    pub heading: String,
    pub y_label: String,
    pub width: f64,
    pub height: f64,
    pub grid_x1: f64,
    pub grid_x2: f64,
    pub y_tick_x: f64,
    pub x_tick_y: String,
    pub y_label_y: String,
    pub grid: Vec<GridLine>,
    pub x_ticks: Vec<AxisTick>,
    pub lines: Vec<Polyline>,
}

/// A line chart over a shared x axis (elapsed seconds)
pub struct LineChart<'a> {
    pub heading: String,
    pub y_label: &'a str,
    pub x: &'a [f64],
    pub series: Vec<Series>,
}

impl LineChart<'_> {
    /// Scale series into SVG coordinates
    pub fn layout(self) -> ChartView {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

        let x_max = self.x.last().copied().unwrap_or(0.0).max(1.0);
        let y_max = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.1;

        let px = |x: f64| MARGIN_LEFT + x / x_max * plot_w;
        let py = |y: f64| MARGIN_TOP + plot_h - y / y_max * plot_h;

        let grid = (0..=4)
            .map(|i| {
                let value = y_max / 4.0 * i as f64;
                let y = py(value);
                GridLine {
                    y: format!("{:.1}", y),
                    label_y: format!("{:.1}", y + 4.0),
                    label: format!("{:.0}", value),
                }
            })
            .collect();

        let x_ticks = (0..=5)
            .map(|i| {
                let value = x_max / 5.0 * i as f64;
                AxisTick {
                    x: format!("{:.1}", px(value)),
                    label: format!("{:.0}s", value),
                }
            })
            .collect();

        let x = self.x;
        let lines = self
            .series
            .into_iter()
            .filter_map(|series| {
                let points: Vec<String> = x
                    .iter()
                    .zip(&series.values)
                    .map(|(x, y)| format!("{:.1},{:.1}", px(*x), py(*y)))
                    .collect();
                if points.is_empty() {
                    return None;
                }
                Some(Polyline {
                    name: series.name,
                    color: series.color,
                    dashed: series.dashed,
                    points: points.join(" "),
                })
            })
            .collect();

        ChartView {
            heading: self.heading,
            y_label: self.y_label.to_string(),
            width: WIDTH,
            height: HEIGHT,
            grid_x1: MARGIN_LEFT,
            grid_x2: WIDTH - MARGIN_RIGHT,
            y_tick_x: MARGIN_LEFT - 6.0,
            x_tick_y: format!("{:.1}", HEIGHT - MARGIN_BOTTOM + 16.0),
            y_label_y: format!("{:.1}", MARGIN_TOP + plot_h / 2.0),
            grid,
            x_ticks,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_scales_to_plot_area() {
        let x = [0.0, 5.0, 10.0];
        let view = LineChart {
            heading: "Pods".to_string(),
            y_label: "count",
            x: &x,
            series: vec![Series::new("web", vec![0.0, 5.0, 10.0], color(0))],
        }
        .layout();

        assert_eq!(view.grid.len(), 5);
        assert_eq!(view.x_ticks.len(), 6);
        assert_eq!(view.x_ticks[5].label, "10s");
        let points: Vec<&str> = view.lines[0].points.split(' ').collect();
        assert_eq!(points[0], "56.0,224.0");
        assert!(points[2].starts_with("904.0,"));
    }

    #[test]
    fn test_empty_series_dropped() {
        let view = LineChart {
            heading: "Pods".to_string(),
            y_label: "count",
            x: &[],
            series: vec![Series::new("web", vec![], color(0)).dashed()],
        }
        .layout();
        assert!(view.lines.is_empty());
    }
}
