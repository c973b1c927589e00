//! Declarative chart descriptions: axes, per-system styles, legend and annotations.

use plotters::style::RGBColor;

/// matplotlib's `tab10` palette, in its canonical order
pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    Log10,
}

/// A major tick: data value and the text printed under it
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    /// Visible data range
    pub range: (f64, f64),
    pub scale: AxisScale,
    pub ticks: Vec<Tick>,
    /// Spacing of unlabelled minor marks on a linear axis
    pub minor_step: Option<f64>,
    /// Draw grid lines at the major ticks
    pub grid: bool,
}

impl AxisSpec {
    pub fn linear(min: f64, max: f64) -> Self {
        Self {
            range: (min, max),
            scale: AxisScale::Linear,
            ticks: Vec::new(),
            minor_step: None,
            grid: false,
        }
    }

    pub fn log10(min: f64, max: f64) -> Self {
        Self {
            scale: AxisScale::Log10,
            ..Self::linear(min, max)
        }
    }

    /// Ticks labelled with their own value
    pub fn ticks(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.ticks = values
            .into_iter()
            .map(|value| Tick {
                value,
                label: format!("{}", value),
            })
            .collect();
        self
    }

    pub fn labeled_ticks(mut self, ticks: &[(f64, &str)]) -> Self {
        self.ticks = ticks
            .iter()
            .map(|(value, label)| Tick {
                value: *value,
                label: (*label).to_string(),
            })
            .collect();
        self
    }

    pub fn minor(mut self, step: f64) -> Self {
        self.minor_step = Some(step);
        self
    }

    pub fn grid(mut self) -> Self {
        self.grid = true;
        self
    }

    /// Whether `value` can be placed on this axis
    pub fn shows(&self, value: f64) -> bool {
        self.scale == AxisScale::Linear || value > 0.0
    }

    /// Major tick positions
    pub fn major_points(&self) -> Vec<f64> {
        self.ticks
            .iter()
            .map(|t| t.value)
            .filter(|v| self.shows(*v))
            .collect()
    }

    /// Unlabelled minor positions: multiples of the minor step on a linear
    /// axis, 2..9 of each decade on a log axis
    pub fn minor_points(&self) -> Vec<f64> {
        let (min, max) = self.range;
        let majors = self.major_points();
        let candidates: Vec<f64> = match (self.scale, self.minor_step) {
            (AxisScale::Linear, Some(step)) if step > 0.0 => {
                let first = (min / step).ceil() as i64;
                let last = (max / step).floor() as i64;
                (first..=last).map(|i| i as f64 * step).collect()
            }
            (AxisScale::Log10, _) if min > 0.0 => {
                let first = min.log10().floor() as i32;
                let last = max.log10().ceil() as i32;
                (first..=last)
                    .flat_map(|decade| (2..10).map(move |m| m as f64 * 10f64.powi(decade)))
                    .filter(|v| min <= *v && *v <= max)
                    .collect()
            }
            _ => Vec::new(),
        };
        candidates
            .into_iter()
            .filter(|p| !majors.iter().any(|m| close(*m, *p)))
            .collect()
    }

    /// Text for the major tick at `value`
    pub fn tick_label(&self, value: f64) -> String {
        self.ticks
            .iter()
            .find(|t| close(t.value, value))
            .map(|t| t.label.clone())
            .unwrap_or_default()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// matplotlib `,`
    Pixel,
    /// matplotlib `.`
    Point,
    Plus,
    Cross,
    Circle,
    Star,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// How one system is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    /// System key in the series collection
    pub key: &'static str,
    /// Legend text
    pub label: &'static str,
    pub marker: Marker,
    pub line: LineStyle,
    pub color: RGBColor,
    /// Higher values are drawn later, on top
    pub z_order: i32,
}

impl SeriesStyle {
    pub fn new(
        key: &'static str,
        label: &'static str,
        marker: Marker,
        line: LineStyle,
        color: RGBColor,
    ) -> Self {
        Self {
            key,
            label,
            marker,
            line,
            color,
            z_order: 3,
        }
    }

    pub fn z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }
}

/// Extra marks drawn over a panel, in data coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// Centered text
    Text {
        at: (f64, f64),
        text: &'static str,
        size: f64,
    },
    /// Arrow pointing from `from` to `to`
    Arrow { from: (f64, f64), to: (f64, f64) },
    /// Reference line across the whole x range
    HorizontalLine { y: f64, dashed: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub x: AxisSpec,
    pub y: AxisSpec,
    pub styles: Vec<SeriesStyle>,
    pub annotations: Vec<Annotation>,
}

impl PanelSpec {
    pub fn new(x: AxisSpec, y: AxisSpec, styles: Vec<SeriesStyle>) -> Self {
        Self {
            x,
            y,
            styles,
            annotations: Vec::new(),
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Styles in declaration order, stably re-sorted by z-order
    pub fn draw_order(&self) -> Vec<&SeriesStyle> {
        let mut order: Vec<&SeriesStyle> = self.styles.iter().collect();
        order.sort_by_key(|s| s.z_order);
        order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPolicy {
    Hidden,
    /// One entry per distinct label across all panels, first style wins
    Deduplicated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    UpperLeft,
    LowerRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendSpec {
    pub policy: LegendPolicy,
    pub position: LegendPosition,
}

/// A whole figure: size, shared axis descriptions, panels and legend
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// Pixel size of the output
    pub size: (u32, u32),
    pub x_desc: &'static str,
    pub y_desc: &'static str,
    pub panels: Vec<PanelSpec>,
    pub legend: LegendSpec,
}

impl ChartSpec {
    pub fn legend_entries(&self) -> Vec<&SeriesStyle> {
        if self.legend.policy == LegendPolicy::Hidden {
            return Vec::new();
        }
        let mut entries: Vec<&SeriesStyle> = Vec::new();
        for style in self.panels.iter().flat_map(|p| p.styles.iter()) {
            if !entries.iter().any(|e| e.label == style.label) {
                entries.push(style);
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(key: &'static str, label: &'static str, color: usize) -> SeriesStyle {
        SeriesStyle::new(key, label, Marker::Point, LineStyle::Solid, TAB10[color])
    }

    fn spec(panels: Vec<PanelSpec>) -> ChartSpec {
        ChartSpec {
            size: (600, 300),
            x_desc: "x",
            y_desc: "y",
            panels,
            legend: LegendSpec {
                policy: LegendPolicy::Deduplicated,
                position: LegendPosition::UpperLeft,
            },
        }
    }

    #[test]
    fn legend_keeps_first_handle_per_label() {
        let axis = || AxisSpec::linear(0.0, 1.0);
        let left = PanelSpec::new(axis(), axis(), vec![style("a", "A", 0), style("b", "B", 1)]);
        let right = PanelSpec::new(axis(), axis(), vec![style("a2", "A", 2)]);
        let chart = spec(vec![left, right]);

        let entries = chart.legend_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "A");
        assert_eq!(entries[0].color, TAB10[0]);
        assert_eq!(entries[1].label, "B");
    }

    #[test]
    fn hidden_legend_has_no_entries() {
        let axis = || AxisSpec::linear(0.0, 1.0);
        let mut chart = spec(vec![PanelSpec::new(axis(), axis(), vec![style("a", "A", 0)])]);
        chart.legend.policy = LegendPolicy::Hidden;
        assert!(chart.legend_entries().is_empty());
    }

    #[test]
    fn z_order_overrides_declaration_order() {
        let axis = || AxisSpec::linear(0.0, 1.0);
        let panel = PanelSpec::new(
            axis(),
            axis(),
            vec![
                style("shenango", "Shenango", 0).z_order(1),
                style("skyloft", "Skyloft", 2).z_order(4),
                style("skyloft_20us", "Skyloft (20µs)", 4).z_order(3),
                style("other", "Other", 1).z_order(3),
            ],
        );
        let keys: Vec<_> = panel.draw_order().iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["shenango", "skyloft_20us", "other", "skyloft"]);
    }

    #[test]
    fn log_axis_maps_ticks_to_labels() {
        let axis = AxisSpec::log10(1.0, 20000.0).labeled_ticks(&[
            (1.0, "1µs"),
            (10.0, "10µs"),
            (100.0, "100µs"),
            (1000.0, "1ms"),
            (10000.0, "10ms"),
        ]);
        assert_eq!(axis.major_points(), vec![1.0, 10.0, 100.0, 1000.0, 10000.0]);
        assert_eq!(axis.tick_label(1000.0), "1ms");
        assert_eq!(axis.tick_label(2.5), "");
        assert!(!axis.shows(0.0));
        assert!(axis.shows(100.0));
    }

    #[test]
    fn log_minor_points_fill_each_decade() {
        let axis = AxisSpec::log10(1.0, 100.0).labeled_ticks(&[(1.0, "1"), (10.0, "10")]);
        let minors = axis.minor_points();
        assert_eq!(minors.len(), 16);
        assert_eq!(minors[0], 2.0);
        assert_eq!(minors[8], 20.0);
        assert!(!minors.contains(&10.0));
    }

    #[test]
    fn linear_minor_points_skip_majors() {
        let axis = AxisSpec::linear(0.0, 100.0)
            .ticks((0..7).map(|i| 16.0 * i as f64))
            .minor(8.0);
        let minors = axis.minor_points();
        assert_eq!(minors.first(), Some(&8.0));
        assert!(!minors.contains(&16.0));
        assert_eq!(minors.len(), 6);
        assert_eq!(axis.tick_label(48.0), "48");
    }

    #[test]
    fn fractional_tick_labels_print_plainly() {
        let axis = AxisSpec::linear(0.0, 2.6).ticks([0.0, 0.5, 1.0, 2.5]);
        assert_eq!(axis.tick_label(0.5), "0.5");
        assert_eq!(axis.tick_label(1.0), "1");
    }
}
