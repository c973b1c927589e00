//! SVG rendering of chart specs over aggregated series.

use crate::chart::{
    Annotation, AxisScale, AxisSpec, ChartSpec, LegendPosition, LineStyle, Marker, PanelSpec,
    SeriesStyle,
};
use crate::series::{Series, SeriesCollection};
use anyhow::{anyhow, Context, Result};
use plotters::coord::combinators::{IntoLogRange, LogCoord};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_backend::{BackendCoord, DrawingErrorKind};
use std::fs;
use std::ops::Range;
use std::path::Path;

const FONT: &str = "sans-serif";
/// Width of the line sample in a legend row
const GLYPH_WIDTH: i32 = 20;

/// A panel's series, resolved and in drawing order
type Resolved<'a> = Vec<(&'a SeriesStyle, &'a Series)>;

/// Render a chart to an in-memory SVG document, one collection per panel.
///
/// Every style key is looked up before anything is drawn, so an unknown
/// label fails before any output exists.
pub fn render_to_string(spec: &ChartSpec, data: &[&SeriesCollection]) -> Result<String> {
    let panels = resolve(spec, data)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, spec.size).into_drawing_area();
        draw_figure(&root, spec, &panels)?;
        root.present()?;
    }
    Ok(svg)
}

/// Write a rendered SVG document, creating the parent directory
pub fn write_svg<P: AsRef<Path>>(output: P, svg: &str) -> Result<()> {
    let output = output.as_ref();
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(output, svg)
        .with_context(|| format!("Failed to write chart: {}", output.display()))?;
    Ok(())
}

fn resolve<'a>(
    spec: &'a ChartSpec,
    data: &[&'a SeriesCollection],
) -> Result<Vec<Resolved<'a>>> {
    if spec.panels.len() != data.len() {
        return Err(anyhow!(
            "Chart has {} panels but {} series collections were given",
            spec.panels.len(),
            data.len()
        ));
    }
    spec.panels
        .iter()
        .zip(data.iter().copied())
        .map(|(panel, collection)| -> Result<Resolved<'a>> {
            panel
                .draw_order()
                .into_iter()
                .map(|style| -> Result<(&'a SeriesStyle, &'a Series)> {
                    Ok((style, collection.get(style.key)?))
                })
                .collect()
        })
        .collect()
}

enum Scaled {
    Linear(RangedCoordf64),
    Log(LogCoord<f64>),
}

/// Axis coordinate with the figure's own tick positions
struct PanelAxis {
    scaled: Scaled,
    major: Vec<f64>,
    minor: Vec<f64>,
}

impl PanelAxis {
    fn new(axis: &AxisSpec) -> Self {
        let (min, max) = axis.range;
        let scaled = match axis.scale {
            AxisScale::Linear => Scaled::Linear((min..max).into()),
            AxisScale::Log10 => Scaled::Log((min..max).log_scale().into()),
        };
        Self {
            scaled,
            major: axis.major_points(),
            minor: axis.minor_points(),
        }
    }
}

impl Ranged for PanelAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        match &self.scaled {
            Scaled::Linear(coord) => coord.map(value, limit),
            Scaled::Log(coord) => coord.map(value, limit),
        }
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        let mut points = self.major.clone();
        if hint.weight().allow_light_points() {
            points.extend_from_slice(&self.minor);
        }
        points
    }

    fn range(&self) -> Range<f64> {
        match &self.scaled {
            Scaled::Linear(coord) => coord.range(),
            Scaled::Log(coord) => coord.range(),
        }
    }
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<PanelAxis, PanelAxis>>;

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    panels: &[Resolved<'_>],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (width, height) = root.dim_in_pixel();

    // Shared axis descriptions
    let desc_style = TextStyle::from((FONT, 15).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        spec.x_desc,
        (width as i32 / 2, height as i32 - 10),
        desc_style.clone(),
    ))?;
    root.draw(&Text::new(
        spec.y_desc,
        (10, height as i32 / 2),
        desc_style.transform(FontTransform::Rotate270),
    ))?;

    let body = root.margin(5, 22, 22, 5);
    let areas = body.split_evenly((1, spec.panels.len().max(1)));

    let legend = spec.legend_entries();
    let last = spec.panels.len().saturating_sub(1);
    for (i, ((panel, series), area)) in spec.panels.iter().zip(panels).zip(&areas).enumerate() {
        let entries = if i == last { legend.as_slice() } else { &[] };
        draw_panel(root, area, panel, series, entries, spec.legend.position)?;
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    area: &DrawingArea<DB, Shift>,
    panel: &PanelSpec,
    series: &Resolved<'_>,
    legend: &[&SeriesStyle],
    position: LegendPosition,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let x_axis = &panel.x;
    let y_axis = &panel.y;

    let mut chart = ChartBuilder::on(area)
        .margin(6)
        .x_label_area_size(24)
        .y_label_area_size(44)
        .build_cartesian_2d(PanelAxis::new(x_axis), PanelAxis::new(y_axis))?;

    let x_fmt = |v: &f64| x_axis.tick_label(*v);
    let y_fmt = |v: &f64| y_axis.tick_label(*v);
    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style((FONT, 12))
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(BLACK.mix(0.04));
    if !x_axis.grid {
        mesh.disable_x_mesh();
    }
    if !y_axis.grid {
        mesh.disable_y_mesh();
    }
    mesh.draw()?;

    for annotation in &panel.annotations {
        if let Annotation::HorizontalLine { y, dashed } = annotation {
            if !y_axis.shows(*y) {
                continue;
            }
            let line = vec![(x_axis.range.0, *y), (x_axis.range.1, *y)];
            let style = BLACK.stroke_width(1);
            if *dashed {
                chart.draw_series(DashedLineSeries::new(line, 5, 5, style))?;
            } else {
                chart.draw_series(LineSeries::new(line, style))?;
            }
        }
    }

    for (style, data) in series {
        let points: Vec<(f64, f64)> = data
            .points()
            .iter()
            .copied()
            .filter(|&point| visible(panel, point))
            .collect();
        draw_line(&mut chart, style, &points)?;
        draw_markers(&mut chart, style, &points)?;
    }

    for annotation in &panel.annotations {
        match annotation {
            Annotation::Text { at, text, size } => {
                if !visible(panel, *at) {
                    continue;
                }
                let text_style = TextStyle::from((FONT, *size).into_font())
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                chart.draw_series(std::iter::once(Text::new(*text, *at, text_style)))?;
            }
            Annotation::Arrow { from, to } => {
                if !visible(panel, *from) || !visible(panel, *to) {
                    continue;
                }
                draw_arrow(root, chart.backend_coord(from), chart.backend_coord(to))?;
            }
            Annotation::HorizontalLine { .. } => {}
        }
    }

    if !legend.is_empty() {
        for entry in legend {
            let style = (*entry).clone();
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())?
                .label(entry.label)
                .legend(move |at| LegendGlyph {
                    at,
                    style: style.clone(),
                });
        }
        chart
            .configure_series_labels()
            .position(match position {
                LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
                LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
            })
            .label_font((FONT, 12))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()?;
    }

    Ok(())
}

fn visible(panel: &PanelSpec, (x, y): (f64, f64)) -> bool {
    panel.x.shows(x) && panel.y.shows(y)
}

fn draw_line<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    style: &SeriesStyle,
    points: &[(f64, f64)],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let stroke = style.color.stroke_width(1);
    match style.line {
        LineStyle::Solid => {
            chart.draw_series(LineSeries::new(points.to_vec(), stroke))?;
        }
        LineStyle::Dashed => {
            chart.draw_series(DashedLineSeries::new(points.to_vec(), 6, 4, stroke))?;
        }
        LineStyle::Dotted => {
            chart.draw_series(DashedLineSeries::new(points.to_vec(), 2, 3, stroke))?;
        }
    }
    Ok(())
}

/// Stroke segments of a marker, in pixels around the point
fn marker_segments(marker: Marker) -> &'static [[(i32, i32); 2]] {
    match marker {
        Marker::Plus => &[[(-4, 0), (4, 0)], [(0, -4), (0, 4)]],
        Marker::Cross => &[[(-3, -3), (3, 3)], [(-3, 3), (3, -3)]],
        Marker::Star => &[
            [(-4, 0), (4, 0)],
            [(0, -4), (0, 4)],
            [(-3, -3), (3, 3)],
            [(-3, 3), (3, -3)],
        ],
        Marker::Pixel | Marker::Point | Marker::Circle => &[],
    }
}

/// Radius and fill of a marker's circle, if it has one
fn marker_circle(marker: Marker) -> Option<(u32, bool)> {
    match marker {
        Marker::Pixel => Some((1, true)),
        Marker::Point => Some((2, true)),
        Marker::Circle => Some((3, false)),
        Marker::Plus | Marker::Cross | Marker::Star => None,
    }
}

fn draw_markers<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    style: &SeriesStyle,
    points: &[(f64, f64)],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let stroke = style.color.stroke_width(1);
    let segments = marker_segments(style.marker);
    if !segments.is_empty() {
        chart.draw_series(points.iter().flat_map(|&p| {
            segments
                .iter()
                .map(move |seg| EmptyElement::at(p) + PathElement::new(seg.to_vec(), stroke))
        }))?;
    }
    if let Some((radius, filled)) = marker_circle(style.marker) {
        let shape = if filled { style.color.filled() } else { stroke };
        chart.draw_series(points.iter().map(|&p| Circle::new(p, radius, shape)))?;
    }
    Ok(())
}

/// Legend sample: a stretch of the series line with its marker in the middle
struct LegendGlyph {
    at: BackendCoord,
    style: SeriesStyle,
}

impl<'a> PointCollection<'a, BackendCoord> for &'a LegendGlyph {
    type Point = &'a BackendCoord;
    type IntoIter = std::iter::Once<&'a BackendCoord>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&self.at)
    }
}

impl<DB: DrawingBackend> Drawable<DB> for LegendGlyph {
    fn draw<I: Iterator<Item = BackendCoord>>(
        &self,
        mut pos: I,
        backend: &mut DB,
        _parent_dim: (u32, u32),
    ) -> std::result::Result<(), DrawingErrorKind<DB::ErrorType>> {
        let Some((x, y)) = pos.next() else {
            return Ok(());
        };
        let stroke = self.style.color.stroke_width(1);
        let (dash, gap) = match self.style.line {
            LineStyle::Solid => (GLYPH_WIDTH, 0),
            LineStyle::Dashed => (6, 4),
            LineStyle::Dotted => (2, 3),
        };
        let mut start = 0;
        while start < GLYPH_WIDTH {
            let end = (start + dash).min(GLYPH_WIDTH);
            backend.draw_line((x + start, y), (x + end, y), &stroke)?;
            start = end + gap;
        }

        let (cx, cy) = (x + GLYPH_WIDTH / 2, y);
        for [from, to] in marker_segments(self.style.marker) {
            backend.draw_line((cx + from.0, cy + from.1), (cx + to.0, cy + to.1), &stroke)?;
        }
        if let Some((radius, filled)) = marker_circle(self.style.marker) {
            let shape = if filled { self.style.color.filled() } else { stroke };
            backend.draw_circle((cx, cy), radius, &shape, filled)?;
        }
        Ok(())
    }
}

/// Straight arrow with a filled head at `to`, in backend pixels
fn draw_arrow<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    from: (i32, i32),
    to: (i32, i32),
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (dx, dy) = ((to.0 - from.0) as f64, (to.1 - from.1) as f64);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1.0 {
        return Ok(());
    }
    let (ux, uy) = (dx / len, dy / len);
    let head = 8.0_f64.min(len);
    let half = head * 0.45;
    let base = (to.0 as f64 - ux * head, to.1 as f64 - uy * head);
    let left = ((base.0 - uy * half) as i32, (base.1 + ux * half) as i32);
    let right = ((base.0 + uy * half) as i32, (base.1 - ux * half) as i32);

    let shaft = vec![from, (base.0 as i32, base.1 as i32)];
    root.draw(&PathElement::new(shaft, BLACK.stroke_width(1)))?;
    root.draw(&Polygon::new(vec![to, left, right], BLACK.filled()))?;
    Ok(())
}
