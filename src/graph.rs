#![cfg(feature = "web")]
use crate::error::RenderError;
use crate::sampler::Series;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;

/// Trace colors, in the order of the usual web plotting palette
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// Image formats a plot can be exported to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    fn output_format(&self) -> ImageOutputFormat {
        match self {
            ImageFormat::Png => ImageOutputFormat::Png,
            ImageFormat::Jpeg => ImageOutputFormat::Jpeg(90),
        }
    }
}

/// One line drawn on a plot
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    pub series: Series,

    /// Stroke width in pixels
    pub line_width: u32,

    pub color: RGBColor,
}

impl Trace {
    /// A 2px line in the first palette color
    pub fn line(series: Series) -> Self {
        Self {
            series,
            line_width: 2,
            color: PALETTE[0],
        }
    }

    /// The `index`-th trace of a plot; colors cycle through [`PALETTE`]
    pub fn nth(series: Series, index: usize) -> Self {
        Self {
            color: PALETTE[index % PALETTE.len()],
            ..Self::line(series)
        }
    }
}

/// Space between the image border and the plotting area, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Margin {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// Layout options for a plot
///
/// Defaults: margins l40 r20 t20 b40, axis titles "x" and "y", axes shown.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotLayout {
    /// Title displayed at the top of the plot, if any
    pub title: Option<String>,

    /// Label for the X-axis
    pub x_title: String,

    /// Label for the Y-axis
    pub y_title: String,

    pub margin: Margin,

    /// Draw the mesh, tick labels and axis titles
    pub show_axes: bool,
}

impl Default for PlotLayout {
    fn default() -> Self {
        Self {
            title: None,
            x_title: "x".to_string(),
            y_title: "y".to_string(),
            margin: Margin {
                left: 40,
                right: 20,
                top: 20,
                bottom: 40,
            },
            show_axes: true,
        }
    }
}

/// Size of the on-screen view of a plot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// A rendered plot: what was drawn and how.
#[derive(Clone, Debug, PartialEq)]
pub struct Plot {
    pub traces: Vec<Trace>,
    pub layout: PlotLayout,
    pub options: RenderOptions,
}

impl Plot {
    /// Axis ranges covering the finite data of every trace.
    ///
    /// Empty or all-NaN data falls back to `-1..1`; a degenerate range is
    /// widened by one unit on each side and the y range gets 5% headroom.
    pub fn axis_ranges(&self) -> (Range<f64>, Range<f64>) {
        let x = merge_bounds(self.traces.iter().map(|t| t.series.x_bounds()));
        let y = merge_bounds(self.traces.iter().map(|t| t.series.y_bounds()));

        let x_range = widen(x.unwrap_or((-1.0, 1.0)), 0.0);
        let y_range = widen(y.unwrap_or((-1.0, 1.0)), 0.05);
        (x_range, y_range)
    }
}

fn merge_bounds(bounds: impl Iterator<Item = Option<(f64, f64)>>) -> Option<(f64, f64)> {
    bounds.flatten().reduce(|(lo1, hi1), (lo2, hi2)| (lo1.min(lo2), hi1.max(hi2)))
}

/// Largest coordinate an axis may reach; the width of any range inside
/// `-MAX_AXIS_EXTENT..MAX_AXIS_EXTENT` is still finite.
const MAX_AXIS_EXTENT: f64 = f64::MAX / 2.0;

fn widen((lo, hi): (f64, f64), headroom: f64) -> Range<f64> {
    let lo = lo.clamp(-MAX_AXIS_EXTENT, MAX_AXIS_EXTENT);
    let hi = hi.clamp(-MAX_AXIS_EXTENT, MAX_AXIS_EXTENT);

    let pad = if hi - lo <= f64::EPSILON * lo.abs().max(hi.abs()).max(1.0) {
        // One unit each way, or enough to move away from a huge value
        (lo.abs() * 1e-3).max(1.0)
    } else {
        (hi - lo) * headroom
    };
    (lo - pad).max(-MAX_AXIS_EXTENT)..(hi + pad).min(MAX_AXIS_EXTENT)
}

/// Pulls a point inside the drawing ranges so coordinate mapping stays finite
fn clamp_point((x, y): (f64, f64), x_range: &Range<f64>, y_range: &Range<f64>) -> (f64, f64) {
    (
        x.clamp(x_range.start, x_range.end),
        y.clamp(y_range.start, y_range.end),
    )
}

/// Draws plots and exports them as images.
pub trait Renderer {
    /// Lays out `traces` for display.
    ///
    /// # Errors
    /// * `RenderError::InvalidSize` if the view has a zero dimension
    fn render(
        &self,
        traces: Vec<Trace>,
        layout: PlotLayout,
        options: RenderOptions,
    ) -> Result<Plot, RenderError>;

    /// Draws `plot` into an encoded image of the given size.
    fn rasterize(
        &self,
        plot: &Plot,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError>;

    /// Draws `plot` and returns it as a `data:<mime>;base64,...` URL
    fn export_image(
        &self,
        plot: &Plot,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<String, RenderError> {
        let bytes = self.rasterize(plot, format, width, height)?;
        Ok(format!(
            "data:{};base64,{}",
            format.mime_type(),
            STANDARD.encode(bytes)
        ))
    }
}

/// [`Renderer`] backed by plotters' in-memory bitmap backend
#[derive(Clone, Copy, Debug, Default)]
pub struct PlottersRenderer;

impl Renderer for PlottersRenderer {
    fn render(
        &self,
        traces: Vec<Trace>,
        layout: PlotLayout,
        options: RenderOptions,
    ) -> Result<Plot, RenderError> {
        check_size(options.width, options.height)?;
        Ok(Plot {
            traces,
            layout,
            options,
        })
    }

    fn rasterize(
        &self,
        plot: &Plot,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        check_size(width, height)?;

        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            draw_plot(&root, plot)?;
            root.present().map_err(draw_error)?;
        }

        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::Draw("pixel buffer size mismatch".to_string()))?;
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image).write_to(&mut encoded, format.output_format())?;
        Ok(encoded.into_inner())
    }
}

fn check_size(width: u32, height: u32) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize { width, height });
    }
    Ok(())
}

fn draw_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Draws every trace of `plot` onto `root`, one line per plottable segment.
fn draw_plot<DB>(root: &DrawingArea<DB, plotters::coord::Shift>, plot: &Plot) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(draw_error)?;

    let layout = &plot.layout;
    let (x_range, y_range) = plot.axis_ranges();

    let mut builder = ChartBuilder::on(root);
    builder
        .margin_left(layout.margin.left)
        .margin_right(layout.margin.right)
        .margin_top(layout.margin.top)
        .margin_bottom(layout.margin.bottom);
    if layout.show_axes {
        builder.x_label_area_size(30).y_label_area_size(40);
    }
    if let Some(title) = &layout.title {
        builder.caption(title, ("sans-serif", 20).into_font());
    }

    let mut chart = builder
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(draw_error)?;

    if layout.show_axes {
        chart
            .configure_mesh()
            .x_desc(layout.x_title.as_str())
            .y_desc(layout.y_title.as_str())
            .draw()
            .map_err(draw_error)?;
    }

    for trace in &plot.traces {
        let style = trace.color.stroke_width(trace.line_width);
        for segment in trace.series.segments() {
            let segment: Vec<(f64, f64)> = segment
                .into_iter()
                .map(|point| clamp_point(point, &x_range, &y_range))
                .collect();
            if segment.len() == 1 {
                // An isolated sample has no neighbour to connect to
                chart
                    .draw_series(
                        segment
                            .iter()
                            .map(|&point| Circle::new(point, trace.line_width, style.filled())),
                    )
                    .map_err(draw_error)?;
            } else {
                chart
                    .draw_series(LineSeries::new(segment, style))
                    .map_err(draw_error)?;
            }
        }
    }

    Ok(())
}
