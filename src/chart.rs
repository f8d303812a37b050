use crate::error::{PipelineError, Result};
use crate::structs::{ChartKind, Summaries, SummaryTable};
use log::debug;
use plotters::prelude::*;
use plotters::style::register_font;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Pixel size of every chart image.
pub const CHART_SIZE: (u32, u32) = (800, 400);

const FONT_FAMILY: &str = "sans-serif";
pub(crate) static FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
static FONT_READY: OnceLock<bool> = OnceLock::new();

const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);
const LINE_COLOR: RGBColor = RGBColor(221, 132, 82);

/// Renders one PNG chart per summary into `out_dir`.
///
/// # Returns
/// The chart paths in monthly, regional, product order.
pub fn render_charts(summaries: &Summaries, out_dir: &Path) -> Result<Vec<PathBuf>> {
    summaries
        .iter()
        .map(|summary| {
            let path = chart_path(summary, out_dir);
            render_chart(summary, &path)?;
            Ok(path)
        })
        .collect()
}

pub fn chart_path(summary: &SummaryTable, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}.png", summary.dimension.chart_stem()))
}

/// Draws revenue per group as a line (months) or bar (regions, products) chart.
///
/// Groups sit on a categorical x axis in summary order. An empty summary
/// still produces a framed, empty chart.
pub fn render_chart(summary: &SummaryTable, path: &Path) -> Result<()> {
    ensure_font()?;

    let labels: Vec<&str> = summary.rows.iter().map(|r| r.key.as_str()).collect();
    let values: Vec<f64> = summary.rows.iter().map(|r| r.revenue).collect();
    let last_index = (labels.len() as u32).saturating_sub(1);
    let y_max = values.iter().copied().fold(0.0, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(summary), (FONT_FAMILY, 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..last_index).into_segmented(), 0f64..y_top)
        .map_err(chart_error)?;

    let x_formatter = |value: &SegmentValue<u32>| match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    let y_formatter = |value: &f64| compact_amount(*value);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .x_desc(summary.dimension.key_column())
        .y_desc("revenue")
        .axis_desc_style((FONT_FAMILY, 15))
        .label_style((FONT_FAMILY, 13))
        .draw()
        .map_err(chart_error)?;

    match summary.dimension.chart_kind() {
        ChartKind::Bar => {
            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BAR_COLOR.filled())
                        .margin(12)
                        .data(values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
                )
                .map_err(chart_error)?;
        }
        ChartKind::Line => {
            chart
                .draw_series(
                    LineSeries::new(
                        values
                            .iter()
                            .enumerate()
                            .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v)),
                        LINE_COLOR.stroke_width(2),
                    )
                    .point_size(4),
                )
                .map_err(chart_error)?;
        }
    }

    root.present().map_err(chart_error)?;
    debug!("Rendered {}", path.display());
    Ok(())
}

fn chart_title(summary: &SummaryTable) -> &'static str {
    match summary.dimension.chart_kind() {
        ChartKind::Line => "Monthly Sales Trend",
        ChartKind::Bar => summary.dimension.title(),
    }
}

/// Formats an axis amount as `950`, `12.5K` or `3.2M`.
pub fn compact_amount(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

fn ensure_font() -> Result<()> {
    let ready = *FONT_READY
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).is_ok());
    if ready {
        Ok(())
    } else {
        Err(PipelineError::Chart(
            "bundled chart font could not be loaded".to_string(),
        ))
    }
}

fn chart_error<E: std::fmt::Display>(err: E) -> PipelineError {
    PipelineError::Chart(err.to_string())
}
