use crate::chart::{CHART_SIZE, FONT_DATA, chart_path};
use crate::error::{PipelineError, Result};
use crate::structs::{Summaries, SummaryTable};
use log::debug;
use printpdf::path::PaintMode;
use printpdf::{
    Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rect, Rgb, image_crate,
};
use std::{fs::File, io::BufWriter, path::Path};

pub const REPORT_FILE: &str = "summary_report.pdf";

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: f32 = 20.0;
const CONTENT_WIDTH: f32 = 170.0;
const ROW_HEIGHT: f32 = 7.0;
const TABLE_FONT_SIZE: f32 = 9.0;
const MM_PER_PT: f32 = 0.3528;
const MM_PER_INCH: f32 = 25.4;

static BOLD_FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

/// Figures shown in the report's overview line.
#[derive(Debug, Clone, Copy)]
pub struct Overview {
    pub rows: usize,
    pub total_revenue: f64,
}

/// Writes the combined PDF: an overview line, then per summary a heading,
/// a bordered table and the chart found in `chart_dir` (if rendered).
///
/// # Errors
/// Returns `PipelineError::Output` if the file cannot be created,
/// `PipelineError::Chart` if a chart image cannot be decoded, or
/// `PipelineError::Pdf` if the document cannot be serialized.
pub fn write_report(
    summaries: &Summaries,
    overview: Overview,
    chart_dir: &Path,
    title: &str,
    output_path: &Path,
) -> Result<()> {
    let mut report = ReportWriter::new(title)?;
    report.heading(title, 20.0);
    report.line(
        &format!(
            "Rows analysed: {} | Total revenue: {:.2}",
            overview.rows, overview.total_revenue
        ),
        11.0,
    );
    report.gap(6.0);

    for summary in summaries.iter() {
        report.section(summary, &chart_path(summary, chart_dir))?;
    }

    report.save(output_path)?;
    debug!("Wrote {}", output_path.display());
    Ok(())
}

/// Cursor-based page writer; `cursor` is the baseline height in mm from the
/// bottom of the current page.
struct ReportWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor: f32,
}

impl ReportWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        // embedded so labels outside WinAnsi (e.g. Devanagari) render
        let regular = doc.add_external_font(FONT_DATA)?;
        let bold = doc.add_external_font(BOLD_FONT_DATA)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT.0 - MARGIN,
        })
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor - height < MARGIN {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor = PAGE_HEIGHT.0 - MARGIN;
        }
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn heading(&mut self, text: &str, size: f32) {
        let height = size * MM_PER_PT * 1.4;
        self.ensure_space(height);
        self.cursor -= height;
        self.layer.set_fill_color(black());
        self.layer
            .use_text(text, size, Mm(MARGIN), Mm(self.cursor), &self.bold);
    }

    fn line(&mut self, text: &str, size: f32) {
        let height = size * MM_PER_PT * 1.6;
        self.ensure_space(height);
        self.cursor -= height;
        self.layer.set_fill_color(black());
        self.layer
            .use_text(text, size, Mm(MARGIN), Mm(self.cursor), &self.regular);
    }

    fn section(&mut self, summary: &SummaryTable, chart: &Path) -> Result<()> {
        // keep the heading with at least the table header and one row
        self.ensure_space(14.0 * MM_PER_PT * 1.4 + 3.0 * ROW_HEIGHT);
        self.heading(summary.dimension.title(), 14.0);
        self.gap(3.0);

        let header = [
            capitalize(summary.dimension.key_column()),
            "Revenue".to_string(),
            "Orders".to_string(),
            "Units".to_string(),
            "Avg Order".to_string(),
        ];
        self.table_row(&header, true);
        for row in &summary.rows {
            self.table_row(
                &[
                    row.key.clone(),
                    format!("{:.2}", row.revenue),
                    row.orders.to_string(),
                    row.units.to_string(),
                    format!("{:.2}", row.avg_order_value),
                ],
                false,
            );
        }
        self.gap(6.0);

        if chart.exists() {
            self.image(chart)?;
            self.gap(8.0);
        }
        Ok(())
    }

    fn table_row(&mut self, cells: &[String], header: bool) {
        self.ensure_space(ROW_HEIGHT);
        let top = self.cursor;
        let bottom = top - ROW_HEIGHT;
        let cell_width = CONTENT_WIDTH / cells.len() as f32;

        self.layer.set_outline_color(black());
        self.layer.set_outline_thickness(0.5);
        for (index, cell) in cells.iter().enumerate() {
            let left = MARGIN + index as f32 * cell_width;
            let right = left + cell_width;
            let mode = if header {
                self.layer.set_fill_color(grey());
                PaintMode::FillStroke
            } else {
                PaintMode::Stroke
            };
            self.layer
                .add_rect(Rect::new(Mm(left), Mm(bottom), Mm(right), Mm(top)).with_mode(mode));

            let (font, color) = if header {
                (&self.bold, white())
            } else {
                (&self.regular, black())
            };
            let text_width = estimate_text_width(cell, TABLE_FONT_SIZE);
            let x = left + ((cell_width - text_width) / 2.0).max(1.0);
            let y = bottom + (ROW_HEIGHT - TABLE_FONT_SIZE * MM_PER_PT) / 2.0 + 0.5;
            self.layer.set_fill_color(color);
            self.layer
                .use_text(cell.as_str(), TABLE_FONT_SIZE, Mm(x), Mm(y), font);
        }
        self.cursor = bottom;
    }

    fn image(&mut self, path: &Path) -> Result<()> {
        let (width_px, height_px) = CHART_SIZE;
        let height = CONTENT_WIDTH * height_px as f32 / width_px as f32;
        self.ensure_space(height);

        let decoded = image_crate::open(path).map_err(|e| {
            PipelineError::Chart(format!("cannot embed {}: {}", path.display(), e))
        })?;
        let dpi = width_px as f32 / (CONTENT_WIDTH / MM_PER_INCH);
        self.cursor -= height;
        Image::from_dynamic_image(&decoded).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.cursor)),
                dpi: Some(dpi),
                ..ImageTransform::default()
            },
        );
        Ok(())
    }

    fn save(self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PipelineError::output(path, e))?;
        self.doc.save(&mut BufWriter::new(file))?;
        Ok(())
    }
}

/// DejaVu Sans averages a little over half an em per glyph.
fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.55 * MM_PER_PT
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn grey() -> Color {
    Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None))
}
