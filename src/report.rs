use image::GenericImageView;
use log::{debug, info};
use printpdf::{BuiltinFont, Image, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use crate::error::FootprintError;
use crate::footprint::{display_decimal, ClientRecord};

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

const PAGE_WIDTH_PT: f64 = 612.0;
const PAGE_HEIGHT_PT: f64 = 792.0;
const TITLE_X_PT: f64 = 200.0;
const TITLE_Y_PT: f64 = PAGE_HEIGHT_PT - 40.0;
const BODY_TOP_PT: f64 = PAGE_HEIGHT_PT - 80.0;
const LEFT_MARGIN_PT: f64 = 50.0;
const CHART_BOX_PT: (f64, f64) = (500.0, 200.0);

const TITLE_FONT_SIZE: u8 = 16;
const BODY_FONT_SIZE: u8 = 12;

pub const REPORT_TITLE: &str = "Carbon Footprint Report";
pub const CHART_LABEL: &str = "Carbon Footprint Comparison Graph:";
pub const SUGGESTIONS: [&str; 3] = [
    "- Use energy-efficient appliances.",
    "- Carpool or use public transport.",
    "- Recycle and reduce waste.",
];

/// One piece of page content, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Bold heading at the fixed title position.
    Title(String),
    /// Body line; the cursor moves down by `advance` points afterwards.
    Line { text: String, advance: f64 },
    /// Image fitted into the chart box whose bottom edge is the cursor.
    Chart(PathBuf),
}

impl Block {
    fn line(text: impl Into<String>, advance: f64) -> Self {
        Block::Line { text: text.into(), advance }
    }
}

/// Content of the report for `record`, with the chart section only when
/// `chart` is given.
pub fn report_blocks(record: &ClientRecord, chart: Option<&Path>) -> Vec<Block> {
    let mut blocks = vec![
        Block::Title(REPORT_TITLE.to_string()),
        Block::line(format!("Client: {}", record.client), 20.0),
        Block::line(format!("Energy: {} kWh", display_decimal(record.energy_kwh)), 20.0),
        Block::line(format!("Transport: {} km", display_decimal(record.transport_km)), 20.0),
        Block::line(format!("Waste: {} kg", display_decimal(record.waste_kg)), 20.0),
        Block::line(format!("Footprint: {} kg CO2", display_decimal(record.total_footprint)), 30.0),
        Block::line("Suggestions:", 20.0),
        Block::line(SUGGESTIONS[0], 15.0),
        Block::line(SUGGESTIONS[1], 15.0),
        Block::line(SUGGESTIONS[2], 40.0),
    ];
    if let Some(path) = chart {
        blocks.push(Block::line(CHART_LABEL, CHART_BOX_PT.1));
        blocks.push(Block::Chart(path.to_path_buf()));
    }
    blocks
}

/// Largest size with the image's aspect ratio that fits in `bounds`.
pub fn fit_within(pixels: (u32, u32), bounds: (f64, f64)) -> (f64, f64) {
    let (width, height) = (pixels.0.max(1) as f64, pixels.1.max(1) as f64);
    let scale = (bounds.0 / width).min(bounds.1 / height);
    (width * scale, height * scale)
}

fn mm_from_pt(value: f64) -> Mm {
    Mm(value * MM_PER_INCH / POINTS_PER_INCH)
}

fn pdf_error(err: impl std::fmt::Debug) -> FootprintError {
    FootprintError::Pdf(format!("{:?}", err))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub path: PathBuf,
    pub chart_embedded: bool,
}

/// Writes per-client reports, embedding the trend chart when it is on disk.
/// Pages are US Letter set in the builtin Helvetica faces, so no font files
/// are read.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    chart_path: PathBuf,
}

impl ReportGenerator {
    pub fn new(chart_path: impl Into<PathBuf>) -> Self {
        ReportGenerator { chart_path: chart_path.into() }
    }

    pub fn generate(&self, record: &ClientRecord, output_path: &Path) -> Result<ReportSummary, FootprintError> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let chart = self.chart_path.is_file().then_some(self.chart_path.as_path());
        let blocks = report_blocks(record, chart);

        let (document, page, layer) = PdfDocument::new(
            REPORT_TITLE,
            mm_from_pt(PAGE_WIDTH_PT),
            mm_from_pt(PAGE_HEIGHT_PT),
            "Report",
        );
        let regular = document.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = document.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        let layer = document.get_page(page).get_layer(layer);

        draw_blocks(&layer, &blocks, &regular, &bold)?;

        let file = File::create(output_path)?;
        document.save(&mut BufWriter::new(file)).map_err(pdf_error)?;
        info!("Wrote report for {} to {}", record.client, output_path.display());

        Ok(ReportSummary {
            path: output_path.to_path_buf(),
            chart_embedded: chart.is_some(),
        })
    }
}

fn draw_blocks(
    layer: &PdfLayerReference,
    blocks: &[Block],
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) -> Result<(), FootprintError> {
    let mut cursor = BODY_TOP_PT;
    for block in blocks {
        match block {
            Block::Title(text) => {
                layer.use_text(text.clone(), TITLE_FONT_SIZE.into(), mm_from_pt(TITLE_X_PT), mm_from_pt(TITLE_Y_PT), bold);
            }
            Block::Line { text, advance } => {
                layer.use_text(text.clone(), BODY_FONT_SIZE.into(), mm_from_pt(LEFT_MARGIN_PT), mm_from_pt(cursor), regular);
                cursor -= advance;
            }
            Block::Chart(path) => draw_chart(layer, path, cursor)?,
        }
    }
    Ok(())
}

fn draw_chart(layer: &PdfLayerReference, path: &Path, box_bottom: f64) -> Result<(), FootprintError> {
    let chart = image::open(path)?;
    let pixels = chart.dimensions();
    let (width, height) = fit_within(pixels, CHART_BOX_PT);
    let scale = width / pixels.0.max(1) as f64;
    let x = LEFT_MARGIN_PT + (CHART_BOX_PT.0 - width) / 2.0;
    let y = box_bottom + (CHART_BOX_PT.1 - height) / 2.0;
    debug!("Placing {}x{} px chart as {:.1}x{:.1} pt at ({:.1}, {:.1})", pixels.0, pixels.1, width, height, x, y);

    // At 72 dpi one pixel is one point, so `scale` maps pixels straight to the box.
    Image::from_dynamic_image(&chart).add_to_layer(
        layer.clone(),
        Some(mm_from_pt(x)),
        Some(mm_from_pt(y)),
        None,
        Some(scale),
        Some(scale),
        Some(POINTS_PER_INCH),
    );
    Ok(())
}
