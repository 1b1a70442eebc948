use log::{debug, info, warn};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::register_font;
use plotters_backend::{BackendColor, BackendCoord, BackendTextStyle, DrawingErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Once;
use crate::csv_handler::RecordStore;
use crate::error::FootprintError;
use crate::footprint::ClientRecord;

pub const CHART_SIZE: (u32, u32) = (1500, 900);

const CHART_FONT_FAMILY: &str = "sans-serif";
static CHART_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
static REGISTER_CHART_FONT: Once = Once::new();

const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);
const ENERGY_COLOR: RGBColor = RGBColor(0, 128, 0);
const TRANSPORT_COLOR: RGBColor = RGBColor(255, 165, 0);
const WASTE_COLOR: RGBColor = RGBColor(255, 0, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(PathBuf),
    NoData,
}

/// Draws the per-client comparison chart to a fixed image path.
#[derive(Debug, Clone)]
pub struct TrendRenderer {
    chart_path: PathBuf,
}

impl TrendRenderer {
    pub fn new(chart_path: impl Into<PathBuf>) -> Self {
        TrendRenderer { chart_path: chart_path.into() }
    }

    pub fn chart_path(&self) -> &Path {
        &self.chart_path
    }

    /// Loads the whole store and renders it. A store with the wrong layout
    /// fails before the image is touched.
    pub fn render_store(&self, store: &RecordStore) -> Result<RenderOutcome, FootprintError> {
        if !store.exists() {
            debug!("Store {} not found", store.path().display());
            return Ok(RenderOutcome::NoData);
        }
        let records = store.load_all()?;
        self.render(&records)
    }

    /// Renders one bar per record plus the three usage lines, in record order.
    /// Nothing is written when `records` is empty.
    pub fn render(&self, records: &[ClientRecord]) -> Result<RenderOutcome, FootprintError> {
        if records.is_empty() {
            debug!("No records to plot, leaving {} untouched", self.chart_path.display());
            return Ok(RenderOutcome::NoData);
        }

        register_chart_font();
        let backend = BitMapBackend::new(&self.chart_path, CHART_SIZE);
        let root = FontSafeBackend::new(backend).into_drawing_area();
        draw_trends(root, records).map_err(|e| FootprintError::Chart(e.to_string()))?;

        info!("Rendered {} clients to {}", records.len(), self.chart_path.display());
        Ok(RenderOutcome::Rendered(self.chart_path.clone()))
    }
}

/// Makes the bundled face the `sans-serif` family every chart text style resolves to.
fn register_chart_font() {
    REGISTER_CHART_FONT.call_once(|| {
        if register_font(CHART_FONT_FAMILY, FontStyle::Normal, CHART_FONT).is_err() {
            warn!("Bundled chart font is not a valid TrueType face; chart text will be skipped");
        }
    });
}

fn upper_bound(records: &[ClientRecord]) -> f64 {
    let max = records
        .iter()
        .flat_map(|r| [r.total_footprint, r.energy_kwh, r.transport_km, r.waste_kg])
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

fn draw_trends<DB>(
    root: DrawingArea<DB, Shift>,
    records: &[ClientRecord],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    let count = records.len();
    let labels: Vec<&str> = records.iter().map(|r| r.client.as_str()).collect();
    let y_max = upper_bound(records);
    debug!("Chart covers {} categories, y up to {:.3}", count, y_max);

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Carbon Footprint Trends", (CHART_FONT_FAMILY, 36.0))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 90)
        .build_cartesian_2d((0..count - 1).into_segmented(), 0.0..y_max)?;

    let label_for = |segment: &SegmentValue<usize>| match segment {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i).map(|s| s.to_string()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .x_label_formatter(&label_for)
        .x_desc("Clients")
        .y_desc("Metrics")
        .draw()?;

    chart
        .draw_series(records.iter().enumerate().map(|(i, record)| {
            let end = if i + 1 < count { SegmentValue::Exact(i + 1) } else { SegmentValue::Last };
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (end, record.total_footprint)],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))?
        .label("Carbon Footprint")
        .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 20, y + 6)], BAR_COLOR.filled()));

    let series: [(&str, RGBColor, fn(&ClientRecord) -> f64); 3] = [
        ("Energy", ENERGY_COLOR, |r| r.energy_kwh),
        ("Transport", TRANSPORT_COLOR, |r| r.transport_km),
        ("Waste", WASTE_COLOR, |r| r.waste_kg),
    ];
    for (label, color, value) in series {
        let points: Vec<(SegmentValue<usize>, f64)> = records
            .iter()
            .enumerate()
            .map(|(i, record)| (SegmentValue::CenterOf(i), value(record)))
            .collect();

        chart
            .draw_series(LineSeries::new(points.iter().cloned(), Color::stroke_width(&color, 2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], Color::stroke_width(&color, 2)));
        chart.draw_series(points.into_iter().map(|point| Circle::new(point, 5, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Passes drawing through to the bitmap, but drops text the font backend
/// cannot produce instead of failing the whole chart.
struct FontSafeBackend<DB> {
    inner: DB,
}

impl<DB> FontSafeBackend<DB> {
    fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: plotters_backend::BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: plotters_backend::BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        match self.inner.draw_text(text, style, pos) {
            Err(DrawingErrorKind::FontError(e)) => {
                warn!("Skipping chart text {:?}: {}", text, e);
                Ok(())
            }
            result => result,
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match self.inner.estimate_text_size(text, style) {
            Err(DrawingErrorKind::FontError(_)) => Ok(estimated_text_extent(text, style.size())),
            result => result,
        }
    }
}

fn estimated_text_extent(text: &str, font_size: f64) -> (u32, u32) {
    let width = (text.chars().count() as f64 * font_size * 0.6).ceil();
    (width as u32, font_size.ceil() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_render_without_records_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TrendRenderer::new(dir.path().join("carbon_trends.png"));

        assert_eq!(renderer.render(&[]).unwrap(), RenderOutcome::NoData);
        assert!(!renderer.chart_path().exists());
    }

    #[test]
    fn test_absent_store_leaves_existing_chart_alone() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("carbon_trends.png");
        fs::write(&chart_path, b"previous").unwrap();
        let store = RecordStore::new(dir.path().join("client_data.csv"));

        let outcome = TrendRenderer::new(&chart_path).render_store(&store).unwrap();
        assert_eq!(outcome, RenderOutcome::NoData);
        assert_eq!(fs::read(&chart_path).unwrap(), b"previous");
    }

    #[test]
    fn test_foreign_store_does_not_touch_chart() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("carbon_trends.png");
        fs::write(&chart_path, b"previous").unwrap();
        let store = RecordStore::new(dir.path().join("client_data.csv"));
        fs::write(store.path(), "name,value\nAcme,1\n").unwrap();

        let err = TrendRenderer::new(&chart_path).render_store(&store).unwrap_err();
        assert!(err.is_data_error());
        assert_eq!(fs::read(&chart_path).unwrap(), b"previous");
    }

    #[test]
    fn test_blank_store_leaves_existing_chart_alone() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("carbon_trends.png");
        let store = RecordStore::new(dir.path().join("client_data.csv"));
        let renderer = TrendRenderer::new(&chart_path);

        for contents in ["", "Client,energy_kwh,transport_km,waste_kg,total_footprint\n"] {
            fs::write(&chart_path, b"previous").unwrap();
            fs::write(store.path(), contents).unwrap();

            assert_eq!(renderer.render_store(&store).unwrap(), RenderOutcome::NoData, "store {:?}", contents);
            assert_eq!(fs::read(&chart_path).unwrap(), b"previous");
        }
    }

    #[test]
    fn test_render_draws_caption_and_axis_text() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TrendRenderer::new(dir.path().join("carbon_trends.png"));
        renderer.render(&[ClientRecord::new("Acme", 10.0, 5.0, 2.0)]).unwrap();

        let image = image::open(renderer.chart_path()).unwrap().to_rgb8();
        let inked = |rows: std::ops::Range<u32>| {
            rows.flat_map(|y| (0..CHART_SIZE.0).map(move |x| (x, y)))
                .filter(|&(x, y)| image.get_pixel(x, y).0 != [255, 255, 255])
                .count()
        };
        assert!(inked(5..70) > 0, "caption was not drawn");
        assert!(inked(800..875) > 0, "x axis text was not drawn");
    }

    #[test]
    fn test_render_writes_png_of_fixed_size() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TrendRenderer::new(dir.path().join("carbon_trends.png"));
        let records = vec![
            ClientRecord::new("Acme", 10.0, 5.0, 2.0),
            ClientRecord::new("Beta", 40.0, 12.0, 6.5),
        ];

        let outcome = renderer.render(&records).unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered(renderer.chart_path().to_path_buf()));

        let image = image::open(renderer.chart_path()).unwrap();
        assert_eq!(image::GenericImageView::dimensions(&image), CHART_SIZE);
    }

    #[test]
    fn test_upper_bound_handles_all_zero_records() {
        assert_eq!(upper_bound(&[ClientRecord::new("Zero", 0.0, 0.0, 0.0)]), 1.0);
        let bound = upper_bound(&[ClientRecord::new("Acme", 10.0, 5.0, 2.0)]);
        assert!((bound - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimated_text_extent() {
        assert_eq!(estimated_text_extent("abcde", 20.0), (60, 20));
    }
}
