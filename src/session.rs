use log::{debug, trace};
use std::io::{BufRead, Write};
use crate::csv_handler::RecordStore;
use crate::error::FootprintError;
use crate::footprint::ClientRecord;
use crate::report::{ReportGenerator, ReportSummary};
use crate::settings::Settings;
use crate::trend_chart::{RenderOutcome, TrendRenderer};

#[derive(Debug)]
pub struct SessionSummary {
    pub records: Vec<ClientRecord>,
    /// `None` when the store could not be read as a client table.
    pub chart: Option<RenderOutcome>,
    pub reports: Vec<ReportSummary>,
}

enum Entry {
    Record(ClientRecord),
    Invalid(String),
    EndOfInput,
}

/// Interactive entry loop followed by chart and report generation.
pub struct Session<R, W> {
    settings: Settings,
    store: RecordStore,
    renderer: TrendRenderer,
    reports: ReportGenerator,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(settings: Settings, input: R, output: W) -> Self {
        Session {
            store: RecordStore::new(&settings.store_path),
            renderer: TrendRenderer::new(&settings.chart_path),
            reports: ReportGenerator::new(&settings.chart_path),
            settings,
            input,
            output,
        }
    }

    pub fn run(mut self) -> Result<SessionSummary, FootprintError> {
        let records = self.collect_records()?;
        let chart = self.render_chart()?;

        let mut reports = Vec::with_capacity(records.len());
        for record in &records {
            let path = self.settings.report_path(&record.client);
            let summary = self.reports.generate(record, &path)?;
            if summary.chart_embedded {
                writeln!(self.output, "Added {} to {}", self.renderer.chart_path().display(), summary.path.display())?;
            }
            writeln!(self.output, "PDF Report Created: {}", summary.path.display())?;
            reports.push(summary);
        }
        writeln!(self.output, "All reports generated successfully.")?;

        Ok(SessionSummary { records, chart, reports })
    }

    fn collect_records(&mut self) -> Result<Vec<ClientRecord>, FootprintError> {
        let mut records = Vec::new();
        loop {
            writeln!(self.output, "\nEnter client data:")?;
            let record = match self.read_entry()? {
                Entry::Record(record) => record,
                Entry::Invalid(raw) => {
                    debug!("Rejected numeric entry {:?}", raw);
                    writeln!(self.output, "Invalid input. Please enter numeric values.")?;
                    continue;
                }
                Entry::EndOfInput => break,
            };

            self.store.append(&record)?;
            writeln!(self.output, "Data for {} added to CSV.", record.client)?;
            records.push(record);

            match self.prompt("Add another client? (yes/no): ")? {
                Some(answer) if answer.trim().eq_ignore_ascii_case("yes") => {}
                _ => break,
            }
        }
        debug!("Collected {} records this session", records.len());
        Ok(records)
    }

    fn read_entry(&mut self) -> Result<Entry, FootprintError> {
        let mut values = [0.0; 3];
        for (slot, label) in values.iter_mut().zip(["Energy (kWh): ", "Transport (km): ", "Waste (kg): "]) {
            let Some(raw) = self.prompt(label)? else {
                return Ok(Entry::EndOfInput);
            };
            match parse_decimal(&raw) {
                Ok(value) => *slot = value,
                Err(FootprintError::InvalidInput(raw)) => return Ok(Entry::Invalid(raw)),
                Err(e) => return Err(e),
            }
        }

        let Some(client) = self.prompt("Client Name: ")? else {
            return Ok(Entry::EndOfInput);
        };
        let [energy_kwh, transport_km, waste_kg] = values;
        Ok(Entry::Record(ClientRecord::new(client, energy_kwh, transport_km, waste_kg)))
    }

    fn render_chart(&mut self) -> Result<Option<RenderOutcome>, FootprintError> {
        match self.renderer.render_store(&self.store) {
            Ok(RenderOutcome::NoData) => {
                writeln!(self.output, "No data found! Run the program and add client data first.")?;
                Ok(Some(RenderOutcome::NoData))
            }
            Ok(RenderOutcome::Rendered(path)) => {
                writeln!(self.output, "Graph saved as '{}'.", path.display())?;
                Ok(Some(RenderOutcome::Rendered(path)))
            }
            Err(e) if e.is_data_error() => {
                writeln!(self.output, "Error: {}", e)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Prints `label` and reads one line without its terminator. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>, FootprintError> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            trace!("End of input at prompt {:?}", label);
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// Parses a user-entered decimal, ignoring surrounding whitespace.
pub fn parse_decimal(raw: &str) -> Result<f64, FootprintError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FootprintError::InvalidInput(raw.to_string()))
}
