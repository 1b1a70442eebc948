use log::debug;
use std::error::Error;
use std::io;
use crate::session::Session;
use crate::settings::Settings;

mod csv_handler;
mod error;
mod footprint;
mod report;
mod session;
mod settings;
mod trend_chart;

fn main() {
    env_logger::init();

    let stdin = io::stdin();
    let session = Session::new(Settings::default(), stdin.lock(), io::stdout());
    match session.run() {
        Ok(summary) => debug!(
            "Session stored {} records, chart {:?}, {} reports",
            summary.records.len(),
            summary.chart,
            summary.reports.len()
        ),
        Err(err) => {
            eprintln!("Error: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
