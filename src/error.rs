use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FootprintError {
    #[error("invalid numeric input: {0:?}")]
    InvalidInput(String),
    #[error("'{column}' column not found in {}", path.display())]
    MissingColumn { column: &'static str, path: PathBuf },
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
    #[error("CSV failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to decode chart image: {0}")]
    Image(#[from] image::ImageError),
    #[error("chart rendering failed: {0}")]
    Chart(String),
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

impl FootprintError {
    /// True for errors caused by a store whose layout is not ours.
    pub fn is_data_error(&self) -> bool {
        matches!(self, FootprintError::MissingColumn { .. })
    }
}
