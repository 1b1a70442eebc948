use log::{debug, info, warn};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use crate::error::FootprintError;
use crate::footprint::ClientRecord;

/// Header of the store, in write order.
pub const COLUMNS: [&str; 5] = ["Client", "energy_kwh", "transport_km", "waste_kg", "total_footprint"];

/// Append-only CSV file holding every submitted client record.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn is_blank(&self) -> Result<bool, FootprintError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Appends one record, writing the header first when the file is new.
    pub fn append(&self, record: &ClientRecord) -> Result<(), FootprintError> {
        let write_header = self.is_blank()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        info!("Appended record for {} to {}", record.client, self.path.display());
        Ok(())
    }

    /// Loads every record in file order. The header is validated before any
    /// row is read; rows that fail to parse are skipped.
    pub fn load_all(&self) -> Result<Vec<ClientRecord>, FootprintError> {
        if self.is_blank()? {
            debug!("Store {} is absent or empty", self.path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        debug!("Store columns: {:?}", headers);

        for column in COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(FootprintError::MissingColumn {
                    column,
                    path: self.path.clone(),
                });
            }
        }

        let records: Vec<ClientRecord> = reader
            .into_deserialize()
            .filter_map(|result| match result {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Failed to parse a record from {}: {}. Skipping invalid record.", self.path.display(), e);
                    None
                }
            })
            .collect();
        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}
