use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::error::AppError;

/// An input table held in memory for the duration of a batch run.
///
/// Read once, mutated only by appending the computed answer column,
/// written once.
#[derive(Debug, Clone)]
pub struct CsvTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl CsvTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        Self::from_csv_reader(&mut reader)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, AppError> {
        let mut reader = csv::Reader::from_reader(reader);
        Self::from_csv_reader(&mut reader)
    }

    fn from_csv_reader<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self, AppError> {
        let headers = reader.headers()?.clone();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        info!(rows = records.len(), columns = headers.len(), "loaded table");
        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    fn column_index(&self, name: &str) -> Result<usize, AppError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| AppError::NotFound(format!("column '{name}' not present in table")))
    }

    /// The per-row seed values from the designated column.
    pub fn column_values(&self, name: &str) -> Result<Vec<String>, AppError> {
        let index = self.column_index(name)?;
        Ok(self
            .records
            .iter()
            .map(|record| record.get(index).unwrap_or_default().to_string())
            .collect())
    }

    /// Append a new column; `values` must carry one cell per row, in row
    /// order. All original columns pass through unchanged.
    pub fn with_answer_column(
        mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<Self, AppError> {
        if values.len() != self.records.len() {
            return Err(AppError::Validation(format!(
                "answer column has {} values for {} rows",
                values.len(),
                self.records.len()
            )));
        }
        if self.column_index(name).is_ok() {
            return Err(AppError::Validation(format!(
                "column '{name}' already present in table"
            )));
        }

        self.headers.push_field(name);
        for (record, value) in self.records.iter_mut().zip(values) {
            record.push_field(&value);
        }
        Ok(self)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(&self.headers)?;
        for record in &self.records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        info!(path = %path.as_ref().display(), rows = self.records.len(), "wrote table");
        Ok(())
    }
}
