//! Extraction results as a plain table or a date-indexed time series

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use crate::config::OutFormat;
use crate::errors::{ExtractError, ExtractResult};
use super::columns::{ColumnOrigin, ColumnSet};

/// Named output column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub origin: ColumnOrigin,
    /// One value per date, `NaN` when missing
    pub values: Vec<f64>,
}

/// Table with a leading date column and one column per feature
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl OutputTable {
    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    /// Number of feature columns, the date column excluded
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value at a row of a named column
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name).and_then(|c| c.values.get(row).copied())
    }

    /// Write the table as CSV: `date` first, missing values as empty cells
    pub fn write_to<W: Write>(&self, writer: W) -> ExtractResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["date".to_string()];
        header.extend(self.column_names());
        csv_writer.write_record(&header)?;

        for (row, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            for column in &self.columns {
                let value = column.values.get(row).copied().unwrap_or(f64::NAN);
                record.push(if value.is_nan() { String::new() } else { value.to_string() });
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> ExtractResult<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(file)
    }

    pub fn to_csv_string(&self) -> ExtractResult<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExtractError::GenericError(format!("CSV output is not UTF-8: {}", e)))
    }

    pub fn into_time_series(self) -> TimeSeries {
        TimeSeries { index: self.dates, columns: self.columns }
    }
}

/// Feature columns indexed by date
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TimeSeries {
    pub fn new(index: Vec<NaiveDate>, columns: Vec<Column>) -> Self {
        TimeSeries { index, columns }
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value of a column at a date; the first row wins when a date repeats
    pub fn value(&self, date: NaiveDate, name: &str) -> Option<f64> {
        let row = self.index.iter().position(|d| *d == date)?;
        self.column(name).and_then(|c| c.values.get(row).copied())
    }

    /// Rows whose date lies in `[start, end]`
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> TimeSeries {
        let rows: Vec<usize> = (0..self.index.len())
            .filter(|&r| self.index[r] >= start && self.index[r] <= end)
            .collect();

        TimeSeries {
            index: rows.iter().map(|&r| self.index[r]).collect(),
            columns: self.columns.iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    origin: c.origin,
                    values: rows.iter().map(|&r| c.values[r]).collect(),
                })
                .collect(),
        }
    }

    pub fn into_table(self) -> OutputTable {
        OutputTable { dates: self.index, columns: self.columns }
    }
}

/// Result in the requested shape
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutput {
    Table(OutputTable),
    TimeSeries(TimeSeries),
}

impl ExtractionOutput {
    pub fn row_count(&self) -> usize {
        match self {
            ExtractionOutput::Table(t) => t.row_count(),
            ExtractionOutput::TimeSeries(ts) => ts.len(),
        }
    }

    pub fn column_count(&self) -> usize {
        match self {
            ExtractionOutput::Table(t) => t.column_count(),
            ExtractionOutput::TimeSeries(ts) => ts.columns().len(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        let columns = match self {
            ExtractionOutput::Table(t) => &t.columns,
            ExtractionOutput::TimeSeries(ts) => &ts.columns,
        };
        columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn as_table(&self) -> Option<&OutputTable> {
        match self {
            ExtractionOutput::Table(t) => Some(t),
            ExtractionOutput::TimeSeries(_) => None,
        }
    }

    pub fn as_time_series(&self) -> Option<&TimeSeries> {
        match self {
            ExtractionOutput::TimeSeries(ts) => Some(ts),
            ExtractionOutput::Table(_) => None,
        }
    }

    /// Convert to a table whichever shape was requested
    pub fn into_table(self) -> OutputTable {
        match self {
            ExtractionOutput::Table(t) => t,
            ExtractionOutput::TimeSeries(ts) => ts.into_table(),
        }
    }
}

/// Outcome of one extraction call
#[derive(Debug, Clone)]
pub struct Extraction {
    /// `None` when no band fell inside the date window
    pub output: Option<ExtractionOutput>,
    /// Non-fatal degrades, in the order they were raised
    pub warnings: Vec<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.output.is_none()
    }
}

/// Name the keyed columns and shape them as requested
///
/// # Arguments
/// * `dates` - Row dates, ascending
/// * `columns` - Populated column set
/// * `names` - Column name per synthetic identifier, at index `id - 1`
/// * `format` - Requested shape
pub fn assemble(dates: Vec<NaiveDate>, columns: ColumnSet, names: &[String], format: OutFormat) -> ExtractionOutput {
    let columns: Vec<Column> = columns.into_columns()
        .map(|(id, column)| Column {
            name: names.get(id as usize - 1).cloned().unwrap_or_else(|| id.to_string()),
            origin: column.origin,
            values: column.values,
        })
        .collect();

    let table = OutputTable { dates, columns };
    match format {
        OutFormat::Table => ExtractionOutput::Table(table),
        OutFormat::TimeSeries => ExtractionOutput::TimeSeries(table.into_time_series()),
    }
}
