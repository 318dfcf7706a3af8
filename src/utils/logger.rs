//! Logger utility for application-wide logging
//!
//! This module provides a file-backed logger that works alongside the
//! `log` facade the library reports through. Extraction runs write a short
//! summary to it so a batch of runs leaves a readable trail on disk.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Custom logger implementation
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
}

impl Logger {
    /// Creates a new logger instance
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be created
    pub fn new<P: AsRef<Path>>(log_file: P) -> io::Result<Self> {
        let file = File::create(log_file.as_ref())?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
        })
    }

    /// Logs a message to the log file
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log
    pub fn log(&self, message: &str) -> io::Result<()> {
        let mut guard = self.file.lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Logs the shape of a finished extraction
    ///
    /// # Arguments
    ///
    /// * `dates` - Number of dates extracted
    /// * `columns` - Column names in output order
    /// * `warnings` - Warnings raised during the run
    pub fn log_extraction_summary(&self, dates: usize, columns: &[String], warnings: &[String]) -> io::Result<()> {
        self.log("Extraction summary:")?;
        self.log(&format!("  Dates: {}", dates))?;
        self.log(&format!("  Columns ({}): {}", columns.len(), columns.join(", ")))?;

        for warning in warnings {
            self.log(&format!("  Warning: {}", warning))?;
        }

        Ok(())
    }
}
