use std::path::Path;

use log::info;

use crate::config::ExtractOptions;
use crate::errors::ExtractResult;
use crate::extractor;
use crate::output::Extraction;
use crate::raster::RasterSource;
use crate::utils::logger::Logger;
use crate::vector::SpatialInput;

/// Main interface to the ZonalKit library
pub struct ZonalKit {
    logger: Logger,
}

impl ZonalKit {
    /// Create a new ZonalKit instance
    ///
    /// # Arguments
    /// * `log_file` - Optional path to log file, defaults to "zonalkit.log"
    ///
    /// # Returns
    /// A ZonalKit instance or an error if the log file cannot be created
    pub fn new(log_file: Option<&str>) -> ExtractResult<Self> {
        let log_path = log_file.unwrap_or("zonalkit.log");
        let logger = Logger::new(log_path)?;
        Ok(ZonalKit { logger })
    }

    /// Extract a time series and record a summary in the log file
    ///
    /// # Arguments
    /// * `stack` - Raster stack with dated bands
    /// * `spatial` - Features or a path to a GeoJSON feature collection
    /// * `options` - Extraction options
    ///
    /// # Returns
    /// The extraction and its warnings, or the first fatal error
    pub fn extract<S: RasterSource + ?Sized>(
        &self,
        stack: &S,
        spatial: impl Into<SpatialInput>,
        options: &ExtractOptions,
    ) -> ExtractResult<Extraction> {
        let result = extractor::extract_time_series(stack, spatial, options);

        match &result {
            Ok(extraction) => {
                let (dates, columns) = match &extraction.output {
                    Some(output) => (output.row_count(), output.column_names()),
                    None => (0, Vec::new()),
                };
                self.logger.log_extraction_summary(dates, &columns, &extraction.warnings)?;
            },
            Err(e) => self.logger.log(&format!("Extraction failed: {}", e))?,
        }

        result
    }

    /// Extract a time series and write it as CSV
    ///
    /// Writes nothing when the date window selects no band.
    ///
    /// # Returns
    /// The warnings raised during extraction
    pub fn extract_to_csv<S: RasterSource + ?Sized, P: AsRef<Path>>(
        &self,
        stack: &S,
        spatial: impl Into<SpatialInput>,
        options: &ExtractOptions,
        output_path: P,
    ) -> ExtractResult<Vec<String>> {
        let extraction = self.extract(stack, spatial, options)?;

        if let Some(output) = extraction.output {
            output.into_table().write_csv(output_path.as_ref())?;
            info!("Wrote extraction to {}", output_path.as_ref().display());
        }

        Ok(extraction.warnings)
    }
}
