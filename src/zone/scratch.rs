//! Per-call scratch directory for the temporary zone artifacts

use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::errors::ExtractResult;

/// Process-unique directory holding the tagged vector dataset and the
/// zone raster. Dropping it removes both files, whichever way the
/// extraction ends.
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Create the directory under `root`, or the system temp dir
    pub fn new(root: Option<&Path>) -> ExtractResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("zonalkit_");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("Created scratch directory {}", dir.path().display());
        Ok(ScratchSpace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Location of the tagged polygon dataset
    pub fn vector_path(&self) -> PathBuf {
        self.dir.path().join("zones.geojson")
    }

    /// Location of the rasterized zone grid
    pub fn raster_path(&self) -> PathBuf {
        self.dir.path().join("zones.tif")
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        debug!("Removing scratch directory {}", self.dir.path().display());
    }
}
