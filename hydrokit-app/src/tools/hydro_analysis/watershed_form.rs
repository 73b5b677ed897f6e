/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 15/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::pipeline::WatershedPipeline;
use hydrokit_vector::read_header;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_THRESHOLD: &str = "500";

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please select all required inputs: no DEM was given.")]
    MissingDem,

    #[error("Please select all required inputs: no output folder was given.")]
    MissingOutputFolder,

    #[error("Please select all required inputs: no WhiteboxTools directory was given.")]
    MissingWhiteboxDir,

    #[error("Please select all required inputs: pour points are enabled but no file was given.")]
    MissingPourPoints,

    #[error("The stream threshold must be a positive whole number of cells, not '{0}'.")]
    InvalidThreshold(String),

    #[error("The DEM {} does not exist.", .0.display())]
    DemNotFound(PathBuf),

    #[error("The output folder {} is not a directory.", .0.display())]
    OutputFolderNotDirectory(PathBuf),

    #[error("The pour-points file {} does not exist.", .0.display())]
    PourPointsNotFound(PathBuf),

    #[error("The pour-points file {} could not be read as a shapefile: {message}", .path.display())]
    PourPointsUnreadable { path: PathBuf, message: String },

    #[error("The pour-points file {} holds {shape_type} geometries; point geometries are required.", .path.display())]
    PourPointsNotPoints { path: PathBuf, shape_type: String },
}

impl From<FormError> for io::Error {
    fn from(err: FormError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
    }
}

/// The optional pour-points input. Switching it on or off always clears
/// the path, and a path can only be entered while it is on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PourPointsField {
    enabled: bool,
    path: String,
}

impl PourPointsField {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.path.clear();
    }

    /// Ignored while the field is disabled.
    pub fn set_path(&mut self, path: &str) {
        if self.enabled {
            self.path = path.to_string();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_editable(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Inputs to a watershed delineation run, held as entered.
#[derive(Debug, Clone, PartialEq)]
pub struct WatershedForm {
    pub whitebox_dir: String,
    pub dem: String,
    pub output_folder: String,
    pub stream_threshold: String,
    pub pour_points: PourPointsField,
}

impl Default for WatershedForm {
    fn default() -> WatershedForm {
        WatershedForm {
            whitebox_dir: String::new(),
            dem: String::new(),
            output_folder: String::new(),
            stream_threshold: DEFAULT_THRESHOLD.to_string(),
            pour_points: PourPointsField::default(),
        }
    }
}

impl WatershedForm {
    pub fn new() -> WatershedForm {
        WatershedForm::default()
    }

    /// Checks every input and builds the pipeline they describe. Required
    /// fields are checked first, then the threshold, then the files.
    pub fn validate(&self) -> Result<WatershedPipeline, FormError> {
        if self.dem.trim().is_empty() {
            return Err(FormError::MissingDem);
        }
        if self.output_folder.trim().is_empty() {
            return Err(FormError::MissingOutputFolder);
        }
        if self.whitebox_dir.trim().is_empty() {
            return Err(FormError::MissingWhiteboxDir);
        }
        if self.pour_points.is_enabled() && self.pour_points.path().trim().is_empty() {
            return Err(FormError::MissingPourPoints);
        }

        let threshold = match self.stream_threshold.trim().parse::<u64>() {
            Ok(t) if t > 0 => t,
            _ => return Err(FormError::InvalidThreshold(self.stream_threshold.clone())),
        };

        // WhiteboxTools resolves bare file names against its working
        // directory, which is the output folder, so every path is made absolute.
        let dem = PathBuf::from(self.dem.trim());
        if !dem.is_file() {
            return Err(FormError::DemNotFound(dem));
        }
        let dem = fs::canonicalize(&dem).map_err(|_| FormError::DemNotFound(dem))?;
        let output_dir = PathBuf::from(self.output_folder.trim());
        if !output_dir.is_dir() {
            return Err(FormError::OutputFolderNotDirectory(output_dir));
        }
        let output_dir = fs::canonicalize(&output_dir)
            .map_err(|_| FormError::OutputFolderNotDirectory(output_dir))?;

        let pour_points = if self.pour_points.is_enabled() {
            let path = PathBuf::from(self.pour_points.path().trim());
            check_pour_points(&path)?;
            Some(fs::canonicalize(&path).map_err(|_| FormError::PourPointsNotFound(path))?)
        } else {
            None
        };

        Ok(WatershedPipeline::new(dem, output_dir, threshold, pour_points))
    }
}

fn check_pour_points(path: &Path) -> Result<(), FormError> {
    if !path.is_file() {
        return Err(FormError::PourPointsNotFound(path.to_path_buf()));
    }
    let header = read_header(path).map_err(|e| FormError::PourPointsUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if !header.shape_type.is_point_type() {
        return Err(FormError::PourPointsNotPoints {
            path: path.to_path_buf(),
            shape_type: header.shape_type.to_string(),
        });
    }
    Ok(())
}
