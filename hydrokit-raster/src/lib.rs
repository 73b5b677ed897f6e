/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT
*/

mod arcascii_raster;
pub mod geotiff;

use self::arcascii_raster::*;
use self::geotiff::*;
use hydrokit_common::utils::Endianness;
use std::f64;
use std::io::Error;
use std::io::ErrorKind;
use std::ops::Index;
use std::path::Path;

/// Raster is an in-memory, single-band grid that abstracts over the supported
/// raster formats (GeoTIFF and ArcGIS ASCII grids). Cell values are held as
/// `f64` in row-major order; the on-disk data type is kept in `configs.data_type`.
///
/// Examples:
///
/// ```ignore
/// // Read an existing raster file
/// let input = Raster::new(&input_file, "r")?;
///
/// // Create a new raster file with the dimensions
/// // and location of an existing file.
/// let mut output = Raster::initialize_using_file(&output_file, &input);
/// ```
#[derive(Default, Clone)]
pub struct Raster {
    pub file_name: String,
    pub file_mode: String,
    pub raster_type: RasterType,
    pub configs: RasterConfigs,
    /// Whether GeoTIFF output is DEFLATE-compressed.
    pub compress: bool,
    data: Vec<f64>,
}

impl Index<(isize, isize)> for Raster {
    type Output = f64;

    fn index(&self, index: (isize, isize)) -> &f64 {
        let (row, column) = index;
        if row < 0 || column < 0 {
            return &self.configs.nodata;
        }
        let (r, c) = (row as usize, column as usize);
        if r >= self.configs.rows || c >= self.configs.columns {
            return &self.configs.nodata;
        }
        &self.data[r * self.configs.columns + c]
    }
}

impl Raster {
    /// Creates an in-memory `Raster` object. The data are either
    /// read from an existing file (`file_name`; `file_mode` is 'r') or
    /// prepared for new file creation (`file_mode` is 'w'). The raster format
    /// is determined by the file extension of the `file_name` string.
    ///
    /// To create a new `Raster` file, most applications should prefer the
    /// `initialize_using_config` or `initialize_using_file` functions instead.
    pub fn new(file_name: &str, file_mode: &str) -> Result<Raster, Error> {
        let fm = file_mode.to_lowercase();
        let mut r = Raster {
            file_name: file_name.to_string(),
            file_mode: fm.clone(),
            raster_type: get_raster_type_from_file(file_name),
            ..Default::default()
        };
        if !r.file_mode.contains('r') {
            return Ok(r);
        }
        if !Path::new(file_name).exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("Raster file {} does not exist.", file_name),
            ));
        }
        match r.raster_type {
            RasterType::ArcAscii => read_arcascii(&r.file_name, &mut r.configs, &mut r.data)?,
            RasterType::GeoTiff => read_geotiff(&r.file_name, &mut r.configs, &mut r.data)?,
            RasterType::Unknown => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unrecognized raster type: {}", file_name),
                ))
            }
        }
        if r.data.len() != r.configs.rows * r.configs.columns {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Raster {} holds {} values but declares {} rows and {} columns.",
                    file_name,
                    r.data.len(),
                    r.configs.rows,
                    r.configs.columns
                ),
            ));
        }
        r.update_min_max();
        Ok(r)
    }

    /// Creates a new in-memory `Raster` object with grid extent and location
    /// based on specified configurations contained within a `RasterConfigs`.
    /// Every cell is initialized to the no-data value.
    pub fn initialize_using_config(file_name: &str, configs: &RasterConfigs) -> Raster {
        let new_file_name = if Path::new(file_name).extension().is_some() {
            file_name.to_string()
        } else {
            // no extension provided; default to .tif
            format!("{}.tif", file_name)
        };
        let mut output = Raster {
            raster_type: get_raster_type_from_file(&new_file_name),
            file_name: new_file_name,
            file_mode: "w".to_string(),
            configs: configs.clone(),
            ..Default::default()
        };
        output.configs.metadata = vec![];
        output.configs.minimum = f64::INFINITY;
        output.configs.maximum = f64::NEG_INFINITY;
        output.data = vec![output.configs.nodata; output.configs.rows * output.configs.columns];
        output
    }

    /// Creates a new in-memory `Raster` object with grid extent and location based
    /// on an existing `Raster`. The georeferencing profile is copied verbatim.
    pub fn initialize_using_file(file_name: &str, input: &Raster) -> Raster {
        let mut output = Raster::initialize_using_config(file_name, &input.configs);
        output.compress = input.compress;
        output
    }

    /// Returns the file name of the `Raster`, without the directory and file extension.
    pub fn get_short_filename(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string()
    }

    /// True when `value` is this raster's no-data sentinel. A NaN sentinel
    /// matches NaN cells.
    pub fn is_nodata(&self, value: f64) -> bool {
        value == self.configs.nodata || (self.configs.nodata.is_nan() && value.is_nan())
    }

    /// Returns the value contained within a grid cell specified
    /// by `row` and `column`. Cells off the grid return the no-data value.
    pub fn get_value(&self, row: isize, column: isize) -> f64 {
        self[(row, column)]
    }

    pub fn set_value(&mut self, row: isize, column: isize, value: f64) {
        if column >= 0 && row >= 0 {
            let c = column as usize;
            let r = row as usize;
            if c < self.configs.columns && r < self.configs.rows {
                let idx = r * self.configs.columns + c;
                self.data[idx] = value;
            }
        }
    }

    pub fn set_row_data(&mut self, row: isize, values: Vec<f64>) {
        if row < 0 || row as usize >= self.configs.rows {
            return;
        }
        let start = row as usize * self.configs.columns;
        let n = values.len().min(self.configs.columns);
        self.data[start..start + n].copy_from_slice(&values[..n]);
    }

    pub fn get_row_data(&self, row: isize) -> Vec<f64> {
        if row < 0 || row as usize >= self.configs.rows {
            return vec![self.configs.nodata; self.configs.columns];
        }
        let start = row as usize * self.configs.columns;
        self.data[start..start + self.configs.columns].to_vec()
    }

    /// Replaces every cell value. `values` must hold `rows * columns` values.
    pub fn set_data(&mut self, values: Vec<f64>) -> Result<(), Error> {
        if values.len() != self.num_cells() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Rasters must have the same dimensions and extent.",
            ));
        }
        self.data = values;
        Ok(())
    }

    pub fn get_data(&self) -> &[f64] {
        &self.data
    }

    pub fn update_min_max(&mut self) {
        self.configs.minimum = f64::INFINITY;
        self.configs.maximum = f64::NEG_INFINITY;
        for &value in &self.data {
            if !self.is_nodata(value) && !value.is_nan() {
                if value < self.configs.minimum {
                    self.configs.minimum = value;
                }
                if value > self.configs.maximum {
                    self.configs.maximum = value;
                }
            }
        }
    }

    pub fn num_cells(&self) -> usize {
        self.configs.rows * self.configs.columns
    }

    pub fn num_valid_cells(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }

    pub fn write(&mut self) -> Result<(), Error> {
        if !self.file_mode.contains('w') {
            return Err(Error::new(
                ErrorKind::Other,
                "Cannot write raster that is not created in write mode ('w').",
            ));
        }
        self.update_min_max();
        match self.raster_type {
            RasterType::ArcAscii => write_arcascii(self),
            RasterType::GeoTiff => write_geotiff(self),
            RasterType::Unknown => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Unrecognized raster type: {}", self.file_name),
            )),
        }
    }

    pub fn add_metadata_entry(&mut self, value: String) {
        self.configs.metadata.push(value);
    }
}

#[derive(Debug, Clone)]
pub struct RasterConfigs {
    pub title: String,
    pub rows: usize,
    pub columns: usize,
    pub nodata: f64,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub endian: Endianness,
    pub data_type: DataType,
    pub pixel_is_area: bool,
    pub epsg_code: u16,
    pub model_tiepoint: Vec<f64>,
    pub model_pixel_scale: [f64; 3],
    pub model_transformation: [f64; 16],
    pub geo_key_directory: Vec<u16>,
    pub geo_double_params: Vec<f64>,
    pub geo_ascii_params: String,
    pub metadata: Vec<String>,
}

impl Default for RasterConfigs {
    fn default() -> RasterConfigs {
        RasterConfigs {
            title: String::new(),
            rows: 0,
            columns: 0,
            nodata: -32768.0,
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
            resolution_x: f64::NEG_INFINITY,
            resolution_y: f64::NEG_INFINITY,
            minimum: f64::INFINITY,
            maximum: f64::NEG_INFINITY,
            endian: Endianness::LittleEndian,
            data_type: DataType::Unknown,
            pixel_is_area: true,
            epsg_code: 0u16,
            model_tiepoint: vec![],
            model_pixel_scale: [0f64; 3],
            model_transformation: [0f64; 16],
            geo_key_directory: vec![],
            geo_double_params: vec![],
            geo_ascii_params: String::new(),
            metadata: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterType {
    Unknown,
    ArcAscii,
    GeoTiff,
}

impl Default for RasterType {
    fn default() -> RasterType {
        RasterType::Unknown
    }
}

fn get_raster_type_from_file(file_name: &str) -> RasterType {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "tif" | "tiff" | "gtif" => RasterType::GeoTiff,
        "asc" | "txt" => RasterType::ArcAscii,
        _ => RasterType::Unknown,
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DataType {
    F64,
    F32,
    I64,
    I32,
    I16,
    I8,
    U64,
    U32,
    U16,
    U8,
    Unknown,
}

impl Default for DataType {
    fn default() -> DataType {
        DataType::Unknown
    }
}

impl DataType {
    pub fn get_data_size(&self) -> usize {
        match *self {
            DataType::F64 | DataType::I64 | DataType::U64 => 8usize,
            DataType::F32 | DataType::I32 | DataType::U32 => 4usize,
            DataType::I16 | DataType::U16 => 2usize,
            DataType::I8 | DataType::U8 => 1usize,
            DataType::Unknown => 0usize,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(*self, DataType::F64 | DataType::F32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_configs() -> RasterConfigs {
        RasterConfigs {
            rows: 2,
            columns: 3,
            nodata: -9999.0,
            north: 20.0,
            south: 0.0,
            east: 30.0,
            west: 0.0,
            resolution_x: 10.0,
            resolution_y: 10.0,
            data_type: DataType::I16,
            ..Default::default()
        }
    }

    #[test]
    fn raster_type_follows_extension() {
        assert_eq!(get_raster_type_from_file("dem.tif"), RasterType::GeoTiff);
        assert_eq!(get_raster_type_from_file("DEM.TIFF"), RasterType::GeoTiff);
        assert_eq!(get_raster_type_from_file("dem.asc"), RasterType::ArcAscii);
        assert_eq!(get_raster_type_from_file("dem.dep"), RasterType::Unknown);
    }

    #[test]
    fn new_raster_starts_as_nodata() {
        let r = Raster::initialize_using_config("out", &small_configs());
        assert_eq!(r.file_name, "out.tif");
        assert_eq!(r.raster_type, RasterType::GeoTiff);
        assert_eq!(r.num_cells(), 6);
        assert_eq!(r.num_valid_cells(), 0);
        assert_eq!(r.get_value(1, 2), -9999.0);
    }

    #[test]
    fn off_grid_reads_return_nodata() {
        let mut r = Raster::initialize_using_config("out.tif", &small_configs());
        r.set_value(0, 0, 5.0);
        assert_eq!(r[(0, 0)], 5.0);
        assert_eq!(r.get_value(-1, 0), -9999.0);
        assert_eq!(r.get_value(0, 3), -9999.0);
        r.set_value(5, 5, 1.0);
        r.set_value(-1, 0, 1.0);
        assert_eq!(r.num_valid_cells(), 1);
        assert_eq!(r.configs.nodata, -9999.0);
    }

    #[test]
    fn rows_are_set_and_read_back() {
        let mut r = Raster::initialize_using_config("out.tif", &small_configs());
        r.set_row_data(1, vec![1.0, 2.0, 3.0]);
        assert_eq!(r.get_row_data(1), vec![1.0, 2.0, 3.0]);
        assert_eq!(r.get_row_data(0), vec![-9999.0; 3]);
        r.update_min_max();
        assert_eq!(r.configs.minimum, 1.0);
        assert_eq!(r.configs.maximum, 3.0);
    }

    #[test]
    fn nan_sentinel_matches_nan_cells() {
        let mut configs = small_configs();
        configs.nodata = f64::NAN;
        let r = Raster::initialize_using_config("out.tif", &configs);
        assert!(r.is_nodata(f64::NAN));
        assert!(!r.is_nodata(0.0));
    }

    #[test]
    fn set_data_checks_dimensions() {
        let mut r = Raster::initialize_using_config("out.tif", &small_configs());
        assert!(r.set_data(vec![0.0; 5]).is_err());
        assert!(r.set_data(vec![0.0; 6]).is_ok());
    }

    #[test]
    fn reading_a_missing_file_is_not_found() {
        let err = Raster::new("/definitely/not/here.tif", "r").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn read_mode_raster_refuses_to_write() {
        let mut r = Raster::new("whatever.tif", "w").unwrap();
        r.file_mode = "r".to_string();
        assert!(r.write().is_err());
    }
}
