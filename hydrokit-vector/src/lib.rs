/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 14/10/2026
Last Modified: 14/10/2026
License: MIT
*/

pub mod shapefile;

pub use crate::shapefile::{read_header, ShapeType, ShapefileHeader};
