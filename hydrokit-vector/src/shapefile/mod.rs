/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT
*/

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use hydrokit_common::utils::{ByteOrderReader, Endianness};
use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, Error, ErrorKind};
use std::path::Path;

const FILE_CODE: i32 = 9994;
const HEADER_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl Default for ShapeType {
    fn default() -> ShapeType {
        ShapeType::Null
    }
}

impl ShapeType {
    pub fn from_int(value: i32) -> Option<ShapeType> {
        match value {
            0 => Some(ShapeType::Null),
            1 => Some(ShapeType::Point),
            3 => Some(ShapeType::PolyLine),
            5 => Some(ShapeType::Polygon),
            8 => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            31 => Some(ShapeType::MultiPatch),
            _ => None,
        }
    }

    pub fn to_int(&self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    /// True for the point-like geometries that can serve as pour points.
    pub fn is_point_type(&self) -> bool {
        matches!(
            self,
            ShapeType::Point
                | ShapeType::PointZ
                | ShapeType::PointM
                | ShapeType::MultiPoint
                | ShapeType::MultiPointZ
                | ShapeType::MultiPointM
        )
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShapefileHeader {
    pub file_length: i32,      // BigEndian, in 16-bit words
    pub version: i32,          // LittleEndian
    pub shape_type: ShapeType, // LittleEndian
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub m_min: f64,
    pub m_max: f64,
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "shape_type: {}\nversion: {}\nfile_length: {}\nx_min: {}\nx_max: {}\ny_min: {}\ny_max: {}",
            self.shape_type,
            self.version,
            self.file_length,
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max
        )
    }
}

impl ShapefileHeader {
    /// Reads the fixed-length header at the start of a `.shp` file.
    pub fn read<R: Read + Seek>(reader: R) -> Result<ShapefileHeader, Error> {
        // Note: the shapefile format uses mixed endianness, so the reader's
        // byte order is switched part-way through the header.
        let mut bor = ByteOrderReader::new(reader, Endianness::BigEndian)?;
        if bor.len() < HEADER_LENGTH {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "The file is too short to be a shapefile.",
            ));
        }
        bor.seek(0)?;
        let file_code = bor.read_i32()?;
        if file_code != FILE_CODE {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("Unrecognized shapefile file code ({}).", file_code),
            ));
        }
        bor.seek(24)?;
        let file_length = bor.read_i32()?;

        // the rest of the header is in LittleEndian format
        bor.set_byte_order(Endianness::LittleEndian);
        let version = bor.read_i32()?;
        let st = bor.read_i32()?;
        let shape_type = ShapeType::from_int(st).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("Unrecognized shape type ({}).", st),
            )
        })?;

        Ok(ShapefileHeader {
            file_length,
            version,
            shape_type,
            x_min: bor.read_f64()?,
            y_min: bor.read_f64()?,
            x_max: bor.read_f64()?,
            y_max: bor.read_f64()?,
            z_min: bor.read_f64()?,
            z_max: bor.read_f64()?,
            m_min: bor.read_f64()?,
            m_max: bor.read_f64()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_i32::<BigEndian>(FILE_CODE)?;
        for _ in 0..5 {
            writer.write_i32::<BigEndian>(0i32)?;
        }
        writer.write_i32::<BigEndian>(self.file_length)?;
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_i32::<LittleEndian>(self.shape_type.to_int())?;
        for v in [
            self.x_min, self.y_min, self.x_max, self.y_max, self.z_min, self.z_max, self.m_min,
            self.m_max,
        ] {
            writer.write_f64::<LittleEndian>(v)?;
        }
        Ok(())
    }
}

/// Reads the header of the shapefile at `file_name`.
pub fn read_header<P: AsRef<Path>>(file_name: P) -> Result<ShapefileHeader, Error> {
    let f = File::open(file_name)?;
    ShapefileHeader::read(BufReader::new(f))
}
