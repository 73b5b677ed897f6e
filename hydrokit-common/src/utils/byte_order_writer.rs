/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 14/10/2026
Last Modified: 16/10/2026
License: MIT
*/
use super::byte_order_reader::Endianness;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::prelude::*;
use std::io::Result;

/// A writer that encodes multi-byte values in a chosen byte order and keeps
/// count of the bytes written, which the TIFF encoder uses to compute offsets.
pub struct ByteOrderWriter<W: Write> {
    is_le: bool,
    writer: W,
    num_bytes_written: usize,
}

macro_rules! write_ordered {
    ($name:ident, $t:ty) => {
        pub fn $name(&mut self, value: $t) -> Result<()> {
            self.num_bytes_written += std::mem::size_of::<$t>();
            if self.is_le {
                self.writer.$name::<LittleEndian>(value)
            } else {
                self.writer.$name::<BigEndian>(value)
            }
        }
    };
}

impl<W: Write> ByteOrderWriter<W> {
    pub fn new(writer: W, byte_order: Endianness) -> ByteOrderWriter<W> {
        ByteOrderWriter {
            is_le: byte_order == Endianness::LittleEndian,
            writer,
            num_bytes_written: 0,
        }
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.num_bytes_written += 1;
        self.writer.write_u8(value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.num_bytes_written += 1;
        self.writer.write_i8(value)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.num_bytes_written += bytes.len();
        self.writer.write_all(bytes)
    }

    write_ordered!(write_u16, u16);
    write_ordered!(write_u32, u32);
    write_ordered!(write_u64, u64);
    write_ordered!(write_i16, i16);
    write_ordered!(write_i32, i32);
    write_ordered!(write_i64, i64);
    write_ordered!(write_f32, f32);
    write_ordered!(write_f64, f64);

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.num_bytes_written
    }

    pub fn is_empty(&self) -> bool {
        self.num_bytes_written == 0
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    pub fn get_inner(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
