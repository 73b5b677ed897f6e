/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 14/10/2026
Last Modified: 16/10/2026
License: MIT
*/
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::prelude::*;
use std::io::{Result, SeekFrom};

/// A seekable reader that decodes multi-byte values in a switchable byte order.
/// Shapefile headers mix big- and little-endian fields, so the order can change
/// part-way through a read.
pub struct ByteOrderReader<R: Read + Seek> {
    is_le: bool,
    reader: R,
    pos: usize,
    len: usize,
}

macro_rules! read_ordered {
    ($name:ident, $t:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$t> {
            self.pos += $size;
            if self.is_le {
                self.reader.$name::<LittleEndian>()
            } else {
                self.reader.$name::<BigEndian>()
            }
        }
    };
}

impl<R: Read + Seek> ByteOrderReader<R> {
    pub fn new(mut reader: R, byte_order: Endianness) -> Result<ByteOrderReader<R>> {
        let len = reader.seek(SeekFrom::End(0))? as usize;
        reader.seek(SeekFrom::Start(0))?;
        Ok(ByteOrderReader {
            is_le: byte_order == Endianness::LittleEndian,
            reader,
            pos: 0usize,
            len,
        })
    }

    pub fn set_byte_order(&mut self, byte_order: Endianness) {
        self.is_le = byte_order == Endianness::LittleEndian;
    }

    pub fn get_byte_order(&self) -> Endianness {
        if self.is_le {
            Endianness::LittleEndian
        } else {
            Endianness::BigEndian
        }
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.reader.seek(SeekFrom::Start(position as u64))?;
        self.pos = position;
        Ok(())
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying stream, in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.pos += 1;
        self.reader.read_u8()
    }

    /// Fills `buf` from the current position.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf)?;
        self.pos += buf.len();
        Ok(())
    }

    read_ordered!(read_u16, u16, 2);
    read_ordered!(read_u32, u32, 4);
    read_ordered!(read_u64, u64, 8);
    read_ordered!(read_i32, i32, 4);
    read_ordered!(read_f64, f64, 8);
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

impl Default for Endianness {
    fn default() -> Endianness {
        Endianness::LittleEndian
    }
}
