use super::tiff_consts::*;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use hydrokit_common::utils::Endianness;
use std::fmt;

/// A decoded image file directory entry. `data` holds the raw bytes of the
/// entry's values, whether they were stored inline or at `offset`.
#[derive(Default, Clone, Debug)]
pub struct Ifd {
    pub tag: u16,
    pub ifd_type: u16,
    pub num_values: u64,
    pub offset: u64,
    pub data: Vec<u8>,
    pub byte_order: Endianness,
}

impl Ifd {
    pub fn new(
        tag: u16,
        ifd_type: u16,
        num_values: u64,
        offset: u64,
        data: Vec<u8>,
        byte_order: Endianness,
    ) -> Ifd {
        Ifd {
            tag,
            ifd_type,
            num_values,
            offset,
            data,
            byte_order,
        }
    }

    fn values<T>(&self, size: usize, le: fn(&[u8]) -> T, be: fn(&[u8]) -> T) -> Vec<T> {
        let read = if self.byte_order == Endianness::LittleEndian {
            le
        } else {
            be
        };
        self.data.chunks_exact(size).map(read).collect()
    }

    pub fn interpret_as_u16(&self) -> Vec<u16> {
        self.values(2, LittleEndian::read_u16, BigEndian::read_u16)
    }

    pub fn interpret_as_u32(&self) -> Vec<u32> {
        self.values(4, LittleEndian::read_u32, BigEndian::read_u32)
    }

    pub fn interpret_as_u64(&self) -> Vec<u64> {
        self.values(8, LittleEndian::read_u64, BigEndian::read_u64)
    }

    pub fn interpret_as_f64(&self) -> Vec<f64> {
        self.values(8, LittleEndian::read_f64, BigEndian::read_f64)
    }

    pub fn interpret_as_ascii(&self) -> String {
        String::from_utf8_lossy(&self.data)
            .trim_end_matches('\0')
            .to_string()
    }

    /// Reads an unsigned integer array stored as SHORT, LONG or LONG8, the
    /// types allowed for dimensions, offsets and byte counts.
    pub fn interpret_as_usize(&self) -> Option<Vec<usize>> {
        match self.ifd_type {
            DT_BYTE => Some(self.data.iter().map(|&v| v as usize).collect()),
            DT_SHORT => Some(self.interpret_as_u16().iter().map(|&v| v as usize).collect()),
            DT_LONG => Some(self.interpret_as_u32().iter().map(|&v| v as usize).collect()),
            DT_TIFF_LONG8 => Some(self.interpret_as_u64().iter().map(|&v| v as usize).collect()),
            _ => None,
        }
    }
}

impl fmt::Display for Ifd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Tag {} (type {}, {} values)",
            self.tag, self.ifd_type, self.num_values
        )
    }
}

/// An entry queued for output. For values that fit in the entry itself
/// `offset` holds the value; otherwise it is the position of the value
/// within the block of larger values that follows the directory.
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub tag: u16,
    pub ifd_type: u16,
    pub num_values: u64,
    pub offset: u64,
}

impl Entry {
    pub fn new(tag: u16, ifd_type: u16, num_values: u64, offset: u64) -> Entry {
        Entry {
            tag,
            ifd_type,
            num_values,
            offset,
        }
    }

    /// True when the entry's value is stored in the four-byte value field
    /// of a classic TIFF directory.
    pub fn is_inline(&self) -> bool {
        field_type_size(self.ifd_type).unwrap_or(usize::MAX) as u64 * self.num_values <= 4
    }
}
