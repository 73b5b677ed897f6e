pub mod ifd;
pub mod tiff_consts;

use crate::*;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use hydrokit_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use ifd::{Entry, Ifd};
use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib;
use std::collections::HashMap;
use std::f64;
use std::fs::File;
use std::io::{BufReader, BufWriter, Error, ErrorKind, Write};
use tiff_consts::*;

fn invalid(msg: &str) -> Error {
    Error::new(ErrorKind::InvalidData, msg.to_string())
}

fn required_usize(ifd_map: &HashMap<u16, Ifd>, tag: u16, name: &str) -> Result<Vec<usize>, Error> {
    match ifd_map.get(&tag).and_then(|ifd| ifd.interpret_as_usize()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(invalid(&format!(
            "The raster {} value was not read correctly",
            name
        ))),
    }
}

fn first_u16(ifd_map: &HashMap<u16, Ifd>, tag: u16, default: u16) -> u16 {
    ifd_map
        .get(&tag)
        .and_then(|ifd| ifd.interpret_as_u16().first().copied())
        .unwrap_or(default)
}

pub fn read_geotiff(
    file_name: &str,
    configs: &mut RasterConfigs,
    data: &mut Vec<f64>,
) -> Result<(), Error> {
    let f = File::open(file_name)?;

    //////////////////////////
    // Read the TIFF header //
    //////////////////////////
    let br = BufReader::new(f);
    let mut th = ByteOrderReader::<BufReader<File>>::new(br, configs.endian)?;

    let bo_indicator1 = th.read_u8()?;
    let bo_indicator2 = th.read_u8()?;
    if bo_indicator1 == 73 && bo_indicator2 == 73 {
        configs.endian = Endianness::LittleEndian;
    } else if bo_indicator1 == 77 && bo_indicator2 == 77 {
        configs.endian = Endianness::BigEndian;
    } else {
        return Err(invalid(
            "Incorrect TIFF header. Unrecognized byte-order indicator.",
        ));
    }
    th.set_byte_order(configs.endian);

    let is_big_tiff = match th.read_u16()? {
        42 => false,
        43 => true,
        _ => {
            return Err(invalid(
                "Incorrect TIFF header. Unrecognized magic number.",
            ))
        }
    };

    let ifd_offset = if !is_big_tiff {
        th.read_u32()? as usize
    } else {
        // Bytesize of offsets
        if th.read_u16()? != 8 {
            return Err(invalid(
                "Incorrect BigTIFF header. Unsupported bytesize of offsets.",
            ));
        }
        // the next two bytes must be set to zero
        if th.read_u16()? != 0 {
            return Err(invalid("Incorrect BigTIFF header."));
        }
        th.read_u64()? as usize
    };
    if ifd_offset == 0 || ifd_offset >= th.len() {
        return Err(invalid("The TIFF file does not contain an image."));
    }

    //////////////////
    // Read the IFD //
    //////////////////

    // Only the first image directory is read; overviews and extra pages are ignored.
    let mut ifd_map = HashMap::new();
    th.seek(ifd_offset)?;
    let num_directories = if !is_big_tiff {
        th.read_u16()? as u64
    } else {
        th.read_u64()?
    };
    let inline_size = if !is_big_tiff { 4u64 } else { 8u64 };

    for _ in 0..num_directories {
        let tag_id = th.read_u16()?;
        let field_type = th.read_u16()?;

        let num_values = if !is_big_tiff {
            th.read_u32()? as u64
        } else {
            th.read_u64()?
        };

        let value_offset = if !is_big_tiff {
            th.read_u32()? as u64
        } else {
            th.read_u64()?
        };

        let data_size = match field_type_size(field_type) {
            Some(size) => size as u64,
            None => {
                // unknown field types may be skipped
                log::debug!("Skipping tag {} of unknown field type {}", tag_id, field_type);
                continue;
            }
        };

        let num_bytes = data_size * num_values;
        if num_bytes > th.len() as u64 {
            return Err(invalid("Error reading the IFDs."));
        }

        // read the tag data
        let mut tag_data = vec![0u8; num_bytes as usize];
        let cur_pos = th.pos();
        if num_bytes > inline_size {
            // the values are stored at the offset location
            th.seek(value_offset as usize)?;
        } else {
            // the value(s) are contained in the offset
            th.seek(cur_pos - inline_size as usize)?;
        }
        th.read_exact(&mut tag_data)?;
        th.seek(cur_pos)?;

        ifd_map.insert(
            tag_id,
            Ifd::new(
                tag_id,
                field_type,
                num_values,
                value_offset,
                tag_data,
                configs.endian,
            ),
        );
    }

    configs.columns = required_usize(&ifd_map, TAG_IMAGEWIDTH, "Columns")?[0];
    configs.rows = required_usize(&ifd_map, TAG_IMAGELENGTH, "Rows")?[0];
    if configs.columns == 0 || configs.rows == 0 {
        return Err(invalid("The raster has no rows or columns."));
    }

    let bits_per_sample = first_u16(&ifd_map, TAG_BITSPERSAMPLE, 1);
    let compression = first_u16(&ifd_map, TAG_COMPRESSION, COMPRESS_NONE);
    if compression != COMPRESS_NONE
        && compression != COMPRESS_PACKBITS
        && compression != COMPRESS_LZW
        && compression != COMPRESS_DEFLATE
        && compression != COMPRESS_DEFLATE_OLD
    {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "Unsupported compression method ({}). Only PACKBITS, LZW, and DEFLATE are supported.",
                compression
            ),
        ));
    }

    let predictor = first_u16(&ifd_map, TAG_PREDICTOR, PREDICTOR_NONE);
    if predictor != PREDICTOR_NONE && predictor != PREDICTOR_HORIZONTAL {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("Unsupported TIFF predictor ({}).", predictor),
        ));
    }

    let photometric_interp = first_u16(&ifd_map, TAG_PHOTOMETRICINTERPRETATION, PI_BLACKISZERO);
    if photometric_interp != PI_BLACKISZERO && photometric_interp != PI_WHITEISZERO {
        return Err(invalid(
            "Unsupported image format. Only single-band greyscale rasters can be read.",
        ));
    }

    let samples_per_pixel = first_u16(&ifd_map, TAG_SAMPLESPERPIXEL, 1).max(1) as usize;
    let planar_config = first_u16(&ifd_map, TAG_PLANARCONFIGURATION, 1);
    let sample_format = first_u16(&ifd_map, TAG_SAMPLEFORMAT, SF_UNSIGNED);

    configs.data_type = match (sample_format, bits_per_sample) {
        (SF_FLOAT, 64) => DataType::F64,
        (SF_FLOAT, 32) => DataType::F32,
        (SF_SIGNED, 64) => DataType::I64,
        (SF_SIGNED, 32) => DataType::I32,
        (SF_SIGNED, 16) => DataType::I16,
        (SF_SIGNED, 8) => DataType::I8,
        (SF_UNSIGNED, 64) => DataType::U64,
        (SF_UNSIGNED, 32) => DataType::U32,
        (SF_UNSIGNED, 16) => DataType::U16,
        (SF_UNSIGNED, 8) => DataType::U8,
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Unsupported sample format ({}) and bits per sample ({}) combination.",
                    sample_format, bits_per_sample
                ),
            ))
        }
    };

    configs.nodata = match ifd_map.get(&TAG_GDAL_NODATA) {
        Some(ifd) => {
            let s = ifd.interpret_as_ascii().trim().to_string();
            if configs.data_type == DataType::F32 {
                s.parse::<f32>().map(|v| v as f64).unwrap_or(-32768f64)
            } else {
                s.parse::<f64>().unwrap_or(-32768f64)
            }
        }
        _ => -32768f64,
    };

    read_georeferencing(&ifd_map, configs)?;

    /////////////////////////
    // Locate the blocks   //
    /////////////////////////
    let width = configs.columns;
    let height = configs.rows;
    let block_width;
    let block_height;
    let block_offsets;
    let block_counts;
    let is_tiled = ifd_map.contains_key(&TAG_TILEWIDTH);
    if is_tiled {
        block_width = required_usize(&ifd_map, TAG_TILEWIDTH, "TileWidth")?[0];
        block_height = required_usize(&ifd_map, TAG_TILELENGTH, "TileLength")?[0];
        block_offsets = required_usize(&ifd_map, TAG_TILEOFFSETS, "TileOffsets")?;
        block_counts = required_usize(&ifd_map, TAG_TILEBYTECOUNTS, "TileByteCounts")?;
    } else {
        block_width = width;
        block_height = match ifd_map.get(&TAG_ROWSPERSTRIP) {
            Some(_) => required_usize(&ifd_map, TAG_ROWSPERSTRIP, "RowsPerStrip")?[0].min(height),
            None => height,
        };
        block_offsets = required_usize(&ifd_map, TAG_STRIPOFFSETS, "StripOffsets")?;
        block_counts = required_usize(&ifd_map, TAG_STRIPBYTECOUNTS, "StripByteCounts")?;
    }
    if block_width == 0 || block_height == 0 {
        return Err(invalid("The raster block dimensions are zero."));
    }

    let blocks_across = (width + block_width - 1) / block_width;
    let blocks_down = (height + block_height - 1) / block_height;
    let num_blocks = blocks_across * blocks_down;
    if block_offsets.len() < num_blocks || block_counts.len() < num_blocks {
        return Err(invalid(
            "The raster does not list an offset and byte count for every block.",
        ));
    }

    // chunky pixels interleave all samples; planar files store the first band's blocks first
    let pixel_stride = if planar_config == 2 {
        1
    } else {
        samples_per_pixel
    };
    let bytes_per_sample = configs.data_type.get_data_size();

    ////////////////////
    // Read the data! //
    ////////////////////
    data.clear();
    data.resize(width * height, configs.nodata);

    for j in 0..blocks_down {
        // the last strip may be shorter than the rest; tiles are always full-sized
        let blk_h = if !is_tiled && j == blocks_down - 1 && height % block_height != 0 {
            height % block_height
        } else {
            block_height
        };
        for i in 0..blocks_across {
            let offset = block_offsets[j * blocks_across + i];
            let n = block_counts[j * blocks_across + i];
            if n == 0 {
                // sparse block
                continue;
            }
            if offset + n > th.len() {
                return Err(invalid("A raster block extends beyond the end of the file."));
            }
            let mut compressed = vec![0u8; n];
            th.seek(offset)?;
            th.read_exact(&mut compressed)?;

            let row_len = block_width * pixel_stride * bytes_per_sample;
            let expected = row_len * blk_h;
            let mut buf = match compression {
                COMPRESS_NONE => compressed,
                COMPRESS_PACKBITS => packbits_decoder(&compressed)?,
                COMPRESS_LZW => lzw_decoder(&compressed, expected)?,
                _ => decompress_to_vec_zlib(&compressed).map_err(|e| {
                    Error::new(
                        ErrorKind::InvalidData,
                        format!(
                            "Error encountered while decoding the DEFLATE compressed GeoTIFF file: {:?}",
                            e
                        ),
                    )
                })?,
            };
            if buf.len() < expected {
                return Err(invalid("A raster block is shorter than its declared size."));
            }

            if predictor == PREDICTOR_HORIZONTAL {
                undo_horizontal_predictor(
                    &mut buf[..expected],
                    row_len,
                    pixel_stride,
                    bytes_per_sample,
                    configs.endian,
                );
            }

            let xmin = i * block_width;
            let ymin = j * block_height;
            let xmax = (xmin + block_width).min(width);
            let ymax = (ymin + blk_h).min(height);
            for y in ymin..ymax {
                let row_start = (y - ymin) * row_len;
                for x in xmin..xmax {
                    let pos = row_start + (x - xmin) * pixel_stride * bytes_per_sample;
                    data[y * width + x] = read_sample(&buf[pos..], configs.data_type, configs.endian);
                }
            }
        }
    }

    Ok(())
}

/// Sets the grid extent, resolution and coordinate reference details from
/// the GeoTIFF tags.
fn read_georeferencing(ifd_map: &HashMap<u16, Ifd>, configs: &mut RasterConfigs) -> Result<(), Error> {
    // GeoKeyDirectoryTag
    let mut raster_type_key = 1u16;
    if let Some(ifd) = ifd_map.get(&TAG_GEOKEYDIRECTORYTAG) {
        configs.geo_key_directory = ifd.interpret_as_u16();
        for key in configs.geo_key_directory.chunks_exact(4).skip(1) {
            // key id, tag location, count, value; location 0 means the value is inline
            if key[1] != 0 {
                continue;
            }
            match key[0] {
                TAG_PROJECTEDCSTYPEGEOKEY => configs.epsg_code = key[3],
                TAG_GEOGRAPHICTYPEGEOKEY if configs.epsg_code == 0 => configs.epsg_code = key[3],
                TAG_GTRASTERTYPEGEOKEY => raster_type_key = key[3],
                _ => {}
            }
        }
    }
    configs.pixel_is_area = raster_type_key != 2;

    // GeoDoubleParamsTag
    if let Some(ifd) = ifd_map.get(&TAG_GEODOUBLEPARAMSTAG) {
        configs.geo_double_params = ifd.interpret_as_f64();
    }

    // GeoAsciiParamsTag
    if let Some(ifd) = ifd_map.get(&TAG_GEOASCIIPARAMSTAG) {
        configs.geo_ascii_params = ifd.interpret_as_ascii();
    }

    // ModelTiePointTag
    configs.model_tiepoint = match ifd_map.get(&TAG_MODELTIEPOINTTAG) {
        Some(ifd) => ifd.interpret_as_f64(),
        _ => vec![],
    };

    // ModelPixelScale
    if let Some(ifd) = ifd_map.get(&TAG_MODELPIXELSCALETAG) {
        let vals = ifd.interpret_as_f64();
        if vals.len() != 3 {
            return Err(invalid(
                "Error: the ModelPixelScaleTag (33550) is not specified correctly in the GeoTIFF file.",
            ));
        }
        configs.model_pixel_scale.copy_from_slice(&vals);
    }

    // ModelTransformationTag
    if let Some(ifd) = ifd_map.get(&TAG_MODELTRANSFORMATIONTAG) {
        let vals = ifd.interpret_as_f64();
        if vals.len() != 16 {
            return Err(invalid(
                "Error: the ModelTransformationTag (33920) is not specified correctly in the GeoTIFF file.",
            ));
        }
        configs.model_transformation.copy_from_slice(&vals);
    }

    let (rows, columns) = (configs.rows as f64, configs.columns as f64);
    if configs.model_tiepoint.len() == 6 {
        if configs.model_pixel_scale[0] == 0.0 {
            configs.model_pixel_scale[0] = 1.0;
            configs.model_pixel_scale[1] = 1.0;
            log::warn!("The ModelPixelScaleTag (33550) is not specified. A pixel resolution of 1.0 has been assumed.");
        }
        // One tie-point and a pixel size: no rotation or shearing.
        configs.resolution_x = configs.model_pixel_scale[0];
        configs.resolution_y = configs.model_pixel_scale[1];
        let tp = &configs.model_tiepoint;
        let mut west = tp[3] - tp[0] * configs.resolution_x;
        let mut north = tp[4] + tp[1] * configs.resolution_y;
        if !configs.pixel_is_area {
            // the tie-point refers to the centre of the cell
            west -= 0.5 * configs.resolution_x;
            north += 0.5 * configs.resolution_y;
        }
        configs.west = west;
        configs.north = north;
        configs.east = west + columns * configs.resolution_x;
        configs.south = north - rows * configs.resolution_y;
    } else if configs.model_tiepoint.len() > 6 {
        return Err(invalid(
            "Rasters georeferenced with multiple tie-points are not supported.",
        ));
    } else if configs.model_transformation[0] != 0.0 {
        let t = configs.model_transformation;
        configs.resolution_x = t[0].abs();
        configs.resolution_y = t[5].abs();
        let corners = [(0.0, 0.0), (columns, 0.0), (0.0, rows), (columns, rows)];
        configs.west = f64::INFINITY;
        configs.east = f64::NEG_INFINITY;
        configs.south = f64::INFINITY;
        configs.north = f64::NEG_INFINITY;
        for (col, row) in corners.iter() {
            let x = t[0] * col + t[1] * row + t[3];
            let y = t[4] * col + t[5] * row + t[7];
            configs.west = configs.west.min(x);
            configs.east = configs.east.max(x);
            configs.south = configs.south.min(y);
            configs.north = configs.north.max(y);
        }
    } else {
        return Err(invalid(
            "The model-space/raster-space transformation cannot be defined.",
        ));
    }
    Ok(())
}

fn read_sample(buf: &[u8], data_type: DataType, byte_order: Endianness) -> f64 {
    macro_rules! read {
        ($method:ident) => {
            if byte_order == Endianness::LittleEndian {
                LittleEndian::$method(buf) as f64
            } else {
                BigEndian::$method(buf) as f64
            }
        };
    }
    match data_type {
        DataType::U8 => buf[0] as f64,
        DataType::I8 => buf[0] as i8 as f64,
        DataType::U16 => read!(read_u16),
        DataType::I16 => read!(read_i16),
        DataType::U32 => read!(read_u32),
        DataType::I32 => read!(read_i32),
        DataType::U64 => read!(read_u64),
        DataType::I64 => read!(read_i64),
        DataType::F32 => read!(read_f32),
        DataType::F64 => read!(read_f64),
        DataType::Unknown => f64::NAN,
    }
}

/// Reverses horizontal differencing (predictor 2) in place. Each row holds
/// `row_len` bytes; every sample is stored as the difference from the same
/// sample of the preceding pixel.
fn undo_horizontal_predictor(
    buf: &mut [u8],
    row_len: usize,
    samples_per_pixel: usize,
    bytes_per_sample: usize,
    byte_order: Endianness,
) {
    let le = byte_order == Endianness::LittleEndian;
    let stride = samples_per_pixel * bytes_per_sample;
    for row in buf.chunks_exact_mut(row_len) {
        let mut pos = stride;
        while pos + bytes_per_sample <= row.len() {
            let prev = pos - stride;
            match bytes_per_sample {
                1 => row[pos] = row[pos].wrapping_add(row[prev]),
                2 => {
                    let (a, b) = if le {
                        (LittleEndian::read_u16(&row[prev..]), LittleEndian::read_u16(&row[pos..]))
                    } else {
                        (BigEndian::read_u16(&row[prev..]), BigEndian::read_u16(&row[pos..]))
                    };
                    let v = a.wrapping_add(b);
                    if le {
                        LittleEndian::write_u16(&mut row[pos..], v);
                    } else {
                        BigEndian::write_u16(&mut row[pos..], v);
                    }
                }
                4 => {
                    let (a, b) = if le {
                        (LittleEndian::read_u32(&row[prev..]), LittleEndian::read_u32(&row[pos..]))
                    } else {
                        (BigEndian::read_u32(&row[prev..]), BigEndian::read_u32(&row[pos..]))
                    };
                    let v = a.wrapping_add(b);
                    if le {
                        LittleEndian::write_u32(&mut row[pos..], v);
                    } else {
                        BigEndian::write_u32(&mut row[pos..], v);
                    }
                }
                _ => {
                    let (a, b) = if le {
                        (LittleEndian::read_u64(&row[prev..]), LittleEndian::read_u64(&row[pos..]))
                    } else {
                        (BigEndian::read_u64(&row[prev..]), BigEndian::read_u64(&row[pos..]))
                    };
                    let v = a.wrapping_add(b);
                    if le {
                        LittleEndian::write_u64(&mut row[pos..], v);
                    } else {
                        BigEndian::write_u64(&mut row[pos..], v);
                    }
                }
            }
            pos += bytes_per_sample;
        }
    }
}

fn lzw_decoder(compressed: &[u8], max_uncompressed_length: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::with_capacity(max_uncompressed_length);
    let mut decoder = lzw::DecoderEarlyChange::new(lzw::MsbReader::new(), 8);
    let mut bytes_read = 0;
    while bytes_read < compressed.len() && buf.len() < max_uncompressed_length {
        let (len, bytes) = decoder.decode_bytes(&compressed[bytes_read..]).map_err(|e| {
            Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Error encountered while decoding the LZW compressed GeoTIFF file: {}",
                    e
                ),
            )
        })?;
        if len == 0 && bytes.is_empty() {
            break;
        }
        bytes_read += len;
        buf.extend_from_slice(bytes);
    }
    Ok(buf)
}

/// Decodes PackBits run-length encoded data.
pub fn packbits_decoder(input_data: &[u8]) -> Result<Vec<u8>, Error> {
    let truncated = || invalid("Truncated PackBits data.");
    let mut output_data = vec![];
    let mut i: usize = 0;
    while i < input_data.len() {
        let header = input_data[i] as i8;
        if header == -128 {
            // no-op
            i += 1;
        } else if header < 0 {
            let value = *input_data.get(i + 1).ok_or_else(truncated)?;
            let count = (1 - header as isize) as usize;
            output_data.extend(std::iter::repeat(value).take(count));
            i += 2;
        } else {
            let count = header as usize + 1;
            let literal = input_data.get(i + 1..i + 1 + count).ok_or_else(truncated)?;
            output_data.extend_from_slice(literal);
            i += 1 + count;
        }
    }
    Ok(output_data)
}

pub fn write_geotiff(r: &mut Raster) -> Result<(), Error> {
    // The encoder writes classic, little-endian TIFFs.
    r.configs.endian = Endianness::LittleEndian;
    let use_compression = r.compress;

    // get the bytes per pixel
    let bytes_per_pixel = r.configs.data_type.get_data_size();
    if bytes_per_pixel == 0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("Unknown data type: {:?}", r.configs.data_type),
        ));
    }
    let row_length_in_bytes = r.configs.columns * bytes_per_pixel;
    if 8usize + r.configs.rows * row_length_in_bytes * 2 >= u32::MAX as usize {
        return Err(invalid(
            "The raster is too large to be written as a classic TIFF.",
        ));
    }

    ////////////////////////////////
    // Encode the image data      //
    ////////////////////////////////
    // One row per strip. Strips are padded to start on a word boundary.
    let header_size = 8usize;
    let mut image_data = ByteOrderWriter::<Vec<u8>>::new(vec![], r.configs.endian);
    let mut strip_offsets = Vec::with_capacity(r.configs.rows);
    let mut strip_counts = Vec::with_capacity(r.configs.rows);
    for row in 0..r.configs.rows {
        let start = row * r.configs.columns;
        let values = &r.data[start..start + r.configs.columns];
        let mut row_bytes = ByteOrderWriter::<Vec<u8>>::new(
            Vec::with_capacity(row_length_in_bytes),
            r.configs.endian,
        );
        for &v in values {
            write_sample(&mut row_bytes, v, r.configs.data_type)?;
        }
        let row_bytes = if use_compression {
            compress_to_vec_zlib(row_bytes.get_inner(), 6)
        } else {
            row_bytes.into_inner()
        };
        strip_offsets.push((header_size + image_data.len()) as u32);
        strip_counts.push(row_bytes.len() as u32);
        image_data.write_bytes(&row_bytes)?;
        if image_data.len() % 2 == 1 {
            image_data.write_u8(0u8)?;
        }
    }
    let ifd_start = (header_size + image_data.len()) as u64;

    let mut ifd_entries: Vec<Entry> = vec![];
    let mut larger_values_data = ByteOrderWriter::<Vec<u8>>::new(vec![], r.configs.endian);

    // ImageWidth tag (256)
    ifd_entries.push(Entry::new(
        TAG_IMAGEWIDTH,
        DT_LONG,
        1u64,
        r.configs.columns as u64,
    ));

    // ImageLength tag (257)
    ifd_entries.push(Entry::new(
        TAG_IMAGELENGTH,
        DT_LONG,
        1u64,
        r.configs.rows as u64,
    ));

    // BitsPerSample tag (258)
    ifd_entries.push(Entry::new(
        TAG_BITSPERSAMPLE,
        DT_SHORT,
        1u64,
        (bytes_per_pixel * 8) as u64,
    ));

    // Compression tag (259)
    let compression = if use_compression {
        COMPRESS_DEFLATE
    } else {
        COMPRESS_NONE
    };
    ifd_entries.push(Entry::new(TAG_COMPRESSION, DT_SHORT, 1u64, compression as u64));

    // PhotometricInterpretation tag (262)
    ifd_entries.push(Entry::new(
        TAG_PHOTOMETRICINTERPRETATION,
        DT_SHORT,
        1u64,
        PI_BLACKISZERO as u64,
    ));

    // StripOffsets (273) and StripByteCounts (279)
    push_longs(&mut ifd_entries, &mut larger_values_data, TAG_STRIPOFFSETS, &strip_offsets)?;
    push_longs(&mut ifd_entries, &mut larger_values_data, TAG_STRIPBYTECOUNTS, &strip_counts)?;

    // SamplesPerPixel tag (277)
    ifd_entries.push(Entry::new(TAG_SAMPLESPERPIXEL, DT_SHORT, 1u64, 1u64));

    // RowsPerStrip tag (278)
    ifd_entries.push(Entry::new(TAG_ROWSPERSTRIP, DT_LONG, 1u64, 1u64));

    // PlanarConfiguration tag (284)
    ifd_entries.push(Entry::new(TAG_PLANARCONFIGURATION, DT_SHORT, 1u64, 1u64));

    // Software tag (305)
    let software = format!("HydroKit v{}", env!("CARGO_PKG_VERSION"));
    push_ascii(&mut ifd_entries, &mut larger_values_data, TAG_SOFTWARE, &software)?;

    // DateTime tag (306)
    let datetime = chrono::Local::now().format("%Y:%m:%d %H:%M:%S").to_string();
    push_ascii(&mut ifd_entries, &mut larger_values_data, TAG_DATETIME, &datetime)?;

    // SampleFormat tag (339)
    let samples_format = match r.configs.data_type {
        DataType::U8 | DataType::U16 | DataType::U32 | DataType::U64 => SF_UNSIGNED,
        DataType::I8 | DataType::I16 | DataType::I32 | DataType::I64 => SF_SIGNED,
        _ => SF_FLOAT,
    };
    ifd_entries.push(Entry::new(TAG_SAMPLEFORMAT, DT_SHORT, 1u64, samples_format as u64));

    if r.configs.model_transformation[0] != 0f64 {
        // ModelTransformationTag tag (33920)
        ifd_entries.push(Entry::new(
            TAG_MODELTRANSFORMATIONTAG,
            DT_DOUBLE,
            16u64,
            larger_values_data.len() as u64,
        ));
        for v in r.configs.model_transformation.iter() {
            larger_values_data.write_f64(*v)?;
        }
    } else {
        // ModelPixelScaleTag tag (33550)
        ifd_entries.push(Entry::new(
            TAG_MODELPIXELSCALETAG,
            DT_DOUBLE,
            3u64,
            larger_values_data.len() as u64,
        ));
        larger_values_data.write_f64(r.configs.resolution_x)?;
        larger_values_data.write_f64(r.configs.resolution_y)?;
        larger_values_data.write_f64(0f64)?;

        // ModelTiepointTag tag (33922)
        let (x, y) = if r.configs.pixel_is_area {
            (r.configs.west, r.configs.north)
        } else {
            (
                r.configs.west + 0.5 * r.configs.resolution_x,
                r.configs.north - 0.5 * r.configs.resolution_y,
            )
        };
        ifd_entries.push(Entry::new(
            TAG_MODELTIEPOINTTAG,
            DT_DOUBLE,
            6u64,
            larger_values_data.len() as u64,
        ));
        larger_values_data.write_f64(0f64)?; // I
        larger_values_data.write_f64(0f64)?; // J
        larger_values_data.write_f64(0f64)?; // K
        larger_values_data.write_f64(x)?; // X
        larger_values_data.write_f64(y)?; // Y
        larger_values_data.write_f64(0f64)?; // Z
    }

    // GeoKeyDirectoryTag tag (34735)
    let geo_key_directory = if r.configs.geo_key_directory.len() >= 4 {
        r.configs.geo_key_directory.clone()
    } else {
        minimal_geokey_directory(r.configs.epsg_code, r.configs.pixel_is_area)
    };
    ifd_entries.push(Entry::new(
        TAG_GEOKEYDIRECTORYTAG,
        DT_SHORT,
        geo_key_directory.len() as u64,
        larger_values_data.len() as u64,
    ));
    for v in &geo_key_directory {
        larger_values_data.write_u16(*v)?;
    }

    if !r.configs.geo_double_params.is_empty() {
        // GeoDoubleParamsTag tag (34736)
        ifd_entries.push(Entry::new(
            TAG_GEODOUBLEPARAMSTAG,
            DT_DOUBLE,
            r.configs.geo_double_params.len() as u64,
            larger_values_data.len() as u64,
        ));
        for v in &r.configs.geo_double_params {
            larger_values_data.write_f64(*v)?;
        }
    }

    if !r.configs.geo_ascii_params.is_empty() {
        // GeoAsciiParamsTag tag (34737)
        let params = r.configs.geo_ascii_params.clone();
        push_ascii(&mut ifd_entries, &mut larger_values_data, TAG_GEOASCIIPARAMSTAG, &params)?;
    }

    // GDAL_NODATA tag (42113); padded so the string is never stored inline
    let mut nodata_str = format!("{}", r.configs.nodata);
    while nodata_str.len() < 4 {
        nodata_str.push(' ');
    }
    push_ascii(&mut ifd_entries, &mut larger_values_data, TAG_GDAL_NODATA, &nodata_str)?;

    ///////////////////////////////////////
    // Write the header, data and IFD    //
    ///////////////////////////////////////
    let f = File::create(&r.file_name)?;
    let mut writer = ByteOrderWriter::new(BufWriter::new(f), r.configs.endian);
    writer.write_bytes(b"II")?;
    writer.write_u16(42u16)?; // magic number
    writer.write_u32(ifd_start as u32)?; // offset to first IFD
    writer.write_bytes(image_data.get_inner())?;

    // Number of Directory Entries.
    writer.write_u16(ifd_entries.len() as u16)?;
    ifd_entries.sort_by(|a, b| a.tag.cmp(&b.tag));
    let ifd_length = 2u64 + ifd_entries.len() as u64 * 12u64 + 4u64;
    for ifde in ifd_entries {
        writer.write_u16(ifde.tag)?; // Tag
        writer.write_u16(ifde.ifd_type)?; // Field type
        writer.write_u32(ifde.num_values as u32)?; // Num of values
        if ifde.ifd_type == DT_SHORT && ifde.num_values == 1 {
            // it's a value, left-justified in the four bytes
            writer.write_u16(ifde.offset as u16)?;
            writer.write_u16(0u16)?;
        } else if ifde.is_inline() {
            writer.write_u32(ifde.offset as u32)?;
        } else {
            // it's an offset
            writer.write_u32((ifd_start + ifd_length + ifde.offset) as u32)?;
        }
    }
    // Only single-image TIFFs are written, so there is no next IFD.
    writer.write_u32(0u32)?;

    writer.write_bytes(larger_values_data.get_inner())?;
    writer.flush()?;

    Ok(())
}

fn write_sample<W: Write>(
    writer: &mut ByteOrderWriter<W>,
    value: f64,
    data_type: DataType,
) -> Result<(), Error> {
    match data_type {
        DataType::U8 => writer.write_u8(value as u8),
        DataType::I8 => writer.write_i8(value as i8),
        DataType::U16 => writer.write_u16(value as u16),
        DataType::I16 => writer.write_i16(value as i16),
        DataType::U32 => writer.write_u32(value as u32),
        DataType::I32 => writer.write_i32(value as i32),
        DataType::U64 => writer.write_u64(value as u64),
        DataType::I64 => writer.write_i64(value as i64),
        DataType::F32 => writer.write_f32(value as f32),
        DataType::F64 => writer.write_f64(value),
        DataType::Unknown => Err(invalid("Unknown data type.")),
    }
}

/// Queues a LONG array, inline when it holds a single value.
fn push_longs(
    entries: &mut Vec<Entry>,
    larger_values_data: &mut ByteOrderWriter<Vec<u8>>,
    tag: u16,
    values: &[u32],
) -> Result<(), Error> {
    if values.len() == 1 {
        entries.push(Entry::new(tag, DT_LONG, 1u64, values[0] as u64));
        return Ok(());
    }
    entries.push(Entry::new(
        tag,
        DT_LONG,
        values.len() as u64,
        larger_values_data.len() as u64,
    ));
    for v in values {
        larger_values_data.write_u32(*v)?;
    }
    Ok(())
}

/// Queues a null-terminated ASCII value. Callers keep strings longer than
/// three characters so the value lands in the larger values block.
fn push_ascii(
    entries: &mut Vec<Entry>,
    larger_values_data: &mut ByteOrderWriter<Vec<u8>>,
    tag: u16,
    value: &str,
) -> Result<(), Error> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    entries.push(Entry::new(
        tag,
        DT_ASCII,
        bytes.len() as u64,
        larger_values_data.len() as u64,
    ));
    if bytes.len() % 2 == 1 {
        // the next value has to start on a word boundary
        bytes.push(0);
    }
    larger_values_data.write_bytes(&bytes)
}

/// Builds a GeoKeyDirectory holding only the model type, raster type and
/// coordinate system code.
fn minimal_geokey_directory(epsg_code: u16, pixel_is_area: bool) -> Vec<u16> {
    let raster_type = if pixel_is_area { 1u16 } else { 2u16 };
    let mut keys: Vec<[u16; 4]> = vec![];
    if epsg_code == 0 {
        keys.push([TAG_GTRASTERTYPEGEOKEY, 0, 1, raster_type]);
    } else if (4000..5000).contains(&epsg_code) {
        // geographic coordinate system
        keys.push([TAG_GTMODELTYPEGEOKEY, 0, 1, 2]);
        keys.push([TAG_GTRASTERTYPEGEOKEY, 0, 1, raster_type]);
        keys.push([TAG_GEOGRAPHICTYPEGEOKEY, 0, 1, epsg_code]);
    } else {
        keys.push([TAG_GTMODELTYPEGEOKEY, 0, 1, 1]);
        keys.push([TAG_GTRASTERTYPEGEOKEY, 0, 1, raster_type]);
        keys.push([TAG_PROJECTEDCSTYPEGEOKEY, 0, 1, epsg_code]);
    }
    let mut directory = vec![1u16, 1u16, 0u16, keys.len() as u16];
    for key in keys {
        directory.extend_from_slice(&key);
    }
    directory
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_configs() -> RasterConfigs {
        RasterConfigs {
            rows: 3,
            columns: 4,
            nodata: -9999.0,
            north: 4_500_030.0,
            south: 4_500_000.0,
            east: 500_040.0,
            west: 500_000.0,
            resolution_x: 10.0,
            resolution_y: 10.0,
            data_type: DataType::F32,
            epsg_code: 32617,
            ..Default::default()
        }
    }

    fn filled_raster(path: &str, compress: bool) -> Raster {
        let mut r = Raster::initialize_using_config(path, &test_configs());
        r.compress = compress;
        for row in 0..3 {
            for col in 0..4 {
                r.set_value(row, col, (row * 4 + col) as f64 + 0.5);
            }
        }
        r.set_value(1, 1, -9999.0);
        r
    }

    fn assert_same_grid(back: &Raster) {
        assert_eq!(back.configs.rows, 3);
        assert_eq!(back.configs.columns, 4);
        assert_eq!(back.configs.nodata, -9999.0);
        assert_eq!(back.configs.data_type, DataType::F32);
        assert_eq!(back.configs.west, 500_000.0);
        assert_eq!(back.configs.north, 4_500_030.0);
        assert_eq!(back.configs.east, 500_040.0);
        assert_eq!(back.configs.south, 4_500_000.0);
        assert_eq!(back.configs.resolution_x, 10.0);
        assert_eq!(back.configs.epsg_code, 32617);
        assert_eq!(back.get_value(0, 0), 0.5);
        assert_eq!(back.get_value(2, 3), 11.5);
        assert!(back.is_nodata(back.get_value(1, 1)));
    }

    #[test]
    fn uncompressed_geotiff_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        let mut r = filled_raster(path.to_str().unwrap(), false);
        r.write().unwrap();
        let back = Raster::new(path.to_str().unwrap(), "r").unwrap();
        assert_same_grid(&back);
    }

    #[test]
    fn deflate_geotiff_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deflate.tif");
        let mut r = filled_raster(path.to_str().unwrap(), true);
        r.write().unwrap();
        let back = Raster::new(path.to_str().unwrap(), "r").unwrap();
        assert_same_grid(&back);
    }

    #[test]
    fn carried_geokeys_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.tif");
        let second = dir.path().join("second.tif");
        let mut r = filled_raster(first.to_str().unwrap(), false);
        r.write().unwrap();
        let input = Raster::new(first.to_str().unwrap(), "r").unwrap();
        let mut output = Raster::initialize_using_file(second.to_str().unwrap(), &input);
        output.set_data(input.get_data().to_vec()).unwrap();
        output.write().unwrap();
        let back = Raster::new(second.to_str().unwrap(), "r").unwrap();
        assert_eq!(back.configs.geo_key_directory, input.configs.geo_key_directory);
        assert_same_grid(&back);
    }

    #[test]
    fn single_row_integer_raster_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("row.tif");
        let mut configs = test_configs();
        configs.rows = 1;
        configs.south = 4_500_020.0;
        configs.data_type = DataType::I16;
        configs.nodata = -32768.0;
        let mut r = Raster::initialize_using_config(path.to_str().unwrap(), &configs);
        r.set_row_data(0, vec![1.0, -2.0, 300.0, -32768.0]);
        r.write().unwrap();
        let back = Raster::new(path.to_str().unwrap(), "r").unwrap();
        assert_eq!(back.configs.data_type, DataType::I16);
        assert_eq!(back.get_row_data(0), vec![1.0, -2.0, 300.0, -32768.0]);
        assert_eq!(back.num_valid_cells(), 3);
    }

    #[test]
    fn pixel_is_point_shifts_the_tiepoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("point.tif");
        let mut configs = test_configs();
        configs.pixel_is_area = false;
        let mut r = Raster::initialize_using_config(path.to_str().unwrap(), &configs);
        r.write().unwrap();
        let back = Raster::new(path.to_str().unwrap(), "r").unwrap();
        assert!(!back.configs.pixel_is_area);
        assert_eq!(back.configs.model_tiepoint[3], 500_005.0);
        assert_eq!(back.configs.west, 500_000.0);
        assert_eq!(back.configs.north, 4_500_030.0);
    }

    #[test]
    fn rejects_files_that_are_not_tiffs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.tif");
        fs::write(&path, b"GIF89a not a tiff").unwrap();
        let err = Raster::new(path.to_str().unwrap(), "r").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn packbits_handles_runs_literals_and_noops() {
        // literal run of 3, repeat of 'z' 4 times, no-op
        let encoded = vec![2u8, b'a', b'b', b'c', 0xFD, b'z', 0x80];
        assert_eq!(packbits_decoder(&encoded).unwrap(), b"abczzzz".to_vec());
    }

    #[test]
    fn packbits_rejects_truncated_input() {
        assert!(packbits_decoder(&[5u8, 1, 2]).is_err());
        assert!(packbits_decoder(&[0xFEu8]).is_err());
    }

    #[test]
    fn horizontal_predictor_is_undone_per_row() {
        let mut bytes = vec![10u8, 1, 1, 250, 5, 5];
        undo_horizontal_predictor(&mut bytes, 3, 1, 1, Endianness::LittleEndian);
        assert_eq!(bytes, vec![10, 11, 12, 250, 255, 4]);

        let mut shorts = vec![0u8; 6];
        LittleEndian::write_u16(&mut shorts[0..], 1000);
        LittleEndian::write_u16(&mut shorts[2..], 24);
        LittleEndian::write_u16(&mut shorts[4..], 65535);
        undo_horizontal_predictor(&mut shorts, 6, 1, 2, Endianness::LittleEndian);
        assert_eq!(LittleEndian::read_u16(&shorts[2..]), 1024);
        assert_eq!(LittleEndian::read_u16(&shorts[4..]), 1023);
    }

    /// An in-memory single-image TIFF. Blocks follow the header, then the
    /// directory, then values too large for a directory entry.
    struct TiffFixture {
        byte_order: Endianness,
        big_tiff: bool,
        entries: Vec<(u16, u16, u64, Vec<u8>)>,
        blocks: Vec<Vec<u8>>,
    }

    impl TiffFixture {
        fn new(byte_order: Endianness, big_tiff: bool) -> TiffFixture {
            TiffFixture {
                byte_order,
                big_tiff,
                entries: vec![],
                blocks: vec![],
            }
            .doubles(TAG_MODELTIEPOINTTAG, &[0.0, 0.0, 0.0, 100.0, 200.0, 0.0])
            .doubles(TAG_MODELPIXELSCALETAG, &[2.0, 2.0, 0.0])
        }

        fn writer(&self) -> ByteOrderWriter<Vec<u8>> {
            ByteOrderWriter::new(vec![], self.byte_order)
        }

        fn shorts(mut self, tag: u16, values: &[u16]) -> TiffFixture {
            let mut w = self.writer();
            for &v in values {
                w.write_u16(v).unwrap();
            }
            self.entries.push((tag, DT_SHORT, values.len() as u64, w.into_inner()));
            self
        }

        fn doubles(mut self, tag: u16, values: &[f64]) -> TiffFixture {
            let mut w = self.writer();
            for &v in values {
                w.write_f64(v).unwrap();
            }
            self.entries.push((tag, DT_DOUBLE, values.len() as u64, w.into_inner()));
            self
        }

        fn ascii(mut self, tag: u16, text: &str) -> TiffFixture {
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(0);
            self.entries.push((tag, DT_ASCII, bytes.len() as u64, bytes));
            self
        }

        /// Width, height, bits and sample format of a single-band image.
        fn image(self, columns: u16, rows: u16, bits: u16, sample_format: u16) -> TiffFixture {
            self.shorts(TAG_IMAGEWIDTH, &[columns])
                .shorts(TAG_IMAGELENGTH, &[rows])
                .shorts(TAG_BITSPERSAMPLE, &[bits])
                .shorts(TAG_PHOTOMETRICINTERPRETATION, &[PI_BLACKISZERO])
                .shorts(TAG_SAMPLEFORMAT, &[sample_format])
        }

        fn block(mut self, data: Vec<u8>) -> TiffFixture {
            self.blocks.push(data);
            self
        }

        fn build(mut self, tiled: bool) -> Vec<u8> {
            let big = self.big_tiff;
            let header_len = if big { 16 } else { 8 };
            let mut offsets = vec![];
            let mut counts = vec![];
            let mut pos = header_len;
            for b in &self.blocks {
                offsets.push(pos as u64);
                counts.push(b.len() as u64);
                pos += b.len();
            }
            let (offsets_tag, counts_tag) = if tiled {
                (TAG_TILEOFFSETS, TAG_TILEBYTECOUNTS)
            } else {
                (TAG_STRIPOFFSETS, TAG_STRIPBYTECOUNTS)
            };
            for (tag, values) in [(offsets_tag, offsets), (counts_tag, counts)] {
                let mut w = self.writer();
                for &v in &values {
                    if big {
                        w.write_u64(v).unwrap();
                    } else {
                        w.write_u32(v as u32).unwrap();
                    }
                }
                let field_type = if big { DT_TIFF_LONG8 } else { DT_LONG };
                self.entries.push((tag, field_type, values.len() as u64, w.into_inner()));
            }
            self.entries.sort_by_key(|e| e.0);

            let n = self.entries.len();
            let inline_size = if big { 8 } else { 4 };
            let ifd_offset = pos;
            let mut extra_pos = if big {
                ifd_offset + 8 + n * 20 + 8
            } else {
                ifd_offset + 2 + n * 12 + 4
            };

            let mut w = self.writer();
            if self.byte_order == Endianness::LittleEndian {
                w.write_bytes(b"II").unwrap();
            } else {
                w.write_bytes(b"MM").unwrap();
            }
            if big {
                w.write_u16(43).unwrap();
                w.write_u16(8).unwrap();
                w.write_u16(0).unwrap();
                w.write_u64(ifd_offset as u64).unwrap();
            } else {
                w.write_u16(42).unwrap();
                w.write_u32(ifd_offset as u32).unwrap();
            }
            for b in &self.blocks {
                w.write_bytes(b).unwrap();
            }

            if big {
                w.write_u64(n as u64).unwrap();
            } else {
                w.write_u16(n as u16).unwrap();
            }
            let mut extra = vec![];
            for (tag, field_type, count, bytes) in &self.entries {
                w.write_u16(*tag).unwrap();
                w.write_u16(*field_type).unwrap();
                if big {
                    w.write_u64(*count).unwrap();
                } else {
                    w.write_u32(*count as u32).unwrap();
                }
                if bytes.len() <= inline_size {
                    let mut field = bytes.clone();
                    field.resize(inline_size, 0);
                    w.write_bytes(&field).unwrap();
                } else {
                    if big {
                        w.write_u64(extra_pos as u64).unwrap();
                    } else {
                        w.write_u32(extra_pos as u32).unwrap();
                    }
                    extra_pos += bytes.len();
                    extra.extend_from_slice(bytes);
                }
            }
            if big {
                w.write_u64(0).unwrap();
            } else {
                w.write_u32(0).unwrap();
            }
            w.write_bytes(&extra).unwrap();
            w.into_inner()
        }
    }

    fn read_bytes(bytes: Vec<u8>) -> Raster {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.tif");
        fs::write(&path, bytes).unwrap();
        Raster::new(path.to_str().unwrap(), "r").unwrap()
    }

    /// LZW stream of 9-bit literal codes between a clear and an end code.
    fn lzw_literals(bytes: &[u8]) -> Vec<u8> {
        let mut codes = vec![256u32];
        codes.extend(bytes.iter().map(|&b| b as u32));
        codes.push(257);
        let mut out = vec![];
        let (mut acc, mut nbits) = (0u32, 0u32);
        for code in codes {
            acc = (acc << 9) | code;
            nbits += 9;
            while nbits >= 8 {
                out.push((acc >> (nbits - 8)) as u8);
                nbits -= 8;
            }
            acc &= (1u32 << nbits) - 1;
        }
        if nbits > 0 {
            out.push((acc << (8 - nbits)) as u8);
        }
        out
    }

    #[test]
    fn tiled_raster_with_partial_edge_tiles() {
        // 5 x 3 grid in 4 x 2 tiles; the right and bottom tiles are padded
        let (columns, rows, tw, th) = (5usize, 3usize, 4usize, 2usize);
        let mut fixture = TiffFixture::new(Endianness::LittleEndian, false)
            .image(columns as u16, rows as u16, 8, SF_UNSIGNED)
            .shorts(TAG_COMPRESSION, &[COMPRESS_NONE])
            .shorts(TAG_TILEWIDTH, &[tw as u16])
            .shorts(TAG_TILELENGTH, &[th as u16]);
        for tj in 0..2 {
            for ti in 0..2 {
                let mut tile = vec![];
                for y in 0..th {
                    for x in 0..tw {
                        let (r, c) = (tj * th + y, ti * tw + x);
                        tile.push(if r < rows && c < columns { (r * 10 + c) as u8 } else { 0xFF });
                    }
                }
                fixture = fixture.block(tile);
            }
        }
        let r = read_bytes(fixture.build(true));
        assert_eq!(r.configs.data_type, DataType::U8);
        assert_eq!((r.configs.rows, r.configs.columns), (3, 5));
        for row in 0..3 {
            for col in 0..5 {
                assert_eq!(r.get_value(row, col), (row * 10 + col) as f64);
            }
        }
        assert_eq!(r.configs.west, 100.0);
        assert_eq!(r.configs.east, 110.0);
        assert_eq!(r.configs.south, 194.0);
    }

    #[test]
    fn bigtiff_with_a_short_last_strip() {
        let values: Vec<i16> = vec![-5, 0, 7, 32767, -32768, 12];
        let strip = |vals: &[i16]| {
            let mut w = ByteOrderWriter::new(vec![], Endianness::LittleEndian);
            for &v in vals {
                w.write_i16(v).unwrap();
            }
            w.into_inner()
        };
        let bytes = TiffFixture::new(Endianness::LittleEndian, true)
            .image(2, 3, 16, SF_SIGNED)
            .shorts(TAG_ROWSPERSTRIP, &[2])
            .ascii(TAG_GDAL_NODATA, "-32768")
            .block(strip(&values[0..4]))
            .block(strip(&values[4..6]))
            .build(false);
        assert_eq!(&bytes[2..4], &[43, 0]);
        let r = read_bytes(bytes);
        assert_eq!(r.configs.data_type, DataType::I16);
        assert_eq!(r.configs.nodata, -32768.0);
        let expected: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        assert_eq!(r.get_data(), &expected[..]);
        assert_eq!(r.num_valid_cells(), 5);
    }

    #[test]
    fn big_endian_float_raster() {
        let mut w = ByteOrderWriter::new(vec![], Endianness::BigEndian);
        for v in [1.25f32, -9999.0, 3.5, 1.0e6] {
            w.write_f32(v).unwrap();
        }
        let bytes = TiffFixture::new(Endianness::BigEndian, false)
            .image(2, 2, 32, SF_FLOAT)
            .ascii(TAG_GDAL_NODATA, "-9999")
            .block(w.into_inner())
            .build(false);
        assert_eq!(&bytes[0..4], b"MM\0*");
        let r = read_bytes(bytes);
        assert_eq!(r.configs.endian, Endianness::BigEndian);
        assert_eq!(r.configs.data_type, DataType::F32);
        assert_eq!(r.configs.resolution_x, 2.0);
        assert_eq!(r.get_data(), &[1.25, -9999.0, 3.5, 1.0e6]);
        assert!(r.is_nodata(r.get_value(0, 1)));
    }

    #[test]
    fn lzw_strip_without_predictor() {
        let raw: Vec<u8> = vec![3, 1, 4, 1, 5, 9, 2, 6];
        let encoded = lzw_literals(&raw);
        assert_eq!(lzw_decoder(&encoded, raw.len()).unwrap(), raw);
        let r = read_bytes(
            TiffFixture::new(Endianness::LittleEndian, false)
                .image(4, 2, 8, SF_UNSIGNED)
                .shorts(TAG_COMPRESSION, &[COMPRESS_LZW])
                .block(encoded)
                .build(false),
        );
        assert_eq!(r.get_data(), &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
    }

    #[test]
    fn lzw_strip_with_horizontal_predictor() {
        // rows [1000, 1010, 1005, 2000] and [0, 65535, 1, 2] stored as differences
        let diffs: [u16; 8] = [1000, 10, 65531, 995, 0, 65535, 2, 1];
        let mut w = ByteOrderWriter::new(vec![], Endianness::LittleEndian);
        for d in diffs {
            w.write_u16(d).unwrap();
        }
        let r = read_bytes(
            TiffFixture::new(Endianness::LittleEndian, false)
                .image(4, 2, 16, SF_UNSIGNED)
                .shorts(TAG_COMPRESSION, &[COMPRESS_LZW])
                .shorts(TAG_PREDICTOR, &[PREDICTOR_HORIZONTAL])
                .block(lzw_literals(&w.into_inner()))
                .build(false),
        );
        assert_eq!(r.configs.data_type, DataType::U16);
        assert_eq!(r.get_row_data(0), vec![1000.0, 1010.0, 1005.0, 2000.0]);
        assert_eq!(r.get_row_data(1), vec![0.0, 65535.0, 1.0, 2.0]);
    }

    #[test]
    fn minimal_geokeys_pick_the_crs_type() {
        let geographic = minimal_geokey_directory(4326, true);
        assert_eq!(geographic[3], 3);
        assert!(geographic.chunks(4).any(|k| k == [TAG_GEOGRAPHICTYPEGEOKEY, 0, 1, 4326]));
        let projected = minimal_geokey_directory(32617, false);
        assert!(projected.chunks(4).any(|k| k == [TAG_PROJECTEDCSTYPEGEOKEY, 0, 1, 32617]));
        assert!(projected.chunks(4).any(|k| k == [TAG_GTRASTERTYPEGEOKEY, 0, 1, 2]));
        assert_eq!(minimal_geokey_directory(0, true), vec![1, 1, 0, 1, 1025, 0, 1, 1]);
    }
}
