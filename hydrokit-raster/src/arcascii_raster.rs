use super::*;
use std::f64;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Error;

fn parse_header_value<T: std::str::FromStr>(key: &str, text: &str) -> Result<T, Error> {
    text.trim().parse::<T>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Invalid {} value in ASCII grid header: '{}'", key, text.trim()),
        )
    })
}

pub fn read_arcascii(
    file_name: &str,
    configs: &mut RasterConfigs,
    data: &mut Vec<f64>,
) -> Result<(), Error> {
    let f = File::open(file_name)?;
    let f = BufReader::new(f);

    let mut xllcenter: f64 = f64::NEG_INFINITY;
    let mut yllcenter: f64 = f64::NEG_INFINITY;
    let mut xllcorner: f64 = f64::NEG_INFINITY;
    let mut yllcorner: f64 = f64::NEG_INFINITY;
    for line in f.lines() {
        let line = line?;
        let vec = line.split_whitespace().collect::<Vec<&str>>();
        if vec.is_empty() {
            continue;
        }
        let key = vec[0].to_lowercase();
        let last = vec[vec.len() - 1];
        let is_header = matches!(
            key.as_str(),
            "nrows" | "ncols" | "xllcorner" | "yllcorner" | "xllcenter" | "yllcenter" | "cellsize"
                | "nodata_value"
        );
        if is_header && vec.len() != 2 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("Malformed ASCII grid header line: '{}'", line),
            ));
        }
        if key == "nrows" {
            configs.rows = parse_header_value::<f64>("NROWS", last)? as usize;
        } else if key == "ncols" {
            configs.columns = parse_header_value::<f64>("NCOLS", last)? as usize;
        } else if key == "xllcorner" {
            xllcorner = parse_header_value("XLLCORNER", last)?;
        } else if key == "yllcorner" {
            yllcorner = parse_header_value("YLLCORNER", last)?;
        } else if key == "xllcenter" {
            xllcenter = parse_header_value("XLLCENTER", last)?;
        } else if key == "yllcenter" {
            yllcenter = parse_header_value("YLLCENTER", last)?;
        } else if key == "cellsize" {
            configs.resolution_x = parse_header_value("CELLSIZE", last)?;
            configs.resolution_y = configs.resolution_x;
        } else if key == "nodata_value" {
            configs.data_type = if last.contains('.') {
                DataType::F32
            } else {
                DataType::I32
            };
            configs.nodata = parse_header_value("NODATA_VALUE", last)?;
        } else if key.starts_with(|c: char| c.is_ascii_alphabetic()) && key != "nan" {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("Unrecognized ASCII grid header key: '{}'", vec[0]),
            ));
        } else {
            // a data line
            if data.is_empty() {
                data.reserve(configs.rows * configs.columns);
            }
            for val in vec {
                data.push(parse_header_value("cell", val)?);
            }
        }
    }

    if configs.rows == 0 || configs.columns == 0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "ASCII grid header is missing NROWS or NCOLS.",
        ));
    }
    if configs.data_type == DataType::Unknown {
        configs.data_type = DataType::F32;
    }

    // set the North, East, South, and West coordinates
    if xllcorner != f64::NEG_INFINITY && yllcorner != f64::NEG_INFINITY {
        configs.west = xllcorner;
        configs.south = yllcorner;
    } else if xllcenter != f64::NEG_INFINITY && yllcenter != f64::NEG_INFINITY {
        configs.west = xllcenter - 0.5 * configs.resolution_x;
        configs.south = yllcenter - 0.5 * configs.resolution_y;
    } else {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "ASCII grid header lacks a lower-left corner or centre.",
        ));
    }
    configs.east = configs.west + (configs.columns as f64) * configs.resolution_x;
    configs.north = configs.south + (configs.rows as f64) * configs.resolution_y;

    Ok(())
}

pub fn write_arcascii(r: &mut Raster) -> Result<(), Error> {
    let f = File::create(&r.file_name)?;
    let mut writer = BufWriter::new(f);

    writeln!(writer, "NCOLS {}", r.configs.columns)?;
    writeln!(writer, "NROWS {}", r.configs.rows)?;
    writeln!(writer, "XLLCORNER {}", r.configs.west)?;
    writeln!(writer, "YLLCORNER {}", r.configs.south)?;
    writeln!(
        writer,
        "CELLSIZE {}",
        (r.configs.resolution_x + r.configs.resolution_y) / 2.0
    )?;
    if r.configs.data_type.is_float() && r.configs.nodata.fract() == 0.0 {
        // keep the decimal point so the grid reads back as floating-point
        writeln!(writer, "NODATA_VALUE {:.1}", r.configs.nodata)?;
    } else {
        writeln!(writer, "NODATA_VALUE {}", r.configs.nodata)?;
    }

    let columns = r.configs.columns;
    for row in r.data.chunks(columns) {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_a_corner_referenced_grid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("grid.asc");
        fs::write(
            &file,
            "ncols 3\nnrows 2\nxllcorner 100\nyllcorner 200\ncellsize 5\nNODATA_value -9999\n1 2 3\n4 -9999 6\n",
        )
        .unwrap();
        let r = Raster::new(file.to_str().unwrap(), "r").unwrap();
        assert_eq!(r.configs.rows, 2);
        assert_eq!(r.configs.columns, 3);
        assert_eq!(r.configs.data_type, DataType::I32);
        assert_eq!(r.configs.west, 100.0);
        assert_eq!(r.configs.east, 115.0);
        assert_eq!(r.configs.north, 210.0);
        assert_eq!(r.get_value(1, 2), 6.0);
        assert_eq!(r.num_valid_cells(), 5);
    }

    #[test]
    fn centre_referenced_grid_shifts_half_a_cell() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("grid.asc");
        fs::write(
            &file,
            "ncols 1\nnrows 1\nxllcenter 10\nyllcenter 20\ncellsize 2\nnodata_value -1.0\n7.5\n",
        )
        .unwrap();
        let r = Raster::new(file.to_str().unwrap(), "r").unwrap();
        assert_eq!(r.configs.west, 9.0);
        assert_eq!(r.configs.south, 19.0);
        assert_eq!(r.configs.data_type, DataType::F32);
        assert_eq!(r.get_value(0, 0), 7.5);
    }

    #[test]
    fn malformed_values_are_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("grid.asc");
        fs::write(
            &file,
            "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nnodata_value -9999\n1 x\n",
        )
        .unwrap();
        let err = Raster::new(file.to_str().unwrap(), "r").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn written_grid_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.asc");
        let configs = RasterConfigs {
            rows: 2,
            columns: 2,
            nodata: -9999.0,
            north: 2.0,
            south: 0.0,
            east: 2.0,
            west: 0.0,
            resolution_x: 1.0,
            resolution_y: 1.0,
            data_type: DataType::F32,
            ..Default::default()
        };
        let mut out = Raster::initialize_using_config(file.to_str().unwrap(), &configs);
        out.set_row_data(0, vec![0.25, 1.5]);
        out.set_row_data(1, vec![-9999.0, 3.0]);
        out.write().unwrap();

        let back = Raster::new(file.to_str().unwrap(), "r").unwrap();
        assert_eq!(back.get_data(), &[0.25, 1.5, -9999.0, 3.0]);
        assert_eq!(back.configs.data_type, DataType::F32);
        assert_eq!(back.configs.nodata, -9999.0);
    }
}
