/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 15/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use hydrokit_raster::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReclassError {
    #[error("Please enter valid numeric values for all entries ('{input}' given for value {value}).")]
    InvalidEntry { value: f64, input: String },

    #[error("No new value was supplied for value {0}.")]
    MissingEntry(f64),

    #[error("The input raster contains value {0}, which has no entry in the reclass values.")]
    UnmappedValue(f64),

    #[error("Invalid nodata value '{0}'; please enter a number or leave it blank.")]
    InvalidNodata(String),

    #[error("Malformed reclass pair '{0}'; expected old:new, e.g. '1:10;2:20'.")]
    MalformedPair(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ReclassError> for io::Error {
    fn from(err: ReclassError) -> io::Error {
        match err {
            ReclassError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidInput, other.to_string()),
        }
    }
}

/// What happens to cells holding the input raster's nodata value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodataPolicy {
    Keep,
    Replace(f64),
}

impl NodataPolicy {
    pub fn output_nodata(&self, input_nodata: f64) -> f64 {
        match self {
            NodataPolicy::Keep => input_nodata,
            NodataPolicy::Replace(v) => *v,
        }
    }
}

/// A cell value used as a map key. Ordered numerically, equal by bit
/// pattern, with negative zero folded onto zero.
#[derive(Debug, Clone, Copy)]
struct CellValue(f64);

impl CellValue {
    fn new(value: f64) -> CellValue {
        if value == 0f64 {
            CellValue(0f64)
        } else {
            CellValue(value)
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Maps original cell values onto their replacements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReclassMap {
    entries: BTreeMap<CellValue, f64>,
}

impl ReclassMap {
    pub fn new() -> ReclassMap {
        ReclassMap::default()
    }

    /// Adds an entry, returning the replacement previously held for `from`.
    pub fn insert(&mut self, from: f64, to: f64) -> Option<f64> {
        self.entries.insert(CellValue::new(from), to)
    }

    pub fn get(&self, value: f64) -> Option<f64> {
        self.entries.get(&CellValue::new(value)).copied()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.entries.contains_key(&CellValue::new(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending order of the original value.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k.0, *v))
    }

    /// Copies every entry of `other` into this map, replacing existing ones.
    pub fn extend(&mut self, other: &ReclassMap) {
        for (from, to) in other.iter() {
            self.insert(from, to);
        }
    }
}

impl fmt::Display for ReclassMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pairs: Vec<String> = self
            .iter()
            .map(|(from, to)| format!("{}:{}", from, to))
            .collect();
        write!(f, "{}", pairs.join(";"))
    }
}

/// The distinct valid values in `raster` with the number of cells holding each,
/// in ascending order. Nodata and NaN cells are skipped.
pub fn value_counts(raster: &Raster) -> Vec<(f64, usize)> {
    let mut counts: BTreeMap<CellValue, usize> = BTreeMap::new();
    for &z in raster.get_data() {
        if raster.is_nodata(z) || z.is_nan() {
            continue;
        }
        *counts.entry(CellValue::new(z)).or_insert(0) += 1;
    }
    counts.into_iter().map(|(k, n)| (k.0, n)).collect()
}

pub fn unique_values(raster: &Raster) -> Vec<f64> {
    value_counts(raster).into_iter().map(|(v, _)| v).collect()
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

fn parse_pair(token: &str, from: &str, to: &str) -> Result<(f64, f64), ReclassError> {
    match (parse_number(from), parse_number(to)) {
        (Some(a), Some(b)) if a.is_finite() => Ok((a, b)),
        _ => Err(ReclassError::MalformedPair(token.to_string())),
    }
}

fn insert_unique(map: &mut ReclassMap, token: &str, from: f64, to: f64) -> Result<(), ReclassError> {
    match map.insert(from, to) {
        Some(prev) if prev.to_bits() != to.to_bits() => {
            Err(ReclassError::MalformedPair(token.to_string()))
        }
        _ => Ok(()),
    }
}

/// Parses `old:new` pairs separated by semicolons, commas or whitespace,
/// e.g. `1:10;2:20;3:-9999`. The same value may not be mapped twice to
/// different replacements.
pub fn parse_reclass_pairs(text: &str) -> Result<ReclassMap, ReclassError> {
    let mut map = ReclassMap::new();
    let tokens = text
        .split(|c: char| c == ';' || c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());
    for token in tokens {
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() != 2 {
            return Err(ReclassError::MalformedPair(token.to_string()));
        }
        let (from, to) = parse_pair(token, parts[0], parts[1])?;
        insert_unique(&mut map, token, from, to)?;
    }
    if map.is_empty() {
        return Err(ReclassError::MalformedPair(text.trim().to_string()));
    }
    Ok(map)
}

/// Reads a mapping file holding one `old,new` pair per line. A colon or
/// whitespace may stand in for the comma. Blank lines and text following
/// a `#` are ignored.
pub fn read_reclass_file<P: AsRef<Path>>(file_name: P) -> Result<ReclassMap, ReclassError> {
    let contents = fs::read_to_string(file_name)?;
    let mut map = ReclassMap::new();
    for line in contents.lines() {
        let line = match line.find('#') {
            Some(i) => &line[..i],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c == ':' || c == ';' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if fields.len() != 2 {
            return Err(ReclassError::MalformedPair(line.to_string()));
        }
        let (from, to) = parse_pair(line, fields[0], fields[1])?;
        insert_unique(&mut map, line, from, to)?;
    }
    if map.is_empty() {
        return Err(ReclassError::MalformedPair(String::new()));
    }
    Ok(map)
}

/// Blank text keeps the input nodata value; anything else must be a number.
pub fn parse_nodata_override(text: &str) -> Result<NodataPolicy, ReclassError> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(NodataPolicy::Keep);
    }
    match t.parse::<f64>() {
        Ok(v) => Ok(NodataPolicy::Replace(v)),
        Err(_) => Err(ReclassError::InvalidNodata(t.to_string())),
    }
}

/// Asks for a new value for each entry of `values`, then for the output
/// nodata value. Nothing is returned unless every answer is numeric.
pub fn prompt_for_mapping<R: BufRead, W: Write>(
    values: &[f64],
    current_nodata: f64,
    mut reader: R,
    mut writer: W,
) -> Result<(ReclassMap, NodataPolicy), ReclassError> {
    let mut map = ReclassMap::new();
    let mut line = String::new();
    writeln!(writer, "Enter new values for each unique value:")?;
    for &value in values {
        write!(writer, "Value {}: ", value)?;
        writer.flush()?;
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(ReclassError::MissingEntry(value));
        }
        let input = line.trim();
        match input.parse::<f64>() {
            Ok(v) => {
                map.insert(value, v);
            }
            Err(_) => {
                return Err(ReclassError::InvalidEntry {
                    value,
                    input: input.to_string(),
                })
            }
        }
    }

    write!(writer, "Nodata value [{}]: ", current_nodata)?;
    writer.flush()?;
    line.clear();
    reader.read_line(&mut line)?;
    let policy = parse_nodata_override(&line)?;
    Ok((map, policy))
}

/// Checks that each of `values` has an entry in `map`.
pub fn validate_mapping(values: &[f64], map: &ReclassMap) -> Result<(), ReclassError> {
    match values.iter().find(|&&v| !map.contains(v)) {
        Some(&v) => Err(ReclassError::MissingEntry(v)),
        None => Ok(()),
    }
}

/// Creates the reclassified version of `input`, named `output_file`. The
/// output has the input's shape and georeferencing, is stored as 32-bit
/// floats, and uses the nodata value chosen by `policy`. Every valid value
/// in the input must have an entry in `map`; this is checked before any
/// cell is produced. The returned raster has not been written to disk.
pub fn reclassify(
    input: Arc<Raster>,
    map: &ReclassMap,
    policy: NodataPolicy,
    output_file: &str,
    max_procs: isize,
) -> Result<Raster, ReclassError> {
    let values = unique_values(&input);
    if let Some(&v) = values.iter().find(|&&v| !map.contains(v)) {
        return Err(ReclassError::UnmappedValue(v));
    }
    let unused = map.iter().filter(|(from, _)| values.binary_search_by(|v| v.total_cmp(from)).is_err()).count();
    if unused > 0 {
        log::debug!("{} reclass entries match no cells in {}", unused, input.get_short_filename());
    }

    let rows = input.configs.rows as isize;
    let columns = input.configs.columns as isize;
    let out_nodata = policy.output_nodata(input.configs.nodata);

    let mut output = Raster::initialize_using_file(output_file, &input);
    output.configs.data_type = DataType::F32;
    output.configs.nodata = out_nodata;
    let map = Arc::new(map.clone());

    let mut num_procs = num_cpus::get() as isize;
    if max_procs > 0 && max_procs < num_procs {
        num_procs = max_procs;
    }
    let (tx, rx) = mpsc::channel();
    for tid in 0..num_procs {
        let input = input.clone();
        let map = map.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            for row in (0..rows).filter(|r| r % num_procs == tid) {
                let mut data: Vec<f64> = vec![out_nodata; columns as usize];
                for col in 0..columns {
                    let z = input.get_value(row, col);
                    if !input.is_nodata(z) {
                        data[col as usize] = match map.get(z) {
                            // stored as F32
                            Some(v) => v as f32 as f64,
                            None => z,
                        };
                    }
                }
                if tx.send((row, data)).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    for _ in 0..rows {
        let (row, data) = rx.recv().map_err(|_| {
            io::Error::new(io::ErrorKind::Other, "Error receiving data from thread.")
        })?;
        output.set_row_data(row, data);
    }
    output.update_min_max();

    Ok(output)
}
