/*
This tool is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 15/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::reclass_map::*;
use crate::tools::*;
use hydrokit_common::utils::get_formatted_elapsed_time;
use hydrokit_raster::*;
use std::io::{self, Error, ErrorKind};
use std::path;
use std::sync::Arc;
use std::time::Instant;

/// This tool creates a new raster in which each distinct value of the input raster (`--input`) is replaced
/// by a user-supplied value. The replacement values are given as `old:new` pairs, either on the command
/// line (`--reclass_vals`) or in a text file holding one `old,new` pair per line (`--reclass_file`):
///
/// > --reclass_vals='1:10;2:20;3:30'
///
/// Alternatively, with the `--interactive` flag the tool lists each distinct value found in the input and
/// asks for its replacement at the console; it cannot be combined with the other two. Every distinct value in the input raster must receive a new
/// value; the tool stops with an error, without creating the output file, if any value is left unmapped
/// or if any entry is not numeric.
///
/// Cells holding the input's NoData value remain NoData. They are written using the `--new_nodata`
/// value when one is given, and keep the input's NoData value otherwise. The output raster has the same
/// dimensions and georeferencing as the input and is always stored as 32-bit floating-point values.
///
/// # See Also
/// `ListUniqueValues`
pub struct ReclassifyValues {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl ReclassifyValues {
    pub fn new() -> ReclassifyValues {
        // public constructor
        let name = "ReclassifyValues".to_string();
        let toolbox = "GIS Analysis".to_string();
        let description =
            "Assigns a new value to each distinct value of a raster and optionally updates its NoData value."
                .to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input File".to_owned(),
            flags: vec!["-i".to_owned(), "--input".to_owned()],
            description: "Input raster file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Output File".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Output raster file.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Reclass Values (old value:new value)".to_owned(),
            flags: vec!["--reclass_vals".to_owned()],
            description: "Reclassification pairs (old value:new value), e.g. '1:10;2:20;3:30'".to_owned(),
            parameter_type: ParameterType::String,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Reclass File".to_owned(),
            flags: vec!["--reclass_file".to_owned()],
            description: "Text file containing one 'old,new' pair per line.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Text),
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "New NoData Value".to_owned(),
            flags: vec!["--new_nodata".to_owned()],
            description: "Optional NoData value for the output; defaults to the input's NoData value.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Enter new values at the console?".to_owned(),
            flags: vec!["--interactive".to_owned()],
            description: "Prompt for the new value of each distinct input value.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });

        let sep: String = path::MAIN_SEPARATOR.to_string();
        let usage = format!(">>.*{0} -r={1} -v --wd=\"*path*to*data*\" -i=landcover.tif -o=output.tif --reclass_vals='1:10;2:20;3:30' --new_nodata=-9999
>>.*{0} -r={1} -v --wd=\"*path*to*data*\" -i=landcover.tif -o=output.tif --reclass_file=classes.txt
>>.*{0} -r={1} --wd=\"*path*to*data*\" -i=landcover.tif -o=output.tif --interactive", short_exe_name(), name).replace("*", &sep);

        ReclassifyValues {
            name: name,
            description: description,
            toolbox: toolbox,
            parameters: parameters,
            example_usage: usage,
        }
    }
}

impl HydroKitTool for ReclassifyValues {
    fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    fn get_tool_parameters(&self) -> String {
        match serde_json::to_string(&self.parameters) {
            Ok(json_str) => return format!("{{\"parameters\":{}}}", json_str),
            Err(err) => return format!("{:?}", err),
        }
    }

    fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    fn get_toolbox(&self) -> String {
        self.toolbox.clone()
    }

    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error> {
        let mut input_file = String::new();
        let mut output_file = String::new();
        let mut reclass_str = String::new();
        let mut reclass_file = String::new();
        let mut new_nodata = String::new();
        let mut interactive = false;

        if args.len() == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }
        for i in 0..args.len() {
            let (flag, value) = flag_and_value(&args, i);
            if flag == "-i" || flag == "-input" {
                input_file = required_value(&flag, value)?;
            } else if flag == "-o" || flag == "-output" {
                output_file = required_value(&flag, value)?;
            } else if flag == "-reclass_vals" {
                reclass_str = required_value(&flag, value)?;
            } else if flag == "-reclass_file" {
                reclass_file = required_value(&flag, value)?;
            } else if flag == "-new_nodata" {
                new_nodata = required_value(&flag, value)?;
            } else if flag == "-interactive" {
                interactive = flag_is_set(&value);
            }
        }

        if input_file.is_empty() || output_file.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Both an input (--input) and an output (--output) raster must be specified.",
            ));
        }
        if !interactive && reclass_str.is_empty() && reclass_file.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "No reclass values were supplied. Use --reclass_vals, --reclass_file or --interactive.",
            ));
        }
        if interactive && (!reclass_str.is_empty() || !reclass_file.is_empty()) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "--interactive cannot be combined with --reclass_vals or --reclass_file.",
            ));
        }

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let input_file = resolve_file(&input_file, working_directory);
        let output_file = resolve_file(&output_file, working_directory);
        let reclass_file = resolve_file(&reclass_file, working_directory);

        // the nodata override is checked before any data are read
        let mut policy = parse_nodata_override(&new_nodata)?;

        if verbose {
            println!("Reading data...")
        };
        let input = Arc::new(Raster::new(&input_file, "r")?);

        let mut map = ReclassMap::new();
        if interactive {
            let values = unique_values(&input);
            let stdin = io::stdin();
            let stdout = io::stdout();
            let (entered, prompted_policy) =
                prompt_for_mapping(&values, input.configs.nodata, stdin.lock(), stdout.lock())?;
            validate_mapping(&values, &entered)?;
            map.extend(&entered);
            if new_nodata.trim().is_empty() {
                policy = prompted_policy;
            }
        } else {
            if !reclass_file.is_empty() {
                map.extend(&read_reclass_file(&reclass_file)?);
            }
            if !reclass_str.is_empty() {
                map.extend(&parse_reclass_pairs(&reclass_str)?);
            }
        }
        log::info!("Reclassifying {} with {} entries", input_file, map.len());

        let configs = hydrokit_common::configs::get_configs()?;
        let start = Instant::now();
        let mut output = reclassify(input.clone(), &map, policy, &output_file, configs.max_procs)?;
        output.compress = configs.compress_rasters;
        let elapsed_time = get_formatted_elapsed_time(start);

        if verbose {
            println!("Progress: 100%");
        }

        output.add_metadata_entry(format!(
            "Created by HydroKit\'s {} tool",
            self.get_tool_name()
        ));
        output.add_metadata_entry(format!("Input file: {}", input_file));
        output.add_metadata_entry(format!("Reclass values: {}", map));
        output.add_metadata_entry(format!("Elapsed Time (excluding I/O): {}", elapsed_time));

        if verbose {
            println!("Saving data...")
        };
        let _ = match output.write() {
            Ok(_) => {
                if verbose {
                    println!("Output file written")
                }
            }
            Err(e) => return Err(e),
        };

        if verbose {
            println!(
                "{}",
                &format!("Elapsed Time (excluding I/O): {}", elapsed_time)
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_input(dir: &Path) -> String {
        let mut configs = RasterConfigs::default();
        configs.rows = 2;
        configs.columns = 3;
        configs.nodata = -32768f64;
        configs.data_type = DataType::I16;
        configs.epsg_code = 32617;
        configs.resolution_x = 30f64;
        configs.resolution_y = 30f64;
        configs.west = 500000f64;
        configs.east = 500090f64;
        configs.north = 4800060f64;
        configs.south = 4800000f64;
        let file = dir.join("landcover.tif").to_string_lossy().to_string();
        let mut r = Raster::initialize_using_config(&file, &configs);
        r.set_data(vec![1.0, 2.0, 3.0, -32768.0, 2.0, 1.0]).unwrap();
        r.write().unwrap();
        file
    }

    fn run(args: &[String]) -> Result<(), Error> {
        ReclassifyValues::new().run(args.to_vec(), "", false)
    }

    #[test]
    fn writes_reclassified_raster() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.tif").to_string_lossy().to_string();
        run(&[
            format!("--input={}", input),
            format!("--output={}", output),
            "--reclass_vals=1:10;2:20;3:30".to_string(),
            "--new_nodata=-9999".to_string(),
        ])
        .unwrap();

        let out = Raster::new(&output, "r").unwrap();
        assert_eq!(out.configs.data_type, DataType::F32);
        assert_eq!(out.configs.nodata, -9999.0);
        assert_eq!(out.configs.epsg_code, 32617);
        assert_eq!(out.get_data(), &[10.0, 20.0, 30.0, -9999.0, 20.0, 10.0]);
    }

    #[test]
    fn file_and_command_line_pairs_combine() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let classes = dir.path().join("classes.txt");
        std::fs::write(&classes, "1,100\n2,200\n").unwrap();
        let output = dir.path().join("out.tif").to_string_lossy().to_string();
        run(&[
            format!("-i={}", input),
            format!("-o={}", output),
            format!("--reclass_file={}", classes.display()),
            "--reclass_vals=3:300".to_string(),
        ])
        .unwrap();
        let out = Raster::new(&output, "r").unwrap();
        assert_eq!(out.configs.nodata, -32768.0);
        assert_eq!(out.get_data(), &[100.0, 200.0, 300.0, -32768.0, 200.0, 100.0]);
    }

    #[test]
    fn invalid_entries_create_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.tif");
        for bad in [
            vec!["--reclass_vals=1:10;2:abc;3:30".to_string()],
            vec!["--reclass_vals=1:10;2:20".to_string()],
            vec![
                "--reclass_vals=1:10;2:20;3:30".to_string(),
                "--new_nodata=none".to_string(),
            ],
        ] {
            let mut args = vec![
                format!("--input={}", input),
                format!("--output={}", output.display()),
            ];
            args.extend(bad);
            let err = run(&args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert!(!output.exists());
        }
    }

    #[test]
    fn requires_a_source_of_values() {
        let err = run(&["-i=a.tif".to_string(), "-o=b.tif".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = run(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn interactive_excludes_other_value_sources() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.tif");
        let err = run(&[
            format!("--input={}", input),
            format!("--output={}", output.display()),
            "--reclass_vals=1:10;2:20;3:30".to_string(),
            "--interactive".to_string(),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("--interactive"));
        assert!(!output.exists());
    }
}
