/*
This tool is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 15/10/2026
Last Modified: 15/10/2026
License: MIT
*/

use super::reclass_map::value_counts;
use crate::tools::*;
use hydrokit_raster::*;
use std::fs::File;
use std::io::{BufWriter, Error, ErrorKind, Write};
use std::path;

/// This tool lists the distinct values of a raster (`--input`) along with the number of grid cells holding
/// each one. NoData cells are not counted. When an output file (`--output`) is specified, the tool also writes
/// a reclass template: one `value,value` line per distinct value. Edit the second column of the template and
/// pass it to `ReclassifyValues` with its `--reclass_file` parameter.
///
/// # See Also
/// `ReclassifyValues`
pub struct ListUniqueValues {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl ListUniqueValues {
    pub fn new() -> ListUniqueValues {
        // public constructor
        let name = "ListUniqueValues".to_string();
        let toolbox = "GIS Analysis".to_string();
        let description = "Lists the distinct values contained in a raster and their cell counts.".to_string();

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
            name: "Output Template File".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Optional output reclass template (text) file.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Text),
            default_value: None,
            optional: true,
        });

        let sep: String = path::MAIN_SEPARATOR.to_string();
        let usage = format!(
            ">>.*{0} -r={1} -v --wd=\"*path*to*data*\" -i=landcover.tif -o=classes.txt",
            short_exe_name(),
            name
        )
        .replace("*", &sep);

        ListUniqueValues {
            name: name,
            description: description,
            toolbox: toolbox,
            parameters: parameters,
            example_usage: usage,
        }
    }
}

impl HydroKitTool for ListUniqueValues {
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
            }
        }
        if input_file.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "An input raster (--input) must be specified.",
            ));
        }

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let input_file = resolve_file(&input_file, working_directory);
        let output_file = resolve_file(&output_file, working_directory);

        if verbose {
            println!("Reading data...")
        };
        let input = Raster::new(&input_file, "r")?;
        let counts = value_counts(&input);

        println!("Value: Cell count");
        for (value, n) in &counts {
            println!("{}: {}", value, n);
        }
        println!("NoData value: {}", input.configs.nodata);
        if counts.len() > 1000 {
            log::warn!(
                "{} holds {} distinct values; it may be a continuous raster",
                input.get_short_filename(),
                counts.len()
            );
        }

        if !output_file.is_empty() {
            if verbose {
                println!("Saving data...")
            };
            let mut writer = BufWriter::new(File::create(&output_file)?);
            writeln!(writer, "# old,new reclass template for {}", input_file)?;
            for (value, _) in &counts {
                writeln!(writer, "{0},{0}", value)?;
            }
            writer.flush()?;
            if verbose {
                println!("Output file written")
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::reclass_map::read_reclass_file;
    use super::*;

    #[test]
    fn template_reads_back_as_identity_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let mut configs = RasterConfigs::default();
        configs.rows = 2;
        configs.columns = 2;
        configs.nodata = -1f64;
        configs.data_type = DataType::F32;
        let input = dir.path().join("grid.asc").to_string_lossy().to_string();
        let mut r = Raster::initialize_using_config(&input, &configs);
        r.set_data(vec![4.5, -1.0, 2.0, 4.5]).unwrap();
        r.write().unwrap();

        let template = dir.path().join("classes.txt");
        ListUniqueValues::new()
            .run(
                vec![format!("-i={}", input), format!("-o={}", template.display())],
                "",
                false,
            )
            .unwrap();

        let map = read_reclass_file(&template).unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(2.0, 2.0), (4.5, 4.5)]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let err = ListUniqueValues::new()
            .run(vec!["-o=classes.txt".to_string()], "", false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
