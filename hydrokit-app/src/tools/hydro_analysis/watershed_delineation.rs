/*
This tool is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 15/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::pipeline::PipelineReport;
use super::toolkit::WhiteboxExecutable;
use super::watershed_form::{WatershedForm, DEFAULT_THRESHOLD};
use crate::tools::*;
use std::io::{Error, ErrorKind};
use std::path;

/// This tool runs a complete watershed delineation workflow on a digital elevation model (`--dem`) by calling
/// a local installation of WhiteboxTools (`--wbt_dir`). The DEM is first conditioned using
/// `FillDepressionsWangAndLiu` (with flat fixing), after which D8 flow directions and flow accumulation (in
/// cells) are calculated. Streams are extracted wherever the accumulation reaches the stream threshold
/// (`--threshold`, 500 cells by default) and converted to vector lines. Drainage basins are delineated and
/// converted to polygons, and finally the longest flowpath within each basin is traced.
///
/// When pour points are supplied (`--pour_pts`, a point shapefile), they are first snapped to the extracted
/// streams using `JensonSnapPourPoints` with a 50 map-unit snap distance. The watershed draining to the snapped
/// outlets is then delineated and vectorized, and the longest flowpath is traced within that watershed rather
/// than within the basins.
///
/// All outputs are written to the output folder (`--out_dir`) under fixed names:
///
/// | File                          | Contents                              |
/// | ----------------------------- | ------------------------------------- |
/// | filled_dtm.tif                | depressionless DEM                    |
/// | d8pointer_dtm.tif             | D8 flow pointer                       |
/// | d8accum_dtm.tif               | D8 flow accumulation (cells)          |
/// | extract_streams_*THRESHOLD*.tif | stream raster                       |
/// | streams_vector.shp            | stream lines                          |
/// | outlet_final.shp              | snapped pour points                   |
/// | watershed.tif, watershed_poly.shp | pour-point watershed              |
/// | basins.tif, basins_poly.shp   | drainage basins                       |
/// | longest_flowpath.shp          | longest flowpath                      |
///
/// The run stops at the first step that fails; files written by earlier steps are kept. If the
/// `--wbt_dir` parameter is not given, the directory stored in the settings file is used (set it once with
/// `hydrokit --wbt_dir=...`).
pub struct WatershedDelineation {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl WatershedDelineation {
    pub fn new() -> WatershedDelineation {
        // public constructor
        let name = "WatershedDelineation".to_string();
        let toolbox = "Hydrological Analysis".to_string();
        let description =
            "Delineates streams, basins, pour-point watersheds and longest flowpaths from a DEM using WhiteboxTools."
                .to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "WhiteboxTools Directory".to_owned(),
            flags: vec!["--wbt_dir".to_owned()],
            description: "Directory containing the whitebox_tools executable.".to_owned(),
            parameter_type: ParameterType::Directory,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Input DEM File".to_owned(),
            flags: vec!["-i".to_owned(), "--dem".to_owned()],
            description: "Input raster DEM file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Output Folder".to_owned(),
            flags: vec!["--out_dir".to_owned()],
            description: "Folder in which the outputs are written.".to_owned(),
            parameter_type: ParameterType::Directory,
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Stream Threshold (cells)".to_owned(),
            flags: vec!["--threshold".to_owned()],
            description: "Flow accumulation, in cells, at which streams are initiated.".to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: Some(DEFAULT_THRESHOLD.to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Use pour points?".to_owned(),
            flags: vec!["--use_pour_pts".to_owned()],
            description: "Delineate the watershed draining to a set of pour points.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Input Pour Points File".to_owned(),
            flags: vec!["--pour_pts".to_owned()],
            description: "Input pour points (outlet) vector file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Point,
            )),
            default_value: None,
            optional: true,
        });

        let sep: String = path::MAIN_SEPARATOR.to_string();
        let usage = format!(">>.*{0} -r={1} -v --wd=\"*path*to*data*\" --wbt_dir=\"*opt*WBT\" --dem=dem.tif --out_dir=\"*path*to*output\" --threshold=1000
>>.*{0} -r={1} -v --wd=\"*path*to*data*\" --dem=dem.tif --out_dir=\"*path*to*output\" --use_pour_pts --pour_pts=outlet.shp", short_exe_name(), name).replace("*", &sep);

        WatershedDelineation {
            name: name,
            description: description,
            toolbox: toolbox,
            parameters: parameters,
            example_usage: usage,
        }
    }
}

impl HydroKitTool for WatershedDelineation {
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
        if args.len() == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }

        let configs = hydrokit_common::configs::get_configs()?;
        let form = form_from_args(&args, working_directory, &configs.whitebox_dir)?;

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let pipeline = form.validate()?;
        let toolkit = WhiteboxExecutable::new(&form.whitebox_dir, pipeline.output_dir(), verbose)?;
        log::info!("Using {}", toolkit.exe().display());

        let report = pipeline.run(&toolkit, verbose)?;
        if verbose {
            print_report(&report);
        }
        println!(
            "Watershed delineation complete; outputs written to {}",
            pipeline.output_dir().display()
        );

        Ok(())
    }
}

/// Fills a `WatershedForm` from the tool's arguments. Relative paths are taken
/// from the working directory and `default_wbt_dir` applies when `--wbt_dir`
/// is absent. Giving `--pour_pts` turns the pour-points input on unless
/// `--use_pour_pts=false` says otherwise.
fn form_from_args(
    args: &[String],
    working_directory: &str,
    default_wbt_dir: &str,
) -> Result<WatershedForm, Error> {
    let mut form = WatershedForm::new();
    form.whitebox_dir = default_wbt_dir.to_string();
    let mut use_pour_pts: Option<bool> = None;
    let mut pour_pts = String::new();

    for i in 0..args.len() {
        let (flag, value) = flag_and_value(args, i);
        if flag == "-wbt_dir" {
            form.whitebox_dir = required_value(&flag, value)?;
        } else if flag == "-i" || flag == "-dem" || flag == "-input" {
            form.dem = resolve_file(&required_value(&flag, value)?, working_directory);
        } else if flag == "-out_dir" || flag == "-output_folder" {
            form.output_folder = resolve_file(&required_value(&flag, value)?, working_directory);
        } else if flag == "-threshold" {
            form.stream_threshold = required_value(&flag, value)?;
        } else if flag == "-use_pour_pts" {
            use_pour_pts = Some(flag_is_set(&value));
        } else if flag == "-pour_pts" {
            pour_pts = resolve_file(&required_value(&flag, value)?, working_directory);
        }
    }

    match use_pour_pts {
        Some(false) if !pour_pts.is_empty() => {
            log::warn!("--use_pour_pts=false was given; ignoring --pour_pts={}", pour_pts);
        }
        Some(true) => {
            form.pour_points.set_enabled(true);
            form.pour_points.set_path(&pour_pts);
        }
        None if !pour_pts.is_empty() => {
            form.pour_points.set_enabled(true);
            form.pour_points.set_path(&pour_pts);
        }
        _ => {}
    }
    Ok(form)
}

fn print_report(report: &PipelineReport) {
    println!("Outputs:");
    for stage in &report.stages {
        println!("  {}: {}", stage.kind, stage.output.display());
    }
    println!("{}", &format!("Elapsed Time: {}", report.elapsed_time));
}
