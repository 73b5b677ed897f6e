/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 14/10/2026
Last Modified: 16/10/2026
License: MIT
*/

/*!
HydroKit is a small command-line toolkit for raster reclassification and for
driving a WhiteboxTools watershed delineation workflow.

It is run by calling it, with appropriate commands and arguments, from a
terminal application or from a script. The following commands are recognized:

| Command           | Description                                                                          |
| ----------------- | ------------------------------------------------------------------------------------ |
| --cd, --wd        | Changes the working directory; used in conjunction with --run flag.                  |
| -h, --help        | Prints help information.                                                             |
| -l, --license     | Prints the license. Tool names may also be used, --license=\"ReclassifyValues\"      |
| --listtools       | Lists all available tools, with tool descriptions. Keywords may also be used.        |
| -r, --run         | Runs a tool; used in conjunction with --cd flag; -r="ReclassifyValues".              |
| --toolbox         | Prints the toolbox associated with a tool; --toolbox=ReclassifyValues.               |
| --toolhelp        | Prints the help associated with a tool; --toolhelp="WatershedDelineation".           |
| --toolparameters  | Prints the parameters (in json form) for a specific tool.                            |
| --wbt_dir         | Sets the default WhiteboxTools directory used by WatershedDelineation.               |
| -v                | Verbose mode. Without this flag, tool outputs will not be printed.                   |
| --version         | Prints the version information.                                                      |

*/

pub mod tools;

use crate::tools::ToolManager;
use anyhow::Context;
use std::env;
use std::path;

#[macro_use]
extern crate serde_derive;

/// # Examples
///
/// From the command line prompt, *HydroKit* can be called to run a tool as follows:
///
/// ```text
/// >>./hydrokit --wd='/Users/jane/data/' --run=ReclassifyValues --input='landcover.tif' --output='reclassed.tif' --reclass_vals='1:10;2:20' -v
/// ```
fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

/// Returns the value of `arg` if it is one of the `names` flags, in either
/// `-flag=value` or bare `-flag` form. Flags are matched without case and
/// with `--` treated as `-`.
fn flag_value(arg: &str, names: &[&str]) -> Option<String> {
    let a = arg.replace("\"", "").replace("\'", "");
    let (flag, value) = match a.find('=') {
        Some(i) => (&a[..i], a[i + 1..].to_string()),
        None => (a.as_str(), String::new()),
    };
    let flag = flag.to_lowercase().replace("--", "-");
    if names.contains(&flag.as_str()) {
        Some(value)
    } else {
        None
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn run() -> anyhow::Result<()> {
    let sep: &str = &path::MAIN_SEPARATOR.to_string();
    let mut working_dir = String::new();
    let mut tool_name = String::new();
    let mut run_tool = false;
    let mut tool_help = false;
    let mut tool_parameters = false;
    let mut toolbox = false;
    let mut list_tools = false;
    let mut keywords: Vec<String> = vec![];
    let mut tool_args_vec: Vec<String> = vec![];
    let mut finding_working_dir = false;
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        version();
        // print help
        help();
        // list tools
        let tm = ToolManager::new(&working_dir, &false)?;
        tm.list_tools();

        return Ok(());
    }

    let mut configs = hydrokit_common::configs::get_configs()?;
    let mut configs_modified = false;

    for arg in args {
        if flag_value(&arg, &["-h", "-help"]).is_some() {
            help();
            return Ok(());
        } else if let Some(mut v) = flag_value(&arg, &["-cd", "-wd", "-working_directory"]) {
            if v.trim().is_empty() {
                finding_working_dir = true;
                continue;
            }
            if !v.ends_with(sep) {
                v.push_str(sep);
            }
            working_dir = v;
            if configs.working_directory != working_dir {
                // update the value
                configs.working_directory = working_dir.clone();
                configs_modified = true;
            }
        } else if let Some(v) = flag_value(&arg, &["-r", "-run"]) {
            tool_name = v;
            run_tool = true;
        } else if let Some(v) = flag_value(&arg, &["-toolhelp"]) {
            tool_name = v;
            tool_help = true;
        } else if let Some(v) = flag_value(&arg, &["-toolparameters"]) {
            tool_name = v;
            tool_parameters = true;
        } else if let Some(v) = flag_value(&arg, &["-toolbox"]) {
            tool_name = v;
            toolbox = true;
        } else if flag_value(&arg, &["-listtools", "-list_tools"]).is_some() {
            list_tools = true;
        } else if let Some(v) = flag_value(&arg, &["-l", "-license", "-licence"]) {
            if !v.is_empty() {
                let tm = ToolManager::new(&configs.working_directory, &configs.verbose_mode)?;
                tm.tool_license(v)?;
            } else {
                license();
            }
            return Ok(());
        } else if let Some(v) = flag_value(&arg, &["-compress_rasters", "-compress_raster"]) {
            let compress = v.to_lowercase().contains("t") || v.is_empty();
            if configs.compress_rasters != compress {
                // update value
                configs.compress_rasters = compress;
                configs_modified = true;
            }
        } else if let Some(v) = flag_value(&arg, &["-v", "-verbose"]) {
            let verbose = v.to_lowercase().contains("t") || v.is_empty();
            if configs.verbose_mode != verbose {
                configs.verbose_mode = verbose;
                configs_modified = true;
            }
        } else if let Some(v) = flag_value(&arg, &["-max_procs"]) {
            let val = v
                .trim()
                .parse::<isize>()
                .with_context(|| format!("Error parsing --max_procs value '{}'", v))?;
            if val != configs.max_procs {
                configs.max_procs = val;
                configs_modified = true;
            }
        } else if flag_value(&arg, &["-version"]).is_some() {
            version();
            return Ok(());
        } else if let Some(v) = flag_value(&arg, &["-wbt_dir"]) {
            // remembered for later runs and passed through to the tool
            if !v.trim().is_empty() && configs.whitebox_dir != v {
                configs.whitebox_dir = v;
                configs_modified = true;
            }
            tool_args_vec.push(arg.trim().to_string());
        } else if arg.starts_with("-") {
            // it's an arg to be fed to the tool
            tool_args_vec.push(arg.trim().to_string());
        } else if finding_working_dir {
            working_dir = arg.trim().to_string();
            if !working_dir.ends_with(sep) {
                working_dir.push_str(sep);
            }
            finding_working_dir = false;
            configs.working_directory = working_dir.clone();
            configs_modified = true;
        } else if tool_args_vec.len() > 0 {
            // the value of a space-separated tool flag
            tool_args_vec.push(arg.trim().to_string());
        } else {
            // add it to the keywords list
            keywords.push(arg.trim().replace("\"", "").replace("\'", ""));
        }
    }

    init_logger(configs.verbose_mode);

    if configs_modified {
        hydrokit_common::configs::save_configs(&configs)?;
    }

    let tm = ToolManager::new(&configs.working_directory, &configs.verbose_mode)?;
    if run_tool {
        if tool_name.is_empty() && keywords.len() > 0 {
            tool_name = keywords[0].clone();
        }
        tm.run_tool(tool_name, tool_args_vec)?;
    } else if tool_help {
        if tool_name.is_empty() && keywords.len() > 0 {
            tool_name = keywords[0].clone();
        }
        tm.tool_help(tool_name)?;
    } else if tool_parameters {
        if tool_name.is_empty() && keywords.len() > 0 {
            tool_name = keywords[0].clone();
        }
        tm.tool_parameters(tool_name)?;
    } else if toolbox {
        if tool_name.is_empty() && keywords.len() > 0 {
            tool_name = keywords[0].clone();
        }
        tm.toolbox(tool_name)?;
    } else if list_tools {
        if keywords.len() == 0 {
            tm.list_tools();
        } else {
            tm.list_tools_with_keywords(keywords);
        }
    }

    Ok(())
}

fn help() {
    let mut ext = "";
    if cfg!(target_os = "windows") {
        ext = ".exe";
    }

    let exe_name = &format!("hydrokit{}", ext);
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let s = "HydroKit Help

The following commands are recognized:
--cd, --wd          Changes the working directory; used in conjunction with --run flag.
--compress_rasters  Sets the compress_rasters option in the settings.json file; determines if newly created rasters are compressed. e.g. --compress_rasters=true
-h, --help          Prints help information.
-l, --license       Prints the HydroKit license. Tool names may also be used, --license=\"ReclassifyValues\"
--listtools         Lists all available tools. Keywords may also be used, --listtools watershed.
--max_procs         Sets the maximum number of processors used. -1 = all available processors. e.g. --max_procs=2
-r, --run           Runs a tool; used in conjunction with --wd flag; -r=\"ReclassifyValues\".
--toolbox           Prints the toolbox associated with a tool; --toolbox=ReclassifyValues.
--toolhelp          Prints the help associated with a tool; --toolhelp=\"WatershedDelineation\".
--toolparameters    Prints the parameters (in json form) for a specific tool; --toolparameters=\"ReclassifyValues\".
--wbt_dir           Sets the WhiteboxTools directory stored in the settings.json file; e.g. --wbt_dir=\"*opt*WBT\"
-v                  Verbose mode. Without this flag, tool outputs will not be printed.
--version           Prints the version information.

Logging detail can be raised with the RUST_LOG environment variable, e.g. RUST_LOG=debug.

Example Usage:
>> .*EXE_NAME -r=ReclassifyValues --cd=\"*path*to*data*\" -i=landcover.tif -o=reclassed.tif --reclass_vals='1:10;2:20;3:30'
"
    .replace("*", &sep)
    .replace("EXE_NAME", exe_name);
    println!("{}", s);
}

fn license() {
    let license_text = "HydroKit License
Copyright 2026 HydroKit contributors

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the \"Software\"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense,
and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so,
subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial
portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES
OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.";
    println!("{}", license_text);
}

fn version() {
    const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
    println!(
        "HydroKit v{} by the HydroKit contributors (c) 2026

HydroKit reclassifies raster values and drives WhiteboxTools watershed
delineation workflows.",
        VERSION.unwrap_or("unknown")
    );
}

#[cfg(test)]
mod tests {
    use super::flag_value;

    #[test]
    fn flags_match_exactly() {
        assert_eq!(flag_value("--run=ReclassifyValues", &["-r", "-run"]), Some("ReclassifyValues".to_string()));
        assert_eq!(flag_value("-r=\"WatershedDelineation\"", &["-r", "-run"]), Some("WatershedDelineation".to_string()));
        assert_eq!(flag_value("--reclass_vals=1:2", &["-r", "-run"]), None);
        assert_eq!(flag_value("--WD=/data", &["-cd", "-wd"]), Some("/data".to_string()));
        assert_eq!(flag_value("-v", &["-v", "-verbose"]), Some(String::new()));
        assert_eq!(flag_value("--listtools", &["-l", "-license"]), None);
    }
}
