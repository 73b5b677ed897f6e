pub mod gis_analysis;
pub mod hydro_analysis;

use std::env;
use std::io::{Error, ErrorKind};
use std::path;

#[derive(Default)]
pub struct ToolManager {
    pub working_dir: String,
    pub verbose: bool,
    tool_names: Vec<String>,
}

impl ToolManager {
    pub fn new<'a>(
        working_directory: &'a str,
        verbose_mode: &'a bool,
    ) -> Result<ToolManager, Error> {
        let mut tool_names = vec![];
        // gis_analysis
        tool_names.push("ListUniqueValues".to_string());
        tool_names.push("ReclassifyValues".to_string());

        // hydro_analysis
        tool_names.push("WatershedDelineation".to_string());

        let tm = ToolManager {
            working_dir: working_directory.to_string(),
            verbose: *verbose_mode,
            tool_names: tool_names,
        };
        Ok(tm)
    }

    fn get_tool(&self, tool_name: &str) -> Option<Box<dyn HydroKitTool + 'static>> {
        match tool_name.to_lowercase().replace("_", "").as_ref() {
            // gis_analysis
            "listuniquevalues" => Some(Box::new(gis_analysis::ListUniqueValues::new())),
            "reclassifyvalues" => Some(Box::new(gis_analysis::ReclassifyValues::new())),

            // hydro_analysis
            "watersheddelineation" => Some(Box::new(hydro_analysis::WatershedDelineation::new())),

            _ => None,
        }
    }

    pub fn run_tool(&self, tool_name: String, args: Vec<String>) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => tool.run(args, &self.working_dir, self.verbose),
            None => Err(unrecognized_tool(&tool_name)),
        }
    }

    pub fn tool_help(&self, tool_name: String) -> Result<(), Error> {
        if !tool_name.is_empty() {
            match self.get_tool(tool_name.as_ref()) {
                Some(tool) => println!("{}", get_help(tool)),
                None => return Err(unrecognized_tool(&tool_name)),
            }
        } else {
            let mut i = 1;
            for val in &self.tool_names {
                if let Some(tool) = self.get_tool(&val) {
                    println!("{}. {}\n", i, get_help(tool));
                    i += 1;
                }
            }
        }
        Ok(())
    }

    pub fn tool_license(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(_tool) => println!("MIT"),
            None => return Err(unrecognized_tool(&tool_name)),
        }
        Ok(())
    }

    pub fn tool_parameters(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => println!("{}", tool.get_tool_parameters()),
            None => return Err(unrecognized_tool(&tool_name)),
        }
        Ok(())
    }

    pub fn toolbox(&self, tool_name: String) -> Result<(), Error> {
        if !tool_name.is_empty() {
            match self.get_tool(tool_name.as_ref()) {
                Some(tool) => println!("{}", tool.get_toolbox()),
                None => return Err(unrecognized_tool(&tool_name)),
            }
        } else {
            let mut tool_details: Vec<(String, String)> = Vec::new();
            for val in &self.tool_names {
                if let Some(tool) = self.get_tool(&val) {
                    tool_details.push((val.to_string(), tool.get_toolbox()));
                }
            }
            tool_details.sort();
            for (name, toolbox) in &tool_details {
                println!("{}: {}", name, toolbox);
            }
        }
        Ok(())
    }

    pub fn list_tools(&self) {
        println!("{}", self.tool_listing(&[]));
    }

    pub fn list_tools_with_keywords(&self, keywords: Vec<String>) {
        println!("{}", self.tool_listing(&keywords));
    }

    /// Builds the `--listtools` output. An empty keyword list matches every tool.
    fn tool_listing(&self, keywords: &[String]) -> String {
        let mut tool_details: Vec<(String, String)> = Vec::new();
        for val in &self.tool_names {
            let tool = match self.get_tool(&val) {
                Some(t) => t,
                None => continue,
            };
            let toolbox = tool.get_toolbox().to_lowercase();
            let (nm, des) = get_name_and_description(tool);
            let matched = keywords.is_empty()
                || keywords.iter().any(|kw| {
                    let kw = kw.to_lowercase();
                    nm.to_lowercase().contains(&kw)
                        || des.to_lowercase().contains(&kw)
                        || toolbox.contains(&kw)
                });
            if matched {
                tool_details.push((nm, des));
            }
        }
        tool_details.sort();

        let mut ret = if keywords.is_empty() {
            format!("All {} Available Tools:\n", tool_details.len())
        } else {
            format!("All {} Tools containing keywords:\n", tool_details.len())
        };
        for (nm, des) in &tool_details {
            ret.push_str(&format!("{}: {}\n\n", nm, des));
        }
        ret
    }
}

fn unrecognized_tool(tool_name: &str) -> Error {
    Error::new(
        ErrorKind::NotFound,
        format!("Unrecognized tool name {}.", tool_name),
    )
}

pub trait HydroKitTool {
    fn get_tool_name(&self) -> String;
    fn get_tool_description(&self) -> String;
    fn get_tool_parameters(&self) -> String;
    fn get_example_usage(&self) -> String;
    fn get_toolbox(&self) -> String;
    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error>;
}

fn get_help<'a>(wt: Box<dyn HydroKitTool + 'a>) -> String {
    let tool_name = wt.get_tool_name();
    let description = wt.get_tool_description();
    let parameters = wt.get_tool_parameters();
    let toolbox = wt.get_toolbox();
    let o: serde_json::Value = serde_json::from_str(&parameters).unwrap_or(serde_json::Value::Null);
    let mut p = String::new();
    p.push_str("Flag               Description\n");
    p.push_str("-----------------  -----------\n");
    if let Some(a) = o["parameters"].as_array() {
        for d in a {
            let mut s = String::new();
            if let Some(flags) = d["flags"].as_array() {
                for f in flags {
                    s.push_str(&format!("{}, ", f.as_str().unwrap_or("")));
                }
            }
            p.push_str(&format!(
                "{:width$} {}\n",
                s.trim().trim_matches(','),
                d["description"].as_str().unwrap_or(""),
                width = 18
            ));
        }
    }
    let example = wt.get_example_usage();
    let s: String;
    if example.len() <= 1 {
        s = format!(
            "{}

Description:\n{}
Toolbox: {}
Parameters:\n
{}
",
            tool_name, description, toolbox, p
        );
    } else {
        s = format!(
            "{}
Description:\n{}
Toolbox: {}
Parameters:\n
{}

Example usage:
{}
",
            tool_name, description, toolbox, p, example
        );
    }
    s
}

fn get_name_and_description<'a>(wt: Box<dyn HydroKitTool + 'a>) -> (String, String) {
    (wt.get_tool_name(), wt.get_tool_description())
}

/// The executable's file name, as shown in example usage strings.
fn short_exe_name() -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let exe = match env::current_exe() {
        Ok(e) => e,
        Err(_) => return "hydrokit".to_string(),
    };
    let e = format!("{}", exe.display());
    let p = match exe.parent() {
        Some(parent) => format!("{}", parent.display()),
        None => String::new(),
    };
    let mut short_exe = e
        .replace(&p, "")
        .replace(".exe", "")
        .replace(".", "")
        .replace(&sep, "");
    if e.contains(".exe") {
        short_exe += ".exe";
    }
    short_exe
}

fn print_welcome(tool_name: &str) {
    let lines = [
        format!("Welcome to {}", tool_name),
        format!("Powered by HydroKit v{}", env!("CARGO_PKG_VERSION")),
    ];
    let welcome_len = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    println!("{}", "*".repeat(welcome_len));
    for l in &lines {
        println!("* {}{}*", l, " ".repeat(welcome_len - 3 - l.len()));
    }
    println!("{}", "*".repeat(welcome_len));
}

/// Bare file names are taken relative to the working directory.
fn resolve_file(file_name: &str, working_directory: &str) -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    if file_name.is_empty() || file_name.contains(&sep) || file_name.contains("/") {
        return file_name.to_string();
    }
    format!("{}{}", working_directory, file_name)
}

/// Splits a `-flag=value` (or `-flag value`) argument the way every tool
/// parses its command line. Returns the lower-cased flag and its value, if any.
fn flag_and_value(args: &[String], i: usize) -> (String, Option<String>) {
    let arg = args[i].replace("\"", "").replace("\'", "");
    let mut vec = arg.splitn(2, "=");
    let flag = vec.next().unwrap_or("").to_lowercase().replace("--", "-");
    match vec.next() {
        Some(v) => (flag, Some(v.to_string())),
        None => {
            let next = args
                .get(i + 1)
                .filter(|a| !a.starts_with('-') || a.parse::<f64>().is_ok())
                .map(|a| a.replace("\"", "").replace("\'", ""));
            (flag, next)
        }
    }
}

/// Boolean flags are true when given bare or with anything other than `false`.
fn flag_is_set(value: &Option<String>) -> bool {
    match value {
        Some(v) => !v.to_lowercase().contains("false"),
        None => true,
    }
}

fn required_value(flag: &str, value: Option<String>) -> Result<String, Error> {
    value.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("The {} flag requires a value.", flag),
        )
    })
}

#[derive(Serialize, Deserialize, Debug)]
struct ToolParameter {
    name: String,
    flags: Vec<String>,
    description: String,
    parameter_type: ParameterType,
    default_value: Option<String>,
    optional: bool,
}

#[derive(Serialize, Deserialize, Debug)]
enum ParameterType {
    Boolean,
    String,
    Integer,
    Float,
    ExistingFile(ParameterFileType),
    NewFile(ParameterFileType),
    Directory,
}

#[derive(Serialize, Deserialize, Debug)]
enum ParameterFileType {
    Raster,
    Vector(VectorGeometryType),
    Text,
}

#[derive(Serialize, Deserialize, Debug)]
enum VectorGeometryType {
    Point,
}
