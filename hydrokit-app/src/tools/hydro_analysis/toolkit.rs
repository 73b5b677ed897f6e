/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 15/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

/// Number of trailing stdout lines kept to explain a failure that wrote
/// nothing to stderr.
const TAIL_LINES: usize = 10;

#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("The WhiteboxTools executable was not found at {}.", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("Could not execute {}: {source}", .exe.display())]
    Launch {
        exe: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed ({}): {message}", describe_exit(.code))]
    Failed {
        tool: String,
        code: Option<i32>,
        message: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {}", c),
        None => "terminated by signal".to_string(),
    }
}

impl From<ToolkitError> for io::Error {
    fn from(err: ToolkitError) -> io::Error {
        let kind = match err {
            ToolkitError::ExecutableNotFound(_) => io::ErrorKind::NotFound,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err.to_string())
    }
}

/// Something that can run a named geoprocessing tool with a list of
/// `--flag=value` arguments, blocking until the tool has finished.
pub trait HydroToolkit {
    fn run_tool(&self, tool_name: &str, args: &[String]) -> Result<(), ToolkitError>;
}

/// The `whitebox_tools` command-line program.
#[derive(Debug, Clone)]
pub struct WhiteboxExecutable {
    exe: PathBuf,
    working_dir: PathBuf,
    verbose: bool,
}

impl WhiteboxExecutable {
    /// Locates `whitebox_tools` (`whitebox_tools.exe` on Windows) in `wbt_dir`.
    /// Tools are run with `working_dir` as their working directory.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        wbt_dir: P,
        working_dir: Q,
        verbose: bool,
    ) -> Result<WhiteboxExecutable, ToolkitError> {
        let exe = wbt_dir.as_ref().join(executable_name());
        if !exe.is_file() {
            return Err(ToolkitError::ExecutableNotFound(exe));
        }
        Ok(WhiteboxExecutable {
            exe,
            working_dir: working_dir.as_ref().to_path_buf(),
            verbose,
        })
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// The full argument list passed to the executable for one tool run.
    pub fn command_args(&self, tool_name: &str, args: &[String]) -> Vec<String> {
        let mut cmd_args = Vec::with_capacity(args.len() + 3);
        cmd_args.push(format!("-r={}", tool_name));
        cmd_args.push(format!("--wd={}", self.working_dir.display()));
        cmd_args.extend(args.iter().cloned());
        cmd_args.push(format!("-v={}", self.verbose));
        cmd_args
    }
}

pub fn executable_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "whitebox_tools.exe"
    } else {
        "whitebox_tools"
    }
}

impl HydroToolkit for WhiteboxExecutable {
    fn run_tool(&self, tool_name: &str, args: &[String]) -> Result<(), ToolkitError> {
        let cmd_args = self.command_args(tool_name, args);
        log::info!("{} {}", self.exe.display(), cmd_args.join(" "));

        let mut child = Command::new(&self.exe)
            .args(&cmd_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolkitError::Launch {
                exe: self.exe.clone(),
                source,
            })?;

        // stderr is drained on its own thread so a chatty tool cannot block on a full pipe
        let stderr = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut s = String::new();
            if let Some(mut e) = stderr {
                let _ = e.read_to_string(&mut s);
            }
            s
        });

        let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(_) => break,
                };
                if self.verbose {
                    println!("{}", line);
                } else {
                    log::debug!("{}: {}", tool_name, line);
                }
                if tail.len() == TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child.wait().map_err(|source| ToolkitError::Launch {
            exe: self.exe.clone(),
            source,
        })?;
        let stderr_text = stderr_reader.join().unwrap_or_default();

        if status.success() {
            return Ok(());
        }
        let message = if !stderr_text.trim().is_empty() {
            stderr_text.trim().to_string()
        } else {
            Vec::from(tail).join("\n").trim().to_string()
        };
        Err(ToolkitError::Failed {
            tool: tool_name.to_string(),
            code: status.code(),
            message,
        })
    }
}
