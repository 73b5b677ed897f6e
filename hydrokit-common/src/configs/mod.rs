use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// A structure to hold environment settings. Backed by settings.json file in the
/// current directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Configs {
    pub verbose_mode: bool,
    pub working_directory: String,
    pub compress_rasters: bool,
    pub max_procs: isize,
    /// Directory containing the WhiteboxTools executable, used when a tool
    /// is not given `--wbt_dir` explicitly.
    #[serde(default)]
    pub whitebox_dir: String,
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            verbose_mode: false,
            working_directory: String::new(),
            compress_rasters: true,
            max_procs: -1,
            whitebox_dir: String::new(),
        }
    }
}

impl Configs {
    pub fn new() -> Configs {
        Configs::default()
    }
}

/// Location of the settings file used by `get_configs` and `save_configs`.
pub fn settings_file() -> Result<PathBuf, Error> {
    Ok(std::env::current_dir()?.join(SETTINGS_FILE))
}

pub fn get_configs() -> Result<Configs, Error> {
    get_configs_from(&settings_file()?)
}

pub fn save_configs(configs: &Configs) -> Result<(), Error> {
    save_configs_to(configs, &settings_file()?)
}

/// Reads the settings from `config_file`. A missing file yields the defaults.
pub fn get_configs_from(config_file: &Path) -> Result<Configs, Error> {
    match fs::read_to_string(config_file) {
        Ok(contents) => {
            debug!("Reading settings from {}", config_file.display());
            serde_json::from_str(&contents).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("Failed to parse {}: {}", config_file.display(), e),
                )
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Configs::new()),
        Err(e) => Err(e),
    }
}

pub fn save_configs_to(configs: &Configs, config_file: &Path) -> Result<(), Error> {
    let configs_json = serde_json::to_string_pretty(configs)
        .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
    fs::write(config_file, configs_json.as_bytes())?;
    debug!("Settings saved to {}", config_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let configs = get_configs_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(configs, Configs::default());
        assert_eq!(configs.max_procs, -1);
        assert!(configs.compress_rasters);
    }

    #[test]
    fn settings_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        let mut configs = Configs::new();
        configs.verbose_mode = true;
        configs.max_procs = 2;
        configs.whitebox_dir = "/opt/WBT".to_string();
        save_configs_to(&configs, &file).unwrap();
        assert_eq!(get_configs_from(&file).unwrap(), configs);
    }

    #[test]
    fn older_settings_without_whitebox_dir_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(
            &file,
            r#"{"verbose_mode":false,"working_directory":"","compress_rasters":false,"max_procs":4}"#,
        )
        .unwrap();
        let configs = get_configs_from(&file).unwrap();
        assert_eq!(configs.max_procs, 4);
        assert!(configs.whitebox_dir.is_empty());
    }

    #[test]
    fn corrupt_settings_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, "{ not json").unwrap();
        let err = get_configs_from(&file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
